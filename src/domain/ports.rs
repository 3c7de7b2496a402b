use crate::config::settings::{BatchSettings, ClassifierSettings, OutputSettings};
use crate::domain::model::{
    AnalysisResult, BatchProgress, CanonicalRecord, ColumnMapping, Extraction, RunPhase,
    RunReport,
};
use crate::domain::verdict::Classification;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    /// 1-based header line after comment filtering; 0 means headerless.
    fn header_row(&self) -> usize;
    fn auto_map(&self) -> bool;
    fn mapping_overrides(&self) -> ColumnMapping;
    fn batch_settings(&self) -> BatchSettings;
    fn classifier_settings(&self) -> ClassifierSettings;
    fn output_settings(&self) -> OutputSettings;
}

/// Remote scoring service boundary. Verdicts are aligned to `batch` by position.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, batch: &[CanonicalRecord]) -> Result<Vec<Classification>>;

    fn name(&self) -> &str;
}

/// 觀察分析進度；每次狀態變更後都會收到不可變的快照
pub trait RunObserver: Send + Sync {
    fn on_progress(&self, _snapshot: &BatchProgress) {}

    fn on_results(&self, _batch: &[AnalysisResult]) {}

    fn on_phase(&self, _phase: RunPhase) {}
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Extraction>;
    async fn transform(&self, extraction: Extraction) -> Result<RunReport>;
    async fn load(&self, report: RunReport) -> Result<String>;
}
