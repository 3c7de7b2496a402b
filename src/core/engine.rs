use crate::core::results::ResultSet;
use crate::domain::model::RunStatus;
use crate::domain::ports::Pipeline;
use crate::domain::verdict::TAG_ANALYSIS_FAILED;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct TriageEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> TriageEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting search term triage");

        // Extract
        let extraction = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} records from {} columns ({} fields mapped)",
            extraction.records.len(),
            extraction.columns.len(),
            extraction.mapping.len()
        );
        self.monitor.log_phase("Extract");

        // Transform
        let report = self.pipeline.transform(extraction).await?;
        let summary = ResultSet::new(report.results.clone());
        tracing::info!(
            "🔍 Analyzed {}/{} search terms: {} negative, {} failed",
            report.progress.completed,
            report.progress.total,
            summary.negatives().count(),
            summary.tagged(TAG_ANALYSIS_FAILED).count()
        );
        if report.status == RunStatus::Cancelled {
            tracing::warn!("⏹️ Run was cancelled, writing the partial results");
        }
        self.monitor.log_phase("Transform");

        // Load
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("📁 Output saved to: {}", output_path);
        self.monitor.log_phase("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
