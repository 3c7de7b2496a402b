use std::sync::Arc;

use crate::core::mapper::FieldMapper;
use crate::core::orchestrator::{BatchOrchestrator, CancelFlag, TracingObserver};
use crate::core::parser::{ParsedTable, TabularParser};
use crate::core::projector::RecordProjector;
use crate::core::report::ReportWriter;
use crate::config::settings::INPUT_EXTENSIONS;
use crate::domain::model::{Extraction, RunReport};
use crate::domain::ports::{Classifier, ConfigProvider, Pipeline, RunObserver, Storage};
use crate::utils::error::{Result, TriageError};
use crate::utils::validation::validate_file_extension;

/// 讀取報表 → 欄位映射 → 分批分類 → 輸出結果
pub struct TriagePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    classifier: Arc<dyn Classifier>,
    cancel: CancelFlag,
    observer: Arc<dyn RunObserver>,
}

impl<S: Storage, C: ConfigProvider> TriagePipeline<S, C> {
    pub fn new(storage: S, config: C, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            storage,
            config,
            classifier,
            cancel: CancelFlag::new(),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for stopping the run between batches.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn parse_table(&self, text: &str) -> ParsedTable {
        match TabularParser::new().parse(text, self.config.header_row()) {
            Ok(table) => table,
            Err(e) => {
                // 解析失敗不中斷，交給後續映射檢查回報缺少的欄位
                tracing::warn!("⚠️ Could not parse {}: {}", self.config.input_path(), e);
                ParsedTable::default()
            }
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for TriagePipeline<S, C> {
    async fn extract(&self) -> Result<Extraction> {
        let input_path = self.config.input_path();
        validate_file_extension("input", input_path, &INPUT_EXTENSIONS)?;

        tracing::debug!("Reading search term report: {}", input_path);
        let bytes = self.storage.read_file(input_path).await?;
        let text = String::from_utf8(bytes).map_err(|e| TriageError::ParseError {
            message: format!("{} is not valid UTF-8: {}", input_path, e),
        })?;

        let table = self.parse_table(&text);
        let columns = table.columns();
        tracing::debug!(
            "Parsed {} rows with header row {} ({} lines rejected)",
            table.rows.len(),
            table.header_row,
            table.rejected_lines
        );
        if table.rejected_lines > 0 {
            tracing::warn!(
                "⚠️ Dropped {} lines whose column count did not match the header",
                table.rejected_lines
            );
        }

        let (mut mapping, conflicts) = if self.config.auto_map() {
            let outcome = FieldMapper::new().auto_map(&columns);
            (outcome.mapping, outcome.conflicts)
        } else {
            Default::default()
        };
        let overrides = self.config.mapping_overrides();
        mapping.merge_overrides(&overrides);

        let before = mapping.len();
        mapping.retain_columns(&columns);
        if mapping.len() < before {
            tracing::warn!(
                "⚠️ Dropped {} mapping entries that point at columns not present in the report",
                before - mapping.len()
            );
        }

        for (field, column) in mapping.iter() {
            tracing::debug!("Mapped {} ← '{}'", field, column);
        }

        let records = RecordProjector::new().project(&table.rows, &mapping);

        Ok(Extraction {
            columns,
            mapping,
            conflicts,
            records,
        })
    }

    async fn transform(&self, extraction: Extraction) -> Result<RunReport> {
        let orchestrator = BatchOrchestrator::new(self.classifier.clone(), self.config.batch_settings());
        orchestrator
            .run(
                &extraction.records,
                &extraction.mapping,
                &self.cancel,
                self.observer.as_ref(),
            )
            .await
    }

    async fn load(&self, report: RunReport) -> Result<String> {
        let settings = self.config.output_settings();
        ReportWriter::new(&self.storage, &settings).write(&report).await
    }
}
