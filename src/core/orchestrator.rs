use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::settings::BatchSettings;
use crate::domain::model::{
    AnalysisResult, BatchFailure, BatchProgress, CanonicalField, CanonicalRecord, ColumnMapping,
    RunPhase, RunReport, RunStatus,
};
use crate::domain::ports::{Classifier, RunObserver};
use crate::domain::verdict::{Classification, Verdict, TAG_ANALYSIS_FAILED, TAG_VERDICT_MISSING};
use crate::utils::error::{Result, TriageError};

/// Cooperative cancellation signal, checked before each batch is dispatched.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// 把進度與狀態轉成日誌
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_progress(&self, snapshot: &BatchProgress) {
        tracing::debug!(
            "Progress {}/{} (batch {}/{}, analyzing: {})",
            snapshot.completed,
            snapshot.total,
            snapshot.current_batch,
            snapshot.total_batches,
            snapshot.is_analyzing
        );
    }

    fn on_results(&self, batch: &[AnalysisResult]) {
        let negatives = batch.iter().filter(|r| r.is_negative()).count();
        tracing::debug!("Received {} results ({} negative)", batch.len(), negatives);
    }

    fn on_phase(&self, phase: RunPhase) {
        match phase {
            RunPhase::Running { batch } => tracing::debug!("▶️ Running batch {}", batch),
            RunPhase::Cancelled => tracing::warn!("⏹️ Run cancelled"),
            other => tracing::info!("🔄 Run phase: {:?}", other),
        }
    }
}

/// Publishes every progress snapshot on a `watch` channel.
#[derive(Debug)]
pub struct ProgressWatch {
    sender: watch::Sender<BatchProgress>,
}

impl ProgressWatch {
    pub fn new() -> (Self, watch::Receiver<BatchProgress>) {
        let (sender, receiver) = watch::channel(BatchProgress::default());
        (Self { sender }, receiver)
    }
}

impl RunObserver for ProgressWatch {
    fn on_progress(&self, snapshot: &BatchProgress) {
        self.sender.send_replace(*snapshot);
    }
}

/// Drives the classifier over admitted records, one batch at a time.
pub struct BatchOrchestrator {
    classifier: Arc<dyn Classifier>,
    settings: BatchSettings,
}

impl BatchOrchestrator {
    pub fn new(classifier: Arc<dyn Classifier>, settings: BatchSettings) -> Self {
        Self {
            classifier,
            settings,
        }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// 批次大小不超過設定上限與服務單次請求上限，且至少為 1
    pub fn batch_size(&self, record_count: usize) -> usize {
        self.settings
            .max_batch_size
            .min(self.settings.request_record_limit)
            .min(record_count)
            .max(1)
    }

    fn pacing_delay(&self, consecutive_failures: u32) -> Duration {
        let base = self.settings.inter_batch_delay;
        let delay = base + self.settings.backoff_step.saturating_mul(consecutive_failures);
        delay.min(self.settings.max_delay.max(base))
    }

    pub async fn run(
        &self,
        records: &[CanonicalRecord],
        mapping: &ColumnMapping,
        cancel: &CancelFlag,
        observer: &dyn RunObserver,
    ) -> Result<RunReport> {
        observer.on_phase(RunPhase::Validating);

        let missing = mapping.missing_required();
        if !missing.is_empty() {
            return Err(TriageError::MappingIncomplete {
                missing: missing
                    .iter()
                    .map(|field| CanonicalField::as_str(field).to_string())
                    .collect(),
            });
        }

        // id 為紀錄在完整輸入中的位置（1-based），略過的紀錄不會讓後面的 id 位移
        let admitted: Vec<(usize, &CanonicalRecord)> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_admissible())
            .map(|(index, record)| (index + 1, record))
            .collect();
        let rejected_records = records.len() - admitted.len();
        if admitted.is_empty() {
            return Err(TriageError::ValidationError {
                message: format!(
                    "none of the {} records has a search term with valid cost and clicks",
                    records.len()
                ),
            });
        }
        if rejected_records > 0 {
            tracing::warn!(
                "⚠️ Skipped {} records without a search term or with invalid numbers",
                rejected_records
            );
        }

        let batch_size = self.batch_size(admitted.len());
        let total_batches = admitted.len().div_ceil(batch_size);

        tracing::info!(
            "🚀 Analyzing {} search terms in {} batches of up to {} with {}",
            admitted.len(),
            total_batches,
            batch_size,
            self.classifier.name()
        );

        let mut progress = BatchProgress {
            total: admitted.len(),
            completed: 0,
            current_batch: 0,
            total_batches,
            is_analyzing: true,
        };
        observer.on_progress(&progress);

        let mut results: Vec<AnalysisResult> = Vec::with_capacity(admitted.len());
        let mut failures = Vec::new();
        let mut consecutive_failures: u32 = 0;
        let mut status = RunStatus::Completed;

        for (index, chunk) in admitted.chunks(batch_size).enumerate() {
            let batch_no = index + 1;
            if cancel.is_cancelled() {
                tracing::info!(
                    "Cancellation requested, stopping before batch {}/{}",
                    batch_no,
                    total_batches
                );
                status = RunStatus::Cancelled;
                break;
            }

            progress.current_batch = batch_no;
            observer.on_phase(RunPhase::Running { batch: batch_no });
            observer.on_progress(&progress);

            let ids: Vec<usize> = chunk.iter().map(|(id, _)| *id).collect();
            let batch: Vec<CanonicalRecord> = chunk.iter().map(|(_, r)| (*r).clone()).collect();

            let batch_results = match self.dispatch(&batch).await {
                Ok(classifications) => {
                    consecutive_failures = 0;
                    tracing::debug!(
                        "Batch {}/{} returned {} verdicts",
                        batch_no,
                        total_batches,
                        classifications.len()
                    );
                    align(&batch, &ids, classifications)
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    if e.is_batch_recoverable() {
                        tracing::warn!("⚠️ Batch {}/{} failed: {}", batch_no, total_batches, e);
                    } else {
                        tracing::error!("❌ Batch {}/{} failed: {}", batch_no, total_batches, e);
                    }

                    let message = e.to_string();
                    failures.push(BatchFailure {
                        batch: batch_no,
                        first_id: ids.first().copied().unwrap_or_default(),
                        last_id: ids.last().copied().unwrap_or_default(),
                        message: message.clone(),
                    });
                    batch
                        .iter()
                        .zip(&ids)
                        .map(|(record, id)| placeholder(record, *id, TAG_ANALYSIS_FAILED, &message))
                        .collect()
                }
            };

            progress.completed += batch.len();
            observer.on_results(&batch_results);
            results.extend(batch_results);
            observer.on_progress(&progress);

            if batch_no < total_batches && !cancel.is_cancelled() {
                let delay = self.pacing_delay(consecutive_failures);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        progress.is_analyzing = false;
        observer.on_progress(&progress);
        observer.on_phase(match status {
            RunStatus::Completed => RunPhase::Completed,
            RunStatus::Cancelled => RunPhase::Cancelled,
        });

        tracing::info!(
            "✅ Analysis finished: {}/{} records, {} failed batches",
            progress.completed,
            progress.total,
            failures.len()
        );

        Ok(RunReport {
            results,
            progress,
            status,
            failures,
            rejected_records,
        })
    }

    async fn dispatch(&self, batch: &[CanonicalRecord]) -> Result<Vec<Classification>> {
        let timeout = self.settings.call_timeout;
        match tokio::time::timeout(timeout, self.classifier.classify(batch)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TriageError::Timeout {
                millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// 依位置對齊判定；不足的補佔位結果，多出來的丟棄
fn align(
    batch: &[CanonicalRecord],
    ids: &[usize],
    classifications: Vec<Classification>,
) -> Vec<AnalysisResult> {
    if classifications.len() > batch.len() {
        tracing::warn!(
            "Classifier returned {} verdicts for {} records, extra verdicts dropped",
            classifications.len(),
            batch.len()
        );
    } else if classifications.len() < batch.len() {
        tracing::warn!(
            "Classifier returned {} verdicts for {} records, padding the rest",
            classifications.len(),
            batch.len()
        );
    }

    let mut verdicts = classifications.into_iter();
    batch
        .iter()
        .zip(ids)
        .map(|(record, &id)| {
            match verdicts.next() {
                Some(classification) => AnalysisResult {
                    id,
                    record: record.clone(),
                    translation: classification
                        .translation
                        .unwrap_or_else(|| record.search_term.clone()),
                    analysis: classification.verdict,
                },
                None => placeholder(
                    record,
                    id,
                    TAG_VERDICT_MISSING,
                    "classifier returned no verdict for this record",
                ),
            }
        })
        .collect()
}

fn placeholder(record: &CanonicalRecord, id: usize, tag: &str, message: &str) -> AnalysisResult {
    AnalysisResult {
        id,
        record: record.clone(),
        translation: record.search_term.clone(),
        analysis: Verdict::placeholder(record, tag, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verdict::{ScoredNote, TAG_DEFAULT_ANALYSIS};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// 依呼叫次序決定成功或失敗；分數由搜尋字詞長度決定，方便比對
    struct ScriptedClassifier {
        calls: AtomicUsize,
        failing_calls: Vec<usize>,
        verdicts_per_call: Option<usize>,
        delay: Duration,
    }

    impl ScriptedClassifier {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing_calls: Vec::new(),
                verdicts_per_call: None,
                delay: Duration::ZERO,
            }
        }

        fn failing_on(mut self, calls: &[usize]) -> Self {
            self.failing_calls = calls.to_vec();
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Classifier for ScriptedClassifier {
        async fn classify(&self, batch: &[CanonicalRecord]) -> Result<Vec<Classification>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing_calls.contains(&call) {
                return Err(TriageError::HttpStatus {
                    status: 502,
                    message: "upstream unavailable".to_string(),
                });
            }

            let count = self.verdicts_per_call.unwrap_or(batch.len());
            Ok(batch
                .iter()
                .cycle()
                .take(count)
                .map(|record| {
                    let mut verdict = Verdict::default_analysis(record);
                    verdict.semantic_relevance = ScoredNote::new(record.search_term.len() as u8, "scripted");
                    verdict.recommendation.is_negative = record.search_term.contains("free");
                    Classification {
                        translation: Some(format!("译:{}", record.search_term)),
                        verdict,
                    }
                })
                .collect())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        snapshots: Mutex<Vec<BatchProgress>>,
        phases: Mutex<Vec<RunPhase>>,
        result_batches: Mutex<Vec<usize>>,
        cancel_after_results: Option<CancelFlag>,
    }

    impl RunObserver for RecordingObserver {
        fn on_progress(&self, snapshot: &BatchProgress) {
            self.snapshots.lock().unwrap().push(*snapshot);
        }

        fn on_results(&self, batch: &[AnalysisResult]) {
            self.result_batches.lock().unwrap().push(batch.len());
            if let Some(flag) = &self.cancel_after_results {
                flag.cancel();
            }
        }

        fn on_phase(&self, phase: RunPhase) {
            self.phases.lock().unwrap().push(phase);
        }
    }

    fn fast_settings() -> BatchSettings {
        BatchSettings {
            inter_batch_delay: Duration::ZERO,
            backoff_step: Duration::ZERO,
            ..Default::default()
        }
    }

    fn full_mapping() -> ColumnMapping {
        [
            (CanonicalField::SearchTerm, "搜索字词"),
            (CanonicalField::Keyword, "关键词"),
            (CanonicalField::Clicks, "点击次数"),
            (CanonicalField::Cost, "费用"),
        ]
        .into_iter()
        .map(|(field, column)| (field, column.to_string()))
        .collect()
    }

    fn records(terms: &[&str]) -> Vec<CanonicalRecord> {
        terms
            .iter()
            .map(|term| CanonicalRecord {
                search_term: term.to_string(),
                keyword: "pcb".to_string(),
                clicks: 4.0,
                cost: 10.0,
                ..Default::default()
            })
            .collect()
    }

    const FIVE_TERMS: [&str; 5] = ["pcb", "pcba quote", "free pcb", "smt line", "pcb design jobs"];

    #[tokio::test]
    async fn test_five_records_with_failing_second_batch() {
        let classifier = Arc::new(ScriptedClassifier::new().failing_on(&[2]));
        let orchestrator = BatchOrchestrator::new(classifier.clone(), fast_settings());
        let observer = RecordingObserver::default();

        let report = orchestrator
            .run(&records(&FIVE_TERMS), &full_mapping(), &CancelFlag::new(), &observer)
            .await
            .unwrap();

        assert_eq!(classifier.calls(), 3);
        assert_eq!(*observer.result_batches.lock().unwrap(), vec![2, 2, 1]);
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.results.len(), 5);
        assert_eq!(report.progress.completed, 5);
        assert_eq!(report.progress.total_batches, 3);
        assert!(!report.progress.is_analyzing);

        let ids: Vec<usize> = report.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        for failed in &report.results[2..4] {
            assert!(failed.has_tag(TAG_ANALYSIS_FAILED));
            assert_eq!(failed.analysis.recommendation.confidence, 0);
            assert_eq!(failed.analysis.semantic_relevance.score, 0);
            assert!(failed.analysis.recommendation.reasoning.contains("upstream unavailable"));
        }
        assert_eq!(
            report.failures,
            vec![BatchFailure {
                batch: 2,
                first_id: 3,
                last_id: 4,
                message: "Classifier returned HTTP 502: upstream unavailable".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_change_neighbours() {
        let terms = records(&FIVE_TERMS);
        let healthy = BatchOrchestrator::new(Arc::new(ScriptedClassifier::new()), fast_settings())
            .run(&terms, &full_mapping(), &CancelFlag::new(), &TracingObserver)
            .await
            .unwrap();
        let degraded = BatchOrchestrator::new(
            Arc::new(ScriptedClassifier::new().failing_on(&[2])),
            fast_settings(),
        )
        .run(&terms, &full_mapping(), &CancelFlag::new(), &TracingObserver)
        .await
        .unwrap();

        for index in [0, 1, 4] {
            assert_eq!(healthy.results[index], degraded.results[index]);
        }
        assert_eq!(degraded.results[4].analysis.semantic_relevance.score, 15);
        assert_eq!(degraded.results[0].translation, "译:pcb");
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_running_flag_flips_once() {
        let orchestrator = BatchOrchestrator::new(
            Arc::new(ScriptedClassifier::new().failing_on(&[1, 3])),
            fast_settings(),
        );
        let observer = RecordingObserver::default();

        orchestrator
            .run(&records(&FIVE_TERMS), &full_mapping(), &CancelFlag::new(), &observer)
            .await
            .unwrap();

        let snapshots = observer.snapshots.lock().unwrap();
        assert!(snapshots.windows(2).all(|w| w[0].completed <= w[1].completed));
        let flips = snapshots
            .windows(2)
            .filter(|w| w[0].is_analyzing && !w[1].is_analyzing)
            .count();
        assert_eq!(flips, 1);
        assert_eq!(snapshots.last().unwrap().completed, 5);

        let phases = observer.phases.lock().unwrap();
        assert_eq!(phases.first(), Some(&RunPhase::Validating));
        assert_eq!(phases.last(), Some(&RunPhase::Completed));
        assert!(phases.contains(&RunPhase::Running { batch: 3 }));
    }

    #[tokio::test]
    async fn test_cancel_keeps_accumulated_results() {
        let classifier = Arc::new(ScriptedClassifier::new());
        let orchestrator = BatchOrchestrator::new(classifier.clone(), fast_settings());
        let cancel = CancelFlag::new();
        let observer = RecordingObserver {
            cancel_after_results: Some(cancel.clone()),
            ..Default::default()
        };

        let report = orchestrator
            .run(&records(&FIVE_TERMS), &full_mapping(), &cancel, &observer)
            .await
            .unwrap();

        assert_eq!(classifier.calls(), 1);
        assert_eq!(report.status, RunStatus::Cancelled);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.progress.completed, 2);
        assert!(!report.progress.is_analyzing);
        assert_eq!(
            observer.phases.lock().unwrap().last(),
            Some(&RunPhase::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_slow_classifier_times_out_per_batch() {
        let classifier = Arc::new(ScriptedClassifier {
            delay: Duration::from_millis(500),
            ..ScriptedClassifier::new()
        });
        let orchestrator = BatchOrchestrator::new(
            classifier,
            BatchSettings {
                call_timeout: Duration::from_millis(20),
                ..fast_settings()
            },
        );

        let report = orchestrator
            .run(&records(&["pcb", "smt"]), &full_mapping(), &CancelFlag::new(), &TracingObserver)
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert!(report.results.iter().all(|r| r.has_tag(TAG_ANALYSIS_FAILED)));
        assert!(report.failures[0].message.contains("timed out after 20ms"));
    }

    #[tokio::test]
    async fn test_short_verdict_list_is_padded() {
        let classifier = Arc::new(ScriptedClassifier {
            verdicts_per_call: Some(1),
            ..ScriptedClassifier::new()
        });
        let report = BatchOrchestrator::new(classifier, fast_settings())
            .run(&records(&["pcb", "smt"]), &full_mapping(), &CancelFlag::new(), &TracingObserver)
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].has_tag(TAG_DEFAULT_ANALYSIS));
        assert!(report.results[1].has_tag(TAG_VERDICT_MISSING));
        assert_eq!(report.progress.completed, 2);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_extra_verdicts_are_dropped() {
        let classifier = Arc::new(ScriptedClassifier {
            verdicts_per_call: Some(4),
            ..ScriptedClassifier::new()
        });
        let report = BatchOrchestrator::new(classifier, fast_settings())
            .run(&records(&["pcb"]), &full_mapping(), &CancelFlag::new(), &TracingObserver)
            .await
            .unwrap();
        assert_eq!(report.results.len(), 1);
    }

    #[tokio::test]
    async fn test_incomplete_mapping_fails_before_any_call() {
        let classifier = Arc::new(ScriptedClassifier::new());
        let mut mapping = full_mapping();
        mapping.remove(CanonicalField::Keyword);
        mapping.remove(CanonicalField::Cost);

        let err = BatchOrchestrator::new(classifier.clone(), fast_settings())
            .run(&records(&FIVE_TERMS), &mapping, &CancelFlag::new(), &TracingObserver)
            .await
            .unwrap_err();

        assert_eq!(classifier.calls(), 0);
        match err {
            TriageError::MappingIncomplete { missing } => {
                assert_eq!(missing, vec!["keyword", "cost"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_admissible_records_is_validation_error() {
        let classifier = Arc::new(ScriptedClassifier::new());
        let mut blank = records(&["", "  "]);
        blank.extend(records(&["pcb"]).into_iter().map(|mut r| {
            r.cost = f64::NAN;
            r
        }));

        let err = BatchOrchestrator::new(classifier.clone(), fast_settings())
            .run(&blank, &full_mapping(), &CancelFlag::new(), &TracingObserver)
            .await
            .unwrap_err();

        assert_eq!(classifier.calls(), 0);
        assert!(matches!(err, TriageError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_ids_keep_input_positions_when_records_are_rejected() {
        let mut input = records(&["pcb", "", "smt"]);
        input[1].keyword = "blank".to_string();

        let report = BatchOrchestrator::new(Arc::new(ScriptedClassifier::new()), fast_settings())
            .run(&input, &full_mapping(), &CancelFlag::new(), &TracingObserver)
            .await
            .unwrap();

        assert_eq!(report.rejected_records, 1);
        assert_eq!(report.progress.total, 2);
        let terms: Vec<(usize, &str)> = report
            .results
            .iter()
            .map(|r| (r.id, r.record.search_term.as_str()))
            .collect();
        assert_eq!(terms, vec![(1, "pcb"), (3, "smt")]);
        for result in &report.results {
            assert_eq!(input[result.id - 1].search_term, result.record.search_term);
        }
    }

    #[tokio::test]
    async fn test_failure_range_uses_input_positions() {
        let input = records(&["pcb", "", "smt", "free pcb", "smt line"]);

        let report = BatchOrchestrator::new(
            Arc::new(ScriptedClassifier::new().failing_on(&[2])),
            fast_settings(),
        )
        .run(&input, &full_mapping(), &CancelFlag::new(), &TracingObserver)
        .await
        .unwrap();

        let ids: Vec<usize> = report.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 4, 5]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].first_id, 4);
        assert_eq!(report.failures[0].last_id, 5);
        assert!(report.results[2].has_tag(TAG_ANALYSIS_FAILED));
        assert_eq!(report.results[2].record.search_term, "free pcb");
    }

    #[tokio::test]
    async fn test_cancel_skips_pacing_delay() {
        let classifier = Arc::new(ScriptedClassifier::new());
        let orchestrator = BatchOrchestrator::new(
            classifier.clone(),
            BatchSettings {
                inter_batch_delay: Duration::from_secs(5),
                max_delay: Duration::from_secs(5),
                ..fast_settings()
            },
        );
        let cancel = CancelFlag::new();
        let observer = RecordingObserver {
            cancel_after_results: Some(cancel.clone()),
            ..Default::default()
        };

        let started = std::time::Instant::now();
        let report = orchestrator
            .run(&records(&FIVE_TERMS), &full_mapping(), &cancel, &observer)
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(classifier.calls(), 1);
        assert_eq!(report.status, RunStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_progress_watch_sees_final_snapshot() {
        let (watch, receiver) = ProgressWatch::new();
        let report = BatchOrchestrator::new(Arc::new(ScriptedClassifier::new()), fast_settings())
            .run(&records(&["pcb", "smt", "pcba"]), &full_mapping(), &CancelFlag::new(), &watch)
            .await
            .unwrap();

        assert_eq!(*receiver.borrow(), report.progress);
        assert_eq!(receiver.borrow().completed, 3);
    }

    #[test]
    fn test_batch_size_and_pacing() {
        let orchestrator = BatchOrchestrator::new(
            Arc::new(ScriptedClassifier::new()),
            BatchSettings {
                max_batch_size: 50,
                request_record_limit: 10,
                ..Default::default()
            },
        );
        assert_eq!(orchestrator.batch_size(1000), 10);
        assert_eq!(orchestrator.batch_size(3), 3);
        assert_eq!(orchestrator.batch_size(0), 1);

        assert_eq!(orchestrator.pacing_delay(0), Duration::from_millis(100));
        assert_eq!(orchestrator.pacing_delay(2), Duration::from_millis(600));
        assert_eq!(orchestrator.pacing_delay(100), Duration::from_secs(2));
    }
}
