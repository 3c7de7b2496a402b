use async_trait::async_trait;

use crate::domain::model::CanonicalRecord;
use crate::domain::ports::Classifier;
use crate::domain::verdict::{Classification, Verdict};
use crate::utils::error::Result;

/// 未配置金鑰且明確允許時使用：不呼叫任何服務，每筆回傳預設分析
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVerdictClassifier;

#[async_trait]
impl Classifier for DefaultVerdictClassifier {
    async fn classify(&self, batch: &[CanonicalRecord]) -> Result<Vec<Classification>> {
        Ok(batch
            .iter()
            .map(|record| Classification {
                translation: Some(record.search_term.clone()),
                verdict: Verdict::default_analysis(record),
            })
            .collect())
    }

    fn name(&self) -> &str {
        "default-verdicts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verdict::TAG_DEFAULT_ANALYSIS;

    #[tokio::test]
    async fn test_every_record_gets_default_analysis() {
        let batch = vec![
            CanonicalRecord {
                search_term: "pcb".to_string(),
                ..Default::default()
            },
            CanonicalRecord {
                search_term: "smt".to_string(),
                ..Default::default()
            },
        ];

        let verdicts = DefaultVerdictClassifier.classify(&batch).await.unwrap();

        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts[1].translation.as_deref(), Some("smt"));
        let recommendation = &verdicts[0].verdict.recommendation;
        assert_eq!(recommendation.confidence, 50);
        assert!(!recommendation.is_negative);
        assert_eq!(recommendation.reason_tags, vec![TAG_DEFAULT_ANALYSIS]);
        assert_eq!(recommendation.reasoning, "使用默认分析，API配置不完整");
    }

    #[test]
    fn test_empty_batch_yields_no_verdicts() {
        let verdicts = tokio_test::block_on(DefaultVerdictClassifier.classify(&[])).unwrap();
        assert!(verdicts.is_empty());
        assert_eq!(DefaultVerdictClassifier.name(), "default-verdicts");
    }
}
