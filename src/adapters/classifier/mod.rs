pub mod chat;
pub mod decode;
pub mod fallback;
pub mod http;
pub mod recovery;

pub use chat::ChatCompletionClassifier;
pub use fallback::DefaultVerdictClassifier;
pub use http::HttpClassifier;

use std::sync::Arc;

use crate::config::settings::{ClassifierKind, ClassifierSettings, CredentialPolicy};
use crate::domain::ports::Classifier;
use crate::utils::error::{Result, TriageError};

/// 依設定建立分類器；缺少金鑰時依 `on_missing_credentials` 決定失敗或改用預設分析
pub fn build_classifier(settings: &ClassifierSettings) -> Result<Arc<dyn Classifier>> {
    match settings.kind {
        ClassifierKind::Http => {
            let classifier = HttpClassifier::new(settings)?;
            tracing::info!("🔗 Using analysis service at {}", classifier.endpoint());
            Ok(Arc::new(classifier))
        }
        ClassifierKind::Chat => {
            let has_key = settings
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty());

            match (has_key, settings.on_missing_credentials) {
                (true, _) => {
                    tracing::info!("🤖 Using chat completions model {}", settings.model);
                    Ok(Arc::new(ChatCompletionClassifier::new(settings)?))
                }
                (false, CredentialPolicy::DefaultVerdicts) => {
                    tracing::warn!("⚠️ KIMI_API_KEY is not set, every record gets the default analysis");
                    Ok(Arc::new(DefaultVerdictClassifier))
                }
                (false, CredentialPolicy::Fail) => Err(TriageError::ConfigError {
                    message: "KIMI_API_KEY is not configured".to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_settings(api_key: Option<&str>, policy: CredentialPolicy) -> ClassifierSettings {
        ClassifierSettings {
            kind: ClassifierKind::Chat,
            api_key: api_key.map(str::to_string),
            on_missing_credentials: policy,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_key_fails_by_default() {
        let result = build_classifier(&chat_settings(None, CredentialPolicy::Fail));
        assert!(matches!(result, Err(TriageError::ConfigError { .. })));
    }

    #[test]
    fn test_missing_key_with_default_policy() {
        let classifier =
            build_classifier(&chat_settings(Some("  "), CredentialPolicy::DefaultVerdicts)).unwrap();
        assert_eq!(classifier.name(), "default-verdicts");
    }

    #[test]
    fn test_builds_requested_kind() {
        let chat = build_classifier(&chat_settings(Some("sk-test"), CredentialPolicy::Fail)).unwrap();
        assert_eq!(chat.name(), "chat");

        let http = build_classifier(&ClassifierSettings {
            endpoint: Some("http://localhost:3000/api/analyze".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(http.name(), "http");
    }
}
