use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::decode::decode_classifications;
use super::recovery::{extract_json_array, preview};
use crate::config::settings::ClassifierSettings;
use crate::domain::model::CanonicalRecord;
use crate::domain::ports::Classifier;
use crate::domain::verdict::Classification;
use crate::utils::error::{Result, TriageError};
use crate::utils::validation::validate_url;

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    #[serde(rename = "searchTerms")]
    search_terms: &'a [CanonicalRecord],
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    results: Vec<Value>,
    #[serde(default)]
    warning: Option<String>,
}

/// Client for an analysis service that accepts `{ "searchTerms": [...] }`
/// and answers `{ "results": [...] }`.
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    max_request_bytes: usize,
    max_records: usize,
}

impl HttpClassifier {
    pub fn new(settings: &ClassifierSettings) -> Result<Self> {
        let endpoint = settings
            .endpoint
            .clone()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| TriageError::MissingConfigError {
                field: "classifier.endpoint".to_string(),
            })?;
        validate_url("classifier.endpoint", &endpoint)?;

        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            timeout: settings.timeout,
            max_request_bytes: settings.max_request_bytes,
            max_records: settings.max_records_per_request,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn decode_body(&self, body: &str, batch: &[CanonicalRecord]) -> Result<Vec<Classification>> {
        let items = match serde_json::from_str::<AnalyzeResponse>(body) {
            Ok(response) => {
                if let Some(warning) = response.warning {
                    tracing::warn!("⚠️ Analysis service warning: {}", warning);
                }
                response.results
            }
            Err(_) => extract_json_array(body)?,
        };
        decode_classifications(&items, batch)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, batch: &[CanonicalRecord]) -> Result<Vec<Classification>> {
        if batch.len() > self.max_records {
            return Err(TriageError::TooManyRecords {
                count: batch.len(),
                limit: self.max_records,
            });
        }

        let payload = serde_json::to_vec(&AnalyzeRequest {
            search_terms: batch,
        })?;
        if payload.len() > self.max_request_bytes {
            return Err(TriageError::PayloadTooLarge {
                size: payload.len(),
                limit: self.max_request_bytes,
            });
        }

        tracing::debug!(
            "Posting {} records ({} bytes) to {}",
            batch.len(),
            payload.len(),
            self.endpoint
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        let status = response.status();
        tracing::debug!("Analysis service response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !status.is_success() {
            return Err(TriageError::HttpStatus {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        self.decode_body(&body, batch)
    }

    fn name(&self) -> &str {
        "http"
    }
}

pub(crate) fn transport_error(error: reqwest::Error, timeout: Duration) -> TriageError {
    if error.is_timeout() {
        TriageError::Timeout {
            millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else {
        TriageError::ApiError(error)
    }
}

/// 服務回傳 `{ "error": "..." }` 時取出訊息，否則回傳內文開頭
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = object.get("error") {
            return message.clone();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        preview(trimmed)
    }
}
