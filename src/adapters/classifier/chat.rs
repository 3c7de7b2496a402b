use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::decode::decode_classifications;
use super::http::{error_message, transport_error};
use super::recovery::{extract_json_array, preview};
use crate::config::settings::ClassifierSettings;
use crate::domain::model::CanonicalRecord;
use crate::domain::ports::Classifier;
use crate::domain::verdict::Classification;
use crate::utils::error::{Result, TriageError};
use crate::utils::validation::validate_url;

/// Classifier that prompts an OpenAI-compatible `/chat/completions` API
/// (Moonshot/Kimi by default) and recovers the verdict array from its reply.
pub struct ChatCompletionClassifier {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    business_context: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl ChatCompletionClassifier {
    pub fn new(settings: &ClassifierSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TriageError::ConfigError {
                message: "KIMI_API_KEY is not configured".to_string(),
            })?;
        validate_url("classifier.base_url", &settings.base_url)?;

        let url = if settings.base_url.ends_with('/') {
            format!("{}chat/completions", settings.base_url)
        } else {
            format!("{}/chat/completions", settings.base_url)
        };

        Ok(Self {
            client: Client::builder().timeout(settings.timeout).build()?,
            url,
            api_key,
            model: settings.model.clone(),
            business_context: settings.business_context.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: settings.timeout,
        })
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a Google Ads expert analyzing {} business search terms. \
             Return ONLY a valid JSON array with no explanations, no markdown formatting, no Chinese text. \
             Each object must have: searchTerm, translation, semanticRelevance{{score,analysis}}, \
             commercialValue{{score,analysis}}, performanceAnalysis{{costEfficiency,clickQuality,conversionPotential}}, \
             recommendation{{isNegative,confidence,negativeKeyword,matchType,level,reasonTags,reasoning}}",
            self.business_context
        )
    }

    /// 每筆紀錄壓縮成 `"term":Nc,Ncv,$cost`，以減少 token
    pub fn user_prompt(&self, batch: &[CanonicalRecord]) -> String {
        let terms = batch
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let term = if record.search_term.is_empty() {
                    format!("term{}", index + 1)
                } else {
                    record.search_term.clone()
                };
                format!(
                    "\"{}\":{}c,{}cv,${}",
                    term, record.clicks, record.conversions, record.cost
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "Analyze {} search terms. Return JSON array only:\n{}",
            self.business_context, terms
        )
    }
}

#[async_trait]
impl Classifier for ChatCompletionClassifier {
    async fn classify(&self, batch: &[CanonicalRecord]) -> Result<Vec<Classification>> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": self.system_prompt()
                },
                {
                    "role": "user",
                    "content": self.user_prompt(batch)
                }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        tracing::debug!("Calling {} with model {}", self.url, self.model);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !status.is_success() {
            return Err(TriageError::HttpStatus {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| TriageError::DecodeError {
            message: format!("chat response is not JSON: {}", e),
        })?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| TriageError::DecodeError {
                message: "empty response from chat completion API".to_string(),
            })?;

        tracing::debug!("Model reply: {}", preview(content));

        let items = extract_json_array(content)?;
        decode_classifications(&items, batch)
    }

    fn name(&self) -> &str {
        "chat"
    }
}
