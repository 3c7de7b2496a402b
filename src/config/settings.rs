use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::utils::error::{Result, TriageError};
use crate::utils::validation::{
    validate_file_extension, validate_path, validate_positive_number, validate_range, validate_url,
    Validate,
};

pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.moonshot.cn/v1";
pub const DEFAULT_CHAT_MODEL: &str = "moonshot-v1-8k";
/// 分析服務單次請求最多接受的紀錄數
pub const DEFAULT_REQUEST_RECORD_LIMIT: usize = 100;
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_BUSINESS_CONTEXT: &str = "PCBA";
/// 可接受的報告副檔名
pub const INPUT_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    pub max_batch_size: usize,
    pub request_record_limit: usize,
    pub call_timeout: Duration,
    pub inter_batch_delay: Duration,
    pub backoff_step: Duration,
    pub max_delay: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_batch_size: 2,
            request_record_limit: DEFAULT_REQUEST_RECORD_LIMIT,
            call_timeout: Duration::from_secs(60),
            inter_batch_delay: Duration::from_millis(100),
            backoff_step: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// POST `{ searchTerms }` to an analysis service that answers `{ results }`.
    #[default]
    Http,
    /// Talk to an OpenAI-compatible chat completions API directly.
    Chat,
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "service" => Ok(ClassifierKind::Http),
            "chat" | "llm" => Ok(ClassifierKind::Chat),
            other => Err(format!("unknown classifier kind '{}', expected http or chat", other)),
        }
    }
}

/// 缺少金鑰時的處理方式，必須明確設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialPolicy {
    #[default]
    Fail,
    DefaultVerdicts,
}

impl FromStr for CredentialPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail" => Ok(CredentialPolicy::Fail),
            "default_verdicts" | "default" => Ok(CredentialPolicy::DefaultVerdicts),
            other => Err(format!(
                "unknown credential policy '{}', expected fail or default_verdicts",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub kind: ClassifierKind,
    pub endpoint: Option<String>,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// 提示詞中描述的業務，例如 "PCBA"
    pub business_context: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_request_bytes: usize,
    pub max_records_per_request: usize,
    pub on_missing_credentials: CredentialPolicy,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::Http,
            endpoint: None,
            base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            business_context: DEFAULT_BUSINESS_CONTEXT.to_string(),
            temperature: 0.1,
            max_tokens: 2000,
            timeout: Duration::from_secs(60),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            max_records_per_request: DEFAULT_REQUEST_RECORD_LIMIT,
            on_missing_credentials: CredentialPolicy::Fail,
        }
    }
}

impl ClassifierSettings {
    /// 未明確設定時，從 KIMI_API_KEY / KIMI_API_BASE / KIMI_MODEL 補上
    pub fn with_env_defaults(mut self) -> Self {
        if self.api_key.as_deref().map_or(true, |key| key.trim().is_empty()) {
            self.api_key = std::env::var("KIMI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        if let Ok(base) = std::env::var("KIMI_API_BASE") {
            if !base.trim().is_empty() && self.base_url == DEFAULT_CHAT_BASE_URL {
                self.base_url = base;
            }
        }
        if let Ok(model) = std::env::var("KIMI_MODEL") {
            if !model.trim().is_empty() && self.model == DEFAULT_CHAT_MODEL {
                self.model = model;
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    Tsv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            other => Err(format!("unsupported output format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub output_path: String,
    pub formats: Vec<OutputFormat>,
    pub compress: bool,
    pub archive_name: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            formats: vec![OutputFormat::Json, OutputFormat::Csv, OutputFormat::Tsv],
            compress: true,
            archive_name: "triage_output.zip".to_string(),
        }
    }
}

impl Validate for BatchSettings {
    fn validate(&self) -> Result<()> {
        validate_positive_number("batch.size", self.max_batch_size, 1)?;
        validate_range(
            "batch.request_record_limit",
            self.request_record_limit,
            1,
            DEFAULT_REQUEST_RECORD_LIMIT,
        )?;
        if self.call_timeout.is_zero() {
            return Err(TriageError::InvalidConfigValueError {
                field: "batch.call_timeout_seconds".to_string(),
                value: "0".to_string(),
                reason: "Every classifier call needs a timeout".to_string(),
            });
        }
        Ok(())
    }
}

impl Validate for ClassifierSettings {
    fn validate(&self) -> Result<()> {
        match self.kind {
            ClassifierKind::Http => {
                let endpoint = self.endpoint.as_deref().unwrap_or("");
                if endpoint.trim().is_empty() {
                    return Err(TriageError::MissingConfigError {
                        field: "classifier.endpoint".to_string(),
                    });
                }
                validate_url("classifier.endpoint", endpoint)?;
            }
            ClassifierKind::Chat => {
                validate_url("classifier.base_url", &self.base_url)?;
                if self.model.trim().is_empty() {
                    return Err(TriageError::MissingConfigError {
                        field: "classifier.model".to_string(),
                    });
                }
            }
        }

        validate_range("classifier.temperature", self.temperature, 0.0, 2.0)?;
        validate_positive_number("classifier.max_tokens", self.max_tokens as usize, 1)?;
        validate_range(
            "classifier.max_records_per_request",
            self.max_records_per_request,
            1,
            DEFAULT_REQUEST_RECORD_LIMIT,
        )?;
        validate_range(
            "classifier.max_request_bytes",
            self.max_request_bytes,
            1,
            DEFAULT_MAX_REQUEST_BYTES,
        )?;
        Ok(())
    }
}

impl Validate for OutputSettings {
    fn validate(&self) -> Result<()> {
        validate_path("load.output_path", &self.output_path)?;
        if self.formats.is_empty() {
            return Err(TriageError::ConfigValidationError {
                field: "load.output_formats".to_string(),
                message: "At least one output format is required".to_string(),
            });
        }
        if self.compress {
            validate_file_extension("load.compression.filename", &self.archive_name, &["zip"])?;
        }
        Ok(())
    }
}
