use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::config::settings::{
    BatchSettings, ClassifierKind, ClassifierSettings, CredentialPolicy, OutputFormat,
    OutputSettings, DEFAULT_CHAT_BASE_URL, DEFAULT_CHAT_MODEL, INPUT_EXTENSIONS,
};
use crate::domain::model::{CanonicalField, ColumnMapping};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, TriageError};
use crate::utils::validation::{validate_file_extension, validate_range, Validate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    /// 0 表示沒有表頭
    pub header_row: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default = "default_true")]
    pub auto: bool,
    /// canonical field name → column, e.g. `searchTerm = "搜索字词"`
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            auto: true,
            overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    pub endpoint: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub business_context: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub on_missing_credentials: Option<CredentialPolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    pub size: Option<usize>,
    pub delay_ms: Option<u64>,
    pub backoff_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub call_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    #[serde(default)]
    pub json_logs: bool,
}

fn default_true() -> bool {
    true
}

/// 未被替換的 `${VAR}` 或空字串視為未設定
fn resolved(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !(v.starts_with("${") && v.ends_with('}')))
        .map(str::to_string)
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TriageError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TriageError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${KIMI_API_KEY})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TriageError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.json_logs).unwrap_or(false)
    }

    fn output_formats(&self) -> Result<Vec<OutputFormat>> {
        self.load
            .output_formats
            .iter()
            .map(|format| {
                format
                    .parse::<OutputFormat>()
                    .map_err(|reason| TriageError::InvalidConfigValueError {
                        field: "load.output_formats".to_string(),
                        value: format.clone(),
                        reason: format!("{}. Valid formats: json, csv, tsv", reason),
                    })
            })
            .collect()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_file_extension("source.path", &self.source.path, &INPUT_EXTENSIONS)?;

        for field in self.mapping.overrides.keys() {
            field.parse::<CanonicalField>()?;
        }

        if let Some(size) = self.batch.size {
            validate_range("batch.size", size, 1, 100)?;
        }

        self.output_formats()?;
        self.batch_settings().validate()?;
        self.classifier_settings().validate()?;
        self.output_settings().validate()?;
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn header_row(&self) -> usize {
        self.source.header_row.unwrap_or(3)
    }

    fn auto_map(&self) -> bool {
        self.mapping.auto
    }

    fn mapping_overrides(&self) -> ColumnMapping {
        self.mapping
            .overrides
            .iter()
            .filter_map(|(field, column)| {
                let field = field.parse::<CanonicalField>().ok()?;
                Some((field, column.clone()))
            })
            .collect()
    }

    fn batch_settings(&self) -> BatchSettings {
        let defaults = BatchSettings::default();
        BatchSettings {
            max_batch_size: self.batch.size.unwrap_or(defaults.max_batch_size),
            call_timeout: self
                .batch
                .call_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.call_timeout),
            inter_batch_delay: self
                .batch
                .delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.inter_batch_delay),
            backoff_step: self
                .batch
                .backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff_step),
            max_delay: self
                .batch
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
            ..defaults
        }
    }

    fn classifier_settings(&self) -> ClassifierSettings {
        let config = &self.classifier;
        let defaults = ClassifierSettings::default();
        ClassifierSettings {
            kind: config.kind,
            endpoint: resolved(&config.endpoint),
            base_url: resolved(&config.base_url).unwrap_or_else(|| DEFAULT_CHAT_BASE_URL.to_string()),
            api_key: resolved(&config.api_key),
            model: resolved(&config.model).unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            business_context: resolved(&config.business_context)
                .unwrap_or(defaults.business_context.clone()),
            temperature: config.temperature.unwrap_or(defaults.temperature),
            max_tokens: config.max_tokens.unwrap_or(defaults.max_tokens),
            timeout: config
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            on_missing_credentials: config.on_missing_credentials.unwrap_or_default(),
            ..defaults
        }
        .with_env_defaults()
    }

    fn output_settings(&self) -> OutputSettings {
        let defaults = OutputSettings::default();
        let compression = self.load.compression.as_ref();
        OutputSettings {
            output_path: self.load.output_path.clone(),
            formats: self.output_formats().unwrap_or(defaults.formats),
            compress: compression.map(|c| c.enabled).unwrap_or(defaults.compress),
            archive_name: compression
                .and_then(|c| c.filename.clone())
                .unwrap_or(defaults.archive_name),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
