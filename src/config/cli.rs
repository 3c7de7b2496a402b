use clap::Parser;
use std::time::Duration;

use crate::config::settings::{
    BatchSettings, ClassifierKind, ClassifierSettings, CredentialPolicy, OutputFormat,
    OutputSettings, DEFAULT_CHAT_BASE_URL, DEFAULT_CHAT_MODEL, INPUT_EXTENSIONS,
};
use crate::domain::model::{CanonicalField, ColumnMapping};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, Validate};

#[derive(Debug, Clone, Parser)]
#[command(name = "search-term-triage")]
#[command(about = "Triage Google Ads search term reports into negative keyword suggestions")]
pub struct CliConfig {
    /// Search term report to analyze (.csv, .tsv or .txt)
    #[arg(short, long)]
    pub input: String,

    /// 1-based header line, counted after comment lines are dropped; 0 = no header
    #[arg(long, default_value = "3")]
    pub header_row: usize,

    #[arg(long, default_value = "http")]
    pub classifier: ClassifierKind,

    /// Analysis service endpoint, required for the http classifier
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long, default_value = DEFAULT_CHAT_BASE_URL)]
    pub api_base: String,

    #[arg(long, default_value = DEFAULT_CHAT_MODEL)]
    pub model: String,

    #[arg(long, default_value = "PCBA")]
    pub business_context: String,

    #[arg(long, default_value = "2")]
    pub batch_size: usize,

    #[arg(long, default_value = "100")]
    pub delay_ms: u64,

    #[arg(long, default_value = "60")]
    pub timeout_seconds: u64,

    /// Manual column binding, e.g. --map searchTerm=搜索字词 (repeatable)
    #[arg(long = "map", value_parser = parse_mapping_override)]
    pub mappings: Vec<(CanonicalField, String)>,

    /// Skip heuristic column detection and use only --map bindings
    #[arg(long)]
    pub no_auto_map: bool,

    /// What to do when KIMI_API_KEY is missing: fail or default-verdicts
    #[arg(long, default_value = "fail")]
    pub on_missing_credentials: CredentialPolicy,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "json,csv,tsv")]
    pub formats: Vec<OutputFormat>,

    /// Write loose files instead of a ZIP archive
    #[arg(long)]
    pub no_compress: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log per-phase timing and memory usage")]
    pub monitor: bool,
}

/// 解析 `field=column`，欄位名稱不分大小寫
pub fn parse_mapping_override(raw: &str) -> std::result::Result<(CanonicalField, String), String> {
    let (field, column) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=column, got '{}'", raw))?;
    let field = field
        .trim()
        .parse::<CanonicalField>()
        .map_err(|e| e.to_string())?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("column name for {} cannot be empty", field));
    }
    Ok((field, column.to_string()))
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn header_row(&self) -> usize {
        self.header_row
    }

    fn auto_map(&self) -> bool {
        !self.no_auto_map
    }

    fn mapping_overrides(&self) -> ColumnMapping {
        self.mappings.iter().cloned().collect()
    }

    fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            max_batch_size: self.batch_size,
            call_timeout: Duration::from_secs(self.timeout_seconds),
            inter_batch_delay: Duration::from_millis(self.delay_ms),
            ..Default::default()
        }
    }

    fn classifier_settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            kind: self.classifier,
            endpoint: self.endpoint.clone(),
            base_url: self.api_base.clone(),
            model: self.model.clone(),
            business_context: self.business_context.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
            on_missing_credentials: self.on_missing_credentials,
            ..Default::default()
        }
        .with_env_defaults()
    }

    fn output_settings(&self) -> OutputSettings {
        OutputSettings {
            output_path: self.output_path.clone(),
            formats: self.formats.clone(),
            compress: !self.no_compress,
            ..Default::default()
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_file_extension("input", &self.input, &INPUT_EXTENSIONS)?;
        self.batch_settings().validate()?;
        self.classifier_settings().validate()?;
        self.output_settings().validate()?;
        Ok(())
    }
}
