use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Column mapping incomplete, missing: {}", missing.join(", "))]
    MappingIncomplete { missing: Vec<String> },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Classifier returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Classifier call timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Request payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Too many records in one request: {count} (limit {limit})")]
    TooManyRecords { count: usize, limit: usize },

    #[error("Classifier payload could not be decoded: {message}")]
    DecodeError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Mapping,
    Validation,
    Network,
    Decode,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TriageError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TriageError::ParseError { .. } => ErrorCategory::Input,
            TriageError::MappingIncomplete { .. } => ErrorCategory::Mapping,
            TriageError::ValidationError { .. } => ErrorCategory::Validation,
            TriageError::HttpStatus { .. }
            | TriageError::Timeout { .. }
            | TriageError::ApiError(_)
            | TriageError::PayloadTooLarge { .. }
            | TriageError::TooManyRecords { .. } => ErrorCategory::Network,
            TriageError::DecodeError { .. } | TriageError::SerializationError(_) => {
                ErrorCategory::Decode
            }
            TriageError::ConfigError { .. }
            | TriageError::MissingConfigError { .. }
            | TriageError::InvalidConfigValueError { .. }
            | TriageError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            TriageError::ZipError(_) | TriageError::CsvError(_) | TriageError::IoError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Decode => ErrorSeverity::Medium,
            ErrorCategory::Input
            | ErrorCategory::Mapping
            | ErrorCategory::Validation
            | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 依嚴重程度決定程序退出碼；中止執行的錯誤一律非零
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 重試錯誤
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }

    /// 單一批次失敗時可轉成佔位結果，不中斷整個分析流程
    pub fn is_batch_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Decode
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TriageError::ParseError { message } => format!("無法解析檔案內容: {}", message),
            TriageError::MappingIncomplete { missing } => {
                format!("請完成字段映射: {}", missing.join(", "))
            }
            TriageError::ValidationError { message } => format!("資料驗證失敗: {}", message),
            TriageError::HttpStatus { status: 413, .. } | TriageError::PayloadTooLarge { .. } => {
                "請求數據過大，請分批上傳".to_string()
            }
            TriageError::TooManyRecords { limit, .. } => {
                format!("單次分析超過{}條限制，請分批處理", limit)
            }
            TriageError::HttpStatus { status, message } => {
                format!("分析服務回應錯誤 ({}): {}", status, message)
            }
            TriageError::Timeout { millis } => format!("分析服務在 {} 毫秒內沒有回應", millis),
            TriageError::ApiError(_) => "無法連線到分析服務".to_string(),
            TriageError::DecodeError { .. } | TriageError::SerializationError(_) => {
                "分析服務回傳的格式無法解析".to_string()
            }
            TriageError::ConfigError { message } => format!("配置錯誤: {}", message),
            TriageError::MissingConfigError { field } => format!("缺少必要配置: {}", field),
            TriageError::InvalidConfigValueError { field, reason, .. } => {
                format!("配置 {} 無效: {}", field, reason)
            }
            TriageError::ConfigValidationError { field, message } => {
                format!("配置 {} 驗證失敗: {}", field, message)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the file encoding (UTF-8) and the header row number",
            ErrorCategory::Mapping => "Map the missing fields manually with --map field=column",
            ErrorCategory::Validation => {
                "Make sure the search term column is mapped and contains values"
            }
            ErrorCategory::Network => "Retry the affected search terms later or raise the timeout",
            ErrorCategory::Decode => "Retry the affected search terms; the model output was malformed",
            ErrorCategory::Configuration => "Review the configuration file and environment variables",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
