use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::verdict::Verdict;
use crate::utils::error::TriageError;

/// 報表常見的貨幣、千分位與百分比符號
const NUMERIC_DECORATIONS: [char; 3] = ['¥', ',', '%'];

/// 未映射推廣計劃時使用的預設值
pub const UNKNOWN_CAMPAIGN: &str = "未知推广计划";

/// A single cell: either a parsed number or the original trimmed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 去掉 ¥ , % 之後嘗試轉成數字，失敗就保留原字串
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        match parse_decorated_number(trimmed) {
            Some(number) => CellValue::Number(number),
            None => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(number) => number.to_string(),
            CellValue::Text(text) => text.clone(),
        }
    }

    /// Numeric view of the cell; anything unparsable is 0.
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Number(number) if number.is_finite() => *number,
            CellValue::Number(_) => 0.0,
            CellValue::Text(text) => parse_decorated_number(text.trim()).unwrap_or(0.0),
        }
    }
}

fn parse_decorated_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| !NUMERIC_DECORATIONS.contains(c))
        .collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// One parsed data line keyed by raw header name, in header order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 重複的欄位名稱保留第一次出現的位置，但值以後者覆蓋
    pub fn insert(&mut self, column: String, value: CellValue) {
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
}

/// The fixed semantic slots every record exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    SearchTerm,
    Keyword,
    Campaign,
    AdGroup,
    MatchType,
    Impressions,
    Clicks,
    Cost,
    Conversions,
    ConversionValue,
    Ctr,
    AvgCpc,
    ConversionRate,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 13] = [
        CanonicalField::SearchTerm,
        CanonicalField::Keyword,
        CanonicalField::Campaign,
        CanonicalField::AdGroup,
        CanonicalField::MatchType,
        CanonicalField::Impressions,
        CanonicalField::Clicks,
        CanonicalField::Cost,
        CanonicalField::Conversions,
        CanonicalField::ConversionValue,
        CanonicalField::Ctr,
        CanonicalField::AvgCpc,
        CanonicalField::ConversionRate,
    ];

    /// 開始分析前必須完成映射的欄位
    pub const REQUIRED: [CanonicalField; 4] = [
        CanonicalField::SearchTerm,
        CanonicalField::Keyword,
        CanonicalField::Clicks,
        CanonicalField::Cost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::SearchTerm => "searchTerm",
            CanonicalField::Keyword => "keyword",
            CanonicalField::Campaign => "campaign",
            CanonicalField::AdGroup => "adGroup",
            CanonicalField::MatchType => "matchType",
            CanonicalField::Impressions => "impressions",
            CanonicalField::Clicks => "clicks",
            CanonicalField::Cost => "cost",
            CanonicalField::Conversions => "conversions",
            CanonicalField::ConversionValue => "conversionValue",
            CanonicalField::Ctr => "ctr",
            CanonicalField::AvgCpc => "avgCpc",
            CanonicalField::ConversionRate => "conversionRate",
        }
    }

    /// 報表中的中文欄位說明
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalField::SearchTerm => "搜索词",
            CanonicalField::Keyword => "关键词",
            CanonicalField::Campaign => "推广计划",
            CanonicalField::AdGroup => "广告组",
            CanonicalField::MatchType => "匹配类型",
            CanonicalField::Impressions => "展现量",
            CanonicalField::Clicks => "点击次数",
            CanonicalField::Cost => "费用",
            CanonicalField::Conversions => "转化次数",
            CanonicalField::ConversionValue => "转化价值",
            CanonicalField::Ctr => "点击率",
            CanonicalField::AvgCpc => "平均点击费用",
            CanonicalField::ConversionRate => "转化率",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            CanonicalField::SearchTerm
            | CanonicalField::Keyword
            | CanonicalField::Campaign
            | CanonicalField::AdGroup
            | CanonicalField::MatchType => FieldKind::Text,
            _ => FieldKind::Numeric,
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CanonicalField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TriageError::InvalidConfigValueError {
                field: "mapping".to_string(),
                value: s.to_string(),
                reason: "Unknown canonical field".to_string(),
            })
    }
}

/// Canonical field → raw column name. Partial by nature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    bindings: BTreeMap<CanonicalField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.bindings.get(&field).map(String::as_str)
    }

    pub fn set(&mut self, field: CanonicalField, column: impl Into<String>) {
        self.bindings.insert(field, column.into());
    }

    pub fn remove(&mut self, field: CanonicalField) -> Option<String> {
        self.bindings.remove(&field)
    }

    pub fn is_mapped(&self, field: CanonicalField) -> bool {
        self.get(field).is_some_and(|column| !column.trim().is_empty())
    }

    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .iter()
            .copied()
            .filter(|field| !self.is_mapped(*field))
            .collect()
    }

    /// 手動覆寫優先，自動映射只補上空缺
    pub fn merge_overrides(&mut self, overrides: &ColumnMapping) {
        for (field, column) in &overrides.bindings {
            self.bindings.insert(*field, column.clone());
        }
    }

    /// 重新解析後欄位集合可能改變，移除已不存在的欄位
    pub fn retain_columns(&mut self, columns: &[String]) {
        self.bindings
            .retain(|_, column| columns.iter().any(|available| available == column));
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.bindings
            .iter()
            .map(|(field, column)| (*field, column.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(CanonicalField, String)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (CanonicalField, String)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

/// A raw column that matched aliases of more than one canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingConflict {
    pub column: String,
    pub fields: Vec<CanonicalField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappingOutcome {
    pub mapping: ColumnMapping,
    pub conflicts: Vec<MappingConflict>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub search_term: String,
    pub keyword: String,
    pub campaign: String,
    pub ad_group: String,
    pub match_type: String,
    pub impressions: f64,
    pub clicks: f64,
    pub cost: f64,
    pub conversions: f64,
    pub conversion_value: f64,
    pub ctr: f64,
    pub avg_cpc: f64,
    pub conversion_rate: f64,
}

impl CanonicalRecord {
    pub fn set_text(&mut self, field: CanonicalField, value: String) {
        match field {
            CanonicalField::SearchTerm => self.search_term = value,
            CanonicalField::Keyword => self.keyword = value,
            CanonicalField::Campaign => self.campaign = value,
            CanonicalField::AdGroup => self.ad_group = value,
            CanonicalField::MatchType => self.match_type = value,
            _ => {}
        }
    }

    pub fn set_number(&mut self, field: CanonicalField, value: f64) {
        match field {
            CanonicalField::Impressions => self.impressions = value,
            CanonicalField::Clicks => self.clicks = value,
            CanonicalField::Cost => self.cost = value,
            CanonicalField::Conversions => self.conversions = value,
            CanonicalField::ConversionValue => self.conversion_value = value,
            CanonicalField::Ctr => self.ctr = value,
            CanonicalField::AvgCpc => self.avg_cpc = value,
            CanonicalField::ConversionRate => self.conversion_rate = value,
            _ => {}
        }
    }

    /// 送出分類前的基本檢查：必須有搜尋字詞，花費與點擊必須是有效數字
    pub fn is_admissible(&self) -> bool {
        !self.search_term.trim().is_empty() && self.cost.is_finite() && self.clicks.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: usize,
    #[serde(flatten)]
    pub record: CanonicalRecord,
    #[serde(default)]
    pub translation: String,
    pub analysis: Verdict,
}

impl AnalysisResult {
    pub fn is_negative(&self) -> bool {
        self.analysis.recommendation.is_negative
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.analysis
            .recommendation
            .reason_tags
            .iter()
            .any(|t| t == tag)
    }
}

/// Read-only progress snapshot published after every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub current_batch: usize,
    pub total_batches: usize,
    pub is_analyzing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RunPhase {
    Idle,
    Validating,
    Running { batch: usize },
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub batch: usize,
    pub first_id: usize,
    pub last_id: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub results: Vec<AnalysisResult>,
    pub progress: BatchProgress,
    pub status: RunStatus,
    pub failures: Vec<BatchFailure>,
    pub rejected_records: usize,
}

/// 擷取階段的產出：欄位、最終映射與投影後的紀錄
#[derive(Debug, Clone)]
pub struct Extraction {
    pub columns: Vec<String>,
    pub mapping: ColumnMapping,
    pub conflicts: Vec<MappingConflict>,
    pub records: Vec<CanonicalRecord>,
}
