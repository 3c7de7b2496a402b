use serde::{Deserialize, Serialize};

use crate::domain::model::CanonicalRecord;

pub const TAG_ANALYSIS_FAILED: &str = "ANALYSIS_FAILED";
pub const TAG_VERDICT_MISSING: &str = "VERDICT_MISSING";
pub const TAG_DEFAULT_ANALYSIS: &str = "DEFAULT_ANALYSIS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredNote {
    pub score: u8,
    pub analysis: String,
}

impl ScoredNote {
    pub fn new(score: u8, analysis: impl Into<String>) -> Self {
        Self {
            score: score.min(100),
            analysis: analysis.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceNotes {
    pub cost_efficiency: String,
    pub click_quality: String,
    #[serde(default)]
    pub conversion_potential: String,
}

impl PerformanceNotes {
    fn uniform(note: &str) -> Self {
        Self {
            cost_efficiency: note.to_string(),
            click_quality: note.to_string(),
            conversion_potential: note.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    #[default]
    Phrase,
    Broad,
}

impl MatchType {
    /// 模型輸出大小寫不一，無法辨識時視為詞組匹配
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact" => MatchType::Exact,
            "broad" => MatchType::Broad,
            _ => MatchType::Phrase,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Phrase => "phrase",
            MatchType::Broad => "broad",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyLevel {
    #[default]
    Campaign,
    AdGroup,
    Account,
}

impl ApplyLevel {
    pub fn parse_lenient(value: &str) -> Self {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match normalized.as_str() {
            "account" => ApplyLevel::Account,
            "adgroup" => ApplyLevel::AdGroup,
            _ => ApplyLevel::Campaign,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyLevel::Campaign => "campaign",
            ApplyLevel::AdGroup => "adgroup",
            ApplyLevel::Account => "account",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub is_negative: bool,
    pub confidence: u8,
    pub negative_keyword: String,
    pub match_type: MatchType,
    pub level: ApplyLevel,
    #[serde(default)]
    pub reason_tags: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub semantic_relevance: ScoredNote,
    pub commercial_value: ScoredNote,
    pub performance_analysis: PerformanceNotes,
    pub recommendation: Recommendation,
}

impl Verdict {
    /// 批次失敗時的佔位判定：零分、零信心，並帶上失敗原因
    pub fn placeholder(record: &CanonicalRecord, tag: &str, message: &str) -> Self {
        Self {
            semantic_relevance: ScoredNote::new(0, message),
            commercial_value: ScoredNote::new(0, message),
            performance_analysis: PerformanceNotes::uniform(message),
            recommendation: Recommendation {
                is_negative: false,
                confidence: 0,
                negative_keyword: record.search_term.clone(),
                match_type: MatchType::Phrase,
                level: ApplyLevel::Campaign,
                reason_tags: vec![tag.to_string()],
                reasoning: message.to_string(),
            },
        }
    }

    /// 缺少 API 金鑰且設定為使用預設分析時回傳的判定
    pub fn default_analysis(record: &CanonicalRecord) -> Self {
        Self {
            semantic_relevance: ScoredNote::new(70, "默认分析：相关性中等"),
            commercial_value: ScoredNote::new(60, "默认分析：商业价值中等"),
            performance_analysis: PerformanceNotes {
                cost_efficiency: "需要进一步分析".to_string(),
                click_quality: "质量评估中".to_string(),
                conversion_potential: "潜力评估中".to_string(),
            },
            recommendation: Recommendation {
                is_negative: false,
                confidence: 50,
                negative_keyword: record.search_term.clone(),
                match_type: MatchType::Phrase,
                level: ApplyLevel::Campaign,
                reason_tags: vec![TAG_DEFAULT_ANALYSIS.to_string()],
                reasoning: "使用默认分析，API配置不完整".to_string(),
            },
        }
    }
}

/// One classifier verdict plus the optional translation the model supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub translation: Option<String>,
    pub verdict: Verdict,
}
