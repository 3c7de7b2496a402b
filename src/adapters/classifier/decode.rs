use serde_json::{Map, Value};

use crate::domain::model::CanonicalRecord;
use crate::domain::verdict::{
    ApplyLevel, Classification, MatchType, PerformanceNotes, Recommendation, ScoredNote, Verdict,
};
use crate::utils::error::{Result, TriageError};

const NEUTRAL_SCORE: u8 = 50;
const PENDING_NOTE: &str = "分析中...";

/// Turn loosely shaped verdict objects into classifications, aligned to `batch`
/// by position. Missing fields fall back to neutral values; a non-object item
/// fails the whole batch.
pub fn decode_classifications(
    items: &[Value],
    batch: &[CanonicalRecord],
) -> Result<Vec<Classification>> {
    let empty = CanonicalRecord::default();

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let record = batch.get(index).unwrap_or(&empty);
            let object = item.as_object().ok_or_else(|| TriageError::DecodeError {
                message: format!("verdict {} is not a JSON object", index + 1),
            })?;
            Ok(decode_one(object, record))
        })
        .collect()
}

fn decode_one(item: &Map<String, Value>, record: &CanonicalRecord) -> Classification {
    // 分析服務有時把判定包在 analysis 底下
    let source = item
        .get("analysis")
        .and_then(Value::as_object)
        .unwrap_or(item);

    let translation = text(item.get("translation")).filter(|t| !t.trim().is_empty());

    let verdict = Verdict {
        semantic_relevance: scored_note(source.get("semanticRelevance")),
        commercial_value: scored_note(source.get("commercialValue")),
        performance_analysis: performance_notes(source.get("performanceAnalysis")),
        recommendation: recommendation(
            source.get("recommendation").and_then(Value::as_object),
            record,
        ),
    };

    Classification {
        translation,
        verdict,
    }
}

fn scored_note(value: Option<&Value>) -> ScoredNote {
    match value {
        Some(Value::Object(note)) => ScoredNote::new(
            score(note.get("score")).unwrap_or(NEUTRAL_SCORE),
            text(note.get("analysis")).unwrap_or_else(|| PENDING_NOTE.to_string()),
        ),
        Some(other) => ScoredNote::new(
            score(Some(other)).unwrap_or(NEUTRAL_SCORE),
            PENDING_NOTE,
        ),
        None => ScoredNote::new(NEUTRAL_SCORE, PENDING_NOTE),
    }
}

fn performance_notes(value: Option<&Value>) -> PerformanceNotes {
    let notes = value.and_then(Value::as_object);
    let field = |name: &str| {
        notes
            .and_then(|n| text(n.get(name)))
            .unwrap_or_else(|| PENDING_NOTE.to_string())
    };

    PerformanceNotes {
        cost_efficiency: field("costEfficiency"),
        click_quality: field("clickQuality"),
        conversion_potential: field("conversionPotential"),
    }
}

fn recommendation(value: Option<&Map<String, Value>>, record: &CanonicalRecord) -> Recommendation {
    let get = |name: &str| value.and_then(|r| r.get(name));

    Recommendation {
        is_negative: flag(get("isNegative")),
        confidence: score(get("confidence")).unwrap_or(NEUTRAL_SCORE),
        negative_keyword: text(get("negativeKeyword"))
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| record.search_term.clone()),
        match_type: text(get("matchType"))
            .map(|m| MatchType::parse_lenient(&m))
            .unwrap_or_default(),
        level: text(get("level"))
            .map(|l| ApplyLevel::parse_lenient(&l))
            .unwrap_or_default(),
        reason_tags: tags(get("reasonTags")),
        reasoning: text(get("reasoning")).unwrap_or_else(|| PENDING_NOTE.to_string()),
    }
}

/// 分數接受數字或數字字串，限制在 0..=100
fn score(value: Option<&Value>) -> Option<u8> {
    let raw = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1" | "是"
        ),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| text(Some(item)))
            .filter(|tag| !tag.trim().is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split([',', '|'])
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
