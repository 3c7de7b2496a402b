//! Recovers a JSON array of verdicts from model output that is not clean JSON.
//!
//! Attempts, in order: the text as-is, a fenced code block, the last bare
//! `[{ ... }]` span, and finally the chosen candidate with trailing commas removed.

use regex::Regex;
use serde_json::Value;

use crate::utils::error::{Result, TriageError};

const FENCED_BLOCK: &str = r"```(?:json|JSON)?\s*([\s\S]*?)\s*```";
const BARE_ARRAY: &str = r"\[\s*\{[\s\S]*\}\s*\]";
const TRAILING_COMMA: &str = r",(\s*[}\]])";

fn pattern(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| TriageError::DecodeError {
        message: format!("invalid recovery pattern: {}", e),
    })
}

pub fn extract_json_array(text: &str) -> Result<Vec<Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TriageError::DecodeError {
            message: "classifier returned an empty payload".to_string(),
        });
    }

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(items);
    }

    let fenced = pattern(FENCED_BLOCK)?
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());

    let candidate = match fenced {
        Some(block) => {
            tracing::debug!("Recovered JSON from fenced code block");
            block
        }
        None => match pattern(BARE_ARRAY)?.find_iter(trimmed).last() {
            Some(m) => {
                tracing::debug!("Recovered JSON from bare array span");
                m.as_str().to_string()
            }
            None => trimmed.to_string(),
        },
    };

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&candidate) {
        return Ok(items);
    }

    let cleaned = pattern(TRAILING_COMMA)?
        .replace_all(&candidate, "$1")
        .replace("```json", "")
        .replace("```", "");

    match serde_json::from_str::<Value>(cleaned.trim()) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(TriageError::DecodeError {
            message: format!("expected a JSON array, got {}", json_kind(&other)),
        }),
        Err(e) => Err(TriageError::DecodeError {
            message: format!("{} (payload starts with: {})", e, preview(trimmed)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn preview(text: &str) -> String {
    let mut shown: String = text.chars().take(120).collect();
    if text.chars().count() > 120 {
        shown.push_str("...");
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_array() {
        let items = extract_json_array(r#"[{"searchTerm": "pcb"}]"#).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["searchTerm"], "pcb");
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here is the analysis:\n```json\n[{\"searchTerm\": \"pcb\"}, {\"searchTerm\": \"pcba\"}]\n```\nDone.";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["searchTerm"], "pcba");
    }

    #[test]
    fn test_bare_array_after_prose() {
        let text = "分析结果如下：[{\"searchTerm\": \"电路板\"}] 以上";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items[0]["searchTerm"], "电路板");
    }

    #[test]
    fn test_trailing_commas_are_removed() {
        let text = "```json\n[{\"searchTerm\": \"pcb\", \"score\": 3,},]\n```";
        let items = extract_json_array(text).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["score"], 3);
    }

    #[test]
    fn test_unrecoverable_text_is_decode_error() {
        assert!(matches!(
            extract_json_array("I cannot help with that."),
            Err(TriageError::DecodeError { .. })
        ));
        assert!(matches!(
            extract_json_array("   "),
            Err(TriageError::DecodeError { .. })
        ));
        assert!(matches!(
            extract_json_array(r#"{"searchTerm": "pcb"}"#),
            Err(TriageError::DecodeError { .. })
        ));
    }
}
