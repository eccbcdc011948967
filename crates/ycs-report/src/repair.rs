//! Recovering a JSON object from model output that is not guaranteed to be valid JSON.
//!
//! Repairs run in a fixed order and stop at the first text that parses to an object:
//! code fences, then control characters, then surrounding prose, then literal `\n`/`\t`
//! escapes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::ReportError;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?[ \t]*\n?").expect("static fence pattern"));

/// Control characters other than tab, line feed and carriage return.
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f]").expect("static control pattern"));

fn parse_object(text: &str) -> Result<Map<String, JsonValue>, String> {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(format!("top-level value is {}, not an object", kind_of(&other))),
        Err(err) => Err(err.to_string()),
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

pub fn strip_control_chars(text: &str) -> String {
    CONTROL_CHARS.replace_all(text, "").into_owned()
}

/// Greedy span from the first `{` to the last `}`.
pub fn outermost_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn unescape_whitespace(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

/// Parse model output into a JSON object, applying repairs only as needed.
pub fn parse_model_output(content: &str) -> Result<Map<String, JsonValue>, ReportError> {
    if let Ok(map) = parse_object(content.trim()) {
        return Ok(map);
    }

    let unfenced = strip_code_fences(content);
    if let Ok(map) = parse_object(&unfenced) {
        debug!("model output parsed after stripping code fences");
        return Ok(map);
    }

    let cleaned = strip_control_chars(&unfenced);
    if let Ok(map) = parse_object(&cleaned) {
        debug!("model output parsed after stripping control characters");
        return Ok(map);
    }

    let candidate = outermost_object_span(&cleaned).unwrap_or(&cleaned);
    let first_error = match parse_object(candidate) {
        Ok(map) => {
            debug!("model output parsed after extracting the outermost object");
            return Ok(map);
        }
        Err(err) => err,
    };

    match parse_object(&unescape_whitespace(candidate)) {
        Ok(map) => {
            debug!("model output parsed after unescaping whitespace");
            Ok(map)
        }
        Err(_) => Err(ReportError::Unparseable {
            reason: first_error,
            content_len: candidate.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_is_parsed_directly() {
        let map = parse_model_output(r#"{"vision": {"problem": "p"}}"#).unwrap();
        assert_eq!(map["vision"]["problem"], "p");
    }

    #[test]
    fn fenced_json_with_trailing_prose_is_recovered() {
        let content = "```json\n{\"vision\": {\"problem\": \"Slow books\"}}\n```\nLet me know if you want more detail.";
        let map = parse_model_output(content).unwrap();
        assert_eq!(map["vision"]["problem"], "Slow books");
    }

    #[test]
    fn leading_prose_and_control_characters_are_removed() {
        let content = "Here is the strategy:\u{0007} {\"market\": {\"trends\": \"AI\u{0001} adoption\"}} Thanks!";
        let map = parse_model_output(content).unwrap();
        assert_eq!(map["market"]["trends"], "AI adoption");
    }

    #[test]
    fn literal_escapes_outside_strings_are_unescaped() {
        let content = r#"{\n\t"planning": {"step1": "Interview users"}\n}"#;
        let map = parse_model_output(content).unwrap();
        assert_eq!(map["planning"]["step1"], "Interview users");
    }

    #[test]
    fn unparseable_output_reports_reason_and_length() {
        let err = parse_model_output("I cannot produce a report {broken").unwrap_err();
        match err {
            ReportError::Unparseable { reason, content_len } => {
                assert!(!reason.is_empty());
                assert_eq!(content_len, "I cannot produce a report {broken".len());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn top_level_array_is_not_a_report() {
        let err = parse_model_output("[1, 2, 3]").unwrap_err();
        assert!(err.to_string().contains("not an object"));
    }

    #[test]
    fn span_extraction_is_greedy() {
        assert_eq!(outermost_object_span("a {x} b {y} c"), Some("{x} b {y}"));
        assert_eq!(outermost_object_span("} no {"), None);
    }
}
