//! Lenient JSON extraction from a model response.
//!
//! The expected payload is `{"findings": [...]}`, but models routinely
//! emit a bare array, a single finding object, or the whole thing wrapped
//! in a fenced code block. All four are accepted.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    Malformed(String),
    #[error("response JSON has an unexpected shape (expected an object, array, or {{\"findings\": [...]}})")]
    UnexpectedShape,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRange {
    pub start: u64,
    pub end: u64,
}

/// A finding as deserialized straight from the model, before validation.
/// Every field is optional so malformed entries can be dropped individually
/// instead of failing the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFinding {
    pub file: Option<String>,
    pub line: Option<u64>,
    pub range: Option<RawRange>,
    pub severity: Option<String>,
    pub category: Option<String>,
    pub confidence: Option<f32>,
    pub message: Option<String>,
    pub suggested_replacement: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindingsEnvelope {
    findings: Vec<RawFinding>,
}

/// Parse a model response into its candidate findings.
///
/// # Errors
///
/// Returns [`ParseError`] if the response (after stripping any fenced code
/// block) is not valid JSON, or its top-level shape is none of the
/// accepted variants.
pub fn parse_findings(raw: &str) -> Result<Vec<RawFinding>, ParseError> {
    let text = strip_fence(raw);
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| ParseError::Malformed(e.to_string()))?;
    extract(value)
}

fn extract(value: Value) -> Result<Vec<RawFinding>, ParseError> {
    match value {
        Value::Object(ref map) if map.contains_key("findings") => {
            let envelope: FindingsEnvelope =
                serde_json::from_value(value.clone()).map_err(|e| ParseError::Malformed(e.to_string()))?;
            Ok(envelope.findings)
        }
        Value::Array(_) => {
            serde_json::from_value(value).map_err(|e| ParseError::Malformed(e.to_string()))
        }
        Value::Object(_) => {
            let finding: RawFinding =
                serde_json::from_value(value).map_err(|e| ParseError::Malformed(e.to_string()))?;
            Ok(vec![finding])
        }
        _ => Err(ParseError::UnexpectedShape),
    }
}

/// Strip a surrounding ` ```[lang]\n ... \n``` ` fence, if present.
fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return raw;
    };
    let Some(end) = body.rfind("```") else {
        return raw;
    };
    let body = &body[..end];
    // Drop an optional language tag on the fence's own line.
    body.split_once('\n').map_or(body, |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_envelope_shape() {
        let raw = r#"{"findings":[{"file":"a.rs","line":1,"severity":"warning","category":"bug","message":"x"}]}"#;
        let findings = parse_findings(raw).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file.as_deref(), Some("a.rs"));
    }

    #[test]
    fn parses_bare_array_shape() {
        let raw = r#"[{"file":"a.rs","line":1,"severity":"warning","category":"bug","message":"x"}]"#;
        let findings = parse_findings(raw).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn parses_single_object_shape() {
        let raw = r#"{"file":"a.rs","line":1,"severity":"warning","category":"bug","message":"x"}"#;
        let findings = parse_findings(raw).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn strips_fenced_code_block_with_language_tag() {
        let raw = "```json\n{\"findings\":[{\"file\":\"a.rs\",\"line\":1,\"severity\":\"warning\",\"category\":\"bug\",\"message\":\"x\"}]}\n```";
        let findings = parse_findings(raw).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_findings("not json at all").is_err());
    }
}
