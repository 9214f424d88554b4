//! Drop findings missing a required field; normalize what remains into
//! [`Finding`] values with their content-addressed id computed.

use stet_findings_models::{Category, Finding, Range, Severity};

use crate::parser::RawFinding;

/// Validate every candidate, returning the findings that survived and a
/// human-readable reason for each one that was dropped.
#[must_use]
pub fn validate(raw: Vec<RawFinding>) -> (Vec<Finding>, Vec<String>) {
    let mut findings = Vec::with_capacity(raw.len());
    let mut warnings = Vec::new();
    for candidate in raw {
        match to_finding(candidate) {
            Ok(finding) => findings.push(finding),
            Err(reason) => warnings.push(reason),
        }
    }
    (findings, warnings)
}

fn to_finding(raw: RawFinding) -> Result<Finding, String> {
    let file = raw.file.ok_or("finding missing required field: file")?;
    let line = raw.line.ok_or("finding missing required field: line")?;
    let severity = raw
        .severity
        .as_deref()
        .ok_or("finding missing required field: severity")
        .and_then(parse_severity)?;
    let category = raw
        .category
        .as_deref()
        .ok_or("finding missing required field: category")
        .and_then(parse_category)?;
    let message = raw.message.ok_or("finding missing required field: message")?;
    if message.trim().is_empty() {
        return Err("finding has an empty message".to_string());
    }

    let range = raw.range.map(|r| Range {
        start: r.start,
        end: r.end,
    });
    let confidence = raw.confidence.unwrap_or(0.5).clamp(0.0, 1.0);

    Ok(Finding::new(
        file,
        line,
        range,
        severity,
        category,
        confidence,
        message,
        raw.suggested_replacement,
    ))
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    match s.to_lowercase().as_str() {
        "info" => Ok(Severity::Info),
        "warning" => Ok(Severity::Warning),
        "error" => Ok(Severity::Error),
        other => Err(format!("unknown severity: {other}")),
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    match s.to_lowercase().as_str() {
        "bug" => Ok(Category::Bug),
        "style" => Ok(Category::Style),
        "maintainability" => Ok(Category::Maintainability),
        "security" => Ok(Category::Security),
        "performance" => Ok(Category::Performance),
        "correctness" => Ok(Category::Correctness),
        "other" => Ok(Category::Other),
        other => Err(format!("unknown category: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> RawFinding {
        RawFinding {
            file: Some("./src/lib.rs".to_string()),
            line: Some(10),
            range: None,
            severity: Some("Warning".to_string()),
            category: Some("Bug".to_string()),
            confidence: Some(0.9),
            message: Some("looks wrong".to_string()),
            suggested_replacement: None,
        }
    }

    #[test]
    fn accepts_a_complete_finding_and_normalizes_the_path() {
        let (findings, warnings) = validate(vec![complete()]);
        assert!(warnings.is_empty());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file, "src/lib.rs");
    }

    #[test]
    fn drops_a_finding_missing_message() {
        let mut raw = complete();
        raw.message = None;
        let (findings, warnings) = validate(vec![raw]);
        assert!(findings.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn drops_a_finding_with_unknown_severity() {
        let mut raw = complete();
        raw.severity = Some("critical".to_string());
        let (findings, warnings) = validate(vec![raw]);
        assert!(findings.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn clamps_confidence_to_unit_interval() {
        let mut raw = complete();
        raw.confidence = Some(1.5);
        let (findings, _) = validate(vec![raw]);
        assert_eq!(findings[0].confidence, 1.0);
    }
}
