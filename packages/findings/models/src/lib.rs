#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! The `Finding` model and its content-addressed identity.
//!
//! A finding's id depends only on its normalized fields, never on when or
//! how it was produced, so identical findings from distinct runs collide
//! by construction.

use sha2::{Digest, Sha256};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// What kind of observation a finding represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bug,
    Style,
    Maintainability,
    Security,
    Performance,
    Correctness,
    Other,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Style => "style",
            Self::Maintainability => "maintainability",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Correctness => "correctness",
            Self::Other => "other",
        }
    }
}

/// An inclusive line range, when a finding spans more than one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

/// A single reviewer observation produced by the model about a specific
/// location in the diff.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Finding {
    pub id: String,
    pub file: String,
    pub line: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub range: Option<Range>,
    pub severity: Severity,
    pub category: Category,
    pub confidence: f32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suggested_replacement: Option<String>,
}

/// Strip a leading `./` and normalize backslashes, matching the
/// convention the diff and git layers use for path comparison.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.strip_prefix("./").unwrap_or(path);
    path.replace('\\', "/")
}

/// Compute the content-addressed id of a finding from its normalized
/// fields: file path, line/range, severity, category, and message. Runtime
/// metadata (confidence, suggested replacement) is deliberately excluded.
#[must_use]
pub fn fingerprint(
    file: &str,
    line: u64,
    range: Option<Range>,
    severity: Severity,
    category: Category,
    message: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_path(file).as_bytes());
    hasher.update(b"\0");
    hasher.update(line.to_le_bytes());
    hasher.update(b"\0");
    if let Some(range) = range {
        hasher.update(range.start.to_le_bytes());
        hasher.update(range.end.to_le_bytes());
    }
    hasher.update(b"\0");
    hasher.update(severity.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(category.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(message.trim().as_bytes());
    hex::encode(hasher.finalize())
}

impl Finding {
    /// Build a finding, computing its id from the normalized fields.
    #[must_use]
    pub fn new(
        file: String,
        line: u64,
        range: Option<Range>,
        severity: Severity,
        category: Category,
        confidence: f32,
        message: String,
        suggested_replacement: Option<String>,
    ) -> Self {
        let file = normalize_path(&file);
        let id = fingerprint(&file, line, range, severity, category, &message);
        Self {
            id,
            file,
            line,
            range,
            severity,
            category,
            confidence,
            message,
            suggested_replacement,
        }
    }
}
