#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Request/response shapes for the local generation endpoint stet talks to.
//!
//! The endpoint accepts a prompt and returns either a single JSON document
//! or a stream of JSON-per-line deltas; these types model both.

use serde::{Deserialize, Serialize};

/// Sampling and context-window options passed through to the model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_ctx: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            num_ctx: 8192,
        }
    }
}

/// Body of a generation request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub system: String,
    pub options: GenerateOptions,
    pub stream: bool,
}

/// One line of a streamed response, or the sole document of a
/// non-streaming one. `done` distinguishes a content delta from the
/// terminal document carrying usage stats.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    pub eval_duration_ns: Option<u64>,
    pub prompt_eval_count: Option<u64>,
    pub eval_count: Option<u64>,
}

/// Usage and timing stats carried by the terminal document of a generation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GenerateStats {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub eval_duration_ns: u64,
}

/// The full text plus stats accumulated from a (possibly streamed) generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateResult {
    pub text: String,
    pub stats: GenerateStats,
}

/// One entry of the tags/list endpoint's model inventory.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

/// Body of the tags/list endpoint response.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

impl TagsResponse {
    /// Whether `model` (or a `model:tag` variant of it) is present.
    #[must_use]
    pub fn has_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| {
            m.name == model || m.name.split(':').next().is_some_and(|base| base == model)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_model_matches_exact_and_tagged_names() {
        let tags = TagsResponse {
            models: vec![ModelTag {
                name: "qwen2.5-coder:14b".to_string(),
            }],
        };
        assert!(tags.has_model("qwen2.5-coder"));
        assert!(tags.has_model("qwen2.5-coder:14b"));
        assert!(!tags.has_model("llama3"));
    }
}
