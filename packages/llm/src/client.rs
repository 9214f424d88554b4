//! `LlmClient` trait and its HTTP implementation against an Ollama-shaped
//! local generation endpoint.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use stet_llm_models::{GenerateChunk, GenerateRequest, GenerateResult, GenerateStats, TagsResponse};
use tokio_util::sync::CancellationToken;

/// Errors a generation or tags call can surface, classified for the exit
/// codes and hints the caller reports at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// TCP connect or DNS failure. The server is probably not running.
    #[error("could not reach the LLM server at {0}")]
    Unreachable(String),

    /// 4xx from the server: unknown model, malformed request.
    #[error("LLM server rejected the request: {0}")]
    BadRequest(String),

    /// The caller's cancellation token fired before the call completed.
    #[error("LLM call canceled")]
    Timeout,

    /// The tags response did not include the requested model.
    #[error("model {0:?} is not present on the LLM server; pull it first")]
    ModelAbsent(String),

    /// Anything else: malformed stream, 5xx, connection reset mid-response.
    #[error("LLM call failed: {0}")]
    Generic(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Unreachable(err.to_string())
        } else if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Generic(err.to_string())
        }
    }
}

/// A client capable of confirming model presence and running generations
/// against a locally-hosted model server.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Confirm `model` is present on the server's tags/list endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ModelAbsent`] if the model is not listed, or a
    /// transport error if the tags endpoint could not be reached.
    async fn ensure_model_present(
        &self,
        model: &str,
        ct: &CancellationToken,
    ) -> Result<(), LlmError>;

    /// Run a generation, accumulating the full response text and stats
    /// whether the transport streamed the response or returned it whole.
    ///
    /// # Errors
    ///
    /// Returns a classified [`LlmError`] on transport failure, a non-2xx
    /// response, or a malformed stream.
    async fn generate(
        &self,
        request: &GenerateRequest,
        ct: &CancellationToken,
    ) -> Result<GenerateResult, LlmError>;
}

/// HTTP client targeting an Ollama-compatible local generation endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// Build a client against `base_url`, applying `request_timeout` as the
    /// per-request wall-clock ceiling (the caller's `ct` is the
    /// cancellation path honored mid-stream).
    #[must_use]
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn fetch_tags(&self) -> Result<TagsResponse, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Generic(format!("tags endpoint returned {status}: {body}")));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn ensure_model_present(
        &self,
        model: &str,
        ct: &CancellationToken,
    ) -> Result<(), LlmError> {
        let tags = tokio::select! {
            biased;
            () = ct.cancelled() => return Err(LlmError::Timeout),
            res = self.fetch_tags() => res?,
        };
        if tags.has_model(model) {
            Ok(())
        } else {
            Err(LlmError::ModelAbsent(model.to_string()))
        }
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        ct: &CancellationToken,
    ) -> Result<GenerateResult, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = tokio::select! {
            biased;
            () = ct.cancelled() => return Err(LlmError::Timeout),
            res = self.http.post(&url).json(request).send() => res?,
        };

        let status = response.status();
        if status.as_u16() >= 400 && status.as_u16() < 500 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::BadRequest(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Generic(format!("server returned {status}: {body}")));
        }

        if request.stream {
            consume_stream(response, ct).await
        } else {
            let body = tokio::select! {
                biased;
                () = ct.cancelled() => return Err(LlmError::Timeout),
                res = response.bytes() => res?,
            };
            let chunk: GenerateChunk = serde_json::from_slice(&body)
                .map_err(|e| LlmError::Generic(format!("malformed response body: {e}")))?;
            Ok(GenerateResult {
                text: chunk.response,
                stats: stats_from_chunk(&chunk),
            })
        }
    }
}

async fn consume_stream(
    response: reqwest::Response,
    ct: &CancellationToken,
) -> Result<GenerateResult, LlmError> {
    let mut stream = response.bytes_stream();
    let mut buf = String::new();
    let mut result = GenerateResult::default();

    loop {
        let next = tokio::select! {
            biased;
            () = ct.cancelled() => return Err(LlmError::Timeout),
            next = stream.next() => next,
        };
        let Some(bytes) = next else { break };
        let bytes = bytes?;
        buf.push_str(&String::from_utf8_lossy(&bytes));

        while let Some(newline) = buf.find('\n') {
            let line = buf[..newline].trim().to_string();
            buf.drain(..=newline);
            if line.is_empty() {
                continue;
            }
            let chunk: GenerateChunk = serde_json::from_str(&line)
                .map_err(|e| LlmError::Generic(format!("malformed stream line: {e}")))?;
            apply_chunk(&mut result, &chunk);
        }
    }

    let tail = buf.trim();
    if !tail.is_empty() {
        let chunk: GenerateChunk = serde_json::from_str(tail)
            .map_err(|e| LlmError::Generic(format!("malformed trailing stream line: {e}")))?;
        apply_chunk(&mut result, &chunk);
    }

    Ok(result)
}

fn apply_chunk(result: &mut GenerateResult, chunk: &GenerateChunk) {
    result.text.push_str(&chunk.response);
    if chunk.done {
        result.stats = stats_from_chunk(chunk);
    }
}

fn stats_from_chunk(chunk: &GenerateChunk) -> GenerateStats {
    GenerateStats {
        prompt_tokens: chunk.prompt_eval_count.unwrap_or_default(),
        completion_tokens: chunk.eval_count.unwrap_or_default(),
        eval_duration_ns: chunk.eval_duration_ns.unwrap_or_default(),
    }
}
