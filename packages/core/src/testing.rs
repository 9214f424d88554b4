//! An in-process stand-in for a real model server, used by `--dry-run`
//! and by tests that exercise the Orchestrator without a live LLM.

use async_trait::async_trait;
use stet_llm::{LlmClient, LlmError};
use stet_llm_models::{GenerateRequest, GenerateResult, GenerateStats};
use tokio_util::sync::CancellationToken;

/// Always reports the model present, and answers every generation with
/// one canned finding for the hunk named in the prompt's `File: ` line.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunLlmClient;

#[async_trait]
impl LlmClient for DryRunLlmClient {
    async fn ensure_model_present(&self, _model: &str, _ct: &CancellationToken) -> Result<(), LlmError> {
        Ok(())
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        _ct: &CancellationToken,
    ) -> Result<GenerateResult, LlmError> {
        let file = request
            .prompt
            .lines()
            .find_map(|line| line.strip_prefix("File: "))
            .unwrap_or("unknown");

        let text = format!(
            r#"{{"findings":[{{"file":{file:?},"line":1,"severity":"info","category":"style","confidence":0.99,"message":"dry run: reviewed this hunk"}}]}}"#,
        );

        Ok(GenerateResult {
            text,
            stats: GenerateStats {
                prompt_tokens: 0,
                completion_tokens: 0,
                eval_duration_ns: 0,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use stet_llm_models::GenerateOptions;

    use super::*;

    #[tokio::test]
    async fn generate_emits_one_finding_for_the_named_file() {
        let client = DryRunLlmClient;
        let request = GenerateRequest {
            model: "any".to_string(),
            prompt: "File: src/lib.rs\nHunk: @@ -1,1 +1,1 @@".to_string(),
            system: String::new(),
            options: GenerateOptions::default(),
            stream: false,
        };
        let result = client
            .generate(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.text.contains("src/lib.rs"));
    }

    #[tokio::test]
    async fn ensure_model_present_always_succeeds() {
        let client = DryRunLlmClient;
        assert!(client
            .ensure_model_present("whatever", &CancellationToken::new())
            .await
            .is_ok());
    }
}
