//! Single-task pipeline: render the prompt, query the model, extract code.

use crate::config::Config;
use crate::error::{CodegenError, Result};
use crate::extract::CodeExtractor;
use crate::llm::{LlmClient, Message, RetryPolicy, TokenUsage};
use crate::template::PromptTemplate;

/// Generated solution for one problem.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Prompt sent to the model.
    pub prompt: String,
    /// Full text returned by the model.
    pub response: String,
    /// Extracted code block.
    pub code: String,
    /// Token usage reported by the gateway.
    pub usage: Option<TokenUsage>,
}

/// Generates code for problem statements with an LLM.
pub struct Solver {
    client: LlmClient,
    template: PromptTemplate,
    extractor: CodeExtractor,
}

impl Solver {
    /// Create a solver from its parts.
    pub fn new(client: LlmClient, template: PromptTemplate, extractor: CodeExtractor) -> Self {
        Self {
            client,
            template,
            extractor,
        }
    }

    /// Build the client, template, and extractor described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client =
            LlmClient::new(config.llm.clone())?.with_retry(RetryPolicy::from(&config.retry));
        let template = PromptTemplate::load(config.template.path.as_deref())?;
        let extractor = CodeExtractor::new(&config.template.language);
        Ok(Self::new(client, template, extractor))
    }

    /// The prompt template in use.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// The code extractor in use.
    pub fn extractor(&self) -> &CodeExtractor {
        &self.extractor
    }

    /// Generate code for `problem`.
    ///
    /// Network failures, malformed responses, and responses without a code
    /// block are returned as errors.
    pub async fn solve(&self, problem: &str) -> Result<Solution> {
        let prompt = self.template.render(problem)?;
        tracing::debug!("formatted prompt: {}", prompt);

        tracing::info!("Sending problem to model {}", self.client.model());
        let response = self.client.chat(vec![Message::user(&prompt)]).await?;

        if response.finish_reason.as_deref() == Some("length") {
            tracing::warn!("Model stopped at max_tokens, code block may be truncated");
        }

        let code = self
            .extractor
            .extract(&response.content)
            .ok_or_else(|| CodegenError::NoCodeBlock {
                language: self.extractor.language().to_string(),
            })?;

        tracing::debug!("extracted code:\n{}", code);

        Ok(Solution {
            prompt,
            response: response.content,
            code,
            usage: response.usage,
        })
    }
}
