// Cover letter generation using OpenAI
//
// This is the infrastructure implementation of BaseCoverLetterService.
// Business logic (what to prompt for) lives in the domain activity.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::providers::openai;

use super::traits::BaseCoverLetterService;

const PREAMBLE: &str = "You are a professional career assistant. You write concise, specific \
cover letters grounded in the candidate's actual experience. Never invent qualifications.";

/// OpenAI-backed cover letter generation
#[derive(Clone)]
pub struct OpenAICoverLetterService {
    client: openai::Client,
}

impl OpenAICoverLetterService {
    pub fn new(api_key: &str) -> Self {
        let client = openai::Client::new(api_key);
        Self { client }
    }
}

#[async_trait]
impl BaseCoverLetterService for OpenAICoverLetterService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(prompt_length = prompt.len(), "Building OpenAI agent");

        let agent = self
            .client
            .agent(openai::GPT_4O)
            .preamble(PREAMBLE)
            .max_tokens(1024)
            .build();

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    prompt_preview = %&prompt[..prompt.len().min(200)],
                    "OpenAI API call failed"
                );
                e
            })
            .context("Failed to call OpenAI API")?;

        tracing::info!(response_length = response.len(), "OpenAI response received");
        Ok(response)
    }
}
