pub mod gemini;
pub mod ollama;
pub mod openai;

use pdfrag_core::config::{LlmConfig, LlmProviderKind};
use tracing::info;

use crate::provider::{LlmError, LlmProvider};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai";

/// Create the LLM provider selected by config.
///
/// Fails with [`LlmError::NotConfigured`] when no provider can be resolved or
/// the selected one lacks its API key.
pub fn create_provider(llm_config: &LlmConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    let kind = llm_config
        .resolve_provider()
        .map_err(|e| LlmError::NotConfigured(e.to_string()))?;

    let provider: Box<dyn LlmProvider> = match kind {
        LlmProviderKind::Groq => {
            let api_key = require(&llm_config.groq_api_key, "GROQ_API_KEY")?;
            info!(model = %llm_config.groq_model, "LLM provider: groq");
            Box::new(openai::OpenAiProvider::new(
                api_key,
                llm_config.groq_model.clone(),
                GROQ_BASE_URL.to_string(),
            ))
        }
        LlmProviderKind::Gemini => {
            let api_key = require(&llm_config.gemini_api_key, "GEMINI_API_KEY")?;
            info!(model = %llm_config.gemini_model, "LLM provider: gemini");
            Box::new(gemini::GeminiProvider::new(
                api_key,
                llm_config.gemini_model.clone(),
            ))
        }
        LlmProviderKind::OpenAi => {
            let api_key = require(&llm_config.openai_api_key, "OPENAI_API_KEY")?;
            info!(model = %llm_config.openai_model, "LLM provider: openai");
            Box::new(openai::OpenAiProvider::new(
                api_key,
                llm_config.openai_model.clone(),
                llm_config.openai_base_url.clone(),
            ))
        }
        LlmProviderKind::Ollama => {
            info!(model = %llm_config.ollama_model, url = %llm_config.ollama_url, "LLM provider: ollama");
            Box::new(ollama::OllamaProvider::new(
                llm_config.ollama_url.clone(),
                llm_config.ollama_model.clone(),
            ))
        }
    };
    Ok(provider)
}

fn require(key: &Option<String>, name: &str) -> Result<String, LlmError> {
    key.clone()
        .ok_or_else(|| LlmError::NotConfigured(format!("{name} not set")))
}
