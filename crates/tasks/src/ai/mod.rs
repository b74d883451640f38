//! Model-backed generation.
//!
//! This module provides:
//! - AI provider abstraction (Anthropic, OpenAI-compatible endpoints)
//! - Prompt template system with Handlebars
//! - Structured response schemas
//! - [`AiGenerator`], which implements the generation collaborators

pub mod prompts;
pub mod provider;
pub mod schemas;

// Provider implementations
pub mod anthropic;
pub mod openai;

mod generator;

use std::sync::Arc;

use crate::entities::ModelSettings;
use crate::errors::{TasksError, TasksResult};

use anthropic::AnthropicProvider;
use openai::OpenAIProvider;

// Re-exports
pub use generator::AiGenerator;
pub use prompts::{PromptManager, PromptTemplate};
pub use provider::{
    parse_ai_response, AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, TokenUsage,
};

/// Build the provider named in model settings, with its API key from the
/// environment.
pub fn provider_for(settings: &ModelSettings) -> TasksResult<Arc<dyn AIProvider>> {
    let provider: Arc<dyn AIProvider> = match settings.provider.as_str() {
        "anthropic" => {
            let mut provider = AnthropicProvider::from_env();
            if let Some(url) = &settings.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        name @ ("openai" | "openrouter" | "perplexity") => {
            let mut provider = match name {
                "openrouter" => OpenAIProvider::openrouter(),
                "perplexity" => OpenAIProvider::perplexity(),
                _ => OpenAIProvider::openai(),
            };
            if let Some(url) = &settings.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        other => {
            return Err(TasksError::ProviderNotConfigured {
                provider: format!("{other} (unsupported provider)"),
            })
        }
    };

    if !provider.is_configured() {
        return Err(TasksError::ProviderNotConfigured {
            provider: format!("{} (set {})", provider.name(), provider.api_key_env_var()),
        });
    }
    Ok(provider)
}
