//! Configuration entities.

use serde::{Deserialize, Serialize};

use super::TaskPriority;
use crate::errors::{TasksError, TasksResult};

/// Main configuration structure (stored in `.tasks/config.json`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TasksConfig {
    /// AI model configurations
    #[serde(default)]
    pub models: ModelConfig,

    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,
}

/// Which configured model a generation call should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelRole {
    #[default]
    Main,
    Research,
}

/// Model configuration for AI providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Main model for generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<ModelSettings>,

    /// Research model (typically Perplexity via OpenRouter)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research: Option<ModelSettings>,
}

impl ModelConfig {
    /// Settings for a role, falling back to built-in defaults.
    pub fn settings_for(&self, role: ModelRole) -> ModelSettings {
        match role {
            ModelRole::Main => self.main.clone().unwrap_or_default(),
            ModelRole::Research => self
                .research
                .clone()
                .unwrap_or_else(ModelSettings::research_default),
        }
    }
}

/// Individual model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Provider name ("anthropic", "openai", "openrouter", "perplexity")
    pub provider: String,

    /// Model ID
    #[serde(rename = "modelId")]
    pub model_id: String,

    /// Maximum tokens
    #[serde(default = "default_max_tokens", rename = "maxTokens")]
    pub max_tokens: u32,

    /// Temperature (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional base URL override
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "baseURL")]
    pub base_url: Option<String>,
}

const fn default_max_tokens() -> u32 {
    8000
}

const fn default_temperature() -> f32 {
    0.2
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model_id: "claude-sonnet-4-20250514".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            base_url: None,
        }
    }
}

impl ModelSettings {
    /// Default research model: Perplexity through OpenRouter.
    pub fn research_default() -> Self {
        Self {
            provider: "openrouter".to_string(),
            model_id: "perplexity/sonar-pro".to_string(),
            max_tokens: 2000,
            temperature: 0.1,
            base_url: None,
        }
    }

    /// Parse a `provider:model_id` spec, keeping other settings at defaults.
    pub fn from_spec(spec: &str) -> TasksResult<Self> {
        let (provider, model_id) = spec
            .split_once(':')
            .filter(|(p, m)| !p.is_empty() && !m.is_empty())
            .ok_or_else(|| TasksError::ConfigError {
                reason: format!("expected 'provider:model_id', got '{spec}'"),
            })?;

        Ok(Self {
            provider: provider.to_lowercase(),
            model_id: model_id.to_string(),
            ..Self::default()
        })
    }
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default tracing directive when RUST_LOG is unset
    #[serde(default = "default_log_level", rename = "logLevel")]
    pub log_level: String,

    /// Default number of tasks when parsing requirements
    #[serde(default = "default_num_tasks", rename = "defaultNumTasks")]
    pub default_num_tasks: u32,

    /// Priority given to generated tasks that carry none
    #[serde(default = "default_priority", rename = "defaultPriority")]
    pub default_priority: TaskPriority,

    /// Project name
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "projectName"
    )]
    pub project_name: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

const fn default_num_tasks() -> u32 {
    10
}

const fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_num_tasks: default_num_tasks(),
            default_priority: default_priority(),
            project_name: None,
        }
    }
}
