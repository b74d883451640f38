//! Error types for the taskmaster crate.

use thiserror::Error;

/// Error types for task graph operations
#[derive(Error, Debug, Clone)]
pub enum TasksError {
    // Graph errors
    #[error("Task graph is corrupt: {reason}")]
    CorruptGraph { reason: String },

    #[error("Task '{task_id}' not found")]
    TaskNotFound { task_id: String },

    #[error("Subtask '{subtask_id}' not found in task '{task_id}'")]
    SubtaskNotFound { task_id: String, subtask_id: String },

    #[error("Invalid task ID format: '{id}' (expected \"N\" or \"N.M\")")]
    InvalidId { id: String },

    #[error("Invalid status: '{status}' (expected pending, done or deferred)")]
    InvalidStatus { status: String },

    #[error("Invalid priority: '{priority}'")]
    InvalidPriority { priority: String },

    // Generator output errors
    #[error("Malformed subtask at position {position}: {reason}")]
    MalformedSubtask { position: usize, reason: String },

    #[error("Task generation failed: {reason}")]
    GenerationFailure { reason: String },

    // Storage errors
    #[error("Storage error: {reason}")]
    StorageError { reason: String },

    #[error("Failed to read file '{path}': {reason}")]
    FileReadError { path: String, reason: String },

    #[error("Failed to write file '{path}': {reason}")]
    FileWriteError { path: String, reason: String },

    #[error("Failed to parse JSON: {reason}")]
    JsonParseError { reason: String },

    #[error("Project not initialized. Run 'taskmaster init' first.")]
    NotInitialized,

    // Configuration errors
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    // AI errors
    #[error("AI error: {0}")]
    Ai(String),

    #[error("AI provider not configured: {provider}")]
    ProviderNotConfigured { provider: String },

    #[error("AI response parse error: {reason}")]
    AiResponseParseError { reason: String },

    // General errors
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },
}

impl From<std::io::Error> for TasksError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TasksError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParseError {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for task operations
pub type TasksResult<T> = Result<T, TasksError>;
