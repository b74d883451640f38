//! Collaborator contracts for task generation, subtask generation and
//! complexity assessment.
//!
//! Generators return loosely-typed drafts; [`super::expand::validate_tasks`]
//! and [`super::expand::validate_subtasks`] turn them into graph entities or
//! fail as a whole.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::{ComplexityInfo, Task, TaskPriority};
use crate::errors::TasksResult;

/// Input for a task generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRequest {
    /// Requirements text to break down
    pub requirements: String,
    /// Desired number of tasks (0 lets the generator decide)
    pub num_tasks: u32,
    /// First id the generator should assign
    pub next_id: u32,
    /// Priority to suggest for tasks without an obvious one
    pub default_priority: TaskPriority,
}

/// Input for a subtask generator.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtaskRequest {
    /// The task being expanded
    pub task: Task,
    /// Assessment guiding the breakdown
    pub complexity: ComplexityInfo,
    /// Number of subtasks to produce
    pub count: u32,
    /// Free-form caller guidance
    pub hint: Option<String>,
}

/// Identifier or reference as a generator may emit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DraftId {
    Number(u64),
    Float(f64),
    Text(String),
}

impl DraftId {
    /// Textual form used for parsing and for dependency references.
    pub fn to_reference(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

/// Unvalidated subtask as produced by a generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskDraft {
    #[serde(default)]
    pub id: Option<DraftId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub dependencies: Option<Vec<DraftId>>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub test_strategy: Option<String>,
}

impl SubtaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            ..Self::default()
        }
    }
}

/// Unvalidated task as produced by a generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default)]
    pub id: Option<DraftId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub dependencies: Option<Vec<DraftId>>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub test_strategy: Option<String>,
    #[serde(default)]
    pub subtasks: Option<Vec<SubtaskDraft>>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            ..Self::default()
        }
    }
}

/// Turns requirements text into new tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskGenerator: Send + Sync {
    async fn generate_tasks(&self, request: &TaskRequest) -> TasksResult<Vec<TaskDraft>>;
}

/// Breaks one task down into subtasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtaskGenerator: Send + Sync {
    async fn generate_subtasks(&self, request: &SubtaskRequest) -> TasksResult<Vec<SubtaskDraft>>;
}

/// Scores how complex a task is and how many subtasks it warrants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComplexityAssessor: Send + Sync {
    async fn assess(&self, task: &Task) -> TasksResult<ComplexityInfo>;
}
