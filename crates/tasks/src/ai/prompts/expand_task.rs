//! Expand task prompt template.
//!
//! Breaks down a task into detailed subtasks.

use serde::Serialize;

use crate::domain::SubtaskRequest;
use crate::entities::Task;

use super::PromptTemplate;

/// Context for expand-task prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ExpandTaskContext {
    /// Number of subtasks to generate
    pub subtask_count: u32,
    /// The task to expand
    pub task: TaskSummary,
    /// Starting ID for new subtasks
    pub next_subtask_id: u32,
    /// Use research mode
    pub use_research: bool,
    /// Expansion prompt from complexity analysis
    pub expansion_prompt: Option<String>,
    /// Caller guidance
    pub additional_context: String,
    /// Complexity analysis reasoning
    pub complexity_reasoning_context: String,
}

/// Simplified task representation for prompts.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub details: String,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            details: task.details.clone(),
        }
    }
}

impl ExpandTaskContext {
    pub fn from_request(request: &SubtaskRequest, use_research: bool) -> Self {
        Self {
            subtask_count: request.count,
            task: TaskSummary::from(&request.task),
            next_subtask_id: 1,
            use_research,
            expansion_prompt: request.complexity.expansion_prompt.clone(),
            additional_context: request.hint.clone().unwrap_or_default(),
            complexity_reasoning_context: request.complexity.reasoning.clone().unwrap_or_default(),
        }
    }
}

/// Get the expand-task template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new("expand-task", SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Break down a task into detailed subtasks")
}

const SYSTEM_PROMPT: &str = r#"You are an AI assistant helping with task breakdown for software development. Break down high-level tasks into specific, actionable subtasks that can be implemented sequentially.{{#if use_research}}

Draw on current best practices and up-to-date technical information when choosing subtasks.{{/if}}

Your response MUST be a JSON object with a "subtasks" property containing an array of subtask objects. Each subtask must include:
- id: sequential integers starting EXACTLY from {{next_subtask_id}}
- title: a clear, actionable title
- description: what the subtask involves
- dependencies: an array of sibling subtask IDs this subtask depends on (can be empty [])
- details: implementation details
- status: "pending"
- testStrategy: testing approach (can be null)

Do not include any other top-level properties."#;

const USER_PROMPT: &str = r"Break down this task into {{#if (gt subtask_count 0)}}exactly {{subtask_count}}{{else}}an appropriate number of{{/if}} specific subtasks:

Task ID: {{task.id}}
Title: {{task.title}}
Description: {{task.description}}
Current details: {{#if task.details}}{{task.details}}{{else}}None{{/if}}{{#if expansion_prompt}}

Expansion guidance: {{expansion_prompt}}{{/if}}{{#if additional_context}}

Additional context: {{additional_context}}{{/if}}{{#if complexity_reasoning_context}}

Complexity analysis reasoning: {{complexity_reasoning_context}}{{/if}}

Use sequential IDs starting from {{next_subtask_id}}. Do NOT prefix subtask IDs with the parent task ID.";
