//! Analyze complexity prompt template.

use serde::Serialize;

use crate::entities::Task;

use super::PromptTemplate;

/// Context for analyze-complexity prompt.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeComplexityContext {
    /// Tasks to analyze
    pub tasks: serde_json::Value,
    /// Use research mode
    pub use_research: bool,
}

impl AnalyzeComplexityContext {
    /// Context for a single task, without its subtasks.
    pub fn for_task(task: &Task, use_research: bool) -> Self {
        Self {
            tasks: serde_json::json!([{
                "id": task.id,
                "title": task.title,
                "description": task.description,
                "details": task.details,
                "dependencies": task.dependencies,
                "priority": task.priority,
            }]),
            use_research,
        }
    }
}

/// Get the analyze-complexity template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new("analyze-complexity", SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Score task complexity and recommend a subtask count")
}

const SYSTEM_PROMPT: &str = r#"You are an expert software architect analyzing task complexity. Consider implementation effort, technical challenges, dependencies and testing requirements.

For each task, provide an analysis object with:
- taskId: the ID of the task being analyzed (positive integer)
- taskTitle: the title of the task
- complexityScore: a score from 1 to 10
- recommendedSubtasks: number of subtasks recommended (0 if no expansion is needed)
- expansionPrompt: a prompt to guide subtask generation
- reasoning: your reasoning for the score

Your response MUST be a JSON object with a single "complexityAnalysis" property containing an array of these objects."#;

const USER_PROMPT: &str = r"Analyze the following tasks to determine their complexity (1-10 scale) and recommend the number of subtasks for expansion.{{#if use_research}} Consider current best practices and common implementation patterns.{{/if}}

Tasks:
{{{json tasks}}}";
