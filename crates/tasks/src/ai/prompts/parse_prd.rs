//! Parse PRD prompt template.
//!
//! Generates tasks from a requirements document.

use serde::Serialize;

use crate::domain::TaskRequest;

use super::PromptTemplate;

/// Context for parse-prd prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ParsePrdContext {
    /// Target number of tasks to generate (0 = auto)
    pub num_tasks: u32,
    /// Starting ID for tasks
    pub next_id: u32,
    /// Enable research mode
    pub research: bool,
    /// Requirements text
    pub prd_content: String,
    /// Default priority for tasks
    pub default_task_priority: String,
}

impl ParsePrdContext {
    pub fn from_request(request: &TaskRequest, research: bool) -> Self {
        let default_task_priority = if request.default_priority.is_unknown() {
            "medium".to_string()
        } else {
            request.default_priority.to_string()
        };

        Self {
            num_tasks: request.num_tasks,
            next_id: request.next_id,
            research,
            prd_content: request.requirements.clone(),
            default_task_priority,
        }
    }
}

/// Get the parse-prd template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new("parse-prd", SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Parse a requirements document into structured tasks")
}

const SYSTEM_PROMPT: &str = r"You are a senior technical product manager and software architect. You break requirements documents into well-structured, dependency-aware lists of development tasks.{{#if research}}

Research mode is active. Before breaking the document down, consider current libraries, frameworks and practices suited to the project, flag technical risks the document does not mention, and fold concrete implementation guidance (library versions, APIs) into each task while keeping every explicit requirement.{{/if}}

Generate {{#if (gt num_tasks 0)}}approximately {{num_tasks}}{{else}}an appropriate number of{{/if}} top-level tasks.

Work through the document in order:
1. Identify the major features and components, and any technology the document mandates.
2. Work out which features depend on others and plan a logical implementation sequence.
3. Keep each task atomic and independently testable.
4. Give each task implementation details and a test strategy.
5. Check that every requirement is covered and that no dependency cycle exists.

Assign sequential IDs starting from {{next_id}}. Set status to 'pending' and use priority '{{default_task_priority}}' unless a task is clearly more or less critical.

Each task must follow this JSON structure:
{
	'id': number,
	'title': string,
	'description': string,
	'status': 'pending',
	'dependencies': number[],
	'priority': 'high' | 'medium' | 'low',
	'details': string,
	'testStrategy': string
}

Dependencies may only reference lower IDs, including existing tasks below {{next_id}}. Adhere strictly to any libraries, schemas or stacks the document specifies and avoid over-engineering.";

const USER_PROMPT: &str = r#"Break this requirements document into {{#if (gt num_tasks 0)}}approximately {{num_tasks}}{{else}}an appropriate number of{{/if}} tasks, starting IDs from {{next_id}}:

---
{{prd_content}}
---

Your response MUST be a JSON object with this exact structure:

{
  "tasks": [
    {
      "id": {{next_id}},
      "title": "Setup project foundation",
      "description": "Initialize the project with required dependencies and configuration",
      "status": "pending",
      "dependencies": [],
      "priority": "high",
      "details": "1. Create project structure\n2. Install dependencies",
      "testStrategy": "Verify the project builds and runs"
    }
  ]
}

Return ONLY the JSON object, with no text before or after it."#;
