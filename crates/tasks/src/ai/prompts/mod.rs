//! Prompt templates for the generation collaborators.
//!
//! Templates are rendered with Handlebars. HTML escaping is disabled since the
//! output goes to a model, not a browser.

pub mod analyze_complexity;
pub mod expand_task;
pub mod parse_prd;

use std::collections::HashMap;

use handlebars::Handlebars;
use serde::Serialize;

use crate::errors::{TasksError, TasksResult};

pub use analyze_complexity::AnalyzeComplexityContext;
pub use expand_task::{ExpandTaskContext, TaskSummary};
pub use parse_prd::ParsePrdContext;

/// A system/user prompt pair.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub description: &'static str,
    pub system: &'static str,
    pub user: &'static str,
}

impl PromptTemplate {
    pub const fn new(id: &'static str, system: &'static str, user: &'static str) -> Self {
        Self {
            id,
            description: "",
            system,
            user,
        }
    }

    #[must_use]
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Render both halves against a context, returning `(system, user)`.
    pub fn render<T: Serialize>(&self, context: &T) -> TasksResult<(String, String)> {
        let handlebars = create_handlebars();

        let system = handlebars
            .render_template(self.system, context)
            .map_err(|e| TasksError::Ai(format!("Failed to render '{}' system prompt: {e}", self.id)))?;
        let user = handlebars
            .render_template(self.user, context)
            .map_err(|e| TasksError::Ai(format!("Failed to render '{}' user prompt: {e}", self.id)))?;

        Ok((system, user))
    }
}

fn create_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars.register_helper(
        "gt",
        Box::new(
            |h: &handlebars::Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output|
             -> handlebars::HelperResult {
                let a = h.param(0).and_then(|v| v.value().as_i64()).unwrap_or(0);
                let b = h.param(1).and_then(|v| v.value().as_i64()).unwrap_or(0);
                if a > b {
                    out.write("true")?;
                }
                Ok(())
            },
        ),
    );

    handlebars.register_helper(
        "json",
        Box::new(
            |h: &handlebars::Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output|
             -> handlebars::HelperResult {
                if let Some(param) = h.param(0) {
                    let json = serde_json::to_string_pretty(param.value()).unwrap_or_default();
                    out.write(&json)?;
                }
                Ok(())
            },
        ),
    );

    handlebars
}

/// Registry of the built-in templates.
#[derive(Debug, Clone)]
pub struct PromptManager {
    templates: HashMap<&'static str, PromptTemplate>,
}

impl PromptManager {
    pub fn new() -> Self {
        let mut manager = Self {
            templates: HashMap::new(),
        };
        manager.register(parse_prd::template());
        manager.register(expand_task::template());
        manager.register(analyze_complexity::template());
        manager
    }

    pub fn register(&mut self, template: PromptTemplate) {
        self.templates.insert(template.id, template);
    }

    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.templates.get(id)
    }

    /// Render a registered template by id.
    pub fn render<T: Serialize>(&self, id: &str, context: &T) -> TasksResult<(String, String)> {
        self.get(id)
            .ok_or_else(|| TasksError::Ai(format!("Unknown prompt template: {id}")))?
            .render(context)
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_rendering() {
        let template = PromptTemplate::new(
            "test",
            "You make {{#if (gt count 0)}}{{count}}{{else}}some{{/if}} things.",
            "Input: {{input}} & more",
        );

        let (system, user) = template
            .render(&json!({ "count": 3, "input": "<data>" }))
            .unwrap();
        assert_eq!(system, "You make 3 things.");
        // no HTML escaping
        assert_eq!(user, "Input: <data> & more");

        let (system, _) = template.render(&json!({ "count": 0, "input": "" })).unwrap();
        assert_eq!(system, "You make some things.");
    }

    #[test]
    fn test_json_helper() {
        let template = PromptTemplate::new("test", "{{{json items}}}", "");
        let (system, _) = template.render(&json!({ "items": [{ "id": 1 }] })).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&system).unwrap();
        assert_eq!(parsed, json!([{ "id": 1 }]));
    }

    #[test]
    fn test_prompt_manager() {
        let manager = PromptManager::new();
        assert!(manager.get("parse-prd").is_some());
        assert!(manager.get("expand-task").is_some());
        assert!(manager.get("analyze-complexity").is_some());
        assert!(manager.render("missing", &json!({})).is_err());
    }
}
