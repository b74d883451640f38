//! Model-backed implementation of the generation collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::domain::{
    ComplexityAssessor, DraftId, SubtaskDraft, SubtaskGenerator, SubtaskRequest, TaskDraft,
    TaskGenerator, TaskRequest,
};
use crate::entities::{ComplexityInfo, ModelSettings, Task};
use crate::errors::{TasksError, TasksResult};

use super::prompts::{AnalyzeComplexityContext, ExpandTaskContext, ParsePrdContext, PromptManager};
use super::provider::{parse_ai_response, AIMessage, AIProvider, GenerateOptions};
use super::schemas::{AnalyzeComplexityResponse, ComplexityEntry, ExpandTaskResponse, ParsePrdResponse};

/// Generates tasks, subtasks and complexity scores by prompting a model.
pub struct AiGenerator {
    provider: Arc<dyn AIProvider>,
    settings: ModelSettings,
    prompts: PromptManager,
    research: bool,
}

impl AiGenerator {
    pub fn new(provider: Arc<dyn AIProvider>, settings: ModelSettings) -> Self {
        Self {
            provider,
            settings,
            prompts: PromptManager::new(),
            research: false,
        }
    }

    /// Build a generator for the configured provider.
    pub fn from_settings(settings: ModelSettings) -> TasksResult<Self> {
        let provider = super::provider_for(&settings)?;
        Ok(Self::new(provider, settings))
    }

    /// Ask the model to research current practices while generating.
    #[must_use]
    pub fn with_research(mut self, research: bool) -> Self {
        self.research = research;
        self
    }

    async fn complete<C: Serialize + Sync, T: DeserializeOwned>(
        &self,
        template_id: &str,
        context: &C,
    ) -> TasksResult<T> {
        let (system, user) = self.prompts.render(template_id, context)?;
        let messages = [AIMessage::system(system), AIMessage::user(user)];
        let options = GenerateOptions {
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
            json_mode: true,
        };

        debug!(
            template = template_id,
            provider = self.provider.name(),
            model = %self.settings.model_id,
            "Sending prompt"
        );
        let response = self
            .provider
            .generate_text(&self.settings.model_id, &messages, &options)
            .await?;
        info!(
            template = template_id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Model response received"
        );

        parse_ai_response(&response)
    }
}

fn generation_failure(e: TasksError) -> TasksError {
    match e {
        TasksError::GenerationFailure { .. } => e,
        other => TasksError::GenerationFailure {
            reason: other.to_string(),
        },
    }
}

/// Bare integer dependencies in a subtask draft name siblings, not tasks.
fn qualify_sibling_dependencies(parent_id: u32, draft: &mut SubtaskDraft) {
    for dep in draft.dependencies.iter_mut().flatten() {
        if let DraftId::Number(n) = dep {
            *dep = DraftId::Text(format!("{parent_id}.{n}"));
        }
    }
}

fn to_complexity_info(task: &Task, entry: ComplexityEntry) -> TasksResult<ComplexityInfo> {
    let raw = entry
        .complexity_score
        .ok_or_else(|| TasksError::AiResponseParseError {
            reason: format!("missing complexityScore for task {}", task.id),
        })?;
    let rounded = raw.round();
    if !(1.0..=10.0).contains(&rounded) {
        return Err(TasksError::AiResponseParseError {
            reason: format!("complexityScore {raw} for task {} is outside 1-10", task.id),
        });
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = rounded as u8;

    Ok(ComplexityInfo {
        score,
        recommended_subtasks: entry.recommended_subtasks,
        expansion_prompt: entry.expansion_prompt.filter(|p| !p.trim().is_empty()),
        reasoning: entry.reasoning.filter(|r| !r.trim().is_empty()),
    })
}

#[async_trait]
impl TaskGenerator for AiGenerator {
    async fn generate_tasks(&self, request: &TaskRequest) -> TasksResult<Vec<TaskDraft>> {
        let context = ParsePrdContext::from_request(request, self.research);
        let response: ParsePrdResponse = self
            .complete("parse-prd", &context)
            .await
            .map_err(generation_failure)?;
        Ok(response.tasks)
    }
}

#[async_trait]
impl SubtaskGenerator for AiGenerator {
    async fn generate_subtasks(&self, request: &SubtaskRequest) -> TasksResult<Vec<SubtaskDraft>> {
        let context = ExpandTaskContext::from_request(request, self.research);
        let response: ExpandTaskResponse = self
            .complete("expand-task", &context)
            .await
            .map_err(generation_failure)?;

        let mut drafts = response.subtasks;
        for draft in &mut drafts {
            qualify_sibling_dependencies(request.task.id, draft);
        }
        Ok(drafts)
    }
}

#[async_trait]
impl ComplexityAssessor for AiGenerator {
    async fn assess(&self, task: &Task) -> TasksResult<ComplexityInfo> {
        let context = AnalyzeComplexityContext::for_task(task, self.research);
        let response: AnalyzeComplexityResponse =
            self.complete("analyze-complexity", &context).await?;

        let mut entries = response.complexity_analysis;
        let position = entries
            .iter()
            .position(|e| {
                e.task_id
                    .as_ref()
                    .is_some_and(|id| id.to_reference() == task.id.to_string())
            })
            .or_else(|| (entries.len() == 1).then_some(0))
            .ok_or_else(|| TasksError::AiResponseParseError {
                reason: format!("no analysis returned for task {}", task.id),
            })?;

        to_complexity_info(task, entries.swap_remove(position))
    }
}
