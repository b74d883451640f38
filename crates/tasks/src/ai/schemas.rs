//! Response shapes expected from the model for each prompt.

use serde::Deserialize;

use crate::domain::{DraftId, SubtaskDraft, TaskDraft};

/// Response to the parse-prd prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsePrdResponse {
    pub tasks: Vec<TaskDraft>,
}

/// Response to the expand-task prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpandTaskResponse {
    pub subtasks: Vec<SubtaskDraft>,
}

/// Response to the analyze-complexity prompt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeComplexityResponse {
    pub complexity_analysis: Vec<ComplexityEntry>,
}

/// One scored task. Fields stay loose so the generator can report what is wrong.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityEntry {
    #[serde(default)]
    pub task_id: Option<DraftId>,
    #[serde(default)]
    pub complexity_score: Option<f64>,
    #[serde(default)]
    pub recommended_subtasks: Option<u32>,
    #[serde(default)]
    pub expansion_prompt: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}
