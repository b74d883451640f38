//! Complexity analysis across the task list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::generation::ComplexityAssessor;
use crate::entities::{ComplexityInfo, Task, TaskGraph, TaskStatus};

/// Score at or above which a task is recommended for expansion.
pub const DEFAULT_THRESHOLD: u8 = 5;

/// Persisted result of a complexity analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityReport {
    pub meta: ReportMeta,
    pub complexity_analysis: Vec<TaskAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AnalysisFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub generated_at: DateTime<Utc>,
    pub threshold: u8,
    pub tasks_analyzed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

/// Assessment of a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnalysis {
    pub task_id: u32,
    pub task_title: String,
    pub complexity_score: u8,
    #[serde(default)]
    pub recommended_subtasks: u32,
    #[serde(default)]
    pub expansion_prompt: String,
    #[serde(default)]
    pub reasoning: String,
}

impl TaskAnalysis {
    fn new(task: &Task, info: ComplexityInfo) -> Self {
        Self {
            task_id: task.id,
            task_title: task.title.clone(),
            complexity_score: info.score,
            recommended_subtasks: info.recommended_subtasks.unwrap_or(0),
            expansion_prompt: info.expansion_prompt.unwrap_or_default(),
            reasoning: info.reasoning.unwrap_or_default(),
        }
    }

    pub fn needs_expansion(&self, threshold: u8) -> bool {
        self.complexity_score >= threshold
    }

    /// Assessment in the form expansion consumes.
    pub fn to_complexity_info(&self) -> ComplexityInfo {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ComplexityInfo {
            score: self.complexity_score,
            recommended_subtasks: Some(self.recommended_subtasks).filter(|&n| n > 0),
            expansion_prompt: non_empty(&self.expansion_prompt),
            reasoning: non_empty(&self.reasoning),
        }
    }
}

/// A task the assessor could not score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFailure {
    pub task_id: u32,
    pub reason: String,
}

impl ComplexityReport {
    pub fn find(&self, task_id: u32) -> Option<&TaskAnalysis> {
        self.complexity_analysis.iter().find(|a| a.task_id == task_id)
    }

    /// Analyses at or above the report threshold, most complex first.
    pub fn expansion_candidates(&self) -> Vec<&TaskAnalysis> {
        let mut candidates: Vec<&TaskAnalysis> = self
            .complexity_analysis
            .iter()
            .filter(|a| a.needs_expansion(self.meta.threshold))
            .collect();
        candidates.sort_by(|a, b| {
            b.complexity_score
                .cmp(&a.complexity_score)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        candidates
    }
}

/// Assess every task that is not done. Failures are collected per task and do
/// not stop the run.
pub async fn analyze_complexity(
    graph: &TaskGraph,
    assessor: &dyn ComplexityAssessor,
    threshold: u8,
) -> ComplexityReport {
    let mut analyses = Vec::new();
    let mut failures = Vec::new();

    for task in graph.iter().filter(|t| t.status != TaskStatus::Done) {
        match assessor.assess(task).await {
            Ok(info) => analyses.push(TaskAnalysis::new(task, info)),
            Err(e) => {
                warn!(task_id = task.id, "Complexity analysis failed: {e}");
                failures.push(AnalysisFailure {
                    task_id: task.id,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        analyzed = analyses.len(),
        failed = failures.len(),
        "Complexity analysis complete"
    );

    ComplexityReport {
        meta: ReportMeta {
            generated_at: Utc::now(),
            threshold,
            tasks_analyzed: analyses.len(),
            project_name: None,
        },
        complexity_analysis: analyses,
        failures,
    }
}
