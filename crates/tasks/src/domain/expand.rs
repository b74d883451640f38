//! Complexity-driven expansion and validation of generator output.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::generation::{
    ComplexityAssessor, DraftId, SubtaskDraft, SubtaskGenerator, SubtaskRequest, TaskDraft,
};
use crate::entities::{ComplexityInfo, Subtask, Task, TaskGraph, TaskPriority, TaskRef, TaskStatus};
use crate::errors::{TasksError, TasksResult};

/// Subtask count used when neither the caller nor the assessment gives one.
pub const DEFAULT_SUBTASK_COUNT: u32 = 3;

/// Parameters for expanding one task.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandRequest {
    pub task_id: u32,
    pub complexity: ComplexityInfo,
    /// Explicit subtask count; zero or `None` defers to the assessment
    pub count: Option<u32>,
    pub hint: Option<String>,
    /// Replace existing subtasks instead of leaving the task alone
    pub force: bool,
}

impl ExpandRequest {
    pub fn new(task_id: u32, complexity: ComplexityInfo) -> Self {
        Self {
            task_id,
            complexity,
            count: None,
            hint: None,
            force: false,
        }
    }
}

/// What an expansion did.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandOutcome {
    /// Subtasks were generated and attached.
    Expanded { task_id: u32, subtasks: Vec<Subtask> },
    /// The task already had subtasks and `force` was not set.
    AlreadyExpanded { task_id: u32, existing: usize },
}

/// Number of subtasks to request for a task.
pub fn effective_count(requested: Option<u32>, complexity: &ComplexityInfo) -> u32 {
    requested
        .filter(|&n| n > 0)
        .or_else(|| complexity.recommended_subtasks.filter(|&n| n > 0))
        .unwrap_or(DEFAULT_SUBTASK_COUNT)
}

/// Ask the assessor for a task's complexity, substituting the fallback on
/// failure.
pub async fn assess_or_default(assessor: &dyn ComplexityAssessor, task: &Task) -> ComplexityInfo {
    match assessor.assess(task).await {
        Ok(info) => info,
        Err(e) => {
            warn!(task_id = task.id, "Complexity assessment failed, using default: {e}");
            ComplexityInfo::fallback()
        }
    }
}

/// Generate and attach subtasks for one task.
///
/// The graph is only modified once the generator output validated in full.
pub async fn expand(
    graph: &mut TaskGraph,
    request: ExpandRequest,
    generator: &dyn SubtaskGenerator,
) -> TasksResult<ExpandOutcome> {
    let task = graph.get_task(request.task_id)?;

    if !task.subtasks.is_empty() && !request.force {
        debug!(task_id = task.id, "Task already has subtasks, skipping");
        return Ok(ExpandOutcome::AlreadyExpanded {
            task_id: task.id,
            existing: task.subtasks.len(),
        });
    }

    let count = effective_count(request.count, &request.complexity);
    let generation = SubtaskRequest {
        task: task.clone(),
        complexity: request.complexity.clone(),
        count,
        hint: request.hint,
    };

    info!(task_id = request.task_id, count, "Generating subtasks");
    let drafts = generator.generate_subtasks(&generation).await?;
    let subtasks = validate_subtasks(request.task_id, drafts)?;

    let task = graph.get_task_mut(request.task_id)?;
    task.subtasks.clone_from(&subtasks);
    task.complexity = Some(request.complexity);

    info!(
        task_id = request.task_id,
        subtasks = subtasks.len(),
        "Task expanded"
    );
    Ok(ExpandOutcome::Expanded {
        task_id: request.task_id,
        subtasks,
    })
}

fn malformed(position: usize, reason: impl Into<String>) -> TasksError {
    TasksError::MalformedSubtask {
        position,
        reason: reason.into(),
    }
}

fn required_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn references(deps: Option<Vec<DraftId>>) -> Vec<String> {
    deps.unwrap_or_default()
        .iter()
        .map(DraftId::to_reference)
        .collect()
}

/// Resolve a draft subtask id: `M`, or `P.M` where `P` is the parent.
fn subtask_index(parent_id: u32, id: &DraftId) -> Option<u32> {
    match id.to_reference().parse::<TaskRef>().ok()? {
        TaskRef::Task(index) => Some(index),
        TaskRef::Subtask { parent, index } if parent == parent_id => Some(index),
        TaskRef::Subtask { .. } => None,
    }
}

/// Validate subtask drafts for `parent_id`. Any malformed element fails the
/// whole batch.
pub fn validate_subtasks(parent_id: u32, drafts: Vec<SubtaskDraft>) -> TasksResult<Vec<Subtask>> {
    let mut seen = HashSet::new();
    let mut subtasks = Vec::with_capacity(drafts.len());

    for (i, draft) in drafts.into_iter().enumerate() {
        let position = i + 1;

        let title = required_text(draft.title).ok_or_else(|| malformed(position, "missing title"))?;
        let description = required_text(draft.description)
            .ok_or_else(|| malformed(position, "missing description"))?;

        let id = match &draft.id {
            None => u32::try_from(position).map_err(|_| malformed(position, "too many subtasks"))?,
            Some(raw) => subtask_index(parent_id, raw).ok_or_else(|| {
                malformed(
                    position,
                    format!("invalid id '{}' for task {parent_id}", raw.to_reference()),
                )
            })?,
        };
        if !seen.insert(id) {
            return Err(malformed(position, format!("duplicate id {id}")));
        }

        let status = match draft.status {
            None => TaskStatus::Pending,
            Some(raw) => raw
                .parse()
                .map_err(|e: TasksError| malformed(position, e.to_string()))?,
        };

        let mut subtask = Subtask::new(id, title, description);
        subtask.status = status;
        subtask.dependencies = references(draft.dependencies);
        subtask.details = draft.details.unwrap_or_default();
        subtask.test_strategy = draft.test_strategy.unwrap_or_default();
        subtasks.push(subtask);
    }

    Ok(subtasks)
}

fn generation_failure(reason: impl Into<String>) -> TasksError {
    TasksError::GenerationFailure {
        reason: reason.into(),
    }
}

/// Validate task drafts against the graph they will be appended to.
///
/// Explicit ids must not collide with existing tasks or each other. Drafts
/// without an id get the next free ids in order.
pub fn validate_tasks(
    drafts: Vec<TaskDraft>,
    graph: &TaskGraph,
    default_priority: TaskPriority,
) -> TasksResult<Vec<Task>> {
    let mut used: HashSet<u32> = graph.iter().map(|t| t.id).collect();

    let mut explicit = Vec::with_capacity(drafts.len());
    for (i, draft) in drafts.iter().enumerate() {
        let id = match &draft.id {
            None => None,
            Some(raw) => match raw.to_reference().parse::<TaskRef>() {
                Ok(TaskRef::Task(id)) => Some(id),
                _ => {
                    return Err(generation_failure(format!(
                        "task at position {} has invalid id '{}'",
                        i + 1,
                        raw.to_reference()
                    )))
                }
            },
        };
        if let Some(id) = id {
            if !used.insert(id) {
                return Err(generation_failure(format!("duplicate task id {id}")));
            }
        }
        explicit.push(id);
    }

    let mut next_free = graph.next_task_id();
    let mut tasks = Vec::with_capacity(drafts.len());

    for (i, (draft, id)) in drafts.into_iter().zip(explicit).enumerate() {
        let position = i + 1;
        let id = match id {
            Some(id) => id,
            None => {
                while used.contains(&next_free) {
                    next_free += 1;
                }
                used.insert(next_free);
                next_free
            }
        };

        let title = required_text(draft.title)
            .ok_or_else(|| generation_failure(format!("task at position {position} is missing a title")))?;
        let description = required_text(draft.description).ok_or_else(|| {
            generation_failure(format!("task at position {position} is missing a description"))
        })?;

        let status = match draft.status {
            None => TaskStatus::Pending,
            Some(raw) => raw
                .parse()
                .map_err(|e: TasksError| generation_failure(format!("task {id}: {e}")))?,
        };
        let priority = match draft.priority {
            None => default_priority,
            Some(raw) => raw
                .parse()
                .map_err(|e: TasksError| generation_failure(format!("task {id}: {e}")))?,
        };
        let subtasks = match draft.subtasks {
            None => Vec::new(),
            Some(drafts) => validate_subtasks(id, drafts)
                .map_err(|e| generation_failure(format!("task {id}: {e}")))?,
        };

        let mut task = Task::new(id, title, description)
            .with_priority(priority)
            .with_dependencies(references(draft.dependencies));
        task.status = status;
        task.details = draft.details.unwrap_or_default();
        task.test_strategy = draft.test_strategy.unwrap_or_default();
        task.subtasks = subtasks;
        tasks.push(task);
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::{MockComplexityAssessor, MockSubtaskGenerator};
    use crate::domain::next::select_next;
    use crate::domain::status::set_status;

    fn complexity(recommended: Option<u32>) -> ComplexityInfo {
        ComplexityInfo {
            score: 7,
            recommended_subtasks: recommended,
            expansion_prompt: Some("split by layer".to_string()),
            reasoning: None,
        }
    }

    fn drafts(n: usize) -> Vec<SubtaskDraft> {
        (1..=n)
            .map(|i| SubtaskDraft::new(format!("Step {i}"), format!("Do step {i}")))
            .collect()
    }

    fn graph() -> TaskGraph {
        TaskGraph::new(vec![Task::new(1, "Base", "d"), Task::new(2, "Feature", "d")])
    }

    #[test]
    fn test_effective_count() {
        assert_eq!(effective_count(Some(6), &complexity(Some(4))), 6);
        assert_eq!(effective_count(Some(0), &complexity(Some(4))), 4);
        assert_eq!(effective_count(None, &complexity(Some(4))), 4);
        assert_eq!(effective_count(None, &complexity(Some(0))), 3);
        assert_eq!(effective_count(None, &complexity(None)), 3);
    }

    #[tokio::test]
    async fn test_expand_uses_recommended_count() {
        let mut graph = graph();
        let mut generator = MockSubtaskGenerator::new();
        generator
            .expect_generate_subtasks()
            .withf(|req| req.count == 4 && req.task.id == 2 && req.hint.is_none())
            .times(1)
            .returning(|req| Ok(drafts(req.count as usize)));

        let outcome = expand(
            &mut graph,
            ExpandRequest::new(2, complexity(Some(4))),
            &generator,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, ExpandOutcome::Expanded { ref subtasks, .. } if subtasks.len() == 4));
        let task = graph.task(2).unwrap();
        assert_eq!(task.subtasks.len(), 4);
        assert_eq!(task.subtasks[3].full_id(2), "2.4");
        assert_eq!(task.complexity, Some(complexity(Some(4))));
    }

    #[tokio::test]
    async fn test_already_expanded_is_noop() {
        let mut graph = graph();
        graph.task_mut(2).unwrap().subtasks = vec![Subtask::new(1, "Existing", "d")];
        let before = graph.clone();

        let mut generator = MockSubtaskGenerator::new();
        generator.expect_generate_subtasks().never();

        let outcome = expand(
            &mut graph,
            ExpandRequest::new(2, complexity(None)),
            &generator,
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            ExpandOutcome::AlreadyExpanded {
                task_id: 2,
                existing: 1
            }
        );
        assert_eq!(graph, before);
    }

    #[tokio::test]
    async fn test_force_replaces_subtasks() {
        let mut graph = graph();
        graph.task_mut(2).unwrap().subtasks = vec![Subtask::new(1, "Existing", "d")];

        let mut generator = MockSubtaskGenerator::new();
        generator
            .expect_generate_subtasks()
            .withf(|req| req.count == 2 && req.hint.as_deref() == Some("focus on tests"))
            .returning(|_| Ok(drafts(2)));

        let mut request = ExpandRequest::new(2, complexity(None));
        request.count = Some(2);
        request.hint = Some("focus on tests".to_string());
        request.force = true;
        expand(&mut graph, request, &generator).await.unwrap();

        let titles: Vec<&str> = graph.task(2).unwrap().subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Step 1", "Step 2"]);
    }

    #[tokio::test]
    async fn test_malformed_output_leaves_graph_untouched() {
        let mut graph = graph();
        let before = graph.clone();

        let mut generator = MockSubtaskGenerator::new();
        generator.expect_generate_subtasks().returning(|_| {
            let mut out = drafts(3);
            out[2].title = Some("   ".to_string());
            Ok(out)
        });

        let err = expand(
            &mut graph,
            ExpandRequest::new(2, complexity(None)),
            &generator,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TasksError::MalformedSubtask { position: 3, .. }));
        assert_eq!(graph, before);
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let mut graph = graph();
        let before = graph.clone();

        let mut generator = MockSubtaskGenerator::new();
        generator.expect_generate_subtasks().returning(|_| {
            Err(TasksError::GenerationFailure {
                reason: "model unavailable".to_string(),
            })
        });

        let err = expand(
            &mut graph,
            ExpandRequest::new(1, complexity(None)),
            &generator,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, TasksError::GenerationFailure { .. }));
        assert_eq!(graph, before);
    }

    #[tokio::test]
    async fn test_expand_missing_task() {
        let mut graph = graph();
        let mut generator = MockSubtaskGenerator::new();
        generator.expect_generate_subtasks().never();

        let err = expand(
            &mut graph,
            ExpandRequest::new(9, complexity(None)),
            &generator,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TasksError::TaskNotFound { .. }));
    }

    #[tokio::test]
    async fn test_expanded_subtasks_feed_propagation() {
        let mut graph = graph();
        let mut generator = MockSubtaskGenerator::new();
        generator.expect_generate_subtasks().returning(|_| Ok(drafts(2)));

        expand(
            &mut graph,
            ExpandRequest::new(1, complexity(None)),
            &generator,
        )
        .await
        .unwrap();

        set_status(&mut graph, "1.1", "done").unwrap();
        set_status(&mut graph, "1.2", "done").unwrap();
        assert_eq!(graph.task(1).unwrap().status, TaskStatus::Done);
        assert_eq!(select_next(&graph).task().unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_assessor_failure_falls_back() {
        let mut assessor = MockComplexityAssessor::new();
        assessor
            .expect_assess()
            .returning(|_| Err(TasksError::Ai("timeout".to_string())));

        let info = assess_or_default(&assessor, &Task::new(1, "T", "d")).await;
        assert_eq!(info, ComplexityInfo::fallback());
    }

    #[test]
    fn test_validate_subtask_ids() {
        let mut out = drafts(3);
        out[0].id = Some(DraftId::Number(1));
        out[1].id = Some(DraftId::Text("4.2".to_string()));
        out[2].id = None;
        let subtasks = validate_subtasks(4, out).unwrap();
        let ids: Vec<u32> = subtasks.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let mut foreign = drafts(1);
        foreign[0].id = Some(DraftId::Text("5.1".to_string()));
        assert!(matches!(
            validate_subtasks(4, foreign),
            Err(TasksError::MalformedSubtask { position: 1, .. })
        ));

        let mut dup = drafts(2);
        dup[0].id = Some(DraftId::Number(2));
        assert!(matches!(
            validate_subtasks(4, dup),
            Err(TasksError::MalformedSubtask { position: 2, .. })
        ));
    }

    #[test]
    fn test_validate_subtask_defaults_and_status() {
        let mut out = drafts(2);
        out[0].dependencies = Some(vec![DraftId::Number(3), DraftId::Text("4.1".to_string())]);
        let subtasks = validate_subtasks(4, out).unwrap();
        assert_eq!(subtasks[0].status, TaskStatus::Pending);
        assert_eq!(subtasks[0].dependencies, vec!["3", "4.1"]);
        assert!(subtasks[1].dependencies.is_empty());

        let mut bad = drafts(1);
        bad[0].status = Some("in-progress".to_string());
        assert!(matches!(
            validate_subtasks(4, bad),
            Err(TasksError::MalformedSubtask { .. })
        ));

        let mut missing = drafts(1);
        missing[0].description = None;
        assert!(validate_subtasks(4, missing).is_err());
    }

    #[test]
    fn test_validate_tasks_assigns_ids_and_priority() {
        let graph = graph();
        let mut first = TaskDraft::new("A", "a");
        first.id = Some(DraftId::Number(4));
        let second = TaskDraft::new("B", "b");
        let mut third = TaskDraft::new("C", "c");
        third.priority = Some("low".to_string());
        third.subtasks = Some(vec![SubtaskDraft::new("c1", "first step")]);

        let tasks = validate_tasks(vec![first, second, third], &graph, TaskPriority::Medium).unwrap();

        let ids: Vec<u32> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 3, 5]);
        assert_eq!(tasks[0].priority, TaskPriority::Medium);
        assert_eq!(tasks[2].priority, TaskPriority::Low);
        assert_eq!(tasks[2].subtasks[0].full_id(5), "5.1");
    }

    #[test]
    fn test_validate_tasks_rejects_collisions() {
        let graph = graph();
        let mut colliding = TaskDraft::new("A", "a");
        colliding.id = Some(DraftId::Number(2));
        assert!(matches!(
            validate_tasks(vec![colliding], &graph, TaskPriority::Medium),
            Err(TasksError::GenerationFailure { .. })
        ));

        let mut a = TaskDraft::new("A", "a");
        a.id = Some(DraftId::Text("7".to_string()));
        let mut b = TaskDraft::new("B", "b");
        b.id = Some(DraftId::Number(7));
        assert!(validate_tasks(vec![a, b], &graph, TaskPriority::Medium).is_err());
    }

    #[test]
    fn test_validate_tasks_rejects_bad_nested_subtasks() {
        let mut draft = TaskDraft::new("A", "a");
        draft.subtasks = Some(vec![SubtaskDraft::default()]);
        let err = validate_tasks(vec![draft], &TaskGraph::default(), TaskPriority::High).unwrap_err();
        assert!(matches!(err, TasksError::GenerationFailure { .. }));
        assert!(err.to_string().contains("task 1"));
    }
}
