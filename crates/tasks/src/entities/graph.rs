//! In-memory task graph snapshot.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use super::{Subtask, Task, TaskRef, TaskStatus};
use crate::errors::{TasksError, TasksResult};

/// A dependency target found in the graph.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Task(&'a Task),
    Subtask {
        parent: &'a Task,
        subtask: &'a Subtask,
    },
}

impl<'a> Resolved<'a> {
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Task(task) => task.status,
            Self::Subtask { subtask, .. } => subtask.status,
        }
    }

    pub fn title(&self) -> &'a str {
        match *self {
            Self::Task(task) => &task.title,
            Self::Subtask { subtask, .. } => &subtask.title,
        }
    }

    pub fn task_ref(&self) -> TaskRef {
        match self {
            Self::Task(task) => TaskRef::Task(task.id),
            Self::Subtask { parent, subtask } => subtask.task_ref(parent.id),
        }
    }
}

/// Ordered sequence of tasks. Order is display order, not priority order.
///
/// Dependency references are not required to resolve; a dangling reference is a
/// valid state that readiness checks report as a warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskGraph {
    pub tasks: Vec<Task>,
}

impl TaskGraph {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Build a graph from a stored document of the form `{ "tasks": [...] }`.
    pub fn from_value(data: &Value) -> TasksResult<Self> {
        let raw_tasks = data
            .get("tasks")
            .ok_or_else(|| TasksError::CorruptGraph {
                reason: "missing 'tasks' array".to_string(),
            })?
            .as_array()
            .ok_or_else(|| TasksError::CorruptGraph {
                reason: "'tasks' is not an array".to_string(),
            })?;

        let mut tasks = Vec::with_capacity(raw_tasks.len());
        for (position, raw) in raw_tasks.iter().enumerate() {
            let task: Task =
                serde_json::from_value(raw.clone()).map_err(|e| TasksError::CorruptGraph {
                    reason: format!("task at position {}: {e}", position + 1),
                })?;

            if let Some(prefix) = foreign_subtask_prefix(raw, task.id) {
                return Err(TasksError::CorruptGraph {
                    reason: format!("task {} holds subtask id '{prefix}' of another task", task.id),
                });
            }

            let mut seen = HashSet::new();
            if let Some(dup) = task.subtasks.iter().find(|s| !seen.insert(s.id)) {
                return Err(TasksError::CorruptGraph {
                    reason: format!("task {} has duplicate subtask id {}", task.id, dup.id),
                });
            }
            tasks.push(task);
        }

        Ok(Self { tasks })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// First task with the given id.
    pub fn task(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: u32) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Task lookup for direct operations.
    pub fn get_task(&self, id: u32) -> TasksResult<&Task> {
        self.task(id).ok_or_else(|| TasksError::TaskNotFound {
            task_id: id.to_string(),
        })
    }

    pub fn get_task_mut(&mut self, id: u32) -> TasksResult<&mut Task> {
        self.task_mut(id).ok_or_else(|| TasksError::TaskNotFound {
            task_id: id.to_string(),
        })
    }

    /// Resolve a parsed reference, `None` when nothing matches.
    pub fn resolve_ref(&self, reference: TaskRef) -> Option<Resolved<'_>> {
        match reference {
            TaskRef::Task(id) => self.task(id).map(Resolved::Task),
            TaskRef::Subtask { parent, index } => {
                let parent = self.task(parent)?;
                parent
                    .subtask(index)
                    .map(|subtask| Resolved::Subtask { parent, subtask })
            }
        }
    }

    /// Tolerant resolution used by readiness scans: malformed references simply
    /// do not resolve.
    pub fn resolve(&self, reference: &str) -> Option<Resolved<'_>> {
        reference
            .parse::<TaskRef>()
            .ok()
            .and_then(|r| self.resolve_ref(r))
    }

    /// Strict lookup used by direct operations such as `show`.
    pub fn lookup(&self, reference: &str) -> TasksResult<Resolved<'_>> {
        match reference.parse::<TaskRef>()? {
            TaskRef::Task(id) => self.get_task(id).map(Resolved::Task),
            TaskRef::Subtask { parent, index } => {
                let parent = self.get_task(parent)?;
                let subtask = parent
                    .subtask(index)
                    .ok_or_else(|| TasksError::SubtaskNotFound {
                        task_id: parent.id.to_string(),
                        subtask_id: format!("{}.{index}", parent.id),
                    })?;
                Ok(Resolved::Subtask { parent, subtask })
            }
        }
    }

    /// Next unused task id (one past the current maximum).
    pub fn next_task_id(&self) -> u32 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    pub fn append(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.extend(tasks);
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .count()
    }
}

/// First stored subtask id written as `"P.M"` whose `P` is not `parent_id`.
fn foreign_subtask_prefix(raw_task: &Value, parent_id: u32) -> Option<String> {
    raw_task
        .get("subtasks")?
        .as_array()?
        .iter()
        .filter_map(|s| s.get("id")?.as_str())
        .find(|id| {
            matches!(
                id.parse::<TaskRef>(),
                Ok(TaskRef::Subtask { parent, .. }) if parent != parent_id
            )
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TaskGraph {
        let mut parent = Task::new(4, "Parent", "Has subtasks");
        parent.subtasks.push(Subtask::new(1, "First", "d"));
        parent.subtasks.push(Subtask::new(2, "Second", "d"));
        TaskGraph::new(vec![Task::new(1, "One", "d"), parent])
    }

    #[test]
    fn test_from_value_requires_tasks_array() {
        assert!(matches!(
            TaskGraph::from_value(&json!({})),
            Err(TasksError::CorruptGraph { .. })
        ));
        assert!(matches!(
            TaskGraph::from_value(&json!({ "tasks": { "1": {} } })),
            Err(TasksError::CorruptGraph { .. })
        ));
        assert!(matches!(
            TaskGraph::from_value(&json!([])),
            Err(TasksError::CorruptGraph { .. })
        ));
    }

    #[test]
    fn test_from_value_rejects_unreadable_task() {
        let err = TaskGraph::from_value(&json!({ "tasks": [{ "title": "no id" }] })).unwrap_err();
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn test_from_value_rejects_duplicate_subtasks() {
        let data = json!({ "tasks": [{
            "id": 1,
            "title": "T",
            "subtasks": [
                { "id": 1, "title": "a" },
                { "id": 1, "title": "b" }
            ]
        }]});
        assert!(matches!(
            TaskGraph::from_value(&data),
            Err(TasksError::CorruptGraph { .. })
        ));
    }

    #[test]
    fn test_from_value_accepts_dotted_subtask_ids() {
        let data = json!({ "tasks": [{
            "id": 4,
            "title": "T",
            "subtasks": [
                { "id": "4.1", "title": "a", "status": "done" },
                { "id": "2", "title": "b", "dependencies": ["4.1"] }
            ]
        }]});

        let graph = TaskGraph::from_value(&data).unwrap();
        let ids: Vec<u32> = graph.tasks[0].subtasks.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(graph.resolve("4.2").unwrap().title(), "b");
    }

    #[test]
    fn test_from_value_rejects_subtask_of_other_parent() {
        let data = json!({ "tasks": [{
            "id": 4,
            "title": "T",
            "subtasks": [{ "id": "3.1", "title": "a" }]
        }]});
        let err = TaskGraph::from_value(&data).unwrap_err();
        assert!(matches!(err, TasksError::CorruptGraph { .. }));
        assert!(err.to_string().contains("3.1"));
    }

    #[test]
    fn test_from_value_rejects_duplicate_mixed_shape_subtasks() {
        let data = json!({ "tasks": [{
            "id": 4,
            "title": "T",
            "subtasks": [{ "id": 1, "title": "a" }, { "id": "4.1", "title": "b" }]
        }]});
        assert!(matches!(
            TaskGraph::from_value(&data),
            Err(TasksError::CorruptGraph { .. })
        ));
    }

    #[test]
    fn test_from_value_accepts_empty_list() {
        let graph = TaskGraph::from_value(&json!({ "tasks": [] })).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.next_task_id(), 1);
    }

    #[test]
    fn test_resolve_task_and_subtask() {
        let graph = sample();
        assert_eq!(graph.resolve("1").unwrap().title(), "One");
        assert_eq!(graph.resolve("4.2").unwrap().title(), "Second");
        assert!(graph.resolve("4.3").is_none());
        assert!(graph.resolve("99").is_none());
        assert!(graph.resolve("garbage").is_none());
    }

    #[test]
    fn test_lookup_errors() {
        let graph = sample();
        assert!(matches!(
            graph.lookup("99"),
            Err(TasksError::TaskNotFound { .. })
        ));
        assert!(matches!(
            graph.lookup("4.9"),
            Err(TasksError::SubtaskNotFound { .. })
        ));
        assert!(matches!(
            graph.lookup("4..9"),
            Err(TasksError::InvalidId { .. })
        ));
        assert_eq!(
            graph.lookup("4.1").unwrap().task_ref(),
            TaskRef::Subtask {
                parent: 4,
                index: 1
            }
        );
    }

    #[test]
    fn test_duplicate_task_ids_return_first_match() {
        let graph = TaskGraph::new(vec![
            Task::new(2, "First", "d"),
            Task::new(2, "Second", "d"),
        ]);
        assert_eq!(graph.task(2).unwrap().title, "First");
    }

    #[test]
    fn test_next_task_id() {
        assert_eq!(sample().next_task_id(), 5);
    }
}
