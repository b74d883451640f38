//! Tasks domain facade.

use std::sync::Arc;

use tracing::info;

use super::deps::{self, ValidationReport};
use super::next::{self, NextTask};
use super::status::{self, StatusUpdate};
use crate::entities::{Resolved, Subtask, Task, TaskGraph, TaskRef, TaskStatus};
use crate::errors::TasksResult;
use crate::storage::Storage;

/// A task or subtask looked up by identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskItem {
    Task(Task),
    Subtask { parent: Task, subtask: Subtask },
}

impl From<Resolved<'_>> for TaskItem {
    fn from(resolved: Resolved<'_>) -> Self {
        match resolved {
            Resolved::Task(task) => Self::Task(task.clone()),
            Resolved::Subtask { parent, subtask } => Self::Subtask {
                parent: parent.clone(),
                subtask: subtask.clone(),
            },
        }
    }
}

/// Tasks domain facade providing high-level task operations
pub struct TasksDomain {
    storage: Arc<dyn Storage>,
}

impl TasksDomain {
    /// Create a new tasks domain
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Initialize the project
    pub async fn init(&self) -> TasksResult<()> {
        self.storage.initialize().await
    }

    /// Check if project is initialized
    pub async fn is_initialized(&self) -> TasksResult<bool> {
        self.storage.is_initialized().await
    }

    /// Load the full graph snapshot
    pub async fn graph(&self) -> TasksResult<TaskGraph> {
        self.storage.load_graph().await
    }

    /// List all tasks with optional status filter
    pub async fn list_tasks(&self, status_filter: Option<TaskStatus>) -> TasksResult<Vec<Task>> {
        let graph = self.storage.load_graph().await?;

        if let Some(status) = status_filter {
            Ok(graph.tasks.into_iter().filter(|t| t.status == status).collect())
        } else {
            Ok(graph.tasks)
        }
    }

    /// Get a task ("N") or subtask ("N.M")
    pub async fn get(&self, reference: &str) -> TasksResult<TaskItem> {
        let graph = self.storage.load_graph().await?;
        graph.lookup(reference).map(TaskItem::from)
    }

    /// Get the next task to work on
    pub async fn next_task(&self) -> TasksResult<NextTask> {
        let graph = self.storage.load_graph().await?;
        Ok(next::select_next(&graph))
    }

    /// Set the status of one or more tasks/subtasks.
    ///
    /// All writes are applied to one snapshot in order; the snapshot is saved
    /// only if every write succeeds.
    pub async fn set_status(&self, references: &[&str], status: &str) -> TasksResult<Vec<StatusUpdate>> {
        let status: TaskStatus = status.parse()?;
        let targets = references
            .iter()
            .map(|r| r.parse::<TaskRef>())
            .collect::<TasksResult<Vec<_>>>()?;

        let mut graph = self.storage.load_graph().await?;
        let updates = targets
            .into_iter()
            .map(|target| status::apply_status(&mut graph, target, status))
            .collect::<TasksResult<Vec<_>>>()?;

        self.storage.save_graph(&graph).await?;
        info!(count = updates.len(), %status, "Status updated");
        Ok(updates)
    }

    /// Report dangling references, duplicate ids and cycles
    pub async fn validate_dependencies(&self) -> TasksResult<ValidationReport> {
        let graph = self.storage.load_graph().await?;
        Ok(deps::validate(&graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Selection;
    use crate::errors::TasksError;
    use crate::storage::FileStorage;
    use tempfile::TempDir;

    async fn setup(tasks: Vec<Task>) -> (TempDir, TasksDomain, Arc<dyn Storage>) {
        let temp_dir = TempDir::new().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(temp_dir.path()));
        storage.initialize().await.unwrap();
        storage.save_graph(&TaskGraph::new(tasks)).await.unwrap();
        let domain = TasksDomain::new(Arc::clone(&storage));
        (temp_dir, domain, storage)
    }

    fn parent_with_subtasks() -> Task {
        let mut task = Task::new(4, "Parent", "d");
        task.subtasks.push(Subtask::new(1, "First", "d"));
        task.subtasks.push(Subtask::new(2, "Second", "d"));
        task
    }

    #[tokio::test]
    async fn test_list_tasks_with_filter() {
        let mut done = Task::new(2, "Task 2", "d");
        done.status = TaskStatus::Done;
        let (_temp, domain, _) = setup(vec![Task::new(1, "Task 1", "d"), done]).await;

        assert_eq!(domain.list_tasks(None).await.unwrap().len(), 2);
        let pending = domain.list_tasks(Some(TaskStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, 1);
    }

    #[tokio::test]
    async fn test_get_task_and_subtask() {
        let (_temp, domain, _) = setup(vec![parent_with_subtasks()]).await;

        assert!(matches!(domain.get("4").await.unwrap(), TaskItem::Task(t) if t.id == 4));
        assert!(matches!(
            domain.get("4.2").await.unwrap(),
            TaskItem::Subtask { subtask, .. } if subtask.title == "Second"
        ));
        assert!(matches!(
            domain.get("4.3").await,
            Err(TasksError::SubtaskNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_status_persists_cascade() {
        let (_temp, domain, storage) = setup(vec![parent_with_subtasks()]).await;

        let updates = domain.set_status(&["4.1", "4.2"], "done").await.unwrap();
        assert_eq!(updates.len(), 2);
        assert!(updates[0].cascades.is_empty());
        assert_eq!(updates[1].cascades.len(), 1);

        let graph = storage.load_graph().await.unwrap();
        assert_eq!(graph.task(4).unwrap().status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn test_set_status_is_all_or_nothing() {
        let (_temp, domain, storage) = setup(vec![parent_with_subtasks()]).await;

        let err = domain.set_status(&["4.1", "4.9"], "done").await.unwrap_err();
        assert!(matches!(err, TasksError::SubtaskNotFound { .. }));

        let graph = storage.load_graph().await.unwrap();
        assert_eq!(graph.task(4).unwrap().subtasks[0].status, TaskStatus::Pending);

        assert!(matches!(
            domain.set_status(&["4"], "in-progress").await,
            Err(TasksError::InvalidStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_next_task() {
        let (_temp, domain, _) = setup(vec![
            Task::new(1, "Task 1", "d"),
            Task::new(2, "Task 2", "d").with_dependencies(["1"]),
        ])
        .await;

        let next = domain.next_task().await.unwrap();
        assert_eq!(next.task().unwrap().id, 1);

        domain.set_status(&["1", "2"], "done").await.unwrap();
        assert_eq!(domain.next_task().await.unwrap().selection, Selection::Exhausted);
    }
}
