//! Status propagation between tasks and their subtasks.
//!
//! Every status write goes through [`set_status`] / [`apply_status`], which apply
//! the single-level cascade in the same call:
//! - a subtask becoming `done` completes its parent once every sibling is done;
//! - a task becoming `done` force-completes all of its subtasks.
//!
//! Reopening a subtask under a done parent, or reopening a task that still has
//! done subtasks, is allowed and reported as an [`Inconsistency`] rather than
//! repaired.

use std::fmt;

use tracing::{debug, info};

use crate::entities::{TaskGraph, TaskRef, TaskStatus};
use crate::errors::{TasksError, TasksResult};

/// A status change made automatically as a consequence of the requested one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cascade {
    /// Every subtask is done, so the parent was marked done.
    ParentCompleted { task_id: u32 },
    /// The task was marked done, so these subtasks were forced to done.
    SubtasksCompleted { task_id: u32, subtask_ids: Vec<u32> },
}

impl fmt::Display for Cascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParentCompleted { task_id } => {
                write!(f, "all subtasks done, task {task_id} marked done")
            }
            Self::SubtasksCompleted {
                task_id,
                subtask_ids,
            } => {
                let ids: Vec<String> = subtask_ids
                    .iter()
                    .map(|id| format!("{task_id}.{id}"))
                    .collect();
                write!(f, "subtasks {} marked done", ids.join(", "))
            }
        }
    }
}

/// A hierarchy state left inconsistent on purpose for the caller to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// The parent is done while one of its subtasks is not.
    DoneParentWithOpenSubtask {
        task_id: u32,
        subtask: TaskRef,
        status: TaskStatus,
    },
    /// The task is not done while some of its subtasks are.
    OpenTaskWithDoneSubtasks {
        task_id: u32,
        status: TaskStatus,
        done_subtasks: Vec<u32>,
    },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoneParentWithOpenSubtask {
                task_id,
                subtask,
                status,
            } => write!(
                f,
                "task {task_id} is done but subtask {subtask} is now {status}"
            ),
            Self::OpenTaskWithDoneSubtasks {
                task_id,
                status,
                done_subtasks,
            } => write!(
                f,
                "task {task_id} is {status} but {} of its subtasks are done",
                done_subtasks.len()
            ),
        }
    }
}

/// Outcome of a single status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub target: TaskRef,
    pub previous: TaskStatus,
    pub status: TaskStatus,
    pub cascades: Vec<Cascade>,
    pub inconsistencies: Vec<Inconsistency>,
}

/// Parse `reference` and `status`, then apply the write with propagation.
///
/// Fails before touching the graph on an invalid status, malformed id or
/// missing task/subtask.
pub fn set_status(graph: &mut TaskGraph, reference: &str, status: &str) -> TasksResult<StatusUpdate> {
    let status: TaskStatus = status.parse()?;
    let target: TaskRef = reference.parse()?;
    apply_status(graph, target, status)
}

/// Apply a status write to an already-parsed reference.
pub fn apply_status(
    graph: &mut TaskGraph,
    target: TaskRef,
    status: TaskStatus,
) -> TasksResult<StatusUpdate> {
    let update = match target {
        TaskRef::Task(task_id) => set_task_status(graph, task_id, status)?,
        TaskRef::Subtask { parent, index } => set_subtask_status(graph, parent, index, status)?,
    };

    debug!(
        task = %update.target,
        from = %update.previous,
        to = %update.status,
        "Status updated"
    );
    for cascade in &update.cascades {
        info!(task = %update.target, "Cascade: {cascade}");
    }

    Ok(update)
}

fn set_task_status(
    graph: &mut TaskGraph,
    task_id: u32,
    status: TaskStatus,
) -> TasksResult<StatusUpdate> {
    let task = graph.get_task_mut(task_id)?;
    let previous = task.status;
    task.status = status;

    let mut cascades = Vec::new();
    let mut inconsistencies = Vec::new();

    if status == TaskStatus::Done {
        let mut forced = Vec::new();
        for subtask in &mut task.subtasks {
            if subtask.status != TaskStatus::Done {
                subtask.status = TaskStatus::Done;
                forced.push(subtask.id);
            }
        }
        if !forced.is_empty() {
            cascades.push(Cascade::SubtasksCompleted {
                task_id,
                subtask_ids: forced,
            });
        }
    } else {
        let done_subtasks = task.done_subtask_ids();
        if !done_subtasks.is_empty() {
            inconsistencies.push(Inconsistency::OpenTaskWithDoneSubtasks {
                task_id,
                status,
                done_subtasks,
            });
        }
    }

    Ok(StatusUpdate {
        target: TaskRef::Task(task_id),
        previous,
        status,
        cascades,
        inconsistencies,
    })
}

fn set_subtask_status(
    graph: &mut TaskGraph,
    task_id: u32,
    index: u32,
    status: TaskStatus,
) -> TasksResult<StatusUpdate> {
    let task = graph.get_task_mut(task_id)?;
    let target = TaskRef::Subtask {
        parent: task_id,
        index,
    };

    let subtask = task
        .subtask_mut(index)
        .ok_or_else(|| TasksError::SubtaskNotFound {
            task_id: task_id.to_string(),
            subtask_id: target.to_string(),
        })?;
    let previous = subtask.status;
    subtask.status = status;

    let mut cascades = Vec::new();
    let mut inconsistencies = Vec::new();

    if status == TaskStatus::Done {
        if task.all_subtasks_done() && task.status != TaskStatus::Done {
            task.status = TaskStatus::Done;
            cascades.push(Cascade::ParentCompleted { task_id });
        }
    } else if task.status == TaskStatus::Done {
        inconsistencies.push(Inconsistency::DoneParentWithOpenSubtask {
            task_id,
            subtask: target,
            status,
        });
    }

    Ok(StatusUpdate {
        target,
        previous,
        status,
        cascades,
        inconsistencies,
    })
}
