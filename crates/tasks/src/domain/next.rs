//! Readiness and next-task selection.
//!
//! A task is a candidate when it is neither `done` nor `deferred`. A candidate
//! is ready when every dependency resolves to an existing task or subtask that
//! is `done`. References that do not resolve block the task like an unfinished
//! dependency, and are additionally reported as [`UnresolvableDependency`]
//! warnings.
//!
//! Ready candidates are ranked by priority, then by unblock weight (how many
//! other unfinished tasks depend on them), then by ascending id.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, warn};

use crate::entities::{Task, TaskGraph, TaskRef, TaskStatus};

/// A dependency reference that names no existing task or subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvableDependency {
    pub task_id: u32,
    pub reference: String,
}

impl fmt::Display for UnresolvableDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task {} depends on '{}', which does not exist",
            self.task_id, self.reference
        )
    }
}

/// Why a single dependency keeps a task from being ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocker {
    /// The dependency exists but is not done yet.
    NotDone {
        reference: TaskRef,
        title: String,
        status: TaskStatus,
    },
    /// The dependency names nothing in the graph.
    Unresolvable { reference: String },
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDone {
                reference,
                title,
                status,
            } => write!(f, "{reference} \"{title}\" is {status}"),
            Self::Unresolvable { reference } => write!(f, "{reference} does not exist"),
        }
    }
}

/// Readiness of one task, with every unmet dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    pub task_id: u32,
    pub title: String,
    pub blockers: Vec<Blocker>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.blockers.is_empty()
    }

    pub fn unresolvable(&self) -> impl Iterator<Item = &str> {
        self.blockers.iter().filter_map(|b| match b {
            Blocker::Unresolvable { reference } => Some(reference.as_str()),
            Blocker::NotDone { .. } => None,
        })
    }
}

/// Result of next-task selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The top-ranked ready task.
    Next(Task),
    /// Work remains but nothing is ready; every candidate's blockers are listed.
    Blocked(Vec<Readiness>),
    /// Every task is done or deferred.
    Exhausted,
}

/// Selection plus the unresolvable references discovered while computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct NextTask {
    pub selection: Selection,
    pub warnings: Vec<UnresolvableDependency>,
}

impl NextTask {
    pub fn task(&self) -> Option<&Task> {
        match &self.selection {
            Selection::Next(task) => Some(task),
            Selection::Blocked(_) | Selection::Exhausted => None,
        }
    }
}

/// Compute the readiness of `task` against `graph`.
///
/// Duplicate references are reported once.
pub fn readiness(graph: &TaskGraph, task: &Task) -> Readiness {
    let mut seen = HashSet::new();
    let blockers = task
        .dependencies
        .iter()
        .filter(|dep| seen.insert(dep.as_str()))
        .filter_map(|dep| match graph.resolve(dep) {
            None => Some(Blocker::Unresolvable {
                reference: dep.clone(),
            }),
            Some(target) if target.status() == TaskStatus::Done => None,
            Some(target) => Some(Blocker::NotDone {
                reference: target.task_ref(),
                title: target.title().to_string(),
                status: target.status(),
            }),
        })
        .collect();

    Readiness {
        task_id: task.id,
        title: task.title.clone(),
        blockers,
    }
}

/// Number of unfinished tasks, per task id, that list that id as a dependency.
///
/// Each dependent task counts once per target; self-references are ignored.
pub fn unblock_weights(graph: &TaskGraph) -> HashMap<u32, usize> {
    let mut weights: HashMap<u32, usize> = HashMap::new();
    for task in graph.iter().filter(|t| t.status != TaskStatus::Done) {
        let targets: HashSet<u32> = task
            .dependencies
            .iter()
            .filter_map(|dep| match dep.parse::<TaskRef>() {
                Ok(TaskRef::Task(id)) if id != task.id => Some(id),
                _ => None,
            })
            .collect();
        for id in targets {
            *weights.entry(id).or_default() += 1;
        }
    }
    weights
}

/// Ready candidates, best first.
pub fn ready_tasks(graph: &TaskGraph) -> Vec<&Task> {
    let weights = unblock_weights(graph);
    let mut ready: Vec<&Task> = graph
        .iter()
        .filter(|t| !t.status.is_terminal())
        .filter(|t| readiness(graph, t).is_ready())
        .collect();
    ready.sort_by(|a, b| compare_candidates(a, b, &weights));
    ready
}

/// Total order over ready candidates; `Less` means `a` should be picked first.
fn compare_candidates(a: &Task, b: &Task, weights: &HashMap<u32, usize>) -> Ordering {
    let weight = |t: &Task| weights.get(&t.id).copied().unwrap_or(0);
    b.priority
        .rank()
        .cmp(&a.priority.rank())
        .then_with(|| weight(b).cmp(&weight(a)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Pick the single best task to work on next.
pub fn select_next(graph: &TaskGraph) -> NextTask {
    let candidates: Vec<&Task> = graph.iter().filter(|t| !t.status.is_terminal()).collect();

    if candidates.is_empty() {
        debug!("No candidate tasks remain");
        return NextTask {
            selection: Selection::Exhausted,
            warnings: Vec::new(),
        };
    }

    let reports: Vec<Readiness> = candidates.iter().map(|t| readiness(graph, t)).collect();

    let warnings: Vec<UnresolvableDependency> = reports
        .iter()
        .flat_map(|r| {
            r.unresolvable().map(|reference| UnresolvableDependency {
                task_id: r.task_id,
                reference: reference.to_string(),
            })
        })
        .collect();
    for warning in &warnings {
        warn!("Unresolvable dependency: {warning}");
    }

    let weights = unblock_weights(graph);
    let best = candidates
        .iter()
        .zip(&reports)
        .filter(|(_, report)| report.is_ready())
        .map(|(task, _)| *task)
        .min_by(|a, b| compare_candidates(a, b, &weights));

    let selection = match best {
        Some(task) => {
            debug!(task_id = task.id, "Selected next task");
            Selection::Next(task.clone())
        }
        None => {
            debug!(candidates = reports.len(), "All candidate tasks are blocked");
            Selection::Blocked(reports)
        }
    };

    NextTask {
        selection,
        warnings,
    }
}
