//! Subtask entity.

use serde::{Deserialize, Deserializer, Serialize};

use super::task::{dependency_refs, TaskStatus};
use super::TaskRef;

/// Subtask structure (nested within exactly one task)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    /// 1-based sequence number within the parent task
    #[serde(deserialize_with = "subtask_index")]
    pub id: u32,

    /// Brief, descriptive title
    pub title: String,

    /// Concise description
    #[serde(default)]
    pub description: String,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Dependencies (can reference tasks or subtasks)
    #[serde(default, with = "dependency_refs")]
    pub dependencies: Vec<String>,

    /// Implementation details
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,

    /// Test strategy
    #[serde(
        default,
        rename = "testStrategy",
        skip_serializing_if = "String::is_empty"
    )]
    pub test_strategy: String,
}

impl Subtask {
    /// Create a new pending subtask
    pub fn new(id: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::default(),
            dependencies: Vec::new(),
            details: String::new(),
            test_strategy: String::new(),
        }
    }

    /// Reference to this subtask under the given parent
    pub fn task_ref(&self, parent_id: u32) -> TaskRef {
        TaskRef::Subtask {
            parent: parent_id,
            index: self.id,
        }
    }

    /// Get full ID (parentId.subtaskId format)
    pub fn full_id(&self, parent_id: u32) -> String {
        self.task_ref(parent_id).to_string()
    }
}

/// Accept subtask ids as numbers, `"M"` or `"P.M"`.
///
/// Only the index is kept; `TaskGraph::from_value` checks that `P` names the
/// enclosing task.
fn subtask_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u32),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(0) => Err(serde::de::Error::custom("subtask id must be positive")),
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => match s.parse::<TaskRef>() {
            Ok(TaskRef::Task(index) | TaskRef::Subtask { index, .. }) => Ok(index),
            Err(_) => Err(serde::de::Error::custom(format!("invalid subtask id '{s}'"))),
        },
    }
}
