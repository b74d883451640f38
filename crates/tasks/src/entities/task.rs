//! Task entity and related types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Subtask;
use crate::errors::TasksError;

/// Task status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
    Deferred,
}

impl TaskStatus {
    /// Whether the task is out of the candidate pool for selection.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Deferred)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Deferred => "deferred",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = TasksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            "deferred" => Ok(Self::Deferred),
            _ => Err(TasksError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Self::Pending),
            Some(raw) => raw.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Task priority levels.
///
/// Missing or unrecognized priorities land in `Unknown`, which ranks below `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskPriority {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl TaskPriority {
    /// Selection rank, higher wins.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
            Self::Unknown => 0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::Unknown
    }

    /// Lenient mapping used when reading stored data.
    fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Self::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = TasksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" | "med" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(TasksError::InvalidPriority {
                priority: s.to_string(),
            }),
        }
    }
}

impl Serialize for TaskPriority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskPriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().map_or(Self::Unknown, Self::from_label))
    }
}

/// Complexity assessment for a single task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityInfo {
    /// Complexity score (1-10)
    pub score: u8,

    /// Recommended number of subtasks
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "recommendedSubtasks"
    )]
    pub recommended_subtasks: Option<u32>,

    /// Prompt to guide subtask generation
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "expansionPrompt"
    )]
    pub expansion_prompt: Option<String>,

    /// Reasoning for complexity score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl ComplexityInfo {
    /// Assessment substituted when the assessor cannot produce one.
    pub fn fallback() -> Self {
        Self {
            score: 5,
            recommended_subtasks: Some(3),
            expansion_prompt: None,
            reasoning: None,
        }
    }
}

/// Core task structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique positive identifier
    #[serde(deserialize_with = "numeric_id")]
    pub id: u32,

    /// Brief, descriptive title
    pub title: String,

    /// Concise description of what the task involves
    #[serde(default)]
    pub description: String,

    /// Current task status
    #[serde(default)]
    pub status: TaskStatus,

    /// Task priority level
    #[serde(default, skip_serializing_if = "TaskPriority::is_unknown")]
    pub priority: TaskPriority,

    /// References to prerequisite tasks or subtasks
    #[serde(default, with = "dependency_refs")]
    pub dependencies: Vec<String>,

    /// In-depth implementation instructions
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,

    /// Verification approach
    #[serde(
        default,
        rename = "testStrategy",
        skip_serializing_if = "String::is_empty"
    )]
    pub test_strategy: String,

    /// List of subtasks
    #[serde(default)]
    pub subtasks: Vec<Subtask>,

    /// Last complexity assessment used to expand this task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<ComplexityInfo>,
}

impl Task {
    /// Create a new pending task with minimal required fields
    pub fn new(id: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            dependencies: Vec::new(),
            details: String::new(),
            test_strategy: String::new(),
            subtasks: Vec::new(),
            complexity: None,
        }
    }

    /// Builder-style priority setter
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Builder-style dependency setter
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Get subtask by its index within this task
    pub fn subtask(&self, index: u32) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == index)
    }

    /// Get mutable subtask by its index within this task
    pub fn subtask_mut(&mut self, index: u32) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == index)
    }

    /// True when the task has subtasks and every one of them is done
    pub fn all_subtasks_done(&self) -> bool {
        !self.subtasks.is_empty() && self.subtasks.iter().all(|s| s.status == TaskStatus::Done)
    }

    /// Indices of subtasks currently marked done
    pub fn done_subtask_ids(&self) -> Vec<u32> {
        self.subtasks
            .iter()
            .filter(|s| s.status == TaskStatus::Done)
            .map(|s| s.id)
            .collect()
    }
}

/// Accept task ids written either as numbers or numeric strings.
fn numeric_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u32),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(0) => Err(serde::de::Error::custom("task id must be positive")),
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => match s.parse::<super::TaskRef>() {
            Ok(super::TaskRef::Task(n)) => Ok(n),
            _ => Err(serde::de::Error::custom(format!("invalid task id '{s}'"))),
        },
    }
}

/// Dependency lists are stored with task references as integers and subtask
/// references as `"N.M"` strings. Both shapes are accepted on read.
pub(crate) mod dependency_refs {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::entities::TaskRef;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRef {
        Number(u64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = Option::<Vec<RawRef>>::deserialize(deserializer)?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(|r| match r {
                RawRef::Number(n) => n.to_string(),
                RawRef::Float(f) => f.to_string(),
                RawRef::Text(s) => s,
            })
            .collect())
    }

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(deps: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(deps.len()))?;
        for dep in deps {
            match dep.parse::<TaskRef>() {
                Ok(TaskRef::Task(id)) => seq.serialize_element(&id)?,
                _ => seq.serialize_element(dep)?,
            }
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_new() {
        let task = Task::new(1, "Test Task", "A test task description");
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "Test Task");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Unknown);
        assert!(task.subtasks.is_empty());
    }

    #[test]
    fn test_task_status_parsing() {
        assert_eq!(
            "pending".parse::<TaskStatus>().unwrap(),
            TaskStatus::Pending
        );
        assert_eq!(" DONE ".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert_eq!(
            "deferred".parse::<TaskStatus>().unwrap(),
            TaskStatus::Deferred
        );
        assert!(matches!(
            "in-progress".parse::<TaskStatus>(),
            Err(TasksError::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(TaskPriority::High.rank() > TaskPriority::Medium.rank());
        assert!(TaskPriority::Medium.rank() > TaskPriority::Low.rank());
        assert!(TaskPriority::Low.rank() > TaskPriority::Unknown.rank());
    }

    #[test]
    fn test_deserialize_defaults() {
        let task: Task = serde_json::from_value(json!({
            "id": 3,
            "title": "Bare task"
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Unknown);
        assert!(task.dependencies.is_empty());
        assert_eq!(task.description, "");
    }

    #[test]
    fn test_unrecognized_priority_is_unknown() {
        let task: Task = serde_json::from_value(json!({
            "id": 1,
            "title": "T",
            "priority": "urgent"
        }))
        .unwrap();
        assert_eq!(task.priority, TaskPriority::Unknown);
    }

    #[test]
    fn test_non_string_priority_is_unknown() {
        for raw in [json!(2), json!(null), json!(true), json!({ "level": "high" })] {
            let task: Task = serde_json::from_value(json!({
                "id": 1,
                "title": "T",
                "priority": raw
            }))
            .unwrap();
            assert_eq!(task.priority, TaskPriority::Unknown);
        }
    }

    #[test]
    fn test_invalid_status_rejected() {
        let result: Result<Task, _> = serde_json::from_value(json!({
            "id": 1,
            "title": "T",
            "status": "in-progress"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_mixed_dependency_refs() {
        let task: Task = serde_json::from_value(json!({
            "id": 7,
            "title": "T",
            "dependencies": [1, "2", "4.2"]
        }))
        .unwrap();
        assert_eq!(task.dependencies, vec!["1", "2", "4.2"]);

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["dependencies"], json!([1, 2, "4.2"]));
        assert!(value.get("priority").is_none());
    }

    #[test]
    fn test_all_subtasks_done() {
        let mut task = Task::new(1, "Test", "Test");
        assert!(!task.all_subtasks_done());

        task.subtasks.push(Subtask::new(1, "Sub 1", "Description"));
        task.subtasks.push(Subtask::new(2, "Sub 2", "Description"));
        task.subtasks[0].status = TaskStatus::Done;
        assert!(!task.all_subtasks_done());
        assert_eq!(task.done_subtask_ids(), vec![1]);

        task.subtasks[1].status = TaskStatus::Done;
        assert!(task.all_subtasks_done());
    }
}
