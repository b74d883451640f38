//! Core data structures for task management.

mod config;
mod graph;
mod id;
mod subtask;
mod task;

pub use config::{GlobalConfig, ModelConfig, ModelRole, ModelSettings, TasksConfig};
pub use graph::{Resolved, TaskGraph};
pub use id::TaskRef;
pub use subtask::Subtask;
pub use task::{ComplexityInfo, Task, TaskPriority, TaskStatus};
