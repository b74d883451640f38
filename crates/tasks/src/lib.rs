#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

//! # Taskmaster
//!
//! A dependency-aware task engine for AI-driven development workflows.
//!
//! This crate provides:
//! - Tasks and subtasks addressed as `"N"` / `"N.M"`, with dependencies
//! - Status propagation between a task and its subtasks
//! - Next-task selection by readiness, priority and unblock weight
//! - Complexity-driven expansion of tasks into subtasks
//! - File-based storage in the `.tasks/` directory
//! - Model-backed task generation and complexity analysis
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskmaster::{FileStorage, Selection, TasksDomain};
//!
//! let domain = TasksDomain::new(Arc::new(FileStorage::new(".")));
//!
//! if let Selection::Next(task) = domain.next_task().await?.selection {
//!     println!("work on {}: {}", task.id, task.title);
//! }
//! ```

pub mod ai;
pub mod domain;
pub mod entities;
pub mod errors;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use domain::{AIDomain, Collaborators, ConfigDomain, Selection, TasksDomain};
pub use entities::{Subtask, Task, TaskGraph, TaskPriority, TaskRef, TaskStatus};
pub use errors::{TasksError, TasksResult};
pub use storage::{FileStorage, Storage};
