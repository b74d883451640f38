//! Task engine and domain facades.
//!
//! The engine modules (`status`, `next`, `expand`, `deps`, `complexity`) work
//! on an in-memory [`TaskGraph`](crate::entities::TaskGraph). The facades
//! combine them with storage and the external collaborators.

mod ai;
pub mod complexity;
mod config;
pub mod deps;
pub mod expand;
pub mod generation;
pub mod next;
pub mod status;
mod tasks;

pub use ai::{AIDomain, Collaborators, ExpandAllResult, ExpandOptions, ParseOptions};
pub use complexity::{
    analyze_complexity, AnalysisFailure, ComplexityReport, ReportMeta, TaskAnalysis,
    DEFAULT_THRESHOLD,
};
pub use config::ConfigDomain;
pub use deps::{DanglingReference, ValidationReport};
pub use expand::{
    effective_count, expand, validate_subtasks, validate_tasks, ExpandOutcome, ExpandRequest,
    DEFAULT_SUBTASK_COUNT,
};
pub use generation::{
    ComplexityAssessor, DraftId, SubtaskDraft, SubtaskGenerator, SubtaskRequest, TaskDraft,
    TaskGenerator, TaskRequest,
};
pub use next::{
    readiness, ready_tasks, select_next, Blocker, NextTask, Readiness, Selection,
    UnresolvableDependency,
};
pub use status::{apply_status, set_status, Cascade, Inconsistency, StatusUpdate};
pub use tasks::{TaskItem, TasksDomain};
