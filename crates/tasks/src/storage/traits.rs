//! Storage trait definitions.

use async_trait::async_trait;

use crate::domain::ComplexityReport;
use crate::entities::TaskGraph;
use crate::errors::TasksResult;

/// Storage interface for task persistence
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize storage (create directories and an empty task list)
    async fn initialize(&self) -> TasksResult<()>;

    /// Get storage type identifier
    fn storage_type(&self) -> &'static str;

    /// Check if storage is initialized
    async fn is_initialized(&self) -> TasksResult<bool>;

    // === Graph Operations ===

    /// Load the task graph snapshot
    async fn load_graph(&self) -> TasksResult<TaskGraph>;

    /// Replace the stored snapshot
    async fn save_graph(&self, graph: &TaskGraph) -> TasksResult<()>;

    // === Reports ===

    /// Load the last complexity report, if one was saved
    async fn load_report(&self) -> TasksResult<Option<ComplexityReport>>;

    /// Save a complexity report
    async fn save_report(&self, report: &ComplexityReport) -> TasksResult<()>;
}
