//! File-based storage implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use super::traits::Storage;
use crate::domain::ComplexityReport;
use crate::entities::TaskGraph;
use crate::errors::{TasksError, TasksResult};

/// Name of the complexity report file under `.tasks/reports/`
pub const REPORT_FILE_NAME: &str = "task-complexity-report.json";

/// File-based storage implementation
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Project root path
    project_path: PathBuf,

    /// Path to tasks directory (.tasks/)
    tasks_dir: PathBuf,

    /// Path to tasks.json
    tasks_file: PathBuf,

    /// Path to the complexity report
    report_file: PathBuf,

    /// Whether `tasks_file` was given explicitly
    custom_tasks_file: bool,
}

impl FileStorage {
    /// Create a new file storage instance
    ///
    /// Uses `.tasks/` directory for project task storage.
    pub fn new(project_path: impl AsRef<Path>) -> Self {
        let project_path = project_path.as_ref().to_path_buf();
        let tasks_dir = project_path.join(".tasks");
        let tasks_file = tasks_dir.join("tasks").join("tasks.json");
        let report_file = tasks_dir.join("reports").join(REPORT_FILE_NAME);

        Self {
            project_path,
            tasks_dir,
            tasks_file,
            report_file,
            custom_tasks_file: false,
        }
    }

    /// Read and write the task graph at an explicit path instead of
    /// `.tasks/tasks/tasks.json`.
    pub fn with_tasks_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tasks_file = path.into();
        self.custom_tasks_file = true;
        self
    }

    /// Read and write the complexity report at an explicit path.
    pub fn with_report_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_file = path.into();
        self
    }

    /// Get the project path
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Get the tasks directory path
    pub fn tasks_dir(&self) -> &Path {
        &self.tasks_dir
    }

    pub fn tasks_file(&self) -> &Path {
        &self.tasks_file
    }

    pub fn report_file(&self) -> &Path {
        &self.report_file
    }

    /// Read and parse the tasks file
    async fn read_tasks_file(&self) -> TasksResult<Value> {
        match fs::read_to_string(&self.tasks_file).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| TasksError::CorruptGraph {
                reason: format!("{}: {e}", self.tasks_file.display()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.custom_tasks_file => {
                Err(TasksError::NotInitialized)
            }
            Err(e) => Err(TasksError::FileReadError {
                path: self.tasks_file.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Write pretty JSON to `path`, creating parent directories
    async fn write_json(path: &Path, data: &Value) -> TasksResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(data)?;
        fs::write(path, content)
            .await
            .map_err(|e| TasksError::FileWriteError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Build metadata for saving
    fn build_metadata(graph: &TaskGraph) -> Value {
        serde_json::json!({
            "version": "1.0.0",
            "lastModified": Utc::now().to_rfc3339(),
            "taskCount": graph.len(),
            "completedCount": graph.completed_count(),
        })
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> TasksResult<()> {
        fs::create_dir_all(self.tasks_dir.join("tasks")).await?;
        fs::create_dir_all(self.tasks_dir.join("reports")).await?;

        if !self.tasks_file.exists() {
            self.save_graph(&TaskGraph::default()).await?;
        }

        Ok(())
    }

    fn storage_type(&self) -> &'static str {
        "file"
    }

    async fn is_initialized(&self) -> TasksResult<bool> {
        Ok(self.tasks_file.exists())
    }

    async fn load_graph(&self) -> TasksResult<TaskGraph> {
        let data = self.read_tasks_file().await?;
        let graph = TaskGraph::from_value(&data)?;
        debug!(
            path = %self.tasks_file.display(),
            tasks = graph.len(),
            "Loaded task graph"
        );
        Ok(graph)
    }

    async fn save_graph(&self, graph: &TaskGraph) -> TasksResult<()> {
        let data = serde_json::json!({
            "tasks": graph.tasks,
            "metadata": Self::build_metadata(graph),
        });
        Self::write_json(&self.tasks_file, &data).await?;
        debug!(
            path = %self.tasks_file.display(),
            tasks = graph.len(),
            "Saved task graph"
        );
        Ok(())
    }

    async fn load_report(&self) -> TasksResult<Option<ComplexityReport>> {
        match fs::read_to_string(&self.report_file).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TasksError::FileReadError {
                path: self.report_file.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn save_report(&self, report: &ComplexityReport) -> TasksResult<()> {
        let data = serde_json::to_value(report)?;
        Self::write_json(&self.report_file, &data).await
    }
}
