//! AI Domain - generator-backed operations for task management.
//!
//! This module wires the collaborators to storage:
//! - Generate tasks from a requirements document
//! - Expand one or all tasks into subtasks
//! - Analyze task complexity and keep the report

use std::sync::Arc;

use tracing::{info, warn};

use super::complexity::{self, ComplexityReport};
use super::expand::{self, validate_tasks, ExpandOutcome, ExpandRequest};
use super::generation::{ComplexityAssessor, SubtaskGenerator, TaskGenerator, TaskRequest};
use crate::entities::{ComplexityInfo, GlobalConfig, Task, TaskGraph, TaskStatus};
use crate::errors::{TasksError, TasksResult};
use crate::storage::Storage;

/// The three external collaborators used by [`AIDomain`].
#[derive(Clone)]
pub struct Collaborators {
    pub tasks: Arc<dyn TaskGenerator>,
    pub subtasks: Arc<dyn SubtaskGenerator>,
    pub assessor: Arc<dyn ComplexityAssessor>,
}

impl Collaborators {
    /// Use one value for all three roles.
    pub fn shared<G>(generator: Arc<G>) -> Self
    where
        G: TaskGenerator + SubtaskGenerator + ComplexityAssessor + 'static,
    {
        Self {
            tasks: Arc::clone(&generator) as Arc<dyn TaskGenerator>,
            subtasks: Arc::clone(&generator) as Arc<dyn SubtaskGenerator>,
            assessor: generator,
        }
    }
}

/// Options for `expand` commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    pub count: Option<u32>,
    pub hint: Option<String>,
    pub force: bool,
}

/// Per-task result of expanding every pending task.
#[derive(Debug)]
pub struct ExpandAllResult {
    pub task_id: u32,
    pub outcome: TasksResult<ExpandOutcome>,
}

/// Options for requirements parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub num_tasks: u32,
    /// Keep existing tasks and number new ones after them
    pub append: bool,
}

/// AI Domain for generator-backed task operations.
pub struct AIDomain {
    storage: Arc<dyn Storage>,
    collaborators: Collaborators,
    settings: GlobalConfig,
}

impl AIDomain {
    /// Create a new AI domain.
    pub fn new(storage: Arc<dyn Storage>, collaborators: Collaborators) -> Self {
        Self {
            storage,
            collaborators,
            settings: GlobalConfig::default(),
        }
    }

    /// Use project settings for default priority and project name.
    pub fn with_settings(mut self, settings: GlobalConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Generate tasks from requirements text and store them.
    ///
    /// Without `append` the stored graph is replaced.
    pub async fn parse_prd(&self, requirements: &str, options: &ParseOptions) -> TasksResult<Vec<Task>> {
        if requirements.trim().is_empty() {
            return Err(TasksError::InvalidArgument {
                reason: "requirements document is empty".to_string(),
            });
        }

        let mut graph = if options.append {
            self.storage.load_graph().await?
        } else {
            TaskGraph::default()
        };

        let request = TaskRequest {
            requirements: requirements.to_string(),
            num_tasks: options.num_tasks,
            next_id: graph.next_task_id(),
            default_priority: self.settings.default_priority,
        };

        info!(next_id = request.next_id, num_tasks = request.num_tasks, "Generating tasks");
        let drafts = self.collaborators.tasks.generate_tasks(&request).await?;
        if drafts.is_empty() {
            return Err(TasksError::GenerationFailure {
                reason: "generator returned no tasks".to_string(),
            });
        }

        let tasks = validate_tasks(drafts, &graph, self.settings.default_priority)?;
        graph.append(tasks.iter().cloned());
        self.storage.save_graph(&graph).await?;

        info!(count = tasks.len(), "Tasks generated");
        Ok(tasks)
    }

    /// Complexity for a task: saved report first, then the assessor, then the
    /// fallback.
    async fn complexity_for(&self, task: &Task, report: Option<&ComplexityReport>) -> ComplexityInfo {
        if let Some(analysis) = report.and_then(|r| r.find(task.id)) {
            return analysis.to_complexity_info();
        }
        expand::assess_or_default(self.collaborators.assessor.as_ref(), task).await
    }

    async fn saved_report(&self) -> Option<ComplexityReport> {
        match self.storage.load_report().await {
            Ok(report) => report,
            Err(e) => {
                warn!("Ignoring unreadable complexity report: {e}");
                None
            }
        }
    }

    async fn expand_in(
        &self,
        graph: &mut TaskGraph,
        task_id: u32,
        options: &ExpandOptions,
        report: Option<&ComplexityReport>,
    ) -> TasksResult<ExpandOutcome> {
        let task = graph.get_task(task_id)?;
        let complexity = if task.subtasks.is_empty() || options.force {
            let task = task.clone();
            self.complexity_for(&task, report).await
        } else {
            ComplexityInfo::fallback()
        };

        let request = ExpandRequest {
            task_id,
            complexity,
            count: options.count,
            hint: options.hint.clone(),
            force: options.force,
        };
        expand::expand(graph, request, self.collaborators.subtasks.as_ref()).await
    }

    /// Expand a single task and save the result.
    pub async fn expand_task(&self, task_id: u32, options: &ExpandOptions) -> TasksResult<ExpandOutcome> {
        let mut graph = self.storage.load_graph().await?;
        let report = self.saved_report().await;

        let outcome = self.expand_in(&mut graph, task_id, options, report.as_ref()).await?;
        if matches!(outcome, ExpandOutcome::Expanded { .. }) {
            self.storage.save_graph(&graph).await?;
        }
        Ok(outcome)
    }

    /// Expand every pending task, continuing past failures.
    pub async fn expand_all(&self, options: &ExpandOptions) -> TasksResult<Vec<ExpandAllResult>> {
        let mut graph = self.storage.load_graph().await?;
        let report = self.saved_report().await;

        let pending: Vec<u32> = graph
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| t.id)
            .collect();

        let mut results = Vec::with_capacity(pending.len());
        for task_id in pending {
            let outcome = self.expand_in(&mut graph, task_id, options, report.as_ref()).await;
            if let Err(e) = &outcome {
                warn!(task_id, "Expansion failed: {e}");
            }
            results.push(ExpandAllResult { task_id, outcome });
        }

        if results
            .iter()
            .any(|r| matches!(r.outcome, Ok(ExpandOutcome::Expanded { .. })))
        {
            self.storage.save_graph(&graph).await?;
        }
        Ok(results)
    }

    /// Assess every open task and save the report.
    pub async fn analyze_complexity(&self, threshold: u8) -> TasksResult<ComplexityReport> {
        let graph = self.storage.load_graph().await?;
        let mut report =
            complexity::analyze_complexity(&graph, self.collaborators.assessor.as_ref(), threshold)
                .await;
        report.meta.project_name.clone_from(&self.settings.project_name);

        self.storage.save_report(&report).await?;
        Ok(report)
    }

    /// Last saved complexity report
    pub async fn complexity_report(&self) -> TasksResult<Option<ComplexityReport>> {
        self.storage.load_report().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::complexity::{ReportMeta, TaskAnalysis};
    use crate::domain::generation::{
        MockComplexityAssessor, MockSubtaskGenerator, MockTaskGenerator, SubtaskDraft, TaskDraft,
    };
    use crate::entities::{Subtask, TaskPriority};
    use crate::storage::FileStorage;
    use chrono::Utc;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        storage: Arc<dyn Storage>,
    }

    async fn fixture(tasks: Vec<Task>) -> Fixture {
        let temp = TempDir::new().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(temp.path()));
        storage.initialize().await.unwrap();
        storage.save_graph(&TaskGraph::new(tasks)).await.unwrap();
        Fixture {
            _temp: temp,
            storage,
        }
    }

    fn domain(
        storage: &Arc<dyn Storage>,
        tasks: MockTaskGenerator,
        subtasks: MockSubtaskGenerator,
        assessor: MockComplexityAssessor,
    ) -> AIDomain {
        AIDomain::new(
            Arc::clone(storage),
            Collaborators {
                tasks: Arc::new(tasks),
                subtasks: Arc::new(subtasks),
                assessor: Arc::new(assessor),
            },
        )
    }

    fn drafts(n: u32) -> Vec<SubtaskDraft> {
        (1..=n)
            .map(|i| SubtaskDraft::new(format!("Step {i}"), "details"))
            .collect()
    }

    #[tokio::test]
    async fn test_parse_prd_replaces_or_appends() {
        let fx = fixture(vec![Task::new(1, "Old", "d")]).await;

        let mut tasks = MockTaskGenerator::new();
        tasks
            .expect_generate_tasks()
            .withf(|req| req.next_id == 1 && req.default_priority == TaskPriority::High)
            .times(1)
            .returning(|_| Ok(vec![TaskDraft::new("Setup", "init repo"), TaskDraft::new("Build", "core")]));
        tasks
            .expect_generate_tasks()
            .withf(|req| req.next_id == 3)
            .times(1)
            .returning(|_| Ok(vec![TaskDraft::new("Ship", "release")]));

        let mut settings = GlobalConfig::default();
        settings.default_priority = TaskPriority::High;
        let ai = domain(
            &fx.storage,
            tasks,
            MockSubtaskGenerator::new(),
            MockComplexityAssessor::new(),
        )
        .with_settings(settings);

        let options = ParseOptions {
            num_tasks: 2,
            append: false,
        };
        let created = ai.parse_prd("Build a thing", &options).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].priority, TaskPriority::High);

        let options = ParseOptions {
            num_tasks: 1,
            append: true,
        };
        ai.parse_prd("More", &options).await.unwrap();

        let graph = fx.storage.load_graph().await.unwrap();
        let titles: Vec<&str> = graph.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Setup", "Build", "Ship"]);
    }

    #[tokio::test]
    async fn test_parse_prd_failure_keeps_graph() {
        let fx = fixture(vec![Task::new(1, "Old", "d")]).await;

        let mut tasks = MockTaskGenerator::new();
        tasks
            .expect_generate_tasks()
            .returning(|_| Ok(vec![TaskDraft::default()]));

        let ai = domain(
            &fx.storage,
            tasks,
            MockSubtaskGenerator::new(),
            MockComplexityAssessor::new(),
        );
        let options = ParseOptions {
            num_tasks: 1,
            append: false,
        };
        assert!(matches!(
            ai.parse_prd("Reqs", &options).await,
            Err(TasksError::GenerationFailure { .. })
        ));
        assert_eq!(fx.storage.load_graph().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_expand_task_prefers_saved_report() {
        let fx = fixture(vec![Task::new(1, "Big", "d")]).await;
        fx.storage
            .save_report(&ComplexityReport {
                meta: ReportMeta {
                    generated_at: Utc::now(),
                    threshold: 5,
                    tasks_analyzed: 1,
                    project_name: None,
                },
                complexity_analysis: vec![TaskAnalysis {
                    task_id: 1,
                    task_title: "Big".to_string(),
                    complexity_score: 9,
                    recommended_subtasks: 5,
                    expansion_prompt: "by module".to_string(),
                    reasoning: String::new(),
                }],
                failures: Vec::new(),
            })
            .await
            .unwrap();

        let mut assessor = MockComplexityAssessor::new();
        assessor.expect_assess().never();
        let mut subtasks = MockSubtaskGenerator::new();
        subtasks
            .expect_generate_subtasks()
            .withf(|req| req.count == 5 && req.complexity.expansion_prompt.as_deref() == Some("by module"))
            .returning(|req| Ok(drafts(req.count)));

        let ai = domain(&fx.storage, MockTaskGenerator::new(), subtasks, assessor);
        let outcome = ai.expand_task(1, &ExpandOptions::default()).await.unwrap();
        assert!(matches!(outcome, ExpandOutcome::Expanded { ref subtasks, .. } if subtasks.len() == 5));

        let graph = fx.storage.load_graph().await.unwrap();
        assert_eq!(graph.task(1).unwrap().subtasks.len(), 5);
        assert_eq!(graph.task(1).unwrap().complexity.as_ref().unwrap().score, 9);
    }

    #[tokio::test]
    async fn test_expand_all_continues_past_failures() {
        let mut done = Task::new(3, "Done", "d");
        done.status = TaskStatus::Done;
        let mut expanded = Task::new(4, "Expanded", "d");
        expanded.subtasks.push(Subtask::new(1, "Existing", "d"));
        let fx = fixture(vec![Task::new(1, "One", "d"), Task::new(2, "Two", "d"), done, expanded]).await;

        let mut assessor = MockComplexityAssessor::new();
        assessor
            .expect_assess()
            .times(2)
            .returning(|_| Err(TasksError::Ai("offline".to_string())));
        let mut subtasks = MockSubtaskGenerator::new();
        subtasks.expect_generate_subtasks().times(2).returning(|req| {
            if req.task.id == 2 {
                Ok(vec![SubtaskDraft::default()])
            } else {
                Ok(drafts(req.count))
            }
        });

        let ai = domain(&fx.storage, MockTaskGenerator::new(), subtasks, assessor);
        let results = ai.expand_all(&ExpandOptions::default()).await.unwrap();

        let ids: Vec<u32> = results.iter().map(|r| r.task_id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert!(matches!(results[0].outcome, Ok(ExpandOutcome::Expanded { .. })));
        assert!(matches!(results[1].outcome, Err(TasksError::MalformedSubtask { .. })));
        assert!(matches!(results[2].outcome, Ok(ExpandOutcome::AlreadyExpanded { .. })));

        let graph = fx.storage.load_graph().await.unwrap();
        assert_eq!(graph.task(1).unwrap().subtasks.len(), 3);
        assert!(graph.task(2).unwrap().subtasks.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_complexity_saves_report() {
        let fx = fixture(vec![Task::new(1, "One", "d")]).await;
        let mut assessor = MockComplexityAssessor::new();
        assessor.expect_assess().returning(|_| Ok(ComplexityInfo::fallback()));

        let mut settings = GlobalConfig::default();
        settings.project_name = Some("demo".to_string());
        let ai = domain(&fx.storage, MockTaskGenerator::new(), MockSubtaskGenerator::new(), assessor)
            .with_settings(settings);

        let report = ai.analyze_complexity(6).await.unwrap();
        assert_eq!(report.meta.threshold, 6);
        assert_eq!(report.meta.project_name.as_deref(), Some("demo"));
        assert_eq!(ai.complexity_report().await.unwrap(), Some(report));
    }
}
