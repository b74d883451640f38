//! Taskmaster CLI - dependency-aware task tracking for AI-driven development.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::disallowed_macros)]
#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use taskmaster::ai::AiGenerator;
use taskmaster::domain::{
    AIDomain, Collaborators, ConfigDomain, ExpandOptions, ExpandOutcome, ParseOptions, Selection,
    TasksDomain, DEFAULT_THRESHOLD,
};
use taskmaster::entities::{ModelRole, ModelSettings, TaskStatus};
use taskmaster::errors::{TasksError, TasksResult};
use taskmaster::storage::{FileStorage, Storage};
use taskmaster::ui;

#[derive(Parser)]
#[command(name = "taskmaster")]
#[command(about = "Dependency-aware task tracking for AI-driven development", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root directory
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Tasks file to use instead of .tasks/tasks/tasks.json
    #[arg(long, global = true)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with tasks structure
    Init,

    /// List all tasks
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,

        /// Include subtasks
        #[arg(long)]
        with_subtasks: bool,
    },

    /// Show details of a task ("N") or subtask ("N.M")
    Show {
        /// Task or subtask ID(s), comma-separated
        id: String,
    },

    /// Show the next task to work on
    Next,

    /// Set task status
    SetStatus {
        /// Task or subtask ID(s), comma-separated
        #[arg(short, long)]
        id: String,

        /// New status (pending, done, deferred)
        #[arg(short, long)]
        status: String,
    },

    /// Expand a task into subtasks using AI
    Expand {
        /// Task ID to expand
        #[arg(short, long, required_unless_present = "all", conflicts_with = "all")]
        id: Option<u32>,

        /// Expand every pending task
        #[arg(long)]
        all: bool,

        /// Number of subtasks to generate
        #[arg(short, long)]
        num: Option<u32>,

        /// Use the research model
        #[arg(short, long)]
        research: bool,

        /// Additional guidance for the generator
        #[arg(short, long)]
        prompt: Option<String>,

        /// Replace existing subtasks
        #[arg(short, long)]
        force: bool,
    },

    /// Analyze task complexity
    AnalyzeComplexity {
        /// Score at or above which expansion is recommended (1-10)
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_THRESHOLD,
            value_parser = clap::value_parser!(u8).range(1..=10)
        )]
        threshold: u8,

        /// Use the research model
        #[arg(short, long)]
        research: bool,

        /// Output file for report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// View complexity report
    ComplexityReport {
        /// Report file path
        #[arg(short = 'r', long = "report")]
        report: Option<PathBuf>,
    },

    /// Parse a requirements document and generate tasks
    ParsePrd {
        /// Path to the requirements file
        input: PathBuf,

        /// Number of tasks to generate (0 = auto, default from config)
        #[arg(short, long)]
        num_tasks: Option<u32>,

        /// Keep existing tasks and add the new ones after them
        #[arg(long)]
        append: bool,

        /// Use the research model
        #[arg(short, long)]
        research: bool,
    },

    /// Check dependencies for missing references, duplicate ids and cycles
    ValidateDeps,

    /// Configure AI models
    Models {
        /// Set main model (`provider:model_id`)
        #[arg(long)]
        set_main: Option<String>,

        /// Set research model (`provider:model_id`)
        #[arg(long)]
        set_research: Option<String>,
    },
}

fn get_project_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let project_path = get_project_path(cli.project.clone());

    // Config may be missing or broken; logging still has to come up.
    let log_level = ConfigDomain::new(&project_path)
        .get_global_settings()
        .await
        .map_or_else(|_| "warn".to_string(), |g| g.log_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli, project_path).await {
        ui::print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, project_path: PathBuf) -> TasksResult<()> {
    let mut storage = FileStorage::new(&project_path);
    if let Some(file) = cli.file {
        storage = storage.with_tasks_file(file);
    }
    let tasks_domain = TasksDomain::new(Arc::new(storage.clone()) as Arc<dyn Storage>);
    let config_domain = ConfigDomain::new(&project_path);

    match cli.command {
        Commands::Init => {
            if tasks_domain.is_initialized().await? {
                ui::print_warning("Project already initialized");
                return Ok(());
            }

            tasks_domain.init().await?;
            config_domain.ensure_exists().await?;

            ui::print_success("Project initialized successfully!");
            ui::print_info(&format!(
                "Tasks directory created at: {}",
                storage.tasks_dir().display()
            ));
        }

        Commands::List {
            status,
            with_subtasks,
        } => {
            let status_filter = status.map(|s| s.parse::<TaskStatus>()).transpose()?;
            let tasks = tasks_domain.list_tasks(status_filter).await?;

            if tasks.is_empty() {
                ui::print_info("No tasks found");
            } else {
                println!("{}", ui::task_table(&tasks, with_subtasks));
                println!();
                ui::print_info(&format!("{} task(s) total", tasks.len()));
            }
        }

        Commands::Show { id } => {
            for reference in id.split(',').map(str::trim) {
                let item = tasks_domain.get(reference).await?;
                ui::display_item(&item);
            }
        }

        Commands::Next => {
            let next = tasks_domain.next_task().await?;
            ui::display_unresolvable(&next.warnings);

            match next.selection {
                Selection::Next(task) => {
                    ui::print_success(&format!("Next task: {} - {}", task.id, task.title));
                    println!();
                    ui::display_task_details(&task);
                }
                Selection::Blocked(candidates) => ui::display_blocked(&candidates),
                Selection::Exhausted => ui::print_info("All tasks are done or deferred"),
            }
        }

        Commands::SetStatus { id, status } => {
            let ids: Vec<&str> = id.split(',').map(str::trim).collect();
            let updates = tasks_domain.set_status(&ids, &status).await?;

            for update in &updates {
                ui::display_status_update(update);
            }
        }

        Commands::Expand {
            id,
            all,
            num,
            research,
            prompt,
            force,
        } => {
            let ai = ai_domain(&storage, &config_domain, research).await?;
            let options = ExpandOptions {
                count: num,
                hint: prompt,
                force,
            };

            if all {
                let pb = spinner("Expanding pending tasks...");
                let results = ai.expand_all(&options).await;
                pb.finish_and_clear();

                let results = results?;
                if results.is_empty() {
                    ui::print_info("No pending tasks to expand");
                }
                for result in results {
                    match result.outcome {
                        Ok(outcome) => report_expansion(&outcome),
                        Err(e) => ui::print_error(&format!("Task {}: {e}", result.task_id)),
                    }
                }
            } else if let Some(task_id) = id {
                let pb = spinner(&format!("Expanding task {task_id}..."));
                let outcome = ai.expand_task(task_id, &options).await;
                pb.finish_and_clear();

                report_expansion(&outcome?);
            }
        }

        Commands::AnalyzeComplexity {
            threshold,
            research,
            output,
        } => {
            let storage = match output {
                Some(path) => storage.with_report_file(path),
                None => storage,
            };
            let ai = ai_domain(&storage, &config_domain, research).await?;

            let pb = spinner("Analyzing task complexity...");
            let report = ai.analyze_complexity(threshold).await;
            pb.finish_and_clear();
            let report = report?;

            println!("{}", ui::complexity_table(&report));
            for failure in &report.failures {
                ui::print_warning(&format!("Task {}: {}", failure.task_id, failure.reason));
            }
            let candidates = report.expansion_candidates().len();
            ui::print_success(&format!(
                "Analyzed {} task(s), {} recommended for expansion",
                report.meta.tasks_analyzed, candidates
            ));
            ui::print_info(&format!("Report saved to {}", storage.report_file().display()));
        }

        Commands::ComplexityReport { report } => {
            let storage = match report {
                Some(path) => storage.with_report_file(path),
                None => storage,
            };

            match storage.load_report().await? {
                Some(report) => {
                    println!("{}", "Complexity Report".bold().underline());
                    println!(
                        "  Generated: {}  Threshold: {}",
                        report.meta.generated_at.to_rfc3339(),
                        report.meta.threshold
                    );
                    println!();
                    println!("{}", ui::complexity_table(&report));
                }
                None => ui::print_info(&format!(
                    "No complexity report at {}. Run analyze-complexity first.",
                    storage.report_file().display()
                )),
            }
        }

        Commands::ParsePrd {
            input,
            num_tasks,
            append,
            research,
        } => {
            let requirements =
                tokio::fs::read_to_string(&input)
                    .await
                    .map_err(|e| TasksError::FileReadError {
                        path: input.display().to_string(),
                        reason: e.to_string(),
                    })?;
            let settings = config_domain.get_global_settings().await?;
            let options = ParseOptions {
                num_tasks: num_tasks.unwrap_or(settings.default_num_tasks),
                append,
            };
            let ai = ai_domain(&storage, &config_domain, research).await?;

            let pb = spinner("Generating tasks...");
            let tasks = ai.parse_prd(&requirements, &options).await;
            pb.finish_and_clear();
            let tasks = tasks?;

            println!("{}", ui::task_table(&tasks, false));
            ui::print_success(&format!("Generated {} task(s)", tasks.len()));
        }

        Commands::ValidateDeps => {
            let report = tasks_domain.validate_dependencies().await?;
            ui::display_validation(&report);
        }

        Commands::Models {
            set_main,
            set_research,
        } => {
            if set_main.is_none() && set_research.is_none() {
                let models = config_domain.get_models().await?;

                println!("{}", "Model Configuration".bold().underline());
                println!();
                for (label, settings, role) in [
                    ("Main", models.main.as_ref(), ModelRole::Main),
                    ("Research", models.research.as_ref(), ModelRole::Research),
                ] {
                    match settings {
                        Some(s) => println!("  {}: {}:{}", label.cyan(), s.provider, s.model_id),
                        None => {
                            let default = models.settings_for(role);
                            println!(
                                "  {}: {}:{} {}",
                                label.cyan(),
                                default.provider,
                                default.model_id,
                                "(default)".dimmed()
                            );
                        }
                    }
                }
            } else {
                if let Some(main) = set_main {
                    let settings = ModelSettings::from_spec(&main)?;
                    config_domain.set_model(ModelRole::Main, settings).await?;
                    ui::print_success(&format!("Main model set to {main}"));
                }
                if let Some(research) = set_research {
                    let settings = ModelSettings::from_spec(&research)?;
                    config_domain.set_model(ModelRole::Research, settings).await?;
                    ui::print_success(&format!("Research model set to {research}"));
                }
            }
        }
    }

    Ok(())
}

async fn ai_domain(
    storage: &FileStorage,
    config: &ConfigDomain,
    research: bool,
) -> TasksResult<AIDomain> {
    let role = if research {
        ModelRole::Research
    } else {
        ModelRole::Main
    };
    let settings = config.model_for(role).await?;
    let generator = AiGenerator::from_settings(settings)?.with_research(research);
    let global = config.get_global_settings().await?;

    Ok(AIDomain::new(
        Arc::new(storage.clone()) as Arc<dyn Storage>,
        Collaborators::shared(Arc::new(generator)),
    )
    .with_settings(global))
}

fn report_expansion(outcome: &ExpandOutcome) {
    match outcome {
        ExpandOutcome::Expanded { task_id, subtasks } => {
            ui::print_success(&format!(
                "Task {task_id} expanded into {} subtask(s)",
                subtasks.len()
            ));
            for subtask in subtasks {
                println!("  {} {task_id}.{} {}", "•".dimmed(), subtask.id, subtask.title);
            }
        }
        ExpandOutcome::AlreadyExpanded { task_id, existing } => ui::print_warning(&format!(
            "Task {task_id} already has {existing} subtask(s); use --force to replace them"
        )),
    }
}
