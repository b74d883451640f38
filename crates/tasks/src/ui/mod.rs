//! Terminal UI helpers for task display.
//!
//! This module uses println! for CLI output, which is appropriate
//! for terminal user interfaces.

#![allow(clippy::disallowed_macros)]

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::domain::{
    ComplexityReport, Readiness, StatusUpdate, TaskItem, UnresolvableDependency, ValidationReport,
};
use crate::entities::{Subtask, Task, TaskPriority, TaskStatus};

/// Get colored status string
pub fn status_colored(status: TaskStatus) -> String {
    match status {
        TaskStatus::Pending => "pending".yellow().to_string(),
        TaskStatus::Done => "done".green().to_string(),
        TaskStatus::Deferred => "deferred".blue().to_string(),
    }
}

/// Get colored priority string
pub fn priority_colored(priority: TaskPriority) -> String {
    match priority {
        TaskPriority::Low => "low".dimmed().to_string(),
        TaskPriority::Medium => "medium".normal().to_string(),
        TaskPriority::High => "high".yellow().to_string(),
        TaskPriority::Unknown => "-".dimmed().to_string(),
    }
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Yellow,
        TaskStatus::Done => Color::Green,
        TaskStatus::Deferred => Color::Blue,
    }
}

fn priority_color(priority: TaskPriority) -> Color {
    match priority {
        TaskPriority::Low | TaskPriority::Unknown => Color::DarkGrey,
        TaskPriority::Medium => Color::White,
        TaskPriority::High => Color::Yellow,
    }
}

fn deps_cell(dependencies: &[String]) -> String {
    if dependencies.is_empty() {
        "-".to_string()
    } else {
        dependencies.join(", ")
    }
}

/// Create a table for displaying tasks
pub fn task_table(tasks: &[Task], show_subtasks: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Priority").fg(Color::Cyan),
        Cell::new("Deps").fg(Color::Cyan),
        Cell::new("Subtasks").fg(Color::Cyan),
    ]);

    for task in tasks {
        let subtasks = if task.subtasks.is_empty() {
            "-".to_string()
        } else {
            let done = task
                .subtasks
                .iter()
                .filter(|s| s.status == TaskStatus::Done)
                .count();
            format!("{done}/{}", task.subtasks.len())
        };

        table.add_row(vec![
            Cell::new(task.id),
            Cell::new(&task.title),
            Cell::new(task.status.to_string()).fg(status_color(task.status)),
            Cell::new(task.priority.to_string()).fg(priority_color(task.priority)),
            Cell::new(deps_cell(&task.dependencies)),
            Cell::new(subtasks),
        ]);

        if show_subtasks {
            for subtask in &task.subtasks {
                table.add_row(vec![
                    Cell::new(format!("  {}.{}", task.id, subtask.id)).fg(Color::DarkGrey),
                    Cell::new(format!("  └─ {}", subtask.title)).fg(Color::DarkGrey),
                    Cell::new(subtask.status.to_string()).fg(status_color(subtask.status)),
                    Cell::new("-"),
                    Cell::new(deps_cell(&subtask.dependencies)),
                    Cell::new("-"),
                ]);
            }
        }
    }

    table
}

/// Create a table for a complexity report, highest score first
pub fn complexity_table(report: &ComplexityReport) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Score").fg(Color::Cyan),
        Cell::new("Subtasks").fg(Color::Cyan),
        Cell::new("Expand").fg(Color::Cyan),
    ]);

    let mut rows: Vec<_> = report.complexity_analysis.iter().collect();
    rows.sort_by(|a, b| {
        b.complexity_score
            .cmp(&a.complexity_score)
            .then(a.task_id.cmp(&b.task_id))
    });

    for analysis in rows {
        let score_color = match analysis.complexity_score {
            8..=10 => Color::Red,
            5..=7 => Color::Yellow,
            _ => Color::Green,
        };
        let expand = if analysis.needs_expansion(report.meta.threshold) {
            "yes"
        } else {
            ""
        };

        table.add_row(vec![
            Cell::new(analysis.task_id),
            Cell::new(&analysis.task_title),
            Cell::new(format!("{}/10", analysis.complexity_score)).fg(score_color),
            Cell::new(analysis.recommended_subtasks),
            Cell::new(expand).fg(Color::Yellow),
        ]);
    }

    table
}

/// Display task details in a formatted way
pub fn display_task_details(task: &Task) {
    println!("{}", "═".repeat(60).dimmed());
    println!(
        "{} {} {}",
        "Task".cyan().bold(),
        task.id.to_string().cyan().bold(),
        format!("[{}]", task.status).yellow()
    );
    println!("{}", "═".repeat(60).dimmed());
    println!();

    println!("{}: {}", "Title".bold(), task.title);
    println!("{}: {}", "Status".bold(), status_colored(task.status));
    println!("{}: {}", "Priority".bold(), priority_colored(task.priority));

    if !task.dependencies.is_empty() {
        println!("{}: {}", "Dependencies".bold(), task.dependencies.join(", "));
    }

    print_sections(&task.description, &task.details, &task.test_strategy);

    if !task.subtasks.is_empty() {
        println!();
        println!("{} ({})", "Subtasks".bold().underline(), task.subtasks.len());
        for subtask in &task.subtasks {
            println!(
                "  {} {}.{} - {} [{}]",
                "•".dimmed(),
                task.id,
                subtask.id,
                subtask.title,
                status_colored(subtask.status)
            );
        }
    }

    if let Some(ref complexity) = task.complexity {
        println!();
        println!("{}", "Complexity".bold().underline());
        println!("  Score: {}/10", complexity.score);
        if let Some(ref reasoning) = complexity.reasoning {
            println!("  Reasoning: {reasoning}");
        }
    }

    println!();
}

/// Display a subtask together with its parent
pub fn display_subtask_details(parent: &Task, subtask: &Subtask) {
    println!("{}", "═".repeat(60).dimmed());
    println!(
        "{} {} {}",
        "Subtask".cyan().bold(),
        format!("{}.{}", parent.id, subtask.id).cyan().bold(),
        format!("[{}]", subtask.status).yellow()
    );
    println!("{}", "═".repeat(60).dimmed());
    println!();

    println!("{}: {}", "Title".bold(), subtask.title);
    println!("{}: {} - {}", "Parent".bold(), parent.id, parent.title);
    println!("{}: {}", "Status".bold(), status_colored(subtask.status));
    if !subtask.dependencies.is_empty() {
        println!("{}: {}", "Dependencies".bold(), subtask.dependencies.join(", "));
    }

    print_sections(&subtask.description, &subtask.details, &subtask.test_strategy);
    println!();
}

/// Display whichever entity a reference resolved to
pub fn display_item(item: &TaskItem) {
    match item {
        TaskItem::Task(task) => display_task_details(task),
        TaskItem::Subtask { parent, subtask } => display_subtask_details(parent, subtask),
    }
}

fn print_sections(description: &str, details: &str, test_strategy: &str) {
    for (heading, body) in [
        ("Description", description),
        ("Details", details),
        ("Test Strategy", test_strategy),
    ] {
        if !body.is_empty() {
            println!();
            println!("{}", heading.bold().underline());
            println!("{body}");
        }
    }
}

/// Explain why no task is ready
pub fn display_blocked(candidates: &[Readiness]) {
    print_warning("No task is ready. Pending tasks are waiting on:");
    for candidate in candidates {
        println!("  {} {} {}", "•".dimmed(), candidate.task_id, candidate.title);
        for blocker in &candidate.blockers {
            println!("      {} {blocker}", "↳".dimmed());
        }
    }
}

/// Report references that name nothing in the graph
pub fn display_unresolvable(warnings: &[UnresolvableDependency]) {
    for warning in warnings {
        print_warning(&warning.to_string());
    }
}

/// Report a status change with cascades and inconsistencies
pub fn display_status_update(update: &StatusUpdate) {
    print_success(&format!(
        "{}: {} → {}",
        update.target,
        status_colored(update.previous),
        status_colored(update.status)
    ));
    for cascade in &update.cascades {
        print_info(&cascade.to_string());
    }
    for inconsistency in &update.inconsistencies {
        print_warning(&inconsistency.to_string());
    }
}

/// Report dependency validation results
pub fn display_validation(report: &ValidationReport) {
    if report.is_valid() {
        print_success("All dependencies are valid");
        return;
    }

    for dangling in &report.dangling {
        print_error(&dangling.to_string());
    }
    for id in &report.duplicate_ids {
        print_error(&format!("task id {id} is used more than once"));
    }
    for cycle in &report.cycles {
        let path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        print_warning(&format!("dependency cycle: {}", path.join(" → ")));
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
