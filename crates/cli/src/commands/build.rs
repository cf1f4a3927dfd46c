use anyhow::Result;
use colored::*;
use kiln_core::execution::{RunReport, TaskState};
use kiln_core::{CancellationToken, KilnError, ProjectManager};

use crate::style::{elapsed, task_label};

pub async fn execute(
    manager: &ProjectManager,
    task: &str,
    cancel: CancellationToken,
) -> Result<()> {
    println!("{} {}", "Building".bold(), task_label(task));
    println!();

    match manager.build(task, cancel).await {
        Ok(report) => {
            print_report(&report);
            println!();
            println!(
                "{} {}",
                "✓".green().bold(),
                "All tasks completed successfully!".green().bold()
            );
            Ok(())
        }
        Err(KilnError::TasksFailed(report)) => {
            print_report(&report);
            println!();
            Err(KilnError::TasksFailed(report).into())
        }
        Err(err) => Err(err.into()),
    }
}

pub fn print_report(report: &RunReport) {
    for outcome in report.outcomes() {
        match outcome.state {
            TaskState::Succeeded => println!(
                "  {} {} {}",
                "✓".green().bold(),
                task_label(&outcome.id),
                elapsed(outcome.duration).dimmed()
            ),
            TaskState::Failed => println!(
                "  {} {} {}",
                "✗".red().bold(),
                task_label(&outcome.id),
                outcome.cause().unwrap_or_default().red()
            ),
            TaskState::Skipped => println!(
                "  {} {} {}",
                "-".yellow().bold(),
                task_label(&outcome.id),
                format!("skipped: {}", outcome.cause().unwrap_or_default()).yellow()
            ),
            TaskState::Pending | TaskState::Running => println!(
                "  {} {} {}",
                "?".dimmed(),
                task_label(&outcome.id),
                outcome.state.to_string().dimmed()
            ),
        }
    }
}
