use anyhow::Result;
use colored::*;
use kiln_core::ProjectManager;

use crate::style::task_label;

pub fn execute(manager: &ProjectManager, task: &str) -> Result<()> {
    println!("{} {}", "Execution plan for".bold(), task_label(task));

    let plan = manager.execution_plan(task)?;

    println!("\n{}:", "Execution order".bold());
    for (i, planned) in plan.tasks().iter().enumerate() {
        println!(
            "  {}. {} {}",
            i + 1,
            task_label(&planned.id),
            planned.action.describe().dimmed()
        );
        if !planned.dependencies.is_empty() {
            println!(
                "     {} {}",
                "after:".dimmed(),
                planned.dependencies.join(", ")
            );
        }
    }
    println!(
        "\n{} {}",
        "Parallelism:".bold(),
        manager.parallelism()
    );

    Ok(())
}
