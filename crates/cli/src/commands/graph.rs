use anyhow::Result;
use colored::*;
use kiln_core::ProjectManager;

use crate::style::task_label;

pub fn execute(manager: &ProjectManager) -> Result<()> {
    println!("{}", "Task Dependency Graph:".bold().underline());

    if let Err(err) = manager.full_plan() {
        println!("{} {}", "Warning:".yellow().bold(), err.to_string().yellow());
    }

    let tasks = manager.task_configs();
    if tasks.is_empty() {
        println!("  {}", "No tasks declared".dimmed());
        return Ok(());
    }

    for task in tasks {
        println!("{}", task_label(&task.name));

        match task.depends_on.as_deref() {
            Some(deps) if !deps.is_empty() => {
                println!("  {} {}", "depends on:".dimmed(), deps.join(", "))
            }
            _ => println!("  {}", "no dependencies".dimmed()),
        }
        println!();
    }

    Ok(())
}
