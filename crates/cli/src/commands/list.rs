use anyhow::Result;
use colored::*;
use kiln_core::ProjectManager;

use crate::style::task_label;

pub fn execute(manager: &ProjectManager) -> Result<()> {
    let spec = manager.spec();
    println!(
        "{} {}",
        "Tasks in".bold().underline(),
        format!("{}:{}:{}", spec.group, spec.name, spec.version).bold().underline()
    );

    let mut tasks: Vec<_> = manager.task_configs().iter().collect();
    tasks.sort_by(|a, b| a.name.cmp(&b.name));

    if tasks.is_empty() {
        println!("  {}", "No tasks found".dimmed());
        return Ok(());
    }

    for task in tasks {
        let kind = format!("[{}]", task.action.kind());
        match &task.description {
            Some(description) => println!(
                "{} {} {}",
                task_label(&task.name),
                kind.green(),
                description.dimmed()
            ),
            None => println!("{} {}", task_label(&task.name), kind.green()),
        }
    }

    Ok(())
}
