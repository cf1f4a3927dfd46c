use std::path::PathBuf;

use anyhow::Result;
use colored::*;
use kiln_core::{CancellationToken, KilnError, ProjectManager};

use crate::commands::build::print_report;

pub async fn execute(
    manager: &ProjectManager,
    repository: Option<PathBuf>,
    cancel: CancellationToken,
) -> Result<()> {
    let spec = manager.spec();
    println!(
        "{} {}",
        "Publishing".bold(),
        format!("{}:{}:{}", spec.group, spec.name, spec.version).cyan()
    );
    println!();

    let report = match manager.publish(repository, cancel).await {
        Ok(report) => report,
        Err(KilnError::TasksFailed(report)) => {
            print_report(&report);
            println!();
            return Err(KilnError::TasksFailed(report).into());
        }
        Err(err) => return Err(err.into()),
    };

    for (descriptor, receipt) in report.descriptors.iter().zip(&report.receipts) {
        println!(
            "{} {} {} {}",
            "✓".green().bold(),
            descriptor.coordinate.to_string().bold(),
            "->".dimmed(),
            receipt.location
        );
        for artifact in &descriptor.artifacts {
            println!(
                "    {} {}",
                artifact.file_name(),
                format!("sha256:{}", artifact.sha256).dimmed()
            );
        }
    }

    Ok(())
}
