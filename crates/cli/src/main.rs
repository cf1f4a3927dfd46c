use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use kiln_core::{CancellationToken, KilnError, ProjectManager, ProjectManagerConfig};
use tracing_subscriber::EnvFilter;

mod commands;
mod style;

/// Kiln - A build and publish task orchestrator
#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Runs declared build tasks in dependency order and publishes their artifacts")]
#[command(version)]
struct Cli {
    /// Path to the project root (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Maximum number of tasks running at once (overrides execution.parallelism)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task and everything it depends on
    Build {
        /// Task id
        task: String,
    },
    /// Package the declared artifacts and publish them
    Publish {
        /// Repository directory (defaults to publishing.repository or <outputDir>/repository)
        #[arg(long)]
        repository: Option<PathBuf>,
    },
    /// Show execution plan for a task without running it
    Plan {
        /// Task id
        task: String,
    },
    /// Show the task dependency graph
    Graph,
    /// List declared tasks
    List,
    /// Print the JSON Schema for kiln.yml
    Schema,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(exit_code(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    // The schema does not need a project on disk
    if let Commands::Schema = cli.command {
        return commands::schema::execute();
    }

    tracing::debug!(project = %cli.project.display(), "loading project");
    let manager = ProjectManager::new(ProjectManagerConfig {
        project_root: cli.project,
        parallelism: cli.jobs,
    })?;

    // Execute command (CLI layer only handles presentation)
    match cli.command {
        Commands::Build { task } => {
            commands::build::execute(&manager, &task, cancel_on_ctrl_c()).await
        }
        Commands::Publish { repository } => {
            commands::publish::execute(&manager, repository, cancel_on_ctrl_c()).await
        }
        Commands::Plan { task } => commands::plan::execute(&manager, &task),
        Commands::Graph => commands::graph::execute(&manager),
        Commands::List => commands::list::execute(&manager),
        Commands::Schema => commands::schema::execute(),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Token cancelled on the first Ctrl-C. Running tasks finish, pending ones
/// are skipped.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Cancelling, waiting for running tasks...".yellow());
            trigger.cancel();
        }
    });
    cancel
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<KilnError>()
        .map_or(1, KilnError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::types::{ConfigError, GraphError};

    #[test]
    fn test_exit_code_follows_kiln_error() {
        let cycle = anyhow::Error::from(KilnError::Graph(GraphError::CyclicDependency {
            cycle: vec!["a".to_string(), "b".to_string()],
        }));
        assert_eq!(exit_code(&cycle), 3);

        let config = anyhow::Error::from(KilnError::Config(ConfigError::MissingField {
            field: "project.name",
        }));
        assert_eq!(exit_code(&config), 2);

        let unknown = anyhow::Error::from(KilnError::Graph(GraphError::UnknownTask(
            "nope".to_string(),
        )));
        assert_eq!(exit_code(&unknown), 2);
    }

    #[test]
    fn test_errors_from_outside_kiln_exit_with_one() {
        assert_eq!(exit_code(&anyhow::anyhow!("terminal closed")), 1);
    }
}
