//! Shell command and script tasks
//!
//! Commands run in the project root with the project coordinate exported as
//! `KILN_PROJECT_NAME`, `KILN_PROJECT_GROUP`, `KILN_PROJECT_VERSION` and the
//! build output directory as `KILN_OUTPUT_DIR`.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::actions::{Action, TaskContext};
use crate::configs::tasks::Command as TaskCommand;

pub struct CommandTask {
    task_name: String,
    command: Option<TaskCommand>,
    script: Option<String>,
}

impl CommandTask {
    pub fn new(task_name: &str, command: Option<TaskCommand>, script: Option<String>) -> Self {
        Self {
            task_name: task_name.to_string(),
            command,
            script,
        }
    }

    /// Execute a command with common setup and error handling
    fn execute_command(
        &self,
        ctx: &TaskContext,
        command: &mut Command,
        description: &str,
    ) -> Result<()> {
        command
            .current_dir(&ctx.project_root)
            .env("KILN_PROJECT_NAME", &ctx.spec.name)
            .env("KILN_PROJECT_GROUP", &ctx.spec.group)
            .env("KILN_PROJECT_VERSION", &ctx.spec.version)
            .env("KILN_OUTPUT_DIR", &ctx.output_dir);

        debug!(task = %self.task_name, command = %description, "spawning");
        let status = command
            .status()
            .with_context(|| format!("Failed to execute {}", description))?;

        if !status.success() {
            match status.code() {
                Some(code) => bail!("{} failed with exit code {}", description, code),
                None => bail!("{} was terminated by a signal", description),
            }
        }
        Ok(())
    }

    /// Execute a script file, resolved relative to the project root
    fn execute_script(&self, ctx: &TaskContext, script_path: &str) -> Result<()> {
        let full_script_path = ctx.project_path(&PathBuf::from(script_path));
        if !full_script_path.exists() {
            bail!("Script file '{}' not found", full_script_path.display());
        }

        let mut command = Command::new(&full_script_path);
        self.execute_command(
            ctx,
            &mut command,
            &format!("script '{}'", full_script_path.display()),
        )
    }

    /// Execute a command with arguments
    fn execute_command_with_args(
        &self,
        ctx: &TaskContext,
        program: &str,
        args: &[String],
    ) -> Result<()> {
        let mut command = Command::new(program);
        command.args(args);
        self.execute_command(ctx, &mut command, &format!("command '{}'", program))
    }

    /// Execute a single shell command
    fn execute_shell_command(&self, ctx: &TaskContext, cmd: &str) -> Result<()> {
        let mut command = Command::new("sh");
        command.arg("-c").arg(cmd);
        self.execute_command(ctx, &mut command, &format!("command '{}'", cmd))
    }
}

impl Action for CommandTask {
    fn describe(&self) -> String {
        match (&self.script, &self.command) {
            (Some(script), _) => format!("script {}", script),
            (None, Some(TaskCommand::Single(cmd))) => cmd.clone(),
            (None, Some(TaskCommand::Multiple(cmds))) => cmds.join(" "),
            (None, None) => "command".to_string(),
        }
    }

    fn prepare(&self, _ctx: &TaskContext) -> Result<()> {
        match (&self.script, &self.command) {
            (None, None) => bail!("no script or command to execute"),
            (None, Some(TaskCommand::Single(cmd))) if cmd.trim().is_empty() => {
                bail!("command must not be empty")
            }
            (None, Some(TaskCommand::Multiple(cmds))) if cmds.is_empty() => {
                bail!("command must name a program")
            }
            _ => Ok(()),
        }
    }

    fn execute(&self, ctx: &TaskContext) -> Result<()> {
        if let Some(script) = &self.script {
            return self.execute_script(ctx, script);
        }
        match &self.command {
            Some(TaskCommand::Single(cmd)) => self.execute_shell_command(ctx, cmd),
            Some(TaskCommand::Multiple(cmds)) => match cmds.split_first() {
                Some((program, args)) => self.execute_command_with_args(ctx, program, args),
                None => bail!("Task '{}' has an empty command", self.task_name),
            },
            None => bail!("Task '{}' has no script or command to execute", self.task_name),
        }
    }
}
