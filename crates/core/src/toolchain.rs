//! Compiler/toolchain collaborator
//!
//! Kiln never compiles anything itself. A compile task hands its source set to
//! a [`Toolchain`] and reports whatever diagnostics come back.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

use crate::configs::tasks::Command as CommandConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub sources: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub working_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompileOutput {
    pub output_dir: PathBuf,
    pub diagnostics: String,
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("toolchain command is empty")]
    EmptyCommand,

    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("source paths cannot be passed to the toolchain: {0}")]
    Sources(#[from] std::env::JoinPathsError),

    #[error("compilation failed with exit code {}:\n{diagnostics}", .code.map_or("<signal>".to_string(), |c| c.to_string()))]
    Failed {
        code: Option<i32>,
        diagnostics: String,
    },
}

pub trait Toolchain: Send + Sync {
    fn describe(&self) -> String;

    /// Reject configurations that could never run
    fn validate(&self) -> Result<(), ToolchainError> {
        Ok(())
    }

    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, ToolchainError>;
}

/// Runs an external program. The source roots are passed in `KILN_SOURCES`
/// (joined with the platform path separator) and the output directory in
/// `KILN_OUTPUT`.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    command: CommandConfig,
}

impl CommandToolchain {
    pub fn new(command: CommandConfig) -> Self {
        Self { command }
    }

    fn build_command(&self) -> Result<(String, Command), ToolchainError> {
        match &self.command {
            CommandConfig::Single(cmd) if !cmd.trim().is_empty() => {
                let mut command = Command::new("sh");
                command.arg("-c").arg(cmd);
                Ok((cmd.clone(), command))
            }
            CommandConfig::Multiple(parts) if !parts.is_empty() => {
                let mut command = Command::new(&parts[0]);
                command.args(&parts[1..]);
                Ok((parts[0].clone(), command))
            }
            _ => Err(ToolchainError::EmptyCommand),
        }
    }
}

impl Toolchain for CommandToolchain {
    fn describe(&self) -> String {
        match &self.command {
            CommandConfig::Single(cmd) => cmd.clone(),
            CommandConfig::Multiple(parts) => parts.join(" "),
        }
    }

    fn validate(&self) -> Result<(), ToolchainError> {
        self.build_command().map(|_| ())
    }

    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, ToolchainError> {
        let (program, mut command) = self.build_command()?;
        command
            .current_dir(&request.working_dir)
            .env("KILN_SOURCES", std::env::join_paths(&request.sources)?)
            .env("KILN_OUTPUT", &request.output_dir);

        let output = command
            .output()
            .map_err(|source| ToolchainError::Launch { program, source })?;
        let diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ToolchainError::Failed {
                code: output.status.code(),
                diagnostics,
            });
        }

        Ok(CompileOutput {
            output_dir: request.output_dir.clone(),
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_commands_are_invalid() {
        let single = CommandToolchain::new(CommandConfig::Single("   ".to_string()));
        assert!(matches!(single.validate(), Err(ToolchainError::EmptyCommand)));

        let multiple = CommandToolchain::new(CommandConfig::Multiple(Vec::new()));
        assert!(matches!(multiple.validate(), Err(ToolchainError::EmptyCommand)));

        let ok = CommandToolchain::new(CommandConfig::Multiple(vec!["javac".to_string()]));
        assert!(ok.validate().is_ok());
        assert_eq!(ok.describe(), "javac");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_sees_sources_and_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let toolchain = CommandToolchain::new(CommandConfig::Single(
            "printf '%s' \"$KILN_SOURCES\" > \"$KILN_OUTPUT/sources.txt\"".to_string(),
        ));
        let output_dir = temp_dir.path().join("classes");
        std::fs::create_dir_all(&output_dir).unwrap();

        let request = CompileRequest {
            sources: vec![PathBuf::from("src/a"), PathBuf::from("src/b")],
            output_dir: output_dir.clone(),
            working_dir: temp_dir.path().to_path_buf(),
        };
        let output = toolchain.compile(&request).unwrap();

        assert_eq!(output.output_dir, output_dir);
        assert_eq!(
            std::fs::read_to_string(output_dir.join("sources.txt")).unwrap(),
            "src/a:src/b"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_diagnostics() {
        let temp_dir = tempfile::tempdir().unwrap();
        let toolchain = CommandToolchain::new(CommandConfig::Single(
            "echo 'Main.java:1: error' >&2; exit 3".to_string(),
        ));
        let request = CompileRequest {
            sources: Vec::new(),
            output_dir: temp_dir.path().to_path_buf(),
            working_dir: temp_dir.path().to_path_buf(),
        };

        match toolchain.compile(&request) {
            Err(ToolchainError::Failed { code, diagnostics }) => {
                assert_eq!(code, Some(3));
                assert!(diagnostics.contains("Main.java:1: error"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
