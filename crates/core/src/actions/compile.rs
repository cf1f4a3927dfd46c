use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::actions::{Action, TaskContext};
use crate::toolchain::{CompileRequest, Toolchain};

const DEFAULT_OUTPUT: &str = "classes";

/// Hands a source set to the toolchain collaborator
pub struct CompileTask {
    sources: Vec<PathBuf>,
    output: PathBuf,
    toolchain: Arc<dyn Toolchain>,
}

impl CompileTask {
    pub fn new(sources: Vec<PathBuf>, output: Option<PathBuf>, toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            sources,
            output: output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            toolchain,
        }
    }

    fn output_dir(&self, ctx: &TaskContext) -> PathBuf {
        ctx.output_dir.join(&self.output)
    }
}

impl Action for CompileTask {
    fn describe(&self) -> String {
        format!("compile with {}", self.toolchain.describe())
    }

    fn prepare(&self, _ctx: &TaskContext) -> Result<()> {
        if self.sources.is_empty() {
            anyhow::bail!("no source roots configured");
        }
        self.toolchain.validate()?;
        Ok(())
    }

    fn execute(&self, ctx: &TaskContext) -> Result<()> {
        let output_dir = self.output_dir(ctx);
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let request = CompileRequest {
            sources: self.sources.iter().map(|s| ctx.project_path(s)).collect(),
            output_dir,
            working_dir: ctx.project_root.clone(),
        };
        let output = self.toolchain.compile(&request)?;

        if !output.diagnostics.trim().is_empty() {
            warn!(diagnostics = %output.diagnostics.trim(), "toolchain reported diagnostics");
        }
        Ok(())
    }

    fn outputs(&self, ctx: &TaskContext) -> Vec<PathBuf> {
        vec![self.output_dir(ctx)]
    }
}
