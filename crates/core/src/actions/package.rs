use std::path::PathBuf;

use anyhow::Result;

use crate::actions::{Action, TaskContext};
use crate::configs::publishing::ArtifactConfig;
use crate::packager::{archive_path, package_artifact, PackageRequest};

/// Packages one classifier bundle and registers it for later publish tasks
pub struct PackageTask {
    artifact: ArtifactConfig,
}

impl PackageTask {
    pub fn new(artifact: ArtifactConfig) -> Self {
        Self { artifact }
    }
}

impl Action for PackageTask {
    fn describe(&self) -> String {
        format!("package {}", self.artifact.classifier)
    }

    fn prepare(&self, _ctx: &TaskContext) -> Result<()> {
        if self.artifact.classifier.trim().is_empty() {
            anyhow::bail!("classifier must not be empty");
        }
        if self.artifact.roots.is_empty() {
            anyhow::bail!("no roots configured for '{}'", self.artifact.classifier);
        }
        Ok(())
    }

    fn execute(&self, ctx: &TaskContext) -> Result<()> {
        let request = PackageRequest::from_config(&self.artifact, &ctx.project_root);
        let artifact = package_artifact(&ctx.spec, &request, &ctx.libs_dir())?;
        ctx.artifacts.register(artifact);
        Ok(())
    }

    fn outputs(&self, ctx: &TaskContext) -> Vec<PathBuf> {
        vec![archive_path(&ctx.spec, &self.artifact.classifier, &ctx.libs_dir())]
    }
}
