use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::actions::{Action, TaskContext};
use crate::packager::package_all;
use crate::publisher::Publisher;
use crate::upload::UploadClient;

/// Publishes the artifacts packaged earlier in the run. When no package task
/// ran, the artifacts declared under `publishing.artifacts` are packaged first.
pub struct PublishTask {
    uploader: Arc<dyn UploadClient>,
}

impl PublishTask {
    pub fn new(uploader: Arc<dyn UploadClient>) -> Self {
        Self { uploader }
    }
}

impl Action for PublishTask {
    fn describe(&self) -> String {
        format!("publish to {}", self.uploader.name())
    }

    fn execute(&self, ctx: &TaskContext) -> Result<()> {
        if ctx.artifacts.is_empty() {
            for artifact in package_all(
                &ctx.spec,
                &ctx.publishing.artifacts,
                &ctx.project_root,
                &ctx.libs_dir(),
            )? {
                ctx.artifacts.register(artifact);
            }
        }

        let artifacts = ctx.artifacts.snapshot();
        let report = Publisher::new(Arc::clone(&self.uploader)).publish(
            &ctx.spec,
            &artifacts,
            ctx.publishing.publications.as_deref(),
        )?;
        info!(publications = report.receipts.len(), "publish task finished");
        Ok(())
    }

    fn outputs(&self, _ctx: &TaskContext) -> Vec<PathBuf> {
        self.uploader.location().into_iter().collect()
    }
}
