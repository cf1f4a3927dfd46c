//! Task actions
//!
//! An [`Action`] is the deferred work attached to a task. The executor calls
//! [`Action::prepare`] on every planned task before anything runs, then
//! [`Action::execute`] exactly once per task that gets to run.
//!
//! Configuration can only produce the built-in kinds in [`BuiltinAction`];
//! embedders and tests may implement [`Action`] directly.

pub mod build_info;
pub mod command;
pub mod compile;
pub mod package;
pub mod publish;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::configs::publishing::PublishingConfig;
use crate::configs::tasks::ActionConfig;
use crate::packager::ArtifactStore;
use crate::resolver::ProjectSpec;
use crate::toolchain::CommandToolchain;
use crate::upload::LocalRepository;

pub use build_info::BuildInfoTask;
pub use command::CommandTask;
pub use compile::CompileTask;
pub use package::PackageTask;
pub use publish::PublishTask;

/// Everything an action may read while it runs
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub spec: Arc<ProjectSpec>,
    pub project_root: PathBuf,
    pub output_dir: PathBuf,
    pub artifacts: ArtifactStore,
    pub publishing: PublishingConfig,
}

impl TaskContext {
    pub fn new(spec: Arc<ProjectSpec>, project_root: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            spec,
            project_root,
            output_dir,
            artifacts: ArtifactStore::new(),
            publishing: PublishingConfig::default(),
        }
    }

    pub fn with_publishing(mut self, publishing: PublishingConfig) -> Self {
        self.publishing = publishing;
        self
    }

    /// Resolve a configured path against the project root
    pub fn project_path(&self, path: &Path) -> PathBuf {
        self.project_root.join(path)
    }

    /// Directory packaged archives are written to
    pub fn libs_dir(&self) -> PathBuf {
        self.output_dir.join("libs")
    }
}

pub trait Action: Send + Sync {
    /// Short human-readable summary, e.g. `package sources`
    fn describe(&self) -> String;

    /// Validate configuration before any task of the run starts
    fn prepare(&self, _ctx: &TaskContext) -> Result<()> {
        Ok(())
    }

    fn execute(&self, ctx: &TaskContext) -> Result<()>;

    /// Paths this action writes. Two tasks with overlapping outputs never run
    /// at the same time.
    fn outputs(&self, _ctx: &TaskContext) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// The closed set of task kinds a config file can declare
pub enum BuiltinAction {
    Command(CommandTask),
    Compile(CompileTask),
    BuildInfo(BuildInfoTask),
    Package(PackageTask),
    Publish(PublishTask),
}

impl BuiltinAction {
    /// `default_repository` is used by publish tasks that do not name one
    pub fn from_config(
        task_name: &str,
        config: &ActionConfig,
        project_root: &Path,
        default_repository: &Path,
    ) -> Self {
        match config {
            ActionConfig::Command { command, script } => BuiltinAction::Command(CommandTask::new(
                task_name,
                command.clone(),
                script.clone(),
            )),
            ActionConfig::Compile {
                sources,
                output,
                toolchain,
            } => BuiltinAction::Compile(CompileTask::new(
                sources.clone(),
                output.clone(),
                Arc::new(CommandToolchain::new(toolchain.clone())),
            )),
            ActionConfig::BuildInfo => BuiltinAction::BuildInfo(BuildInfoTask),
            ActionConfig::Package(artifact) => {
                BuiltinAction::Package(PackageTask::new(artifact.clone()))
            }
            ActionConfig::Publish { repository } => {
                let root = repository
                    .as_ref()
                    .map(|path| project_root.join(path))
                    .unwrap_or_else(|| default_repository.to_path_buf());
                BuiltinAction::Publish(PublishTask::new(Arc::new(LocalRepository::new(root))))
            }
        }
    }

    fn inner(&self) -> &dyn Action {
        match self {
            BuiltinAction::Command(action) => action,
            BuiltinAction::Compile(action) => action,
            BuiltinAction::BuildInfo(action) => action,
            BuiltinAction::Package(action) => action,
            BuiltinAction::Publish(action) => action,
        }
    }
}

impl Action for BuiltinAction {
    fn describe(&self) -> String {
        self.inner().describe()
    }

    fn prepare(&self, ctx: &TaskContext) -> Result<()> {
        self.inner().prepare(ctx)
    }

    fn execute(&self, ctx: &TaskContext) -> Result<()> {
        self.inner().execute(ctx)
    }

    fn outputs(&self, ctx: &TaskContext) -> Vec<PathBuf> {
        self.inner().outputs(ctx)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Small actions for graph and executor tests

    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::resolver::ProjectSpec;

    pub fn context(root: &Path) -> TaskContext {
        TaskContext::new(
            Arc::new(ProjectSpec {
                name: "lib".to_string(),
                group: "org.example".to_string(),
                version: "1.0.0".to_string(),
                build_info: None,
            }),
            root.to_path_buf(),
            root.join("build"),
        )
    }

    pub struct Noop;

    impl Action for Noop {
        fn describe(&self) -> String {
            "noop".to_string()
        }

        fn execute(&self, _ctx: &TaskContext) -> Result<()> {
            Ok(())
        }
    }

    /// Appends its name to a shared log when run
    pub struct Record {
        pub name: String,
        pub log: Arc<Mutex<Vec<String>>>,
        pub fail: bool,
        pub delay: Duration,
        pub outputs: Vec<PathBuf>,
        pub active: Arc<AtomicUsize>,
        pub peak: Arc<AtomicUsize>,
    }

    impl Record {
        pub fn new(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                log: Arc::clone(log),
                fail: false,
                delay: Duration::ZERO,
                outputs: Vec::new(),
                active: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        pub fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn writing(mut self, path: impl Into<PathBuf>) -> Self {
            self.outputs.push(path.into());
            self
        }

        pub fn tracking(mut self, active: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>) -> Self {
            self.active = Arc::clone(active);
            self.peak = Arc::clone(peak);
            self
        }
    }

    impl Action for Record {
        fn describe(&self) -> String {
            format!("record {}", self.name)
        }

        fn execute(&self, _ctx: &TaskContext) -> Result<()> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.log.lock().unwrap().push(self.name.clone());
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                anyhow::bail!("{} exploded", self.name);
            }
            Ok(())
        }

        fn outputs(&self, _ctx: &TaskContext) -> Vec<PathBuf> {
            self.outputs.clone()
        }
    }

    pub struct RejectOnPrepare;

    impl Action for RejectOnPrepare {
        fn describe(&self) -> String {
            "reject".to_string()
        }

        fn prepare(&self, _ctx: &TaskContext) -> Result<()> {
            anyhow::bail!("not configured")
        }

        fn execute(&self, _ctx: &TaskContext) -> Result<()> {
            Ok(())
        }
    }
}
