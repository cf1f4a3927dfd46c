//! High-level project interface
//!
//! [`ProjectManager`] is the entry point the CLI talks to. It loads `kiln.yml`
//! and any `.kiln/tasks/*.yml` files, resolves the project metadata, turns the
//! declared tasks into a graph and drives builds and the publish flow.
//!
//! ```rust,no_run
//! use kiln_core::project_manager::{ProjectManager, ProjectManagerConfig};
//! use std::path::PathBuf;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> kiln_core::types::KilnResult<()> {
//! let manager = ProjectManager::new(ProjectManagerConfig {
//!     project_root: PathBuf::from("."),
//!     parallelism: None,
//! })?;
//!
//! let report = manager.build("sourceJar", CancellationToken::new()).await?;
//! println!("{} tasks ran", report.outcomes().len());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::actions::{BuiltinAction, TaskContext};
use crate::configs::project::{parse_project_config, ProjectFileConfig, DEFAULT_OUTPUT_DIR};
use crate::configs::publishing::PublishingConfig;
use crate::configs::tasks::{parse_tasks_config, TaskConfig, TasksFileConfig};
use crate::execution::{RunReport, TaskExecutor};
use crate::graph::{ExecutionPlan, TaskGraph};
use crate::packager::package_all;
use crate::publisher::{PublishReport, Publisher};
use crate::resolver::{resolve, ProjectSpec};
use crate::types::{ConfigError, KilnResult};
use crate::upload::LocalRepository;

pub const PROJECT_FILE: &str = "kiln.yml";

/// Configuration for initializing a project manager
#[derive(Debug, Clone)]
pub struct ProjectManagerConfig {
    pub project_root: PathBuf,
    /// Overrides `execution.parallelism` from `kiln.yml`
    pub parallelism: Option<usize>,
}

pub struct ProjectManager {
    project_root: PathBuf,
    spec: Arc<ProjectSpec>,
    config: ProjectFileConfig,
    tasks: Vec<TaskConfig>,
    parallelism: usize,
}

impl ProjectManager {
    pub fn new(config: ProjectManagerConfig) -> KilnResult<Self> {
        let project_file = Self::load_project_file(&config.project_root)?;
        let spec = resolve(&project_file.project)?;

        let mut tasks = project_file.tasks.clone().unwrap_or_default();
        tasks.extend(Self::load_task_configs(&config.project_root)?.tasks);

        let parallelism = config
            .parallelism
            .or_else(|| project_file.execution.as_ref().and_then(|e| e.parallelism))
            .unwrap_or(1)
            .max(1);

        debug!(
            project = %spec.name,
            tasks = tasks.len(),
            parallelism,
            "loaded project"
        );

        Ok(Self {
            project_root: config.project_root,
            spec: Arc::new(spec),
            config: project_file,
            tasks,
            parallelism,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn spec(&self) -> &ProjectSpec {
        &self.spec
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Every declared task, `kiln.yml` first, then task files by file name
    pub fn task_configs(&self) -> &[TaskConfig] {
        &self.tasks
    }

    pub fn output_dir(&self) -> PathBuf {
        let relative = self
            .config
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        self.project_root.join(relative)
    }

    pub fn publishing(&self) -> PublishingConfig {
        self.config.publishing.clone().unwrap_or_default()
    }

    /// Repository used when neither the command line nor a task names one
    pub fn default_repository(&self) -> PathBuf {
        match self.config.publishing.as_ref().and_then(|p| p.repository.as_ref()) {
            Some(repository) => self.project_root.join(repository),
            None => self.output_dir().join("repository"),
        }
    }

    pub fn task_graph(&self) -> KilnResult<TaskGraph> {
        let default_repository = self.default_repository();
        let mut graph = TaskGraph::new();
        for task in &self.tasks {
            if task.name.trim().is_empty() {
                return Err(ConfigError::InvalidTask {
                    task: task.name.clone(),
                    message: "task name must not be empty".to_string(),
                }
                .into());
            }
            let action = BuiltinAction::from_config(
                &task.name,
                &task.action,
                &self.project_root,
                &default_repository,
            );
            graph.add_task(
                task.name.clone(),
                task.depends_on.clone().unwrap_or_default(),
                Arc::new(action),
            )?;
        }
        Ok(graph)
    }

    /// Validated plan of every declared task
    pub fn full_plan(&self) -> KilnResult<ExecutionPlan> {
        Ok(self.task_graph()?.build()?)
    }

    /// Plan for `target` and everything it depends on
    pub fn execution_plan(&self, target: &str) -> KilnResult<ExecutionPlan> {
        Ok(self.full_plan()?.closure(&[target])?)
    }

    pub fn task_context(&self) -> TaskContext {
        TaskContext::new(
            Arc::clone(&self.spec),
            self.project_root.clone(),
            self.output_dir(),
        )
        .with_publishing(self.publishing())
    }

    /// Run `target` and its dependency closure
    ///
    /// Returns [`KilnError::TasksFailed`](crate::types::KilnError::TasksFailed)
    /// when any task of the closure did not succeed.
    pub async fn build(&self, target: &str, cancel: CancellationToken) -> KilnResult<RunReport> {
        let plan = self.execution_plan(target)?;
        info!(task = target, tasks = plan.len(), "building");
        self.run_plan(&plan, Arc::new(self.task_context()), cancel)
            .await
    }

    /// Run the publishing `dependsOn` tasks, package every declared artifact
    /// and upload the resulting publications to `repository` (or the default
    /// repository)
    pub async fn publish(
        &self,
        repository: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> KilnResult<PublishReport> {
        let publishing = self.publishing();
        let ctx = Arc::new(self.task_context());

        let plan = self.full_plan()?;
        let depends_on = publishing.depends_on.clone().unwrap_or_default();
        if !depends_on.is_empty() {
            let plan = plan.closure(&depends_on)?;
            self.run_plan(&plan, Arc::clone(&ctx), cancel).await?;
        }

        for artifact in package_all(
            &self.spec,
            &publishing.artifacts,
            &self.project_root,
            &ctx.libs_dir(),
        )? {
            ctx.artifacts.register(artifact);
        }

        let repository = repository.unwrap_or_else(|| self.default_repository());
        let publisher = Publisher::new(Arc::new(LocalRepository::new(repository)));
        let report = publisher.publish(
            &self.spec,
            &ctx.artifacts.snapshot(),
            publishing.publications.as_deref(),
        )?;
        Ok(report)
    }

    async fn run_plan(
        &self,
        plan: &ExecutionPlan,
        ctx: Arc<TaskContext>,
        cancel: CancellationToken,
    ) -> KilnResult<RunReport> {
        TaskExecutor::new(self.parallelism)
            .run(plan, ctx, cancel)
            .await?
            .into_result()
    }

    fn load_project_file(project_root: &Path) -> KilnResult<ProjectFileConfig> {
        let path = project_root.join(PROJECT_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = parse_project_config(&content)
            .map_err(|source| ConfigError::Parse { path, source })?;
        Ok(config)
    }

    fn load_task_configs(project_root: &Path) -> KilnResult<TasksFileConfig> {
        let tasks_dir = project_root.join(".kiln").join("tasks");
        let mut files = Vec::new();

        if tasks_dir.exists() {
            let read_error = |source| ConfigError::Read {
                path: tasks_dir.clone(),
                source,
            };
            for entry in std::fs::read_dir(&tasks_dir).map_err(read_error)? {
                let path = entry.map_err(read_error)?.path();
                if path.extension().and_then(|s| s.to_str()) == Some("yml") {
                    files.push(path);
                }
            }
        }
        files.sort();

        // Merge all task files
        let mut tasks = Vec::new();
        let mut description = None;
        for path in files {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            let config = parse_tasks_config(&content)
                .map_err(|source| ConfigError::Parse { path, source })?;
            tasks.extend(config.tasks);
            if config.description.is_some() {
                description = config.description;
            }
        }

        Ok(TasksFileConfig { description, tasks })
    }
}
