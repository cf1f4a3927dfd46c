//! Runs an [`ExecutionPlan`]
//!
//! The scheduler walks the plan in order on every pass. A pending task starts
//! once all of its dependencies have succeeded, a worker slot is free and its
//! declared outputs are not locked by a running task. Actions run on the
//! blocking pool under a [`JoinSet`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::actions::TaskContext;
use crate::execution::locks::PathLocks;
use crate::execution::state::{RunReport, SkipReason, StateTable, TaskOutcome, TaskState};
use crate::graph::ExecutionPlan;
use crate::types::{ConfigError, ExecutionError, KilnResult};

#[derive(Debug, Clone)]
pub struct TaskExecutor {
    parallelism: usize,
}

impl Default for TaskExecutor {
    fn default() -> Self {
        Self::sequential()
    }
}

impl TaskExecutor {
    /// At most `parallelism` actions run at once; zero is treated as one
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
        }
    }

    pub fn sequential() -> Self {
        Self::new(1)
    }

    /// Run every task of `plan`
    ///
    /// Only a failed `prepare` is returned as an error, and in that case no
    /// action has run. Task failures are recorded in the returned report.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        ctx: Arc<TaskContext>,
        cancel: CancellationToken,
    ) -> KilnResult<RunReport> {
        for task in plan.tasks() {
            task.action
                .prepare(&ctx)
                .map_err(|err| ConfigError::InvalidTask {
                    task: task.id.clone(),
                    message: format!("{:#}", err),
                })?;
        }

        let tasks = plan.tasks();
        let outputs: Vec<Vec<PathBuf>> = tasks.iter().map(|t| t.action.outputs(&ctx)).collect();
        let states = StateTable::new(plan.task_ids());
        let mut outcomes: Vec<Option<TaskOutcome>> = tasks.iter().map(|_| None).collect();
        let mut started: HashMap<usize, Instant> = HashMap::new();
        let mut running: HashMap<tokio::task::Id, usize> = HashMap::new();
        let mut locks = PathLocks::new();
        let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();

        debug!(
            tasks = tasks.len(),
            parallelism = self.parallelism,
            "starting run"
        );

        loop {
            for (position, task) in tasks.iter().enumerate() {
                if states.get(&task.id) != Some(TaskState::Pending) {
                    continue;
                }

                if cancel.is_cancelled() {
                    skip(&states, &mut outcomes, position, &task.id, SkipReason::Cancelled);
                    continue;
                }

                let mut ready = true;
                let mut failed_dependency = None;
                for dep in &task.dependencies {
                    match states.get(dep) {
                        Some(TaskState::Succeeded) => {}
                        Some(TaskState::Failed) | Some(TaskState::Skipped) => {
                            failed_dependency = Some(dep.clone());
                            break;
                        }
                        _ => ready = false,
                    }
                }
                if let Some(dep) = failed_dependency {
                    skip(
                        &states,
                        &mut outcomes,
                        position,
                        &task.id,
                        SkipReason::DependencyFailed(dep),
                    );
                    continue;
                }

                if !ready || join_set.len() >= self.parallelism {
                    continue;
                }
                if !locks.try_acquire(&task.id, &outputs[position]) {
                    debug!(task = %task.id, "waiting for output lock");
                    continue;
                }

                set_state(&states, &task.id, TaskState::Running);
                info!(task = %task.id, action = %task.action.describe(), "running task");
                let action = Arc::clone(&task.action);
                let task_ctx = Arc::clone(&ctx);
                let handle = join_set.spawn_blocking(move || action.execute(&task_ctx));
                running.insert(handle.id(), position);
                started.insert(position, Instant::now());
            }

            if join_set.is_empty() {
                break;
            }

            let joined = tokio::select! {
                _ = cancel.cancelled(), if !cancel.is_cancelled() => {
                    warn!("run cancelled, waiting for running tasks to finish");
                    continue;
                }
                joined = join_set.join_next_with_id() => joined,
            };
            let Some(joined) = joined else {
                break;
            };

            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(err) => {
                    let id = err.id();
                    (id, Err(anyhow::anyhow!("task panicked: {}", err)))
                }
            };
            let Some(position) = running.remove(&id) else {
                continue;
            };

            let task = &tasks[position];
            locks.release(&task.id);
            let duration = started
                .get(&position)
                .map(Instant::elapsed)
                .unwrap_or_default();

            let outcome = match result {
                Ok(()) => {
                    set_state(&states, &task.id, TaskState::Succeeded);
                    info!(task = %task.id, elapsed_ms = duration.as_millis() as u64, "task succeeded");
                    TaskOutcome {
                        id: task.id.clone(),
                        state: TaskState::Succeeded,
                        skip_reason: None,
                        error: None,
                        duration,
                    }
                }
                Err(source) => {
                    set_state(&states, &task.id, TaskState::Failed);
                    warn!(task = %task.id, error = %format!("{:#}", source), "task failed");
                    TaskOutcome {
                        id: task.id.clone(),
                        state: TaskState::Failed,
                        skip_reason: None,
                        error: Some(ExecutionError {
                            task: task.id.clone(),
                            source,
                        }),
                        duration,
                    }
                }
            };
            outcomes[position] = Some(outcome);
        }

        let report = RunReport::new(outcomes.into_iter().flatten().collect());
        info!(
            tasks = report.outcomes().len(),
            failed = report.failed().count(),
            skipped = report.skipped().count(),
            "run finished"
        );
        Ok(report)
    }
}

fn set_state(states: &StateTable, id: &str, to: TaskState) {
    if let Err(err) = states.transition(id, to) {
        error!(%err, "illegal task state transition");
    }
}

fn skip(
    states: &StateTable,
    outcomes: &mut [Option<TaskOutcome>],
    position: usize,
    id: &str,
    reason: SkipReason,
) {
    set_state(states, id, TaskState::Skipped);
    warn!(task = %id, reason = %reason, "skipping task");
    outcomes[position] = Some(TaskOutcome {
        id: id.to_string(),
        state: TaskState::Skipped,
        skip_reason: Some(reason),
        error: None,
        duration: Duration::ZERO,
    });
}
