//! Task states and the run report

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::types::{ExecutionError, KilnError, KilnResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Skipped
        )
    }

    /// Pending -> Running -> {Succeeded | Failed}, or Pending -> Skipped
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Running)
                | (TaskState::Pending, TaskState::Skipped)
                | (TaskState::Running, TaskState::Succeeded)
                | (TaskState::Running, TaskState::Failed)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    DependencyFailed(String),
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DependencyFailed(dependency) => {
                write!(f, "dependency '{}' failed", dependency)
            }
            SkipReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Terminal record for one task of a run
#[derive(Debug)]
pub struct TaskOutcome {
    pub id: String,
    pub state: TaskState,
    pub skip_reason: Option<SkipReason>,
    pub error: Option<ExecutionError>,
    pub duration: Duration,
}

impl TaskOutcome {
    /// Why the task did not succeed, if it did not
    pub fn cause(&self) -> Option<String> {
        match (&self.error, &self.skip_reason) {
            (Some(error), _) => Some(format!("{:#}", error.source)),
            (None, Some(reason)) => Some(reason.to_string()),
            (None, None) => None,
        }
    }
}

/// Aggregate result of a run, outcomes in plan order
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: Vec<TaskOutcome>,
}

impl RunReport {
    pub(crate) fn new(outcomes: Vec<TaskOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    pub fn get(&self, id: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|outcome| outcome.id == id)
    }

    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.get(id).map(|outcome| outcome.state)
    }

    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| outcome.state == TaskState::Succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.state == TaskState::Failed)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.state == TaskState::Skipped)
    }

    /// Every Failed or Skipped task
    pub fn unsuccessful(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.state != TaskState::Succeeded)
    }

    pub fn into_result(self) -> KilnResult<RunReport> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(KilnError::TasksFailed(self))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub task: String,
    pub from: TaskState,
    pub to: TaskState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task '{}' cannot go from {} to {}",
            self.task, self.from, self.to
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// Task id -> state, guarded by a mutex
#[derive(Debug, Default)]
pub struct StateTable {
    states: Mutex<HashMap<String, TaskState>>,
}

impl StateTable {
    pub fn new<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            states: Mutex::new(
                ids.into_iter()
                    .map(|id| (id.to_string(), TaskState::Pending))
                    .collect(),
            ),
        }
    }

    pub fn get(&self, id: &str) -> Option<TaskState> {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }

    pub fn transition(&self, id: &str, to: TaskState) -> Result<(), InvalidTransition> {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let from = states.get(id).copied().unwrap_or(TaskState::Pending);
        if !from.can_transition_to(to) {
            return Err(InvalidTransition {
                task: id.to_string(),
                from,
                to,
            });
        }
        states.insert(id.to_string(), to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        let table = StateTable::new(["a", "b"]);
        table.transition("a", TaskState::Running).unwrap();
        table.transition("a", TaskState::Succeeded).unwrap();
        table.transition("b", TaskState::Skipped).unwrap();

        assert_eq!(table.get("a"), Some(TaskState::Succeeded));
        assert_eq!(table.get("b"), Some(TaskState::Skipped));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let table = StateTable::new(["a"]);
        table.transition("a", TaskState::Skipped).unwrap();
        let err = table.transition("a", TaskState::Running).unwrap_err();
        assert_eq!(err.to_string(), "task 'a' cannot go from skipped to running");

        let table = StateTable::new(["b"]);
        assert!(table.transition("b", TaskState::Succeeded).is_err());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }

    #[test]
    fn test_report_collects_unsuccessful_tasks() {
        let outcome = |id: &str, state, skip_reason| TaskOutcome {
            id: id.to_string(),
            state,
            skip_reason,
            error: None,
            duration: Duration::ZERO,
        };
        let report = RunReport::new(vec![
            outcome("a", TaskState::Failed, None),
            outcome(
                "b",
                TaskState::Skipped,
                Some(SkipReason::DependencyFailed("a".to_string())),
            ),
            outcome("c", TaskState::Succeeded, None),
        ]);

        assert!(!report.is_success());
        assert_eq!(report.unsuccessful().count(), 2);
        assert_eq!(
            report.get("b").and_then(TaskOutcome::cause).as_deref(),
            Some("dependency 'a' failed")
        );

        let err = report.into_result().unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "2 task(s) did not succeed");
    }
}
