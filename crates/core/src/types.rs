use std::path::PathBuf;

use thiserror::Error;

use crate::execution::RunReport;

/// The main error type for Kiln operations
#[derive(Debug, Error)]
pub enum KilnError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Packaging(#[from] PackagingError),

    #[error(transparent)]
    Publication(#[from] PublicationError),

    #[error("{} task(s) did not succeed", .0.unsuccessful().count())]
    TasksFailed(RunReport),
}

impl KilnError {
    /// Process exit code reported by the CLI for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            KilnError::Config(_) => 2,
            KilnError::Graph(GraphError::CyclicDependency { .. }) => 3,
            KilnError::Graph(_) => 2,
            KilnError::Packaging(_)
            | KilnError::Publication(_)
            | KilnError::TasksFailed(_) => 1,
        }
    }
}

/// Errors raised while reading or resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' has invalid value '{value}': {message}")]
    InvalidField {
        field: &'static str,
        value: String,
        message: &'static str,
    },

    #[error("task '{task}' is misconfigured: {message}")]
    InvalidTask { task: String, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors raised while assembling or validating the task graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("task '{0}' is declared more than once")]
    DuplicateTask(String),

    #[error("task '{task}' depends on '{dependency}' which was not found")]
    UnknownDependency { task: String, dependency: String },

    #[error("task '{0}' not found")]
    UnknownTask(String),

    #[error("circular dependency detected: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<String> },
}

fn format_cycle(cycle: &[String]) -> String {
    let mut path = cycle.to_vec();
    if let Some(first) = path.first().cloned() {
        path.push(first);
    }
    path.join(" -> ")
}

/// An action failure attributed to one task
#[derive(Debug, Error)]
#[error("task '{task}' failed: {source:#}")]
pub struct ExecutionError {
    pub task: String,
    #[source]
    pub source: anyhow::Error,
}

/// Errors raised by the artifact packager
#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("no files found for classifier '{classifier}' under {}", format_roots(.roots))]
    EmptyFileSet {
        classifier: String,
        roots: Vec<PathBuf>,
    },

    #[error("'{member}' is provided by more than one root for classifier '{classifier}'")]
    DuplicateEntry { classifier: String, member: String },

    #[error("invalid exclude pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to write archive {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_roots(roots: &[PathBuf]) -> String {
    if roots.is_empty() {
        return "<no roots>".to_string();
    }
    roots
        .iter()
        .map(|root| root.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while generating or uploading publications
#[derive(Debug, Error)]
pub enum PublicationError {
    #[error("publication coordinate is missing its {0}")]
    MissingCoordinate(&'static str),

    #[error("nothing to publish: no artifacts were packaged")]
    NoArtifacts,

    #[error("publication coordinate has an invalid {part} '{value}'")]
    InvalidCoordinate { part: &'static str, value: String },

    #[error("coordinate '{0}' is published more than once")]
    DuplicateCoordinate(String),

    #[error("publication '{publication}' references unknown classifier '{classifier}'")]
    UnknownClassifier {
        publication: String,
        classifier: String,
    },

    #[error("upload of '{coordinate}' failed: {source:#}")]
    Upload {
        coordinate: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Result type alias for Kiln operations
pub type KilnResult<T> = Result<T, KilnError>;
