use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::configs::publishing::ArtifactConfig;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum Command {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    pub name: String,
    pub description: Option<String>,
    pub depends_on: Option<Vec<String>>,
    #[serde(flatten)]
    pub action: ActionConfig,
}

/// The built-in task kinds, selected by the `type` field
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionConfig {
    /// Run a shell command, a program with arguments, or a script file.
    Command {
        command: Option<Command>,
        script: Option<String>,
    },
    /// Hand a source file set to the configured toolchain.
    Compile {
        sources: Vec<PathBuf>,
        /// Output directory relative to the build output directory. Defaults to `classes`.
        output: Option<PathBuf>,
        toolchain: Command,
    },
    /// Write the project's build-info file, if the project declares one.
    BuildInfo,
    /// Package a classifier bundle and register it for publishing.
    Package(ArtifactConfig),
    /// Generate publications from the packaged artifacts and upload them.
    Publish {
        repository: Option<PathBuf>,
    },
}

impl ActionConfig {
    /// The `type` tag as written in config files
    pub fn kind(&self) -> &'static str {
        match self {
            ActionConfig::Command { .. } => "command",
            ActionConfig::Compile { .. } => "compile",
            ActionConfig::BuildInfo => "buildInfo",
            ActionConfig::Package(_) => "package",
            ActionConfig::Publish { .. } => "publish",
        }
    }
}

/// Extra task files under `.kiln/tasks/`
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TasksFileConfig {
    pub description: Option<String>,
    pub tasks: Vec<TaskConfig>,
}

pub fn parse_tasks_config(yaml_str: &str) -> Result<TasksFileConfig, serde_yaml::Error> {
    let config: TasksFileConfig = serde_yaml::from_str(yaml_str)?;
    Ok(config)
}
