use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::configs::publishing::PublishingConfig;
use crate::configs::tasks::TaskConfig;

pub const DEFAULT_OUTPUT_DIR: &str = "build";

/// Root of a `kiln.yml` file
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectFileConfig {
    pub project: RawProjectConfig,
    /// Directory (relative to the project root) that receives every build output.
    pub output_dir: Option<PathBuf>,
    pub execution: Option<ExecutionConfig>,
    pub tasks: Option<Vec<TaskConfig>>,
    pub publishing: Option<PublishingConfig>,
}

/// Unvalidated project metadata. Every field is optional here so the resolver
/// can name exactly which one is missing.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawProjectConfig {
    pub name: Option<String>,
    pub group: Option<String>,
    pub version: Option<String>,
    pub build_info: Option<RawBuildInfoConfig>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawBuildInfoConfig {
    /// Dotted module name the generated file is placed under, e.g. `org.example.lib`.
    pub output_module: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Maximum number of independent tasks running at once. Defaults to 1.
    pub parallelism: Option<usize>,
}

pub fn parse_project_config(yaml_str: &str) -> Result<ProjectFileConfig, serde_yaml::Error> {
    let config: ProjectFileConfig = serde_yaml::from_str(yaml_str)?;
    Ok(config)
}
