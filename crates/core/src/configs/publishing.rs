use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The `publishing` block of `kiln.yml`
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublishingConfig {
    /// Local repository directory. Defaults to `<outputDir>/repository`.
    pub repository: Option<PathBuf>,
    /// Tasks that must succeed before anything is packaged.
    pub depends_on: Option<Vec<String>>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactConfig>,
    /// Publication groupings. When omitted a single publication carries every artifact.
    pub publications: Option<Vec<PublicationConfig>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactConfig {
    pub classifier: String,
    pub roots: Vec<PathBuf>,
    /// Glob patterns, relative to each root, left out of the bundle.
    pub excludes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublicationConfig {
    /// Overrides the project name in the coordinate.
    pub artifact_id: Option<String>,
    pub classifiers: Vec<String>,
}
