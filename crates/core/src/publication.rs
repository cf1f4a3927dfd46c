//! Publication descriptors
//!
//! A publication is one publishable unit: a Maven-style coordinate plus the
//! artifacts shipped under it.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::configs::publishing::PublicationConfig;
use crate::packager::Artifact;
use crate::resolver::ProjectSpec;
use crate::types::PublicationError;

/// `group:name:version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl Coordinate {
    fn new(group: &str, name: &str, version: &str) -> Result<Self, PublicationError> {
        for (value, part) in [(group, "group"), (name, "name"), (version, "version")] {
            if value.trim().is_empty() {
                return Err(PublicationError::MissingCoordinate(part));
            }
            if value.contains(['/', '\\']) || value.split('.').all(|s| s.is_empty()) {
                return Err(PublicationError::InvalidCoordinate {
                    part,
                    value: value.to_string(),
                });
            }
        }
        Ok(Self {
            group: group.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    /// Repository-relative directory, e.g. `org/example/lib/1.0.0`
    pub fn repository_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group.split('.').collect();
        path.push(&self.name);
        path.push(&self.version);
        path
    }

    /// `<name>-<version>`
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationDescriptor {
    pub coordinate: Coordinate,
    pub artifacts: Vec<Artifact>,
}

impl PublicationDescriptor {
    /// Minimal Maven POM for this publication
    pub fn to_pom(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
</project>
"#,
            escape_xml(&self.coordinate.group),
            escape_xml(&self.coordinate.name),
            escape_xml(&self.coordinate.version),
        )
    }

    pub fn classifiers(&self) -> impl Iterator<Item = &str> {
        self.artifacts.iter().map(|a| a.classifier.as_str())
    }
}

/// One requested grouping of artifacts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublicationRequest {
    pub artifact_id: Option<String>,
    pub classifiers: Vec<String>,
}

impl From<&PublicationConfig> for PublicationRequest {
    fn from(config: &PublicationConfig) -> Self {
        Self {
            artifact_id: config.artifact_id.clone(),
            classifiers: config.classifiers.clone(),
        }
    }
}

/// One publication under the project's own coordinate carrying every artifact
pub fn generate(
    spec: &ProjectSpec,
    artifacts: &[Artifact],
) -> Result<Vec<PublicationDescriptor>, PublicationError> {
    let coordinate = Coordinate::new(&spec.group, &spec.name, &spec.version)?;
    Ok(vec![PublicationDescriptor {
        coordinate,
        artifacts: artifacts.to_vec(),
    }])
}

/// One publication per request. Coordinates must be unique across the result.
pub fn generate_grouped(
    spec: &ProjectSpec,
    artifacts: &[Artifact],
    requests: &[PublicationRequest],
) -> Result<Vec<PublicationDescriptor>, PublicationError> {
    let mut seen = HashSet::new();
    let mut descriptors = Vec::with_capacity(requests.len());

    for request in requests {
        let name = request.artifact_id.as_deref().unwrap_or(&spec.name);
        let coordinate = Coordinate::new(&spec.group, name, &spec.version)?;

        let mut selected = Vec::with_capacity(request.classifiers.len());
        for classifier in &request.classifiers {
            let artifact = artifacts
                .iter()
                .find(|a| &a.classifier == classifier)
                .ok_or_else(|| PublicationError::UnknownClassifier {
                    publication: coordinate.to_string(),
                    classifier: classifier.clone(),
                })?;
            selected.push(artifact.clone());
        }

        if !seen.insert(coordinate.clone()) {
            return Err(PublicationError::DuplicateCoordinate(coordinate.to_string()));
        }
        descriptors.push(PublicationDescriptor {
            coordinate,
            artifacts: selected,
        });
    }

    Ok(descriptors)
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
