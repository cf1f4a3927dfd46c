//! Project metadata resolution
//!
//! Turns the raw `project` block of `kiln.yml` into an immutable [`ProjectSpec`].
//! Resolution reads nothing but its input, so resolving the same block twice
//! always yields equal specs.

use serde::Serialize;

use crate::configs::project::{RawBuildInfoConfig, RawProjectConfig};
use crate::types::ConfigError;

/// Validated project metadata shared by every component of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSpec {
    pub name: String,
    pub group: String,
    pub version: String,
    pub build_info: Option<BuildInfoSpec>,
}

/// Where the generated build-info file goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfoSpec {
    pub output_module: String,
    pub filename: String,
}

impl ProjectSpec {
    /// `<name>-<version>`, the stem shared by every file this project produces
    pub fn base_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

pub fn resolve(raw: &RawProjectConfig) -> Result<ProjectSpec, ConfigError> {
    let name = path_segment(required(raw.name.as_deref(), "project.name")?, "project.name")?;
    let group = dotted(required(raw.group.as_deref(), "project.group")?, "project.group")?;
    let version = path_segment(
        required(raw.version.as_deref(), "project.version")?,
        "project.version",
    )?;
    let build_info = raw.build_info.as_ref().map(resolve_build_info).transpose()?;

    Ok(ProjectSpec {
        name,
        group,
        version,
        build_info,
    })
}

fn resolve_build_info(raw: &RawBuildInfoConfig) -> Result<BuildInfoSpec, ConfigError> {
    let output_module = required(raw.output_module.as_deref(), "project.buildInfo.outputModule")?;
    let filename = required(raw.filename.as_deref(), "project.buildInfo.filename")?;
    Ok(BuildInfoSpec {
        output_module: dotted(output_module, "project.buildInfo.outputModule")?,
        filename: path_segment(filename, "project.buildInfo.filename")?,
    })
}

/// Values that become a single path component under the output or
/// repository directory
fn path_segment(value: String, field: &'static str) -> Result<String, ConfigError> {
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ConfigError::InvalidField {
            field,
            value,
            message: "must not contain path separators or be '.' or '..'",
        });
    }
    Ok(value)
}

/// Dot-separated names such as `org.example.lib`, each part one path component
fn dotted(value: String, field: &'static str) -> Result<String, ConfigError> {
    if value.contains(['/', '\\']) || value.split('.').any(|part| part.trim().is_empty()) {
        return Err(ConfigError::InvalidField {
            field,
            value,
            message: "must be dot-separated names without path separators",
        });
    }
    Ok(value)
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, ConfigError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ConfigError::MissingField { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: Option<&str>, group: Option<&str>, version: Option<&str>) -> RawProjectConfig {
        RawProjectConfig {
            name: name.map(String::from),
            group: group.map(String::from),
            version: version.map(String::from),
            build_info: None,
        }
    }

    #[test]
    fn test_resolve_complete_config() {
        let spec = resolve(&raw(Some("lib"), Some("org.example"), Some("1.0.0"))).unwrap();
        assert_eq!(spec.name, "lib");
        assert_eq!(spec.group, "org.example");
        assert_eq!(spec.version, "1.0.0");
        assert!(spec.build_info.is_none(), "build info defaults to absent");
        assert_eq!(spec.base_name(), "lib-1.0.0");
    }

    #[test]
    fn test_missing_fields_are_named() {
        let cases = [
            (raw(None, Some("g"), Some("1")), "project.name"),
            (raw(Some("n"), None, Some("1")), "project.group"),
            (raw(Some("n"), Some("g"), None), "project.version"),
            (raw(Some("n"), Some("  "), Some("1")), "project.group"),
        ];

        for (input, expected) in cases {
            match resolve(&input) {
                Err(ConfigError::MissingField { field }) => assert_eq!(field, expected),
                other => panic!("expected missing {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_build_info_requires_both_fields() {
        let mut input = raw(Some("lib"), Some("org.example"), Some("1.0.0"));
        input.build_info = Some(RawBuildInfoConfig {
            output_module: Some("org.example.lib".to_string()),
            filename: None,
        });

        match resolve(&input) {
            Err(ConfigError::MissingField { field }) => {
                assert_eq!(field, "project.buildInfo.filename")
            }
            other => panic!("unexpected result {:?}", other),
        }

        input.build_info = Some(RawBuildInfoConfig {
            output_module: Some("org.example.lib".to_string()),
            filename: Some("info.json".to_string()),
        });
        let spec = resolve(&input).unwrap();
        assert_eq!(
            spec.build_info,
            Some(BuildInfoSpec {
                output_module: "org.example.lib".to_string(),
                filename: "info.json".to_string(),
            })
        );
    }

    #[test]
    fn test_values_that_escape_the_output_dir_are_rejected() {
        let cases = [
            (raw(Some("../lib"), Some("org.example"), Some("1.0.0")), "project.name"),
            (raw(Some("lib"), Some("org/example"), Some("1.0.0")), "project.group"),
            (raw(Some("lib"), Some("org..example"), Some("1.0.0")), "project.group"),
            (raw(Some("lib"), Some("org.example"), Some("..")), "project.version"),
        ];
        for (input, expected) in cases {
            match resolve(&input) {
                Err(ConfigError::InvalidField { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {}, got {:?}", expected, other),
            }
        }

        let mut input = raw(Some("lib"), Some("org.example"), Some("1.0.0"));
        input.build_info = Some(RawBuildInfoConfig {
            output_module: Some("org.example.lib".to_string()),
            filename: Some("../../../escaped.json".to_string()),
        });
        match resolve(&input) {
            Err(ConfigError::InvalidField { field, value, .. }) => {
                assert_eq!(field, "project.buildInfo.filename");
                assert_eq!(value, "../../../escaped.json");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let input = raw(Some("lib"), Some("org.example"), Some("1.0.0"));
        assert_eq!(resolve(&input).unwrap(), resolve(&input).unwrap());
    }
}
