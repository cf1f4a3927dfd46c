use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::actions::{Action, TaskContext};
use crate::resolver::{BuildInfoSpec, ProjectSpec};

#[derive(Serialize)]
struct BuildInfo<'a> {
    name: &'a str,
    group: &'a str,
    version: &'a str,
}

/// Writes `{name, group, version}` as JSON under
/// `<output>/generated/<module path>/<filename>`
pub struct BuildInfoTask;

impl BuildInfoTask {
    pub fn target(output_dir: &std::path::Path, build_info: &BuildInfoSpec) -> PathBuf {
        let mut path = output_dir.join("generated");
        for segment in build_info.output_module.split('.').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(&build_info.filename);
        path
    }

    fn render(spec: &ProjectSpec) -> Result<String> {
        let info = BuildInfo {
            name: &spec.name,
            group: &spec.group,
            version: &spec.version,
        };
        Ok(serde_json::to_string_pretty(&info)?)
    }
}

impl Action for BuildInfoTask {
    fn describe(&self) -> String {
        "generate build info".to_string()
    }

    fn execute(&self, ctx: &TaskContext) -> Result<()> {
        let Some(build_info) = &ctx.spec.build_info else {
            info!("no build info requested, nothing to generate");
            return Ok(());
        };

        let target = Self::target(&ctx.output_dir, build_info);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, Self::render(&ctx.spec)?)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        info!(path = %target.display(), "generated build info");
        Ok(())
    }

    fn outputs(&self, ctx: &TaskContext) -> Vec<PathBuf> {
        ctx.spec
            .build_info
            .as_ref()
            .map(|build_info| vec![Self::target(&ctx.output_dir, build_info)])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::context;
    use std::sync::Arc;

    #[test]
    fn test_build_info_is_written_under_module_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ctx = context(temp_dir.path());
        let mut spec = (*ctx.spec).clone();
        spec.build_info = Some(BuildInfoSpec {
            output_module: "org.example.lib".to_string(),
            filename: "build-info.json".to_string(),
        });
        ctx.spec = Arc::new(spec);

        BuildInfoTask.execute(&ctx).unwrap();

        let target = temp_dir
            .path()
            .join("build/generated/org/example/lib/build-info.json");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(json["name"], "lib");
        assert_eq!(json["group"], "org.example");
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(BuildInfoTask.outputs(&ctx), vec![target]);
    }

    #[test]
    fn test_absent_build_info_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(temp_dir.path());
        BuildInfoTask.execute(&ctx).unwrap();
        assert!(!temp_dir.path().join("build").exists());
        assert!(BuildInfoTask.outputs(&ctx).is_empty());
    }
}
