//! Repository upload collaborator
//!
//! Remote transports live outside Kiln. The built-in [`LocalRepository`] lays
//! publications out the way a Maven repository does, which is enough for
//! local consumption and for tests.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::publication::{Coordinate, PublicationDescriptor};

/// Confirmation returned by an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub coordinate: Coordinate,
    pub location: String,
}

pub trait UploadClient: Send + Sync {
    fn name(&self) -> &str;

    /// Filesystem location this client writes to, if any
    fn location(&self) -> Option<PathBuf> {
        None
    }

    fn upload(&self, descriptor: &PublicationDescriptor) -> Result<UploadReceipt>;
}

#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl UploadClient for LocalRepository {
    fn name(&self) -> &str {
        "local"
    }

    fn location(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }

    fn upload(&self, descriptor: &PublicationDescriptor) -> Result<UploadReceipt> {
        let coordinate = &descriptor.coordinate;
        let dir = self.root.join(coordinate.repository_path());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create repository directory {}", dir.display()))?;

        let stem = coordinate.file_stem();
        for artifact in &descriptor.artifacts {
            let target = dir.join(format!(
                "{}-{}.{}",
                stem,
                artifact.classifier,
                crate::packager::ARCHIVE_EXTENSION
            ));
            fs::copy(&artifact.path, &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    artifact.path.display(),
                    target.display()
                )
            })?;

            let checksum = target.with_file_name(format!(
                "{}.sha256",
                target
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ));
            fs::write(&checksum, &artifact.sha256)
                .with_context(|| format!("Failed to write {}", checksum.display()))?;
        }

        let pom = dir.join(format!("{}.pom", stem));
        fs::write(&pom, descriptor.to_pom())
            .with_context(|| format!("Failed to write {}", pom.display()))?;

        let manifest = dir.join(format!("{}.json", stem));
        let json = serde_json::to_string_pretty(descriptor)?;
        fs::write(&manifest, json)
            .with_context(|| format!("Failed to write {}", manifest.display()))?;

        info!(coordinate = %coordinate, location = %dir.display(), "published");
        Ok(UploadReceipt {
            coordinate: coordinate.clone(),
            location: dir.display().to_string(),
        })
    }
}
