//! Artifact packaging
//!
//! Collects the files under a set of roots into a reproducible `.tar.gz`
//! bundle named `<name>-<version>-<classifier>.tar.gz`. Members are sorted by
//! their path relative to the root that provided them and every header carries
//! fixed metadata, so packaging the same files twice yields identical bytes.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use flate2::{Compression, GzBuilder};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tar::{EntryType, Header};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::configs::publishing::ArtifactConfig;
use crate::resolver::ProjectSpec;
use crate::types::PackagingError;

pub const ARCHIVE_EXTENSION: &str = "tar.gz";

const DEFAULT_EXCLUDE_GLOBS: &[&str] = &["**/.git/**"];

/// What to put in one classifier bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    pub classifier: String,
    pub roots: Vec<PathBuf>,
    pub excludes: Vec<String>,
}

impl PackageRequest {
    /// Build a request from config, resolving relative roots against `project_root`
    pub fn from_config(config: &ArtifactConfig, project_root: &Path) -> Self {
        Self {
            classifier: config.classifier.clone(),
            roots: config
                .roots
                .iter()
                .map(|root| project_root.join(root))
                .collect(),
            excludes: config.excludes.clone().unwrap_or_default(),
        }
    }
}

/// A packaged bundle on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub classifier: String,
    pub roots: Vec<PathBuf>,
    /// Archive member names, sorted
    pub members: Vec<String>,
    pub path: PathBuf,
    pub sha256: String,
    pub size: u64,
}

impl Artifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Where the archive for `classifier` lands
pub fn archive_path(spec: &ProjectSpec, classifier: &str, output_dir: &Path) -> PathBuf {
    output_dir.join(format!(
        "{}-{}.{}",
        spec.base_name(),
        classifier,
        ARCHIVE_EXTENSION
    ))
}

pub fn package_artifact(
    spec: &ProjectSpec,
    request: &PackageRequest,
    output_dir: &Path,
) -> Result<Artifact, PackagingError> {
    let excludes = build_exclude_set(&request.excludes)?;
    let members = collect_members(request, &excludes)?;

    if members.is_empty() {
        return Err(PackagingError::EmptyFileSet {
            classifier: request.classifier.clone(),
            roots: request.roots.clone(),
        });
    }

    fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;
    let path = archive_path(spec, &request.classifier, output_dir);
    write_archive(&members, output_dir, &path)?;

    let (sha256, size) = digest_file(&path).map_err(io_error(&path))?;
    info!(
        classifier = %request.classifier,
        path = %path.display(),
        members = members.len(),
        "packaged artifact"
    );

    Ok(Artifact {
        classifier: request.classifier.clone(),
        roots: request.roots.clone(),
        members: members.into_keys().collect(),
        path,
        sha256,
        size,
    })
}

/// Package every configured artifact, stopping at the first failure
pub fn package_all(
    spec: &ProjectSpec,
    configs: &[ArtifactConfig],
    project_root: &Path,
    output_dir: &Path,
) -> Result<Vec<Artifact>, PackagingError> {
    configs
        .iter()
        .map(|config| {
            let request = PackageRequest::from_config(config, project_root);
            package_artifact(spec, &request, output_dir)
        })
        .collect()
}

fn build_exclude_set(extra: &[String]) -> Result<GlobSet, PackagingError> {
    let mut builder = GlobSetBuilder::new();
    let patterns = DEFAULT_EXCLUDE_GLOBS
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().cloned());
    for pattern in patterns {
        let glob = Glob::new(&pattern).map_err(|source| PackagingError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| PackagingError::Pattern {
        pattern: extra.join(", "),
        source,
    })
}

/// Map of archive member name to the file providing it
fn collect_members(
    request: &PackageRequest,
    excludes: &GlobSet,
) -> Result<BTreeMap<String, PathBuf>, PackagingError> {
    let mut members = BTreeMap::new();

    for root in &request.roots {
        if !root.exists() {
            warn!(root = %root.display(), classifier = %request.classifier, "root does not exist, skipping");
            continue;
        }

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|source| PackagingError::Walk {
                root: root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            // A root that is itself a file contributes it under its own name
            let relative = if entry.depth() == 0 {
                PathBuf::from(entry.file_name())
            } else {
                entry
                    .path()
                    .strip_prefix(root)
                    .unwrap_or(entry.path())
                    .to_path_buf()
            };

            if excludes.is_match(&relative) {
                debug!(path = %entry.path().display(), "excluded from bundle");
                continue;
            }

            let member = member_name(&relative);
            if members.contains_key(&member) {
                return Err(PackagingError::DuplicateEntry {
                    classifier: request.classifier.clone(),
                    member,
                });
            }
            members.insert(member, entry.path().to_path_buf());
        }
    }

    Ok(members)
}

/// Archive member names always use forward slashes
fn member_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_archive(
    members: &BTreeMap<String, PathBuf>,
    output_dir: &Path,
    destination: &Path,
) -> Result<(), PackagingError> {
    // Written next to the destination and renamed, so a failed run never
    // leaves a truncated archive behind
    let temp = tempfile::NamedTempFile::new_in(output_dir).map_err(io_error(output_dir))?;

    let encoder = GzBuilder::new()
        .mtime(0)
        .write(temp.as_file(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (member, source) in members {
        let mut file = File::open(source).map_err(io_error(source))?;
        let len = file.metadata().map_err(io_error(source))?.len();

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(len);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        builder
            .append_data(&mut header, member, &mut file)
            .map_err(io_error(destination))?;
    }

    let encoder = builder.into_inner().map_err(io_error(destination))?;
    encoder.finish().map_err(io_error(destination))?;

    temp.persist(destination)
        .map_err(|err| io_error(destination)(err.error))?;
    Ok(())
}

fn digest_file(path: &Path) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let size = io::copy(&mut file, &mut hasher)?;
    Ok((format!("{:x}", hasher.finalize()), size))
}

fn io_error(path: &Path) -> impl Fn(io::Error) -> PackagingError + '_ {
    move |source| PackagingError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Artifacts produced so far in a run, shared between tasks
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    inner: Arc<Mutex<Vec<Artifact>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artifact, replacing any earlier one with the same classifier
    pub fn register(&self, artifact: Artifact) {
        let mut artifacts = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        artifacts.retain(|existing| existing.classifier != artifact.classifier);
        artifacts.push(artifact);
    }

    pub fn snapshot(&self) -> Vec<Artifact> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    fn spec() -> ProjectSpec {
        ProjectSpec {
            name: "lib".to_string(),
            group: "org.example".to_string(),
            version: "1.0.0".to_string(),
            build_info: None,
        }
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn request(classifier: &str, roots: Vec<PathBuf>) -> PackageRequest {
        PackageRequest {
            classifier: classifier.to_string(),
            roots,
            excludes: Vec::new(),
        }
    }

    fn archive_members(path: &Path) -> Vec<String> {
        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                entry
                    .unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_archive_is_named_after_the_project() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("src");
        write(&src.join("Main.java"), "class Main {}");

        let out = temp_dir.path().join("out");
        let artifact = package_artifact(&spec(), &request("sources", vec![src]), &out).unwrap();

        assert_eq!(artifact.path, out.join("lib-1.0.0-sources.tar.gz"));
        assert_eq!(artifact.file_name(), "lib-1.0.0-sources.tar.gz");
        assert!(artifact.path.exists());
        assert_eq!(artifact.sha256.len(), 64);
        assert_eq!(artifact.size, fs::metadata(&artifact.path).unwrap().len());
    }

    #[test]
    fn test_members_are_sorted_across_roots() {
        let temp_dir = tempfile::tempdir().unwrap();
        let main = temp_dir.path().join("main");
        let generated = temp_dir.path().join("generated");
        write(&main.join("org/example/Zeta.java"), "z");
        write(&main.join("org/example/Alpha.java"), "a");
        write(&generated.join("org/example/BuildInfo.json"), "{}");
        write(&main.join(".git/HEAD"), "ref");

        let out = temp_dir.path().join("out");
        let artifact = package_artifact(
            &spec(),
            &request("sources", vec![main, generated]),
            &out,
        )
        .unwrap();

        let expected = vec![
            "org/example/Alpha.java".to_string(),
            "org/example/BuildInfo.json".to_string(),
            "org/example/Zeta.java".to_string(),
        ];
        assert_eq!(artifact.members, expected);
        assert_eq!(archive_members(&artifact.path), expected);
    }

    #[test]
    fn test_packaging_is_byte_identical() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("src");
        write(&src.join("a.txt"), "alpha");
        write(&src.join("nested/b.txt"), "beta");

        let first_out = temp_dir.path().join("first");
        let second_out = temp_dir.path().join("second");
        let first = package_artifact(&spec(), &request("sources", vec![src.clone()]), &first_out).unwrap();
        let second = package_artifact(&spec(), &request("sources", vec![src]), &second_out).unwrap();

        assert_eq!(
            fs::read(&first.path).unwrap(),
            fs::read(&second.path).unwrap(),
            "archives of the same file set must match byte for byte"
        );
        assert_eq!(first.sha256, second.sha256);
    }

    #[test]
    fn test_empty_file_set_creates_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let empty = temp_dir.path().join("empty");
        fs::create_dir_all(&empty).unwrap();
        let out = temp_dir.path().join("out");

        let err = package_artifact(
            &spec(),
            &request("javadoc", vec![empty, temp_dir.path().join("missing")]),
            &out,
        )
        .unwrap_err();

        assert!(matches!(err, PackagingError::EmptyFileSet { ref classifier, .. } if classifier == "javadoc"));
        assert!(!archive_path(&spec(), "javadoc", &out).exists());
        assert!(!out.exists(), "output directory should not be created");
    }

    #[test]
    fn test_excludes_apply_relative_to_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("src");
        write(&src.join("keep.txt"), "keep");
        write(&src.join("scratch/drop.tmp"), "drop");

        let mut req = request("sources", vec![src]);
        req.excludes = vec!["**/*.tmp".to_string()];
        let artifact = package_artifact(&spec(), &req, &temp_dir.path().join("out")).unwrap();
        assert_eq!(artifact.members, vec!["keep.txt".to_string()]);
    }

    #[test]
    fn test_duplicate_members_are_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let first = temp_dir.path().join("first");
        let second = temp_dir.path().join("second");
        write(&first.join("same.txt"), "1");
        write(&second.join("same.txt"), "2");

        let err = package_artifact(
            &spec(),
            &request("sources", vec![first, second]),
            &temp_dir.path().join("out"),
        )
        .unwrap_err();
        assert!(matches!(err, PackagingError::DuplicateEntry { ref member, .. } if member == "same.txt"));
    }

    #[test]
    fn test_store_replaces_same_classifier() {
        let store = ArtifactStore::new();
        let artifact = |classifier: &str, sha: &str| Artifact {
            classifier: classifier.to_string(),
            roots: Vec::new(),
            members: Vec::new(),
            path: PathBuf::from(format!("{}.tar.gz", classifier)),
            sha256: sha.to_string(),
            size: 0,
        };

        store.register(artifact("sources", "1"));
        store.register(artifact("javadoc", "2"));
        store.register(artifact("sources", "3"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].classifier, "javadoc");
        assert_eq!(snapshot[1].sha256, "3");
    }
}
