//! Output path locks
//!
//! A task holds every path it declares as output while it runs. Two paths
//! conflict when they are equal or one contains the other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct PathLocks {
    held: HashMap<PathBuf, String>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner currently holding a path that overlaps `path`
    pub fn holder(&self, path: &Path) -> Option<&str> {
        self.held
            .iter()
            .find(|(held, _)| overlaps(held, path))
            .map(|(_, owner)| owner.as_str())
    }

    /// Take every path for `owner`, or nothing if any of them is held by
    /// another owner
    pub fn try_acquire(&mut self, owner: &str, paths: &[PathBuf]) -> bool {
        let blocked = paths.iter().any(|path| {
            self.holder(path)
                .map_or(false, |holder| holder != owner)
        });
        if blocked {
            return false;
        }
        for path in paths {
            self.held.insert(path.clone(), owner.to_string());
        }
        true
    }

    pub fn release(&mut self, owner: &str) {
        self.held.retain(|_, held_by| held_by != owner);
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}
