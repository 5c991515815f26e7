//! File existence checks used for `Cargo.toml` ownership lookups.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Answers whether a path (relative to the crate root) exists.
pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem under `root`.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).exists()
    }
}

/// A fixed set of known paths, handy when the log comes from another machine.
impl FileProbe for BTreeSet<PathBuf> {
    fn exists(&self, path: &Path) -> bool {
        self.contains(path)
    }
}
