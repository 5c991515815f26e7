//! Attribution of compiler warnings to the crates that own the warned files.

use super::unit::CompilationUnit;
use crate::probe::FileProbe;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Relative paths named by warning location lines.
#[derive(Debug, Default)]
pub struct WarnedFiles(BTreeSet<String>);

impl WarnedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warned path; absolute paths are outside the crate and dropped.
    pub fn record(&mut self, path: &str) -> bool {
        if path.starts_with('/') {
            return false;
        }
        self.0.insert(path.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub owned: usize,
    pub unowned: usize,
}

/// Marks the unit owning each warned file.
///
/// The owner is the unit with the longest `cargo_dir` that is a directory
/// prefix of the file. When some file has no owner and the crate root has a
/// `Cargo.toml`, every root-level unit is marked instead.
pub fn attribute_warnings(
    units: &mut [CompilationUnit],
    warned: &WarnedFiles,
    probe: &dyn FileProbe,
) -> Attribution {
    let mut result = Attribution::default();
    for file in &warned.0 {
        match owner_of(units, file) {
            Some(idx) => {
                units[idx].has_warning = true;
                result.owned += 1;
            }
            None => result.unowned += 1,
        }
    }
    if result.unowned > 0 && probe.exists(Path::new("Cargo.toml")) {
        for unit in units
            .iter_mut()
            .filter(|u| u.cargo_dir.is_empty() && !u.is_excluded())
        {
            unit.has_warning = true;
        }
    }
    debug!(
        owned = result.owned,
        unowned = result.unowned,
        "attributed warnings"
    );
    result
}

fn owner_of(units: &[CompilationUnit], file: &str) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, unit) in units.iter().enumerate() {
        if unit.cargo_dir.is_empty() || unit.is_excluded() {
            continue;
        }
        let inside = file
            .strip_prefix(unit.cargo_dir.as_str())
            .is_some_and(|rest| rest.starts_with('/'));
        let longer = best.is_none_or(|(_, len)| unit.cargo_dir.len() > len);
        if inside && longer {
            best = Some((idx, unit.cargo_dir.len()));
        }
    }
    best.map(|(idx, _)| idx)
}
