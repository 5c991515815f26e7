use std::collections::BTreeMap;
use std::path::Path;

/// Module names that collide with existing platform libraries.
const DEFAULT_RENAMES: [(&str, &str); 5] = [
    ("libbacktrace", "libbacktrace_rust"),
    ("libgcc", "libgcc_rust"),
    ("liblog", "liblog_rust"),
    ("libsync", "libsync_rust"),
    ("libx86_64", "libx86_64_rust"),
];

/// Renames applied to generated module names and rlib references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTable(BTreeMap<String, String>);

impl Default for RenameTable {
    fn default() -> Self {
        Self(
            DEFAULT_RENAMES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        )
    }
}

impl RenameTable {
    /// Adds or overrides renames on top of the built-in table.
    pub fn extend(&mut self, extra: &BTreeMap<String, String>) {
        for (from, to) in extra {
            self.0.insert(from.clone(), to.clone());
        }
    }

    pub fn apply(&self, name: &str) -> String {
        self.0
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

pub fn pkg_to_crate_name(pkg: &str) -> String {
    pkg.replace(['-', '.'], "_")
}

/// File name without directory and extension.
pub fn file_base_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Crate name rustc derives for a test source file.
pub fn test_base_name(path: &str) -> String {
    pkg_to_crate_name(&file_base_name(path))
}

/// Absolute and shortened `.../` paths belong to other crates.
pub fn is_dependent_path(path: &str) -> bool {
    path.starts_with('/') || path.starts_with(".../")
}

pub fn is_build_script_name(name: &str) -> bool {
    name.starts_with("build_script_")
}

pub fn unquote(s: &str) -> &str {
    if s.len() > 1 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

pub fn escape_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}
