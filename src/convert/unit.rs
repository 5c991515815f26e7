use super::kind::{self, UnitNames};
use super::names::{is_build_script_name, is_dependent_path};
use crate::error::ParseIssue;
use std::fmt;

/// Kind of artifact a rustc invocation produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CrateKind {
    Bin,
    /// `lib` / `rlib`, emitted as an rlib library
    Lib,
    /// `cdylib` / `dylib`
    Cdylib,
    Test,
    ProcMacro,
    /// Declared but unsupported (e.g. `staticlib`), or never declared (empty).
    Unknown(String),
}

impl CrateKind {
    pub fn from_crate_type(crate_type: &str) -> Self {
        match crate_type {
            "bin" => CrateKind::Bin,
            "lib" | "rlib" => CrateKind::Lib,
            "cdylib" | "dylib" => CrateKind::Cdylib,
            "test" => CrateKind::Test,
            "proc-macro" => CrateKind::ProcMacro,
            other => CrateKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CrateKind::Bin => "bin",
            CrateKind::Lib => "lib",
            CrateKind::Cdylib => "cdylib",
            CrateKind::Test => "test",
            CrateKind::ProcMacro => "proc-macro",
            CrateKind::Unknown(s) => s,
        }
    }
}

impl Default for CrateKind {
    fn default() -> Self {
        CrateKind::Unknown(String::new())
    }
}

/// Which environments a unit is built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EnvSupport {
    pub host: bool,
    pub device: bool,
}

impl EnvSupport {
    pub fn both(&self) -> bool {
        self.host && self.device
    }

    pub fn union(self, other: EnvSupport) -> EnvSupport {
        EnvSupport {
            host: self.host || other.host,
            device: self.device || other.device,
        }
    }
}

/// Parsed flags that must be identical before two units can merge.
///
/// Full extern paths and the target triple are deliberately absent: they
/// differ between host and device builds of the same crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlagSet {
    pub edition: String,
    pub cap_lints: Option<String>,
    pub emit_list: String,
    pub cfgs: Vec<String>,
    pub features: Vec<String>,
    pub codegens: Vec<String>,
    pub core_externs: Vec<String>,
    pub static_libs: Vec<String>,
    pub shared_libs: Vec<String>,
}

/// rustc's default edition when `--edition` is absent.
pub const DEFAULT_EDITION: &str = "2015";

impl Default for FlagSet {
    fn default() -> Self {
        Self {
            edition: DEFAULT_EDITION.to_string(),
            cap_lints: None,
            emit_list: String::new(),
            cfgs: Vec::new(),
            features: Vec::new(),
            codegens: Vec::new(),
            core_externs: Vec::new(),
            static_libs: Vec::new(),
            shared_libs: Vec::new(),
        }
    }
}

impl FlagSet {
    pub(crate) fn normalize(&mut self) {
        for list in [
            &mut self.cfgs,
            &mut self.features,
            &mut self.codegens,
            &mut self.core_externs,
            &mut self.static_libs,
            &mut self.shared_libs,
        ] {
            sort_unique(list);
        }
    }
}

pub(crate) fn sort_unique(list: &mut Vec<String>) {
    list.sort();
    list.dedup();
}

/// Why a unit is kept out of merging and module output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    BuildScript(String),
    DependentCrate,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::BuildScript(name) => write!(f, "{name}"),
            Exclusion::DependentCrate => write!(f, "dependent crate"),
        }
    }
}

/// One compilation unit, built from a single `rustc` invocation and
/// possibly merged with its host/device or split-test siblings.
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    /// 1-based line in the cargo log.
    pub line_num: usize,
    /// rustc arguments as logged.
    pub line: String,
    pub crate_name: String,
    pub kind: CrateKind,
    pub root_pkg: String,
    pub main_src: String,
    pub srcs: Vec<String>,
    pub module_name: String,
    pub module_type: Option<String>,
    pub stem: String,
    pub target: Option<String>,
    pub env: EnvSupport,
    pub has_warning: bool,
    pub flags: FlagSet,
    /// `name = libname-hash.rlib` entries.
    pub externs: Vec<String>,
    /// Deepest directory holding a `Cargo.toml` above `main_src`; empty for the root.
    pub cargo_dir: String,
    pub errors: Vec<ParseIssue>,
    /// Merge history, only filled when debug output is requested.
    pub merge_notes: Vec<String>,
}

impl CompilationUnit {
    pub fn exclusion(&self) -> Option<Exclusion> {
        if is_build_script_name(&self.crate_name) {
            Some(Exclusion::BuildScript(self.crate_name.clone()))
        } else if is_dependent_path(&self.main_src) {
            Some(Exclusion::DependentCrate)
        } else {
            None
        }
    }

    pub fn is_excluded(&self) -> bool {
        self.exclusion().is_some()
    }

    /// Error-free, not excluded, and of a kind that maps to a module.
    pub fn is_mergeable(&self) -> bool {
        self.errors.is_empty() && !self.is_excluded() && self.module_type.is_some()
    }

    /// Dependency crates listed by the dependency report.
    pub fn is_dependency(&self) -> bool {
        matches!(self.exclusion(), Some(Exclusion::DependentCrate))
    }

    /// Recomputes the module type; the default stem is kept only for
    /// units that have not absorbed split tests.
    pub fn refresh_module_kind(&mut self) {
        let resolved = kind::resolve(
            &self.kind,
            self.env,
            &UnitNames {
                crate_name: &self.crate_name,
                root_pkg: &self.root_pkg,
                main_src: &self.main_src,
            },
        );
        self.module_type = resolved.module_type;
        if self.srcs.len() <= 1 {
            self.stem = resolved.default_stem;
        }
    }

    /// `pkg "feat1,feat2"` line of the dependency report.
    pub fn feature_list(&self) -> String {
        let pkg = match self.main_src.strip_prefix(".../") {
            Some(rest) => rest.split('/').next().unwrap_or(rest),
            None => self.main_src.as_str(),
        };
        if self.flags.features.is_empty() {
            pkg.to_string()
        } else {
            format!("{} \"{}\"", pkg, self.flags.features.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_kind_from_crate_type() {
        assert_eq!(CrateKind::from_crate_type("rlib"), CrateKind::Lib);
        assert_eq!(CrateKind::from_crate_type("proc-macro"), CrateKind::ProcMacro);
        assert_eq!(
            CrateKind::from_crate_type("staticlib"),
            CrateKind::Unknown("staticlib".into())
        );
        assert_eq!(CrateKind::Cdylib.as_str(), "cdylib");
    }

    #[test]
    fn test_exclusion() {
        let mut unit = CompilationUnit {
            crate_name: "build_script_build".into(),
            main_src: "build.rs".into(),
            ..Default::default()
        };
        assert_eq!(
            unit.exclusion(),
            Some(Exclusion::BuildScript("build_script_build".into()))
        );
        unit.crate_name = "libc".into();
        unit.main_src = ".../libc-0.2.80/src/lib.rs".into();
        assert!(unit.is_dependency());
        unit.main_src = "src/lib.rs".into();
        assert!(!unit.is_excluded());
    }

    #[test]
    fn test_feature_list() {
        let mut unit = CompilationUnit {
            main_src: ".../libc-0.2.80/src/lib.rs".into(),
            ..Default::default()
        };
        assert_eq!(unit.feature_list(), "libc-0.2.80");
        unit.flags.features = vec!["default".into(), "std".into()];
        assert_eq!(unit.feature_list(), "libc-0.2.80 \"default,std\"");
    }

    #[test]
    fn test_flag_set_normalize() {
        let mut flags = FlagSet {
            cfgs: vec!["b".into(), "a".into(), "b".into()],
            ..Default::default()
        };
        flags.normalize();
        assert_eq!(flags.cfgs, vec!["a", "b"]);
        assert_eq!(flags.edition, DEFAULT_EDITION);
    }
}
