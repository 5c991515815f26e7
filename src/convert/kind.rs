//! Mapping from crate kind and host/device support to Android module types.

use super::names::pkg_to_crate_name;
use super::unit::{CrateKind, EnvSupport};

/// Names a unit contributes to its default output stem.
#[derive(Debug, Clone, Copy)]
pub struct UnitNames<'a> {
    pub crate_name: &'a str,
    pub root_pkg: &'a str,
    pub main_src: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleKind {
    /// `None` when the crate kind has no Android module counterpart.
    pub module_type: Option<String>,
    pub default_stem: String,
}

pub fn resolve(kind: &CrateKind, env: EnvSupport, names: &UnitNames) -> ModuleKind {
    let host = if env.device { "" } else { "_host" };
    let (module_type, default_stem) = match kind {
        CrateKind::Bin => (
            Some(format!("rust_binary{host}")),
            names.crate_name.to_string(),
        ),
        CrateKind::Lib => (
            Some(format!("rust_library{host}_rlib")),
            format!("lib{}", names.crate_name),
        ),
        CrateKind::Cdylib => (
            Some(format!("rust_library{host}_dylib")),
            format!("lib{}.so", names.crate_name),
        ),
        CrateKind::Test => (Some(format!("rust_test{host}")), test_module_name(names)),
        CrateKind::ProcMacro => (
            Some("rust_proc_macro".to_string()),
            format!("lib{}", names.crate_name),
        ),
        CrateKind::Unknown(_) => (None, String::new()),
    };
    ModuleKind {
        module_type,
        default_stem,
    }
}

/// Unique test module name built from root package, crate name and source path.
///
/// The crate name is dropped in favour of `test` when it only repeats the
/// package name or the source file name.
pub fn test_module_name(names: &UnitNames) -> String {
    let first = pkg_to_crate_name(names.root_pkg);
    let mut last = names
        .main_src
        .strip_suffix(".rs")
        .unwrap_or(names.main_src)
        .replace('/', "_");
    let mut middle = names.crate_name;
    if first.starts_with(middle) || last.ends_with(middle) {
        middle = "test";
    }
    last = pkg_to_crate_name(&last);
    if last.contains(middle) {
        format!("{}_{}", names.root_pkg, last)
    } else {
        format!("{}_{}_{}", names.root_pkg, middle, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: EnvSupport = EnvSupport {
        host: true,
        device: false,
    };
    const BOTH: EnvSupport = EnvSupport {
        host: true,
        device: true,
    };

    fn names<'a>(crate_name: &'a str, root_pkg: &'a str, main_src: &'a str) -> UnitNames<'a> {
        UnitNames {
            crate_name,
            root_pkg,
            main_src,
        }
    }

    #[test]
    fn test_resolve_table() {
        let n = names("foo", "foo", "src/lib.rs");
        let cases = [
            (CrateKind::Bin, "rust_binary_host", "foo"),
            (CrateKind::Lib, "rust_library_host_rlib", "libfoo"),
            (CrateKind::Cdylib, "rust_library_host_dylib", "libfoo.so"),
            (CrateKind::ProcMacro, "rust_proc_macro", "libfoo"),
        ];
        for (kind, module_type, stem) in cases {
            let resolved = resolve(&kind, HOST, &n);
            assert_eq!(resolved.module_type.as_deref(), Some(module_type));
            assert_eq!(resolved.default_stem, stem);
        }
    }

    #[test]
    fn test_resolve_device_drops_host_suffix() {
        let n = names("foo", "foo", "src/main.rs");
        let resolved = resolve(&CrateKind::Bin, BOTH, &n);
        assert_eq!(resolved.module_type.as_deref(), Some("rust_binary"));
        let resolved = resolve(&CrateKind::Lib, BOTH, &n);
        assert_eq!(resolved.module_type.as_deref(), Some("rust_library_rlib"));
    }

    #[test]
    fn test_resolve_unknown_kind() {
        let n = names("foo", "foo", "src/lib.rs");
        let resolved = resolve(&CrateKind::Unknown("staticlib".into()), HOST, &n);
        assert_eq!(resolved.module_type, None);
        assert!(resolved.default_stem.is_empty());
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let n = names("a", "foo", "tests/a.rs");
        assert_eq!(
            resolve(&CrateKind::Test, BOTH, &n),
            resolve(&CrateKind::Test, BOTH, &n)
        );
    }

    #[test]
    fn test_test_module_name_collapses_redundant_parts() {
        // crate name repeats the file name
        assert_eq!(
            test_module_name(&names("a", "foo", "tests/a.rs")),
            "foo_tests_a"
        );
        // crate name repeats the package name
        assert_eq!(
            test_module_name(&names("foo", "foo", "src/lib.rs")),
            "foo_test_src_lib"
        );
        // distinct crate name stays in the middle
        assert_eq!(
            test_module_name(&names("integration", "my-pkg", "src/main.rs")),
            "my-pkg_integration_src_main"
        );
    }
}
