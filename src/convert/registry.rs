//! Merge-or-insert store for parsed compilation units.
//!
//! A unit merges into the first earlier unit (in log order) that is either
//! its host/device twin or a split test of the same package. Only units with
//! the same kind, root package and [`FlagSet`] can ever merge, so candidates
//! are indexed by that key and scanned in insertion order.
//!
//! The outcome for three or more mergeable units depends on log order; logs
//! are expected to list host builds first, then device builds, then tests.

use super::names::{pkg_to_crate_name, test_base_name};
use super::unit::{CompilationUnit, CrateKind, FlagSet};
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    HostDevice,
    TestSplit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted(usize),
    Merged { into: usize, rule: MergeRule },
    /// Kept for reports, never merged.
    Excluded(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MergeKey {
    kind: CrateKind,
    root_pkg: String,
    flags: FlagSet,
}

impl MergeKey {
    fn of(unit: &CompilationUnit) -> Self {
        Self {
            kind: unit.kind.clone(),
            root_pkg: unit.root_pkg.clone(),
            flags: unit.flags.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: Vec<CompilationUnit>,
    candidates: HashMap<MergeKey, Vec<usize>>,
    record_merges: bool,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps a merge history on each surviving unit for debug output.
    pub fn with_merge_notes(mut self, record: bool) -> Self {
        self.record_merges = record;
        self
    }

    pub fn register(&mut self, unit: CompilationUnit) -> Registration {
        if !unit.is_mergeable() {
            let idx = self.push(unit);
            return if self.units[idx].is_excluded() {
                Registration::Excluded(idx)
            } else {
                Registration::Inserted(idx)
            };
        }

        let key = MergeKey::of(&unit);
        if let Some(indices) = self.candidates.get(&key) {
            for &idx in indices {
                let existing = &self.units[idx];
                let rule = if host_device_mergeable(existing, &unit) {
                    MergeRule::HostDevice
                } else if test_mergeable(existing, &unit) {
                    MergeRule::TestSplit
                } else {
                    continue;
                };
                debug!(
                    line = unit.line_num,
                    into = %existing.module_name,
                    ?rule,
                    "merging {}",
                    unit.crate_name
                );
                let record = self.record_merges;
                merge_into(&mut self.units[idx], &unit, rule, record);
                return Registration::Merged { into: idx, rule };
            }
        }

        let idx = self.push(unit);
        self.candidates.entry(key).or_default().push(idx);
        Registration::Inserted(idx)
    }

    fn push(&mut self, unit: CompilationUnit) -> usize {
        trace!(line = unit.line_num, crate_name = %unit.crate_name, "new unit");
        self.units.push(unit);
        self.units.len() - 1
    }

    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [CompilationUnit] {
        &mut self.units
    }

    pub fn into_units(self) -> Vec<CompilationUnit> {
        self.units
    }
}

/// Both error-free with identical merge-relevant flags.
pub fn flags_equivalent(a: &CompilationUnit, b: &CompilationUnit) -> bool {
    a.errors.is_empty() && b.errors.is_empty() && a.flags == b.flags
}

/// Same crate built for another environment.
pub fn host_device_mergeable(existing: &CompilationUnit, new: &CompilationUnit) -> bool {
    existing.crate_name == new.crate_name
        && existing.kind == new.kind
        && existing.main_src == new.main_src
        && existing.stem == new.stem
        && existing.root_pkg == new.root_pkg
        && !existing.is_excluded()
        && !new.is_excluded()
        && flags_equivalent(existing, new)
}

/// Another test binary of the same package.
///
/// A test can only join while its crate name still equals its source base
/// name, i.e. before it absorbed anything itself.
pub fn test_mergeable(existing: &CompilationUnit, new: &CompilationUnit) -> bool {
    existing.kind == CrateKind::Test
        && new.kind == CrateKind::Test
        && existing.root_pkg == new.root_pkg
        && !existing.is_excluded()
        && !new.is_excluded()
        && new.crate_name == test_base_name(&new.main_src)
        && (existing.srcs.len() > 1
            || (existing.crate_name == test_base_name(&existing.main_src)
                && existing.env == new.env))
        && flags_equivalent(existing, new)
}

fn merge_into(existing: &mut CompilationUnit, new: &CompilationUnit, rule: MergeRule, record: bool) {
    if record {
        existing.merge_notes.push(format!(
            "merged line {} ({:?}) {} {}",
            new.line_num, rule, new.crate_name, new.main_src
        ));
    }
    existing.env = existing.env.union(new.env);
    existing.has_warning |= new.has_warning;
    if existing.target.is_none() {
        existing.target = new.target.clone();
    }
    if rule == MergeRule::TestSplit {
        existing.srcs.push(new.main_src.clone());
        let (mine, theirs) = (&existing.module_name, &new.module_name);
        if theirs.len() < mine.len() || (theirs.len() == mine.len() && theirs < mine) {
            existing.module_name = new.module_name.clone();
        }
        existing.stem = existing.module_name.clone();
        // display only; merged tests are named after each source file
        existing.crate_name = pkg_to_crate_name(&existing.root_pkg);
    }
    existing.refresh_module_kind();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::names::RenameTable;
    use crate::convert::InvocationParser;
    use crate::convert::unit::EnvSupport;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    const DEPS: &str = "-L dependency=/w/foo/target.tmp/debug/deps";

    fn parse(line: &str) -> CompilationUnit {
        let probe: BTreeSet<PathBuf> = BTreeSet::new();
        let renames = RenameTable::default();
        InvocationParser::new(&probe, &renames, false).parse(1, line)
    }

    #[test]
    fn test_host_device_merge() {
        let mut registry = UnitRegistry::new();
        let host = parse("--crate-name foo src/main.rs --crate-type bin");
        let device = parse(
            "--crate-name foo src/main.rs --crate-type bin --target x86_64-unknown-linux-gnu",
        );
        assert_eq!(registry.register(host), Registration::Inserted(0));
        assert_eq!(
            registry.register(device),
            Registration::Merged {
                into: 0,
                rule: MergeRule::HostDevice
            }
        );
        let units = registry.units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].env, EnvSupport { host: true, device: true });
        assert_eq!(units[0].target.as_deref(), Some("x86_64-unknown-linux-gnu"));
        assert_eq!(units[0].module_type.as_deref(), Some("rust_binary"));
        assert_eq!(units[0].stem, "foo");
    }

    #[test]
    fn test_existing_target_is_kept() {
        let mut registry = UnitRegistry::new();
        registry.register(parse("--crate-name foo src/lib.rs --crate-type lib --target a-b-c"));
        registry.register(parse("--crate-name foo src/lib.rs --crate-type lib --target x-y-z"));
        assert_eq!(registry.units().len(), 1);
        assert_eq!(registry.units()[0].target.as_deref(), Some("a-b-c"));
    }

    #[test]
    fn test_different_flags_do_not_merge() {
        let mut registry = UnitRegistry::new();
        registry.register(parse("--crate-name foo src/lib.rs --crate-type lib --cfg a"));
        registry.register(parse("--crate-name foo src/lib.rs --crate-type lib --cfg b"));
        registry.register(parse(
            "--crate-name foo src/lib.rs --crate-type lib --cfg a --edition=2018",
        ));
        assert_eq!(registry.units().len(), 3);
    }

    #[test]
    fn test_extern_paths_do_not_block_merge() {
        let mut registry = UnitRegistry::new();
        registry.register(parse(
            "--crate-name foo src/lib.rs --crate-type lib \
             --extern libc=/w/foo/target.tmp/debug/deps/liblibc-aaaa.rlib",
        ));
        registry.register(parse(
            "--crate-name foo src/lib.rs --crate-type lib --target t \
             --extern libc=/w/foo/target.tmp/t/debug/deps/liblibc-bbbb.rlib",
        ));
        assert_eq!(registry.units().len(), 1);
    }

    #[test]
    fn test_split_tests_merge() {
        let mut registry = UnitRegistry::new();
        let a = parse(&format!("--crate-name a tests/a.rs --test {DEPS}"));
        let b = parse(&format!("--crate-name b tests/b.rs --test {DEPS}"));
        assert_eq!(a.module_name, "foo_tests_a");
        registry.register(a);
        assert_eq!(
            registry.register(b),
            Registration::Merged {
                into: 0,
                rule: MergeRule::TestSplit
            }
        );

        let unit = &registry.units()[0];
        assert_eq!(unit.srcs, vec!["tests/a.rs", "tests/b.rs"]);
        assert_eq!(unit.module_name, "foo_tests_a");
        assert_eq!(unit.stem, "foo_tests_a");
        assert_eq!(unit.crate_name, "foo");
        assert_eq!(unit.kind, CrateKind::Test);
        assert_eq!(unit.root_pkg, "foo");
    }

    #[test]
    fn test_shorter_test_name_survives() {
        let mut registry = UnitRegistry::new();
        registry.register(parse(&format!("--crate-name long_name tests/long_name.rs --test {DEPS}")));
        registry.register(parse(&format!("--crate-name z tests/z.rs --test {DEPS}")));
        assert_eq!(registry.units()[0].module_name, "foo_tests_z");
        // a third test keeps joining the merged unit
        registry.register(parse(&format!("--crate-name c tests/c.rs --test {DEPS}")));
        let unit = &registry.units()[0];
        assert_eq!(registry.units().len(), 1);
        assert_eq!(unit.srcs.len(), 3);
        assert_eq!(unit.module_name, "foo_tests_c");
    }

    #[test]
    fn test_tests_of_other_packages_stay_apart() {
        let mut registry = UnitRegistry::new();
        registry.register(parse(&format!("--crate-name a tests/a.rs --test {DEPS}")));
        registry.register(parse(
            "--crate-name b tests/b.rs --test -L dependency=/w/bar/target.tmp/debug/deps",
        ));
        assert_eq!(registry.units().len(), 2);
    }

    #[test]
    fn test_unmerged_tests_need_equal_env() {
        let mut registry = UnitRegistry::new();
        registry.register(parse(&format!("--crate-name a tests/a.rs --test {DEPS}")));
        registry.register(parse(&format!(
            "--crate-name b tests/b.rs --test --target t {DEPS}"
        )));
        assert_eq!(registry.units().len(), 2);
    }

    #[test]
    fn test_error_units_never_merge() {
        let mut registry = UnitRegistry::new();
        let broken = parse("--crate-name foo --crate-type bin");
        assert!(!broken.errors.is_empty());
        registry.register(broken.clone());
        assert_eq!(registry.register(broken), Registration::Inserted(1));
        assert_eq!(registry.units().len(), 2);
    }

    #[test]
    fn test_excluded_units_are_retained() {
        let mut registry = UnitRegistry::new();
        let script = parse("--crate-name build_script_build build.rs --crate-type bin");
        let dep = parse("--crate-name libc .../libc-0.2/src/lib.rs --crate-type lib");
        assert_eq!(registry.register(script.clone()), Registration::Excluded(0));
        assert_eq!(registry.register(script), Registration::Excluded(1));
        assert_eq!(registry.register(dep), Registration::Excluded(2));
        assert_eq!(registry.units().len(), 3);
    }

    #[test]
    fn test_merge_preserves_kind_and_sources() {
        let mut registry = UnitRegistry::new().with_merge_notes(true);
        registry.register(parse(&format!("--crate-name a tests/a.rs --test {DEPS}")));
        registry.register(parse(&format!("--crate-name b tests/b.rs --test {DEPS}")));
        registry.register(parse(&format!(
            "--crate-name a tests/a.rs --test --target t {DEPS}"
        )));
        // the device build of `a` joins the merged test as another split test
        assert_eq!(registry.units().len(), 1);
        let unit = &registry.units()[0];
        assert_eq!(unit.srcs.len(), 3);
        assert_eq!(unit.kind, CrateKind::Test);
        assert_eq!(unit.root_pkg, "foo");
        assert!(unit.env.both());
        assert_eq!(unit.merge_notes.len(), 2);
    }
}
