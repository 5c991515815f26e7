//! Parsing of one logged `rustc` command line into a [`CompilationUnit`].

use super::TARGET_TMP;
use super::names::{RenameTable, is_dependent_path, unquote};
use super::unit::{CompilationUnit, CrateKind, EnvSupport, sort_unique};
use crate::error::ParseIssue;
use crate::probe::FileProbe;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const MANIFEST: &str = "Cargo.toml";

/// `-C` options that only matter to cargo's own bookkeeping.
const IGNORED_CODEGENS: [&str; 4] = ["debuginfo=", "extra-filename=", "incremental=", "metadata="];

static REGISTRY_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\S*/registry/src/").expect("valid registry pattern"));

static REGISTRY_HASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.\.\./(?:github\.com|index\.crates\.io)-[0-9a-f]*/")
        .expect("valid registry hash pattern")
});

static EXTERN_DEPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=/\S*/deps/").expect("valid extern pattern"));

pub struct InvocationParser<'a> {
    probe: &'a dyn FileProbe,
    renames: &'a RenameTable,
    onefile: bool,
}

impl<'a> InvocationParser<'a> {
    pub fn new(probe: &'a dyn FileProbe, renames: &'a RenameTable, onefile: bool) -> Self {
        Self {
            probe,
            renames,
            onefile,
        }
    }

    /// Parses the arguments of one rustc call. Never fails: problems are
    /// collected in the unit's `errors`.
    pub fn parse(&self, line_num: usize, args: &str) -> CompilationUnit {
        let mut unit = CompilationUnit {
            line_num,
            line: args.to_string(),
            ..Default::default()
        };
        let mut declared_kind: Option<String> = None;
        let mut tokens = tokenize(args).into_iter().peekable();

        while let Some(arg) = tokens.next() {
            match arg {
                "--crate-name" => {
                    let Some(name) = take_value(&mut tokens, arg, &mut unit) else {
                        continue;
                    };
                    unit.crate_name = name.to_string();
                    if let Some(src) = tokens.next_if(|t| !t.starts_with('-')) {
                        self.set_main_src(&mut unit, src);
                    }
                }
                "--crate-type" => {
                    let Some(crate_type) = take_value(&mut tokens, arg, &mut unit) else {
                        continue;
                    };
                    match &declared_kind {
                        Some(first) => unit.errors.push(ParseIssue::MultipleCrateTypes {
                            first: first.clone(),
                            second: crate_type.to_string(),
                        }),
                        None => declared_kind = Some(crate_type.to_string()),
                    }
                }
                "--test" => match &declared_kind {
                    Some(first) => unit
                        .errors
                        .push(ParseIssue::TestWithCrateType(first.clone())),
                    None => declared_kind = Some("test".to_string()),
                },
                "--target" => {
                    if let Some(target) = take_value(&mut tokens, arg, &mut unit) {
                        unit.target = Some(target.to_string());
                    }
                }
                "--cfg" => {
                    if let Some(cfg) = take_value(&mut tokens, arg, &mut unit) {
                        match feature_name(cfg) {
                            Some(feature) => unit.flags.features.push(feature),
                            None => unit.flags.cfgs.push(cfg.to_string()),
                        }
                    }
                }
                "--extern" => {
                    if let Some(ext) = take_value(&mut tokens, arg, &mut unit) {
                        let named = EXTERN_DEPS.replace(ext, " = ").into_owned();
                        let core = named.split(" = ").next().unwrap_or(&named).to_string();
                        unit.externs.push(named);
                        unit.flags.core_externs.push(core);
                    }
                }
                "-C" => {
                    if let Some(codegen) = take_value(&mut tokens, arg, &mut unit)
                        && !IGNORED_CODEGENS.iter().any(|p| codegen.starts_with(p))
                    {
                        unit.flags.codegens.push(codegen.to_string());
                    }
                }
                "--cap-lints" => {
                    if let Some(cap) = take_value(&mut tokens, arg, &mut unit) {
                        unit.flags.cap_lints = Some(cap.to_string());
                    }
                }
                "-L" => {
                    if let Some(search) = take_value(&mut tokens, arg, &mut unit)
                        && let Some(pkg) = root_package(search)
                    {
                        unit.root_pkg = pkg;
                    }
                }
                "-l" => {
                    if let Some(lib) = take_value(&mut tokens, arg, &mut unit) {
                        if let Some(name) = lib.strip_prefix("static=") {
                            unit.flags.static_libs.push(name.to_string());
                        } else {
                            let name = lib.strip_prefix("dylib=").unwrap_or(lib);
                            unit.flags.shared_libs.push(name.to_string());
                        }
                    }
                }
                "--out-dir" | "--color" | "--check-cfg" => {
                    take_value(&mut tokens, arg, &mut unit);
                }
                _ if arg.starts_with("--error-format=") || arg.starts_with("--json=") => {}
                _ if arg.starts_with("--emit=") => {
                    unit.flags.emit_list = arg["--emit=".len()..].to_string();
                }
                _ if arg.starts_with("--edition=") => {
                    unit.flags.edition = arg["--edition=".len()..].to_string();
                }
                _ if !arg.starts_with('-') && unit.main_src.is_empty() => {
                    self.set_main_src(&mut unit, arg);
                }
                _ => unit
                    .errors
                    .push(ParseIssue::UnrecognizedFlag(arg.to_string())),
            }
        }

        self.finish(unit, declared_kind)
    }

    fn set_main_src(&self, unit: &mut CompilationUnit, src: &str) {
        let src = REGISTRY_SRC.replace(src, ".../");
        let src = REGISTRY_HASH.replace(&src, ".../").into_owned();
        unit.cargo_dir = self.find_cargo_dir(&src);
        unit.main_src = if !unit.cargo_dir.is_empty() && !self.onefile {
            src.strip_prefix(unit.cargo_dir.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(&src)
                .to_string()
        } else {
            src
        };
    }

    /// Deepest directory above `main_src` that holds a `Cargo.toml`.
    fn find_cargo_dir(&self, main_src: &str) -> String {
        if is_dependent_path(main_src) {
            return String::new();
        }
        let mut dir = Path::new(main_src).parent();
        while let Some(d) = dir {
            if d.as_os_str().is_empty() {
                break;
            }
            if self.probe.exists(&d.join(MANIFEST)) {
                return d.to_string_lossy().into_owned();
            }
            dir = d.parent();
        }
        String::new()
    }

    fn finish(&self, mut unit: CompilationUnit, declared_kind: Option<String>) -> CompilationUnit {
        if unit.crate_name.is_empty() {
            unit.errors.push(ParseIssue::MissingCrateName);
        }
        if unit.main_src.is_empty() {
            unit.errors.push(ParseIssue::MissingMainSource);
        } else {
            unit.srcs.push(unit.main_src.clone());
        }
        unit.kind = match declared_kind {
            Some(crate_type) => CrateKind::from_crate_type(&crate_type),
            // `--cfg test` without `--test` still builds a test harness
            None if unit.flags.cfgs.iter().any(|c| c == "test") => CrateKind::Test,
            None => {
                unit.errors.push(ParseIssue::MissingCrateType);
                CrateKind::default()
            }
        };
        if unit.root_pkg.is_empty() {
            unit.root_pkg = unit.crate_name.clone();
        }
        unit.env = EnvSupport {
            host: true,
            device: unit.target.is_some(),
        };
        unit.flags.normalize();
        sort_unique(&mut unit.externs);
        unit.refresh_module_kind();
        unit.module_name = self.renames.apply(&unit.stem);
        unit
    }
}

fn take_value<'t>(
    tokens: &mut impl Iterator<Item = &'t str>,
    flag: &str,
    unit: &mut CompilationUnit,
) -> Option<&'t str> {
    let value = tokens.next();
    if value.is_none() {
        unit.errors
            .push(ParseIssue::MissingFlagValue(flag.to_string()));
    }
    value
}

/// Splits on whitespace, keeping single-quoted spans such as
/// `'cfg(feature, values("a", "b"))'` in one token.
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '\'' => {
                quoted = !quoted;
                start.get_or_insert(i);
            }
            c if c.is_whitespace() && !quoted => {
                if let Some(s) = start.take() {
                    tokens.push(&line[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        tokens.push(&line[s..]);
    }
    tokens
}

/// `'feature="std"'` or `feature="std"` gives `std`.
fn feature_name(cfg: &str) -> Option<String> {
    let cfg = cfg
        .strip_prefix('\'')
        .and_then(|c| c.strip_suffix('\''))
        .unwrap_or(cfg);
    cfg.strip_prefix("feature=")
        .map(|value| unquote(value).to_string())
}

/// Package name from a `dependency=<pkg>/target.tmp/<profile>/deps` search path.
fn root_package(search: &str) -> Option<String> {
    let path = search.strip_prefix("dependency=")?;
    let without_deps = path.strip_suffix("/deps")?;
    let marker = format!("/{TARGET_TMP}/");
    let pkg_dir = match path.find(&marker) {
        Some(idx) => &path[..idx],
        // <pkg>/<target-dir>/<profile>/deps
        None => {
            let mut parts = without_deps.rsplitn(3, '/');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(p), Some(t), Some(rest)) if !p.is_empty() && !t.is_empty() => rest,
                _ => path,
            }
        }
    };
    pkg_dir.rsplit('/').next().map(str::to_string)
}
