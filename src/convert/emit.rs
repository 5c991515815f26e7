//! Android.bp text generation.
//!
//! Modules are sorted by name and routed to the `Android.bp` next to their
//! owning `Cargo.toml`. The [`Emitter`] is the per-run context: it writes each
//! file header exactly once and refuses to let two owners share one file.

use super::names::{RenameTable, escape_quotes};
use super::unit::{CompilationUnit, CrateKind, Exclusion};
use crate::error::{ConvertError, ConvertResult};
use regex::Regex;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, PathBuf};
use std::sync::LazyLock;

pub const BP_FILE: &str = "Android.bp";

pub const DEFAULT_HEADER: &str = "// This file is generated by cargo2bp.";

/// `name = libname-<hash>.rlib`
static EXTERN_LIB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.* = lib(.*)-[0-9a-f]*\.(rlib|so|rmeta)$").expect("valid extern lib pattern")
});

#[derive(Debug, Clone, Copy)]
pub struct EmitOptions<'a> {
    pub header: &'a str,
    /// Write everything into the top-level `Android.bp`.
    pub onefile: bool,
    pub debug: bool,
    pub renames: &'a RenameTable,
}

#[derive(Debug)]
struct OutputFile {
    owner: String,
    text: String,
}

pub struct Emitter<'a> {
    options: EmitOptions<'a>,
    files: BTreeMap<PathBuf, OutputFile>,
}

impl<'a> Emitter<'a> {
    pub fn new(options: EmitOptions<'a>) -> Self {
        Self {
            options,
            files: BTreeMap::new(),
        }
    }

    /// Writes all units in module-name order.
    pub fn emit_units(&mut self, units: &[CompilationUnit]) -> ConvertResult<()> {
        let mut ordered: Vec<&CompilationUnit> = units.iter().collect();
        ordered.sort_by(|a, b| (&a.module_name, &a.stem).cmp(&(&b.module_name, &b.stem)));

        let EmitOptions { debug, renames, .. } = self.options;
        for unit in ordered {
            if let Some(reason) = unit.exclusion() {
                if debug {
                    let out = self.open(&unit.cargo_dir)?;
                    write_ignored(out, unit, &reason);
                }
                continue;
            }
            let out = self.open(&unit.cargo_dir)?;
            if !unit.errors.is_empty() {
                let problems: Vec<String> = unit.errors.iter().map(ToString::to_string).collect();
                write_error_stub(out, unit, &problems);
            } else if let Some(module_type) = &unit.module_type {
                if debug {
                    write_debug_info(out, unit);
                }
                write_module(out, unit, module_type, renames);
            } else {
                let problem = format!("unknown crate_type {}", unit.kind.as_str());
                write_error_stub(out, unit, &[problem]);
            }
        }
        Ok(())
    }

    /// Appends the `dependent_library ["feature_list"]` block to the top-level file.
    pub fn emit_dependencies(&mut self, units: &[CompilationUnit]) -> ConvertResult<()> {
        let listed: BTreeSet<String> = units
            .iter()
            .filter(|u| u.is_dependency())
            .map(CompilationUnit::feature_list)
            .collect();
        if listed.is_empty() {
            return Ok(());
        }
        let out = self.open("")?;
        line(out, "");
        line(out, "// dependent_library [\"feature_list\"]");
        for entry in listed {
            line(out, &format!("//   {entry}"));
        }
        Ok(())
    }

    pub fn finish(self) -> BTreeMap<PathBuf, String> {
        self.files
            .into_iter()
            .map(|(path, file)| (path, file.text))
            .collect()
    }

    fn open(&mut self, cargo_dir: &str) -> ConvertResult<&mut String> {
        let owner = if self.options.onefile { "" } else { cargo_dir };
        match self.files.entry(output_path(owner)) {
            Entry::Occupied(entry) => {
                if entry.get().owner != owner {
                    return Err(ConvertError::EmissionTargetCollision {
                        path: entry.key().clone(),
                        first: display_owner(&entry.get().owner),
                        second: display_owner(owner),
                    });
                }
                Ok(&mut entry.into_mut().text)
            }
            Entry::Vacant(entry) => {
                let mut text = String::new();
                line(&mut text, self.options.header.trim_end());
                let file = entry.insert(OutputFile {
                    owner: owner.to_string(),
                    text,
                });
                Ok(&mut file.text)
            }
        }
    }
}

fn output_path(owner: &str) -> PathBuf {
    let dir: PathBuf = PathBuf::from(owner)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    dir.join(BP_FILE)
}

fn display_owner(owner: &str) -> String {
    if owner.is_empty() {
        ".".to_string()
    } else {
        owner.to_string()
    }
}

fn line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

fn property(out: &mut String, name: &str, value: &str) {
    line(out, &format!("    {name}: \"{}\",", escape_quotes(value)));
}

fn list_items(out: &mut String, items: impl IntoIterator<Item = String>) {
    for item in items {
        line(out, &format!("        \"{}\",", escape_quotes(&item)));
    }
}

fn list_property(out: &mut String, name: &str, items: Vec<String>) {
    if items.is_empty() {
        return;
    }
    line(out, &format!("    {name}: ["));
    list_items(out, items);
    line(out, "    ],");
}

fn with_lib_prefix(names: &[String]) -> Vec<String> {
    names.iter().map(|n| format!("lib{n}")).collect()
}

fn write_line_origin(out: &mut String, unit: &CompilationUnit) {
    line(out, "");
    line(out, &format!("// Line {} {}", unit.line_num, unit.line));
}

fn write_error_stub(out: &mut String, unit: &CompilationUnit, problems: &[String]) {
    write_line_origin(out, unit);
    for problem in problems {
        line(out, &format!("// ERROR: {problem}"));
    }
}

fn write_ignored(out: &mut String, unit: &CompilationUnit, reason: &Exclusion) {
    line(out, "");
    line(out, &format!("// IGNORED: {reason} {}", unit.main_src));
    for problem in &unit.errors {
        line(out, &format!("// ERROR: {problem}"));
    }
}

fn write_debug_info(out: &mut String, unit: &CompilationUnit) {
    fn field(out: &mut String, name: &str, value: impl std::fmt::Display) {
        line(out, &format!("//{name:>12} = {value}"));
    }

    write_line_origin(out, unit);
    field(out, "module_name", &unit.module_name);
    field(out, "crate_name", &unit.crate_name);
    field(out, "crate_type", unit.kind.as_str());
    field(out, "main_src", &unit.main_src);
    field(out, "has_warning", unit.has_warning);
    field(out, "for_host", unit.env.host);
    field(out, "for_device", unit.env.device);
    field(out, "module_type", unit.module_type.as_deref().unwrap_or(""));
    if let Some(target) = &unit.target {
        field(out, "target", target);
    }
    field(out, "edition", &unit.flags.edition);
    if !unit.flags.emit_list.is_empty() {
        field(out, "emit_list", &unit.flags.emit_list);
    }
    if let Some(cap) = &unit.flags.cap_lints {
        field(out, "cap_lints", cap);
    }
    for cfg in &unit.flags.cfgs {
        field(out, "cfg", cfg);
    }
    for feature in &unit.flags.features {
        field(out, "cfg", format!("'feature \"{feature}\"'"));
    }
    for codegen in &unit.flags.codegens {
        field(out, "codegen", codegen);
    }
    for ext in &unit.externs {
        field(out, "externs", ext);
    }
    for lib in &unit.flags.static_libs {
        field(out, "-l static", lib);
    }
    for lib in &unit.flags.shared_libs {
        field(out, "-l (dylib)", lib);
    }
    for note in &unit.merge_notes {
        line(out, &format!("// {note}"));
    }
}

fn write_module(out: &mut String, unit: &CompilationUnit, module_type: &str, renames: &RenameTable) {
    line(out, "");
    line(out, &format!("{module_type} {{"));
    write_core_properties(out, unit);
    property(out, "edition", &unit.flags.edition);
    list_property(out, "features", unit.flags.features.clone());
    write_flags(out, unit);
    write_externs(out, unit, renames);
    list_property(out, "static_libs", with_lib_prefix(&unit.flags.static_libs));
    list_property(out, "shared_libs", with_lib_prefix(&unit.flags.shared_libs));
    line(out, "}");
}

fn write_core_properties(out: &mut String, unit: &CompilationUnit) {
    property(out, "name", &unit.module_name);
    if unit.stem != unit.module_name {
        property(out, "stem", &unit.stem);
    }
    if unit.has_warning && unit.flags.cap_lints.is_none() {
        line(out, "    deny_warnings: false,");
    }
    if unit.env.both() {
        line(out, "    host_supported: true,");
    }
    property(out, "crate_name", &unit.crate_name);
    if unit.srcs.len() > 1 {
        let srcs: BTreeSet<String> = unit.srcs.iter().cloned().collect();
        list_property(out, "srcs", srcs.into_iter().collect());
    } else {
        line(out, &format!("    srcs: [\"{}\"],", escape_quotes(&unit.main_src)));
    }
    if unit.kind == CrateKind::Test {
        property(
            out,
            "relative_install_path",
            &format!("rust/{}", unit.root_pkg),
        );
    }
}

fn write_flags(out: &mut String, unit: &CompilationUnit) {
    let cfgs = unit.flags.cfgs.iter().map(|c| format!("--cfg {c}"));
    match &unit.flags.cap_lints {
        Some(cap) if unit.flags.cfgs.is_empty() => {
            line(out, &format!("    flags: [\"--cap-lints {}\"],", escape_quotes(cap)));
        }
        Some(cap) => {
            line(out, "    flags: [");
            list_items(out, std::iter::once(format!("--cap-lints {cap}")).chain(cfgs));
            line(out, "    ],");
        }
        None => list_property(out, "flags", cfgs.collect()),
    }
}

/// Splits externs into rlibs and proc-macro `.so` files by extension.
fn write_externs(out: &mut String, unit: &CompilationUnit, renames: &RenameTable) {
    let mut rlibs = Vec::new();
    let mut proc_macros = Vec::new();
    for ext in &unit.externs {
        let lib_name = match EXTERN_LIB.captures(ext).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().to_string(),
            None => ext.split(' ').next().unwrap_or(ext).to_string(),
        };
        if ext.ends_with(".rlib") || ext.ends_with(".rmeta") {
            let name = renames.apply(&format!("lib{lib_name}"));
            rlibs.push(format!("        \"{}\",", escape_quotes(&name)));
        } else if ext.ends_with(".so") {
            proc_macros.push(format!("lib{lib_name}"));
        } else {
            rlibs.push(format!("        // ERROR: unknown type of lib {lib_name}"));
        }
    }
    if !rlibs.is_empty() {
        line(out, "    rlibs: [");
        for entry in rlibs {
            line(out, &entry);
        }
        line(out, "    ],");
    }
    list_property(out, "proc_macros", proc_macros);
}
