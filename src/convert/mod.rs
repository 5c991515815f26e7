//! Conversion of `cargo -v` build logs into Android.bp modules.
//!
//! The pipeline is:
//!
//! - [`scan`] - classify log lines (rustc calls, warning headers, warning locations)
//! - [`invocation`] - parse each rustc call into a [`CompilationUnit`]
//! - [`registry`] - merge host/device twins and split tests
//! - [`warnings`] - mark units owning warned files
//! - [`emit`] - write sorted module definitions per `Cargo.toml` directory

pub mod emit;
pub mod invocation;
pub mod kind;
pub mod names;
pub mod registry;
pub mod scan;
pub mod unit;
pub mod warnings;

pub use emit::{BP_FILE, DEFAULT_HEADER, EmitOptions, Emitter};
pub use invocation::InvocationParser;
pub use names::RenameTable;
pub use registry::{MergeRule, Registration, UnitRegistry};
pub use scan::{LogEvent, LogScanner};
pub use unit::{CompilationUnit, CrateKind, EnvSupport};
pub use warnings::{WarnedFiles, attribute_warnings};

use crate::error::{ConvertError, ConvertResult};
use crate::probe::FileProbe;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Cargo target directory used for generator builds; also recognized in `-L` paths.
pub const TARGET_TMP: &str = "target.tmp";

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub header: String,
    pub onefile: bool,
    pub debug: bool,
    /// Append the dependency feature list to the top-level file.
    pub dependencies: bool,
    pub renames: RenameTable,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            onefile: false,
            debug: false,
            dependencies: false,
            renames: RenameTable::default(),
        }
    }
}

/// Result of one conversion run.
#[derive(Debug)]
pub struct Conversion {
    /// Every parsed unit after merging, in log order.
    pub units: Vec<CompilationUnit>,
    /// Output path (relative to the crate root) to file contents.
    pub files: BTreeMap<PathBuf, String>,
    pub warned_files: usize,
}

impl Conversion {
    /// Units that became real modules.
    pub fn modules(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units
            .iter()
            .filter(|u| !u.is_excluded() && u.errors.is_empty() && u.module_type.is_some())
    }

    /// Units written as error comments.
    pub fn failures(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units
            .iter()
            .filter(|u| !u.is_excluded() && (!u.errors.is_empty() || u.module_type.is_none()))
    }

    /// Writes every generated file below `root`, replacing existing ones.
    pub fn write_to(&self, root: &Path) -> ConvertResult<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.files.len());
        for (relative, text) in &self.files {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| ConvertError::Write {
                    path: path.clone(),
                    source,
                })?;
            }
            fs::write(&path, text).map_err(|source| ConvertError::Write {
                path: path.clone(),
                source,
            })?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Converts a whole cargo log. Only an output collision is fatal.
pub fn convert_log(
    log: &str,
    probe: &dyn FileProbe,
    options: &ConvertOptions,
) -> ConvertResult<Conversion> {
    let parser = InvocationParser::new(probe, &options.renames, options.onefile);
    let mut registry = UnitRegistry::new().with_merge_notes(options.debug);
    let mut scanner = LogScanner::new();
    let mut warned = WarnedFiles::new();

    for line in log.lines() {
        match scanner.feed(line) {
            Some(LogEvent::Invocation { line_num, args }) => {
                let unit = parser.parse(line_num, args);
                if !unit.errors.is_empty() {
                    warn!(
                        line = line_num,
                        problems = unit.errors.len(),
                        "rustc call {} has parse errors",
                        unit.crate_name
                    );
                }
                registry.register(unit);
            }
            Some(LogEvent::WarnedFile(path)) => {
                warned.record(path);
            }
            None => {}
        }
    }

    attribute_warnings(registry.units_mut(), &warned, probe);
    let units = registry.into_units();

    let mut emitter = Emitter::new(EmitOptions {
        header: &options.header,
        onefile: options.onefile,
        debug: options.debug,
        renames: &options.renames,
    });
    emitter.emit_units(&units)?;
    if options.dependencies {
        emitter.emit_dependencies(&units)?;
    }
    let files = emitter.finish();
    info!(units = units.len(), files = files.len(), "conversion finished");

    Ok(Conversion {
        units,
        files,
        warned_files: warned.len(),
    })
}
