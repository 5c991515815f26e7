use crate::convert::{ConvertOptions, DEFAULT_HEADER, RenameTable};
use anyhow::{Context, Result};
use colored::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "cargo2bp.toml";

pub const DEFAULT_DEVICE_TARGET: &str = "x86_64-unknown-linux-gnu";

/// Contents of an optional `cargo2bp.toml` next to the crate's `Cargo.toml`.
#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Cargo2BpConfig {
    pub output: OutputConfig,
    pub cargo: CargoConfig,
    /// Extra module renames, e.g. `libfoo = "libfoo_rust"`.
    pub rename: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub onefile: bool,
    pub dependencies: bool,
    pub debug: bool,
    pub header: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
pub struct CargoConfig {
    pub device_target: Option<String>,
    pub features: Option<String>,
    pub rustflags: Option<String>,
    /// Extra `cargo -v` argument strings, one cargo call each.
    pub builds: Vec<String>,
}

impl Cargo2BpConfig {
    pub fn device_target(&self) -> &str {
        self.cargo
            .device_target
            .as_deref()
            .unwrap_or(DEFAULT_DEVICE_TARGET)
    }

    /// Conversion options with command-line switches layered on top.
    pub fn convert_options(&self, onefile: bool, debug: bool, dependencies: bool) -> ConvertOptions {
        let mut renames = RenameTable::default();
        renames.extend(&self.rename);
        ConvertOptions {
            header: self
                .output
                .header
                .clone()
                .unwrap_or_else(|| DEFAULT_HEADER.to_string()),
            onefile: onefile || self.output.onefile,
            debug: debug || self.output.debug,
            dependencies: dependencies || self.output.dependencies,
            renames,
        }
    }
}

/// Loads `explicit` if given, else `cargo2bp.toml` under `root` when present.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<Cargo2BpConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = root.join(CONFIG_FILE);
            if !default.exists() {
                return Ok(Cargo2BpConfig::default());
            }
            default
        }
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Cargo2BpConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {} - check for unknown keys", path.display()))?;
    println!("   {} Using config {}", "⚙".cyan(), path.display());
    Ok(config)
}
