//! Running `cargo -v` passes and collecting their output in `cargo.out`.

use crate::convert::TARGET_TMP;
use anyhow::{Context, Result, bail};
use colored::*;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Log file shared by all cargo passes.
pub const CARGO_OUT: &str = "cargo.out";

/// Ordered cargo passes; the converter relies on host builds coming first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoPlan {
    pub passes: Vec<String>,
    pub features: Option<String>,
    pub rustflags: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanRequest<'a> {
    /// Explicit `--cargo` argument strings; replace the default passes.
    pub custom: &'a [String],
    pub device: bool,
    pub tests: bool,
    pub device_target: &'a str,
    pub features: Option<String>,
    pub rustflags: Option<String>,
}

impl CargoPlan {
    pub fn new(request: PlanRequest) -> Self {
        let mut passes = vec!["clean".to_string()];
        if !request.custom.is_empty() {
            passes.extend(request.custom.iter().cloned());
        } else {
            let device = format!("--target {}", request.device_target);
            passes.push("build".to_string());
            if request.device {
                passes.push(format!("build {device}"));
                if request.tests {
                    passes.push("build --tests".to_string());
                    passes.push(format!("build --tests {device}"));
                }
            } else if request.tests {
                passes.push("build --tests".to_string());
            }
        }
        Self {
            passes,
            features: request.features,
            rustflags: request.rustflags,
        }
    }

    fn arguments(&self, pass: &str) -> Vec<String> {
        let mut args = vec!["-v".to_string()];
        args.extend(pass.split_whitespace().map(str::to_string));
        if pass != "clean"
            && let Some(features) = &self.features
        {
            args.push("--features".to_string());
            args.push(features.clone());
        }
        args.push("--target-dir".to_string());
        args.push(TARGET_TMP.to_string());
        args
    }

    /// Shell-style rendering of one pass, as written to `cargo.out`.
    pub fn command_line(&self, pass: &str) -> String {
        let cmd = format!("cargo {}", self.arguments(pass).join(" "));
        match &self.rustflags {
            Some(flags) if pass != "clean" => format!("RUSTFLAGS=\"{flags}\" {cmd}"),
            _ => cmd,
        }
    }

    pub fn print_dry_run(&self) {
        for pass in &self.passes {
            println!("{} {}", "Dry-run skip:".dimmed(), self.command_line(pass));
        }
    }

    /// Runs every pass in `root`, appending all output to `cargo.out`.
    ///
    /// A failing pass is reported but does not stop later passes; the log
    /// still holds whatever rustc calls were made.
    pub fn run(&self, root: &Path, verbose: bool) -> Result<()> {
        let manifest = root.join("Cargo.toml");
        if File::open(&manifest).is_err() {
            bail!("Cannot find or read {}", manifest.display());
        }
        let out_path = root.join(CARGO_OUT);
        if out_path.exists() {
            fs::remove_file(&out_path)
                .with_context(|| format!("Failed to remove old {}", out_path.display()))?;
        }

        for pass in &self.passes {
            let cmd = self.command_line(pass);
            if verbose {
                println!("   {} Running: {}", "⚙".cyan(), cmd);
            }
            let mut out = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&out_path)
                .with_context(|| format!("Failed to open {}", out_path.display()))?;
            writeln!(out, "### Running: {cmd}")?;

            let mut command = Command::new("cargo");
            command
                .args(self.arguments(pass))
                .current_dir(root)
                .stdout(Stdio::from(out.try_clone()?))
                .stderr(Stdio::from(out));
            if pass != "clean"
                && let Some(flags) = &self.rustflags
            {
                command.env("RUSTFLAGS", flags);
            }
            let status = command
                .status()
                .with_context(|| format!("Failed to start `{cmd}`"))?;
            if !status.success() {
                eprintln!("   {} `{}` exited with {}", "!".yellow(), cmd, status);
            }
        }
        Ok(())
    }
}
