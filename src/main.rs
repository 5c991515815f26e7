//! # cargo2bp CLI Entry Point
//!
//! Plans and runs `cargo -v` builds, then converts `cargo.out` into
//! `Android.bp` files. Without `--run` only the plan is printed.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use cargo2bp::cargo::{CARGO_OUT, CargoPlan, PlanRequest};
use cargo2bp::config::{self, Cargo2BpConfig};
use cargo2bp::{FsProbe, convert_log, logging, ui};

#[derive(Parser)]
#[command(name = "cargo2bp")]
#[command(about = "Generate Android.bp files from cargo -v builds", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    /// Run cargo and write Android.bp; without it, only show the plan
    #[arg(long)]
    run: bool,
    /// Extra cargo arguments, one `cargo -v <ARGS>` call each
    #[arg(long, value_name = "ARGS")]
    cargo: Vec<String>,
    /// Also build for the device target
    #[arg(long)]
    device: bool,
    /// Also build tests
    #[arg(long)]
    tests: bool,
    /// Features passed to every cargo build
    #[arg(long)]
    features: Option<String>,
    /// RUSTFLAGS for every cargo build
    #[arg(long)]
    rustflags: Option<String>,
    /// Write all modules to the top-level Android.bp
    #[arg(long)]
    onefile: bool,
    /// Append the dependency feature list
    #[arg(long)]
    dependencies: bool,
    /// Dump parsed fields and merges as comments
    #[arg(long)]
    debug: bool,
    /// Reuse the existing cargo.out instead of running cargo
    #[arg(long)]
    skipcargo: bool,
    /// Echo cargo commands and show diagnostic logs
    #[arg(short, long)]
    verbose: bool,
    /// Configuration file [default: ./cargo2bp.toml]
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn build_plan(cli: &Cli, config: &Cargo2BpConfig) -> CargoPlan {
    let mut custom = cli.cargo.clone();
    custom.extend(config.cargo.builds.iter().cloned());
    CargoPlan::new(PlanRequest {
        custom: &custom,
        device: cli.device,
        tests: cli.tests,
        device_target: config.device_target(),
        features: cli.features.clone().or_else(|| config.cargo.features.clone()),
        rustflags: cli.rustflags.clone().or_else(|| config.cargo.rustflags.clone()),
    })
}

fn generate(root: &Path, cli: &Cli, config: &Cargo2BpConfig) -> Result<()> {
    let log_path = root.join(CARGO_OUT);
    if !log_path.exists() {
        println!(
            "{} No {} to convert; run without --skipcargo first.",
            "!".yellow(),
            CARGO_OUT
        );
        return Ok(());
    }
    let log = fs::read_to_string(&log_path)
        .with_context(|| format!("Failed to read {}", log_path.display()))?;

    let options = config.convert_options(cli.onefile, cli.debug, cli.dependencies);
    let conversion = convert_log(&log, &FsProbe::new(root), &options)
        .with_context(|| format!("Failed to convert {}", log_path.display()))?;
    let written = conversion
        .write_to(root)
        .context("Failed to write Android.bp files")?;

    for path in &written {
        let shown = path.strip_prefix(root).unwrap_or(path);
        println!("{} Wrote {}", "✓".green(), shown.display());
    }
    if conversion.warned_files > 0 {
        println!(
            "   {} {} file(s) had compiler warnings",
            "!".yellow(),
            conversion.warned_files
        );
    }
    ui::print_summary(&conversion);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let root = std::env::current_dir().context("Failed to get current directory")?;
    let config = config::load_config(&root, cli.config.as_deref())?;
    let plan = build_plan(&cli, &config);

    if !cli.run {
        plan.print_dry_run();
        println!(
            "{} Dry run only; pass --run to build and write Android.bp.",
            "!".yellow()
        );
        return Ok(());
    }

    if !cli.skipcargo {
        println!("{} Running {} cargo pass(es)...", "⚙".cyan(), plan.passes.len());
        plan.run(&root, cli.verbose)?;
    }
    generate(&root, &cli, &config)
}
