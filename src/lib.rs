//! # cargo2bp - Android.bp generator for Cargo crates
//!
//! cargo2bp runs `cargo -v` builds of a crate, scans the recorded rustc
//! calls and writes equivalent Soong module definitions to `Android.bp`.
//!
//! ## Features
//!
//! - **Log Driven**: Works from the rustc calls cargo actually made
//! - **Host/Device Merging**: Identical host and target builds become one module
//! - **Test Splitting**: Per-file integration tests collapse into one `rust_test`
//! - **Warning Ownership**: Modules with compiler warnings are marked as such
//!
//! ## Quick Start
//!
//! ```bash
//! # Show the cargo passes that would run
//! cargo2bp --device --tests
//!
//! # Build and generate Android.bp
//! cargo2bp --run --device --tests
//! ```
//!
//! ## Module Organization
//!
//! - [`convert`] - Log scanning, rustc parsing, merging and emission
//! - [`cargo`] - Running the `cargo -v` passes into `cargo.out`
//! - [`config`] - Configuration parsing (`cargo2bp.toml`)

/// Cargo pass planning and execution.
pub mod cargo;

/// Configuration file parsing (`cargo2bp.toml`).
pub mod config;

/// Conversion of build logs into Android.bp modules.
pub mod convert;

/// Typed errors for the conversion pipeline.
pub mod error;

/// Diagnostic logging setup.
pub mod logging;

/// File existence probes.
pub mod probe;

/// Terminal UI utilities (tables, colors).
pub mod ui;

pub use convert::{Conversion, ConvertOptions, convert_log};
pub use error::{ConvertError, ConvertResult};
pub use probe::{FileProbe, FsProbe};
