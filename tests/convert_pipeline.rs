//! End-to-end conversion of a recorded cargo log against a real directory tree.

use cargo2bp::convert::BP_FILE;
use cargo2bp::{ConvertOptions, FsProbe, convert_log};
use std::fs;
use std::path::Path;

const CARGO_LOG: &str = r#"### Running: cargo -v build --target-dir target.tmp
   Compiling helper v0.1.0 (/w/ws/sub)
     Running `rustc --crate-name build_script_build --edition=2018 build.rs --crate-type bin -C debuginfo=2 -C metadata=11aa --out-dir /w/ws/target.tmp/debug/build/ws-11aa -L dependency=/w/ws/target.tmp/debug/deps`
     Running `rustc --crate-name helper --edition=2018 sub/src/lib.rs --error-format=json --json=diagnostic-rendered-ansi --crate-type lib --emit=dep-info,metadata,link -C debuginfo=2 --cfg 'feature="default"' -C metadata=22bb -L dependency=/w/ws/target.tmp/debug/deps`
warning: unused variable: `x`
 --> sub/src/lib.rs:3:9
  |
3 |     let x = 1;
  |         ^ help: if this is intentional, prefix it with an underscore: `_x`

     Running `rustc --crate-name ws --edition=2018 src/main.rs --crate-type bin -C debuginfo=2 -C metadata=33cc -L dependency=/w/ws/target.tmp/debug/deps --extern helper=/w/ws/target.tmp/debug/deps/libhelper-22bb.rlib`
    Finished dev [unoptimized + debuginfo] target(s) in 1.02s
"#;

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"ws\"\n").unwrap();
    fs::create_dir_all(dir.path().join("sub/src")).unwrap();
    fs::write(dir.path().join("sub/Cargo.toml"), "[package]\nname = \"helper\"\n").unwrap();
    dir
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

#[test]
fn test_modules_are_written_next_to_their_manifest() {
    let dir = workspace();
    let conversion =
        convert_log(CARGO_LOG, &FsProbe::new(dir.path()), &ConvertOptions::default()).unwrap();
    let written = conversion.write_to(dir.path()).unwrap();
    assert_eq!(written.len(), 2);

    let top = read(dir.path(), BP_FILE);
    assert!(top.starts_with("// This file is generated by cargo2bp."));
    assert!(top.contains("rust_binary_host {"));
    assert!(top.contains("    name: \"ws\","));
    assert!(top.contains("    srcs: [\"src/main.rs\"],"));
    assert!(top.contains("        \"libhelper\","));
    assert!(!top.contains("build_script"));

    let sub = read(dir.path(), "sub/Android.bp");
    assert!(sub.contains("rust_library_host_rlib {"));
    assert!(sub.contains("    name: \"libhelper\","));
    assert!(sub.contains("    deny_warnings: false,"));
    assert!(sub.contains("    srcs: [\"src/lib.rs\"],"));
    assert!(sub.contains("    edition: \"2018\","));
    assert!(sub.contains("        \"default\","));

    assert_eq!(conversion.warned_files, 1);
    assert_eq!(conversion.modules().count(), 2);
    assert_eq!(conversion.failures().count(), 0);
}

#[test]
fn test_onefile_puts_everything_at_the_root() {
    let dir = workspace();
    let options = ConvertOptions {
        onefile: true,
        ..Default::default()
    };
    let conversion = convert_log(CARGO_LOG, &FsProbe::new(dir.path()), &options).unwrap();
    conversion.write_to(dir.path()).unwrap();

    let top = read(dir.path(), BP_FILE);
    assert!(top.contains("    srcs: [\"sub/src/lib.rs\"],"));
    assert!(top.contains("rust_binary_host {"));
    assert!(!dir.path().join("sub/Android.bp").exists());
}

#[test]
fn test_debug_output_lists_ignored_build_script() {
    let dir = workspace();
    let options = ConvertOptions {
        debug: true,
        ..Default::default()
    };
    let conversion = convert_log(CARGO_LOG, &FsProbe::new(dir.path()), &options).unwrap();
    let top = &conversion.files[Path::new(BP_FILE)];
    assert!(top.contains("// IGNORED: build_script_build build.rs"));
}

#[test]
fn test_write_replaces_existing_file() {
    let dir = workspace();
    fs::write(dir.path().join(BP_FILE), "stale").unwrap();
    let conversion =
        convert_log(CARGO_LOG, &FsProbe::new(dir.path()), &ConvertOptions::default()).unwrap();
    conversion.write_to(dir.path()).unwrap();
    assert!(!read(dir.path(), BP_FILE).contains("stale"));
}
