//! Integration tests for the command-line interface: set, apply, get,
//! and sections, driven against the compiled binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn envpatch(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_envpatch"))
        .args(args)
        .output()
        .expect("failed to run envpatch binary")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn set_replaces_value() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(&file, "FOO=old\nBAR=2\n").unwrap();

    let output = envpatch(&["set", path_str(&file), "FOO=new"]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(fs::read_to_string(&file).unwrap(), "FOO=new\nBAR=2\n");
}

#[test]
fn set_multiple_pairs_into_section() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(&file, "").unwrap();

    let output = envpatch(&[
        "set",
        path_str(&file),
        "PORT=8080",
        "HOST=0.0.0.0",
        "--section",
        "net",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let content = fs::read_to_string(&file).unwrap();
    assert!(content.starts_with("# [SECTION: net]\n"));
    assert!(content.contains("HOST=0.0.0.0\n"));
    assert!(content.contains("PORT=8080\n"));
    assert!(content.ends_with("# [SECTION_END: net]\n"));
}

#[test]
fn set_dry_run_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(&file, "FOO=old\n").unwrap();

    let output = envpatch(&["set", path_str(&file), "FOO=new", "--dry-run"]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(fs::read_to_string(&file).unwrap(), "FOO=old\n");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("would apply 1 patch"), "{stdout}");
}

#[test]
fn set_diff_shows_changed_lines() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(&file, "FOO=old\nBAR=2\n").unwrap();

    let output = envpatch(&["set", path_str(&file), "FOO=new", "--dry-run", "--diff"]);
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("-FOO=old"), "{stdout}");
    assert!(stdout.contains("+FOO=new"), "{stdout}");
    assert!(!stdout.contains("-BAR=2"), "{stdout}");
}

#[test]
fn set_rejects_malformed_pair() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(&file, "FOO=1\n").unwrap();

    let output = envpatch(&["set", path_str(&file), "NOEQUALS"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("KEY=VALUE"), "{stderr}");
    assert_eq!(fs::read_to_string(&file).unwrap(), "FOO=1\n");
}

#[test]
fn apply_runs_updates_from_toml() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(&file, "DEBUG=true\n").unwrap();

    let updates = dir.path().join("updates.toml");
    fs::write(
        &updates,
        "[[update]]\nkey = \"DEBUG\"\nvalue = \"false\"\n",
    )
    .unwrap();

    let output = envpatch(&[
        "apply",
        path_str(&file),
        "--updates",
        path_str(&updates),
    ]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(fs::read_to_string(&file).unwrap(), "DEBUG=false\n");
}

#[test]
fn get_prints_value() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(&file, "FOO=1\nMSG=\"hello world\" # greeting\n").unwrap();

    let output = envpatch(&["get", path_str(&file), "MSG"]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "hello world\n");
}

#[test]
fn get_joins_multi_line_values() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(&file, "CERT=\"line one\nline two\"\n").unwrap();

    let output = envpatch(&["get", path_str(&file), "CERT"]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "line one\nline two\n"
    );
}

#[test]
fn get_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(&file, "FOO=1\n").unwrap();

    let output = envpatch(&["get", path_str(&file), "MISSING"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("MISSING"), "{stderr}");
}

#[test]
fn sections_lists_names_and_keys() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.env");
    fs::write(
        &file,
        "# [SECTION: net]\nPORT=80\nHOST=x\n# [SECTION_END: net]\nTOP=1\n",
    )
    .unwrap();

    let output = envpatch(&["sections", path_str(&file)]);
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("net"), "{stdout}");
    assert!(stdout.contains("PORT"), "{stdout}");
    assert!(stdout.contains("HOST"), "{stdout}");
    assert!(!stdout.contains("TOP"), "{stdout}");
}
