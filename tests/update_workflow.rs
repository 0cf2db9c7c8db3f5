//! End-to-end update workflows against real files.
//!
//! Each test drives the full pipeline: parse, plan, atomic rewrite, and
//! checks the resulting bytes (and idempotency of a second run).

use envpatch::{preview_file, update_file, UpdateFileOptions, UpdateRequest};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_env(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("app.env");
    fs::write(&path, content).unwrap();
    path
}

fn options() -> UpdateFileOptions {
    UpdateFileOptions::default()
}

#[test]
fn replace_preserves_surrounding_lines_and_comments() {
    let dir = TempDir::new().unwrap();
    let path = write_env(
        &dir,
        "# generated by setup\nHOST=localhost\nPORT=old # do not touch comment\n\nDEBUG=false\n",
    );

    let outcome = update_file(&path, vec![UpdateRequest::new("PORT", "8080")], &options()).unwrap();
    assert_eq!(outcome.patches, 1);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "# generated by setup\nHOST=localhost\nPORT=8080 # do not touch comment\n\nDEBUG=false\n"
    );
}

#[test]
fn second_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, "FOO=old\nBAR=2\n");
    let updates = || {
        vec![
            UpdateRequest::new("FOO", "new"),
            UpdateRequest::new("ADDED", "yes"),
        ]
    };

    let first = update_file(&path, updates(), &options()).unwrap();
    assert!(first.patches > 0);
    let after_first = fs::read_to_string(&path).unwrap();

    let second = update_file(&path, updates(), &options()).unwrap();
    assert_eq!(second.patches, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
}

#[test]
fn new_section_created_on_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, "");

    update_file(
        &path,
        vec![UpdateRequest::new("PORT", "8080").in_section("NET")],
        &options(),
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "# [SECTION: NET]\nPORT=8080\n# [SECTION_END: NET]\n"
    );
}

#[test]
fn new_key_lands_inside_existing_section() {
    let dir = TempDir::new().unwrap();
    let path = write_env(
        &dir,
        "# [SECTION: net]\nHOST=example.com\n# [SECTION_END: net]\nTAIL=1\n",
    );

    update_file(
        &path,
        vec![UpdateRequest::new("PORT", "80").in_section("net")],
        &options(),
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "# [SECTION: net]\nHOST=example.com\nPORT=80\n# [SECTION_END: net]\nTAIL=1\n"
    );
}

#[test]
fn variable_moves_between_sections() {
    let dir = TempDir::new().unwrap();
    let path = write_env(
        &dir,
        "# [SECTION: A]\nFOO=1\n# [SECTION_END: A]\n# [SECTION: B]\nBAR=2\n# [SECTION_END: B]\n",
    );

    update_file(
        &path,
        vec![UpdateRequest::new("FOO", "1").in_section("B")],
        &options(),
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "# [SECTION: A]\n# [SECTION_END: A]\n# [SECTION: B]\nBAR=2\nFOO=1\n# [SECTION_END: B]\n"
    );
}

#[test]
fn multi_line_value_collapses_to_single_line() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, "KEY=\"one\ntwo\nthree\"\nNEXT=1\n");

    update_file(&path, vec![UpdateRequest::new("KEY", "flat")], &options()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "KEY=\"flat\"\nNEXT=1\n");
}

#[test]
fn matching_multi_line_value_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let content = "KEY=\"one\ntwo\"\n";
    let path = write_env(&dir, content);

    let outcome = update_file(
        &path,
        vec![UpdateRequest::new("KEY", "one\ntwo")],
        &options(),
    )
    .unwrap();
    assert_eq!(outcome.patches, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn untouched_crlf_lines_keep_their_terminators() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, "FOO=old\r\nBAR=2\r\n");

    update_file(&path, vec![UpdateRequest::new("FOO", "new")], &options()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "FOO=new\nBAR=2\r\n");
}

#[test]
fn value_with_spaces_gets_quoted_on_insert() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, "A=1\n");

    update_file(
        &path,
        vec![UpdateRequest::new("MSG", "hello world")],
        &options(),
    )
    .unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "A=1\nMSG=\"hello world\"\n");
}

#[test]
fn preview_matches_what_apply_writes() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, "FOO=old\nBAR=2\n");
    let updates = || {
        vec![
            UpdateRequest::new("FOO", "new"),
            UpdateRequest::new("NEW", "3").in_section("extra"),
        ]
    };

    let (_, rendered) = preview_file(&path, updates(), &options()).unwrap();
    update_file(&path, updates(), &options()).unwrap();
    assert_eq!(fs::read(&path).unwrap(), rendered);
}

#[test]
fn backup_keeps_original_content_next_to_file() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, "FOO=old\n");
    let opts = UpdateFileOptions {
        backup: true,
        ..options()
    };

    let outcome = update_file(&path, vec![UpdateRequest::new("FOO", "new")], &opts).unwrap();
    let backup = outcome.backup.expect("backup path");
    assert_eq!(backup.parent(), path.parent());
    assert_eq!(fs::read_to_string(&backup).unwrap(), "FOO=old\n");
    assert_eq!(fs::read_to_string(&path).unwrap(), "FOO=new\n");
}

#[test]
fn final_line_without_newline_is_replaced_cleanly() {
    let dir = TempDir::new().unwrap();
    let path = write_env(&dir, "A=1\nB=old");

    update_file(&path, vec![UpdateRequest::new("B", "new")], &options()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "A=1\nB=new\n");
}
