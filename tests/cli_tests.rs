//! End-to-end tests for the `tugup` binary.
//!
//! Each test builds a small project in a temp directory and runs the binary
//! from inside it, so `tugup.toml` lookup sees only that project.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const VIEWS: &str = r#"from django.utils.encoding import force_text


def index(request):
    return force_text(request.META["HTTP_ACCEPT"])
"#;

const VIEWS_AT_3_0: &str = r#"from django.utils.encoding import force_str


def index(request):
    return force_str(request.headers["accept"])
"#;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (name, contents) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, contents).expect("write file");
    }
    dir
}

fn tugup(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tugup"))
        .args(args)
        .current_dir(dir)
        .env_remove("TUGUP_TARGET_VERSION")
        .env_remove("RUST_LOG")
        .output()
        .expect("run tugup")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("json output")
}

// ============================================================================
// Modes
// ============================================================================

#[test]
fn write_mode_rewrites_and_exits_one() {
    let dir = project(&[("app/views.py", VIEWS)]);
    let output = tugup(dir.path(), &["--target-version", "3.0", "app"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Rewriting app/views.py"));
    assert_eq!(
        fs::read_to_string(dir.path().join("app/views.py")).unwrap(),
        VIEWS_AT_3_0
    );
}

#[test]
fn second_run_is_clean() {
    let dir = project(&[("views.py", VIEWS)]);
    tugup(dir.path(), &["--target-version", "3.0", "views.py"]);
    let output = tugup(dir.path(), &["--target-version", "3.0", "views.py"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("1 scanned, 0 rewritten, 1 unchanged"));
}

#[test]
fn check_mode_reports_without_writing() {
    let dir = project(&[("views.py", VIEWS)]);
    let output = tugup(dir.path(), &["--check", "--target-version", "3.0", "views.py"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Would rewrite views.py"));
    assert_eq!(fs::read_to_string(dir.path().join("views.py")).unwrap(), VIEWS);
}

#[test]
fn diff_mode_prints_unified_diff() {
    let dir = project(&[("views.py", VIEWS)]);
    let output = tugup(dir.path(), &["--diff", "--target-version", "3.0", "views.py"]);

    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("--- a/views.py"));
    assert!(text.contains("+from django.utils.encoding import force_str"));
    assert_eq!(fs::read_to_string(dir.path().join("views.py")).unwrap(), VIEWS);
}

#[test]
fn json_format_reports_each_file() {
    let dir = project(&[("a.py", VIEWS), ("b.py", "x = 1\n")]);
    let output = tugup(
        dir.path(),
        &["--check", "--format", "json", "--target-version", "3.0", "."],
    );

    let json = json(&output);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["mode"], "check");
    assert_eq!(json["target_version"], "3.0");
    assert_eq!(json["summary"]["files_scanned"], 2);
    assert_eq!(json["summary"]["edits_applied"], 4);
}

// ============================================================================
// Rule Selection and Config
// ============================================================================

#[test]
fn only_limits_rules() {
    let dir = project(&[("views.py", VIEWS)]);
    tugup(
        dir.path(),
        &["--target-version", "3.0", "--only", "request_headers", "views.py"],
    );
    let text = fs::read_to_string(dir.path().join("views.py")).unwrap();
    assert!(text.contains("force_text(request.headers[\"accept\"])"));
}

#[test]
fn config_file_supplies_target() {
    let dir = project(&[
        ("tugup.toml", "target_version = \"3.0\"\nskip = [\"request_headers\"]\n"),
        ("views.py", VIEWS),
    ]);
    tugup(dir.path(), &["views.py"]);
    let text = fs::read_to_string(dir.path().join("views.py")).unwrap();
    assert!(text.contains("force_str(request.META[\"HTTP_ACCEPT\"])"));
}

#[test]
fn namespace_moves_rule_modules() {
    let source = "from vendor.django.utils.encoding import force_text\nforce_text(x)\n";
    let dir = project(&[("views.py", source)]);
    tugup(
        dir.path(),
        &["--target-version", "3.0", "--namespace", "vendor.django", "views.py"],
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("views.py")).unwrap(),
        "from vendor.django.utils.encoding import force_str\nforce_str(x)\n"
    );
}

#[test]
fn target_version_from_environment() {
    let dir = project(&[("views.py", VIEWS)]);
    let output = Command::new(env!("CARGO_BIN_EXE_tugup"))
        .args(["--check", "views.py"])
        .current_dir(dir.path())
        .env("TUGUP_TARGET_VERSION", "1.11")
        .output()
        .expect("run tugup");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn list_rules_as_json() {
    let dir = project(&[]);
    let output = tugup(
        dir.path(),
        &["--list-rules", "--format", "json", "--target-version", "3.0"],
    );
    assert_eq!(output.status.code(), Some(0));
    let rules = json(&output);
    let rules = rules.as_array().expect("array");
    assert_eq!(rules.len(), 5);
    assert_eq!(rules[0]["name"], "default_app_config");
    assert_eq!(rules[0]["min_version"], "3.2");
    assert_eq!(rules[0]["active"], false);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn unparseable_file_is_skipped() {
    let dir = project(&[("bad.py", "x = 'open\nforce_text\n")]);
    let output = tugup(dir.path(), &["--target-version", "3.0", "bad.py"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("1 skipped"));
    assert_eq!(
        fs::read_to_string(dir.path().join("bad.py")).unwrap(),
        "x = 'open\nforce_text\n"
    );
}

#[test]
fn fstring_use_of_renamed_name_leaves_file_unmodified() {
    let source = "from django.utils.encoding import force_text\nx = f\"{force_text(y)}\"\n";
    let dir = project(&[("views.py", source)]);
    let output = tugup(dir.path(), &["--target-version", "3.0", "views.py"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Error views.py"));
    assert_eq!(fs::read_to_string(dir.path().join("views.py")).unwrap(), source);
}

#[test]
fn unknown_rule_is_invalid_arguments() {
    let dir = project(&[("views.py", VIEWS)]);
    let output = tugup(dir.path(), &["--format", "json", "--only", "nope", "views.py"]);
    assert_eq!(output.status.code(), Some(2));
    let json = json(&output);
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 2);
    assert!(json["error"]["details"]["known_rules"].is_array());
}

#[test]
fn missing_path_is_resolution_error() {
    let dir = project(&[]);
    let output = tugup(dir.path(), &["missing.py"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("tugup: error:"));
}

#[test]
fn bad_config_is_invalid_arguments() {
    let dir = project(&[("tugup.toml", "target = 1\n"), ("views.py", VIEWS)]);
    let output = tugup(dir.path(), &["views.py"]);
    assert_eq!(output.status.code(), Some(2));
}
