//! CLI integration tests for pipfile.
//!
//! Each test runs the binary in a scratch directory with `HOME` pointed at
//! that directory so no user configuration leaks in.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE: &str = "source('https://pypi.org/simple', verify_ssl=True)
package('requests', '>=2.0')
package('six', None)
dev_package('pytest', '==3.0.0')
requires_python('3.9')
";

/// Get the pipfile binary command, isolated in `dir`.
fn pipfile(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pipfile").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("PIPFILE_PYTHON");
    cmd
}

/// Create a temporary directory holding a Pipfile.
fn project(content: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Pipfile"), content).unwrap();
    tmp
}

// ============================================================================
// pipfile hash
// ============================================================================

#[test]
fn test_hash_prints_file_digest() {
    let tmp = project("package('six')\n");

    pipfile(tmp.path())
        .arg("hash")
        .assert()
        .success()
        .stdout("9f935b494017cdfc4962839b58e0c0349258b06dd65e6411de90ce85f74c1bec\n");
}

#[test]
fn test_hash_explicit_path() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("app")).unwrap();
    fs::write(tmp.path().join("app").join("Pipfile"), "package('six')\n").unwrap();

    pipfile(tmp.path())
        .args(["hash", "app/Pipfile"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("9f935b49"));
}

// ============================================================================
// pipfile freeze
// ============================================================================

#[test]
fn test_freeze_prints_snapshot() {
    let tmp = project(SAMPLE);

    pipfile(tmp.path())
        .arg("freeze")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{\n    \"_meta\": {\n        \"manifest-sha256\": \""))
        .stdout(predicate::str::contains(
            "    \"default\": [\n        {\n            \"name\": \"requests\",\n            \"version\": \">=2.0\"\n        },\n        {\n            \"name\": \"six\"\n        }\n    ],",
        ))
        .stdout(predicate::str::contains("\"verify_ssl\": true"));
}

#[test]
fn test_freeze_writes_output_file() {
    let tmp = project(SAMPLE);

    pipfile(tmp.path())
        .args(["freeze", "-o", "Pipfile.json"])
        .assert()
        .success()
        .stdout("");

    let written = fs::read_to_string(tmp.path().join("Pipfile.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["develop"][0]["name"], "pytest");
    assert_eq!(value["_meta"]["requires"][0]["marker"], "python_version");
}

// ============================================================================
// pipfile show
// ============================================================================

#[test]
fn test_show_lists_groups() {
    let tmp = project(SAMPLE);

    pipfile(tmp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("default:\n  requests >=2.0\n  six\n"))
        .stdout(predicate::str::contains("develop:\n  pytest ==3.0.0\n"));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_syntax_error_reports_location() {
    let tmp = project("package('six')\nimport os\n");

    pipfile(tmp.path())
        .args(["--no-color", "show"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_undeclared_name_is_rejected() {
    let tmp = project("package(requests)\n");

    pipfile(tmp.path())
        .args(["--no-color", "freeze"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("name `requests` is not defined"));
}

#[test]
fn test_missing_manifest() {
    let tmp = TempDir::new().unwrap();

    pipfile(tmp.path())
        .args(["--no-color", "hash"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `Pipfile`"))
        .stderr(predicate::str::contains("help: consider:"));
}

// ============================================================================
// pipfile find
// ============================================================================

#[test]
fn test_find_strict_walks_up() {
    let tmp = project("");
    let nested = tmp.path().join("src");
    fs::create_dir_all(&nested).unwrap();
    let expected = tmp.path().canonicalize().unwrap().join("Pipfile");

    pipfile(&nested)
        .args(["find", "--strict"])
        .assert()
        .success()
        .stdout(format!("{}\n", expected.display()));
}

#[test]
fn test_find_strict_respects_depth() {
    let tmp = project("");
    let nested = tmp.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    pipfile(&nested)
        .args(["find", "--strict", "--max-depth", "2"])
        .assert()
        .failure();
}

#[test]
fn test_find_reports_candidate() {
    let tmp = TempDir::new().unwrap();
    let expected = tmp.path().canonicalize().unwrap().join("Pipfile");

    pipfile(tmp.path())
        .arg("find")
        .assert()
        .success()
        .stdout(format!("{}\n", expected.display()));
}

#[test]
fn test_find_uses_project_config_depth() {
    let tmp = project("");
    let nested = tmp.path().join("a").join("b");
    fs::create_dir_all(nested.join(".pipfile")).unwrap();
    fs::write(
        nested.join(".pipfile").join("config.toml"),
        "[discovery]\nmax_depth = 2\n",
    )
    .unwrap();

    pipfile(&nested).args(["find", "--strict"]).assert().failure();
}

// ============================================================================
// pipfile check
// ============================================================================

#[cfg(unix)]
#[test]
fn test_check_mismatch_exits_nonzero() {
    let tmp = project("requires('os_name', 'nt')\n");

    pipfile(tmp.path())
        .args(["--no-color", "check", "--python", "/nonexistent/python"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("requirement `os_name` is not satisfied"))
        .stderr(predicate::str::contains("reports 'posix'"));
}

#[cfg(unix)]
#[test]
fn test_check_satisfied() {
    let tmp = project("requires('os_name', 'posix')\nrequires('extra', 'docs')\n");

    pipfile(tmp.path())
        .args(["check", "--python", "/nonexistent/python"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok       os_name == 'posix'"))
        .stdout(predicate::str::contains("skipped  extra == 'docs'"))
        .stderr(predicate::str::contains("warning: marker `extra` is not evaluated"));
}

// ============================================================================
// pipfile completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    pipfile(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pipfile"));
}
