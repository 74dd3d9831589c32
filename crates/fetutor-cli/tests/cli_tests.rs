//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BANK: &str = r#"
[[problems]]
id = "D1"
category = "Dynamics"
statement = "A car accelerates at a(t) = 2t^2 + 2 from 10 m/s. Speed after 3 s?"
targets = [{ name = "v_final", value = 34.0 }]
options = ["34 m/s", "50 m/s"]
correct_option = "34 m/s"

[[problems]]
id = "S1"
category = "Statics"
statement = "Find both support reactions."
targets = [{ name = "R_A", value = 75.0 }, { name = "R_B", value = 25.0 }]
"#;

fn fetutor(home: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("fetutor").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("FETUTOR_GEMINI_KEY")
        .env_remove("FETUTOR_OPENAI_KEY")
        .env_remove("FETUTOR_WEBHOOK_URL");
    cmd
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bank.toml"), BANK).unwrap();
    dir
}

#[test]
fn validate_valid_bank() {
    let dir = workspace();
    fetutor(&dir)
        .args(["validate", "--bank", "bank.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 problems"))
        .stdout(predicate::str::contains("All problems valid"));
}

#[test]
fn validate_reports_warnings() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("weak.toml"),
        "[[problems]]\nid = \"X\"\nstatement = \"Pick.\"\noptions = [\"A\"]\n",
    )
    .unwrap();
    fetutor(&dir)
        .args(["validate", "--bank", "weak.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[X] WARNING: options given but no correct_option"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    fetutor(&dir)
        .args(["validate", "--bank", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn problems_lists_bank() {
    let dir = workspace();
    fetutor(&dir)
        .args(["problems", "--bank", "bank.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("D1"))
        .stdout(predicate::str::contains("R_A, R_B"))
        .stdout(predicate::str::contains("2 problem(s)"));
}

#[test]
fn problems_filters_by_category() {
    let dir = workspace();
    fetutor(&dir)
        .args(["problems", "--bank", "bank.toml", "--category", "statics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("S1"))
        .stdout(predicate::str::contains("1 problem(s)"));
}

#[test]
fn check_against_expected_value() {
    let dir = TempDir::new().unwrap();
    fetutor(&dir)
        .args(["check", "I got v = 33.5 m/s", "--expected", "34"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted: 33.5"))
        .stdout(predicate::str::contains("answer (expected 34): MATCH"));

    fetutor(&dir)
        .args(["check", "about 30", "--expected", "34"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NO MATCH"));
}

#[test]
fn check_against_problem_targets() {
    let dir = workspace();
    fetutor(&dir)
        .args(["check", "R = 75 N", "--problem", "S1", "--bank", "bank.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("R_A (expected 75): MATCH"))
        .stdout(predicate::str::contains("R_B (expected 25): NO MATCH"));
}

#[test]
fn check_without_number_fails_closed() {
    let dir = TempDir::new().unwrap();
    fetutor(&dir)
        .args(["check", "no idea", "--expected", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no number found)"))
        .stdout(predicate::str::contains("NO MATCH"));
}

#[test]
fn check_requires_a_target() {
    let dir = TempDir::new().unwrap();
    fetutor(&dir).args(["check", "34"]).assert().failure();
}

#[test]
fn score_offline_is_unavailable() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("t.txt"), "Student: F = 10 N\n").unwrap();
    fetutor(&dir)
        .args(["score", "--transcript", "t.txt", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mastery score: unavailable"))
        .stdout(predicate::str::contains("running with --offline"));
}

#[test]
fn missing_provider_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("t.txt"), "Student: hi\n").unwrap();
    fetutor(&dir)
        .args(["score", "--transcript", "t.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'gemini' is not configured"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    fetutor(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created fetutor.toml"))
        .stdout(predicate::str::contains("Created problems/fe-sample.toml"));

    assert!(dir.path().join("fetutor.toml").exists());
    assert!(dir.path().join("problems/fe-sample.toml").exists());

    fetutor(&dir)
        .args(["validate", "--bank", "problems"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All problems valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    fetutor(&dir).arg("init").assert().success();

    fetutor(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    fetutor(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Socratic engineering tutor"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    fetutor(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fetutor"));
}
