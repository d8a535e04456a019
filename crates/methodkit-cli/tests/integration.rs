use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn methodkit(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("methodkit").unwrap();
    cmd.current_dir(dir.path())
        .env("METHODKIT_ROOT", dir.path());
    cmd
}

const METHODOLOGY: &str = r#"
methodology_id: sccu
version: 1.2.0
name: SCCU
description: Sample methodology
states:
  - id: START
    name: Start
    type: Initial
  - id: QA
    name: QA Review
    type: Waiting
    timeout: 24h
  - id: DONE
    name: Done
    type: Terminal
  - id: FAILED
    name: Failed
    type: Error
actors:
  - id: qa_lead
    name: QA Lead
    type: Human
    tools: [review_ui]
tools:
  - id: review_ui
    name: Review UI
    type: UI
    compatible_actors: [Human]
actions:
  - id: approve_qa
    name: Approve QA
    actor: qa_lead
    tool: review_ui
    allowed_in_states: [QA]
facts:
  - id: started
    from_state: START
    to_state: QA
  - id: qa_approved
    from_state: QA
    to_state: DONE
    triggered_by: approve_qa
  - id: qa_failed
    from_state: QA
    to_state: FAILED
phase_defaults:
  QA:
    template: QA_TEMPLATE
    validators: [checklist]
    skip_allowed: false
processes:
  - id: release
    version: 2.0.0
    name: Release
    description: Standard release flow
    states_sequence: [START, QA, DONE]
    approval_points:
      QA:
        role: qa_lead
"#;

fn write_namespace(dir: &TempDir) {
    let ns = dir.path().join("namespaces/sccu");
    std::fs::create_dir_all(ns.join("processes")).unwrap();
    std::fs::create_dir_all(ns.join("skills/hotfix")).unwrap();
    std::fs::write(ns.join("methodology.yaml"), METHODOLOGY).unwrap();
    std::fs::write(
        ns.join("skills/hotfix/SKILL.md"),
        "---\nname: hotfix\ndescription: Fast patching\n---\n",
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// methodkit validate
// ---------------------------------------------------------------------------

#[test]
fn validate_clean_methodology_succeeds() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);

    methodkit(&dir)
        .args(["validate", "sccu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ VALID"));
}

#[test]
fn validate_unknown_namespace_fails() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);

    methodkit(&dir)
        .args(["validate", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn validate_reports_deadlock_as_error() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);
    // Orphan working state with no outgoing transition.
    let path = dir.path().join("namespaces/sccu/methodology.yaml");
    let doc = std::fs::read_to_string(&path).unwrap().replace(
        "\nactors:",
        "\n  - id: STUCK\n    name: Stuck\n    type: Working\nactors:",
    );
    std::fs::write(&path, doc).unwrap();

    methodkit(&dir)
        .args(["validate", "sccu"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Deadlock: State 'STUCK' has no outgoing transitions",
        ));
}

#[test]
fn validate_strict_fails_on_warnings() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);
    // Remove the Error state: produces a warning but no error.
    let path = dir.path().join("namespaces/sccu/methodology.yaml");
    let doc = std::fs::read_to_string(&path)
        .unwrap()
        .replace("  - id: FAILED\n    name: Failed\n    type: Error\n", "")
        .replace(
            "  - id: qa_failed\n    from_state: QA\n    to_state: FAILED\n",
            "",
        );
    std::fs::write(&path, doc).unwrap();

    methodkit(&dir).args(["validate", "sccu"]).assert().success();
    methodkit(&dir)
        .args(["validate", "sccu", "--strict"])
        .assert()
        .failure();
}

#[test]
fn validate_json_output() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);

    methodkit(&dir)
        .args(["validate", "sccu", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"));
}

// ---------------------------------------------------------------------------
// methodkit generate
// ---------------------------------------------------------------------------

#[test]
fn generate_writes_process_files() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);

    methodkit(&dir)
        .args(["generate", "sccu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated release.json"));

    let path = dir.path().join("namespaces/sccu/processes/release.json");
    let content = std::fs::read_to_string(path).unwrap();
    let process: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(process["process_id"], "release");
    assert_eq!(process["version"], "2.0.0");
    assert_eq!(process["phases"][1]["id"], "QA");
    assert_eq!(process["phases"][1]["approval"]["role"], "qa_lead");
}

#[test]
fn generate_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);

    methodkit(&dir)
        .args(["generate", "sccu", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("release.json"));

    assert!(!dir
        .path()
        .join("namespaces/sccu/processes/release.json")
        .exists());
}

#[test]
fn generate_skips_manually_modified_unless_forced() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);
    let path = dir.path().join("namespaces/sccu/processes/release.json");
    std::fs::write(
        &path,
        r#"{"process_id": "release", "phases": [], "_generated": false}"#,
    )
    .unwrap();

    methodkit(&dir)
        .args(["generate", "sccu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipping release.json"));
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"_generated\": false"));

    methodkit(&dir)
        .args(["generate", "sccu", "--force"])
        .assert()
        .success();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.contains("_generated"));
}

#[test]
fn generate_honors_output_dir() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);
    let out = dir.path().join("out");

    methodkit(&dir)
        .args(["generate", "sccu", "--output"])
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("release.json").exists());
}

// ---------------------------------------------------------------------------
// methodkit sync-check
// ---------------------------------------------------------------------------

#[test]
fn sync_check_missing_process_fails() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);

    methodkit(&dir)
        .args(["sync-check", "sccu"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗"));
}

#[test]
fn sync_check_after_generate_is_clean() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);

    methodkit(&dir).args(["generate", "sccu"]).assert().success();
    methodkit(&dir)
        .args(["sync-check", "sccu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ In sync"));
}

#[test]
fn sync_check_warning_only_drift_exits_zero() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);
    methodkit(&dir).args(["generate", "sccu"]).assert().success();

    // Flip skip_allowed on one phase: warning-severity drift.
    let path = dir.path().join("namespaces/sccu/processes/release.json");
    let content = std::fs::read_to_string(&path).unwrap();
    let mut process: serde_json::Value = serde_json::from_str(&content).unwrap();
    process["phases"][1]["skip_allowed"] = serde_json::json!(true);
    std::fs::write(&path, serde_json::to_string_pretty(&process).unwrap()).unwrap();

    methodkit(&dir)
        .args(["sync-check", "sccu", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skip_allowed"))
        .stdout(predicate::str::contains("1 warning(s)"));
}

// ---------------------------------------------------------------------------
// methodkit extract-defaults / visualize
// ---------------------------------------------------------------------------

#[test]
fn extract_defaults_round_trips_generated_processes() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);
    methodkit(&dir).args(["generate", "sccu"]).assert().success();

    methodkit(&dir)
        .args(["extract-defaults", "sccu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("phase_defaults"))
        .stdout(predicate::str::contains("QA_TEMPLATE"));
}

#[test]
fn visualize_state_diagram_to_stdout() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);

    methodkit(&dir)
        .args(["visualize", "sccu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stateDiagram-v2"))
        .stdout(predicate::str::contains("START --> QA"));
}

#[test]
fn visualize_plantuml_to_file() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);
    let out = dir.path().join("diagram.puml");

    methodkit(&dir)
        .args(["visualize", "sccu", "--format", "plantuml", "--output"])
        .arg(&out)
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.starts_with("@startuml"));
}

#[test]
fn visualize_rejects_unknown_type() {
    let dir = TempDir::new().unwrap();
    write_namespace(&dir);

    methodkit(&dir)
        .args(["visualize", "sccu", "--type", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown diagram type"));
}

// ---------------------------------------------------------------------------
// methodkit init / install / status
// ---------------------------------------------------------------------------

fn project_with_source() -> (TempDir, TempDir) {
    let source = TempDir::new().unwrap();
    write_namespace(&source);
    // The source also ships a process file to install.
    let mut cmd = Command::cargo_bin("methodkit").unwrap();
    cmd.current_dir(source.path())
        .env("METHODKIT_ROOT", source.path())
        .args(["generate", "sccu"])
        .assert()
        .success();

    let project = TempDir::new().unwrap();
    let mut cmd = methodkit(&project);
    cmd.args(["init", "--methodology", "sccu", "--source"])
        .arg(source.path())
        .assert()
        .success();
    (project, source)
}

#[test]
fn init_writes_manifest() {
    let (project, _source) = project_with_source();
    let content = std::fs::read_to_string(project.path().join(".installed.yaml")).unwrap();
    assert!(content.contains("methodology: sccu"));
    assert!(content.contains("methodology_version: 1.2.0"));
}

#[test]
fn init_twice_fails() {
    let (project, source) = project_with_source();
    methodkit(&project)
        .args(["init", "--methodology", "sccu", "--source"])
        .arg(source.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn install_skill_and_process() {
    let (project, _source) = project_with_source();

    methodkit(&project)
        .args(["install", "sccu/skills/hotfix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed hotfix"));
    assert!(project.path().join(".claude/skills/hotfix/SKILL.md").exists());

    methodkit(&project)
        .args(["install", "sccu/processes/release"])
        .assert()
        .success();
    assert!(project.path().join("processes/release.json").exists());

    let manifest = std::fs::read_to_string(project.path().join(".installed.yaml")).unwrap();
    assert!(manifest.contains("hotfix"));
    assert!(manifest.contains("release"));
    assert!(manifest.contains("sha256:"));
}

#[test]
fn install_twice_fails() {
    let (project, _source) = project_with_source();
    methodkit(&project)
        .args(["install", "sccu/skills/hotfix"])
        .assert()
        .success();
    methodkit(&project)
        .args(["install", "sccu/skills/hotfix"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already installed"));
}

#[test]
fn install_all_skips_already_installed() {
    let (project, _source) = project_with_source();
    methodkit(&project)
        .args(["install", "sccu/processes/release"])
        .assert()
        .success();

    methodkit(&project)
        .args(["install", "sccu/processes", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed: 0, Skipped: 1"));
}

#[test]
fn install_invalid_path_fails() {
    let (project, _source) = project_with_source();
    methodkit(&project)
        .args(["install", "not-a-path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected namespace/type/id"));
}

#[test]
fn status_detects_modification() {
    let (project, _source) = project_with_source();
    methodkit(&project)
        .args(["install", "sccu/processes/release"])
        .assert()
        .success();

    methodkit(&project)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ release"));

    std::fs::write(
        project.path().join("processes/release.json"),
        "{\"process_id\": \"release\", \"phases\": []}",
    )
    .unwrap();

    methodkit(&project)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("~ release"))
        .stdout(predicate::str::contains("[modified]"));
}

#[test]
fn status_without_init_fails() {
    let dir = TempDir::new().unwrap();
    methodkit(&dir)
        .args(["status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}
