//! End-to-end checks over contract and exemption files on disk: one clean
//! contract, one with violations, one with a duplicate key and one with an
//! expired exemption.

use std::path::{Path, PathBuf};

use apiscope_schema::{aggregate, check_contract, CheckRequest, ExitStatus, PolicyConfig};
use chrono::NaiveDate;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn run(contract: &Path, exemptions: Option<&Path>) -> apiscope_schema::Report {
    let config = PolicyConfig::default();
    aggregate(&check_contract(&CheckRequest {
        contract,
        exemptions,
        today: today(),
        config: &config,
    }))
}

const WIDGET_CONTRACT: &str = r##"openapi: 3.0.3
paths:
  /widgets:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Widget"
components:
  schemas:
    Widget:
      type: object
      properties:
        name:
          type: string
"##;

const PLAYBACK_CONTRACT: &str = r##"openapi: 3.0.3
paths:
  /playback:
    get:
      responses:
        "200":
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/PlaybackState"
components:
  schemas:
    PlaybackState:
      type: object
      properties:
        is_active:
          type: boolean
"##;

#[test]
fn test_clean_contract_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let contract = write(dir.path(), "openapi.yaml", WIDGET_CONTRACT);
    let report = run(&contract, None);
    assert_eq!(report.status, ExitStatus::Success);
    assert_eq!(report.status.code(), 0);
    assert!(report.text.contains("  - Widget\n"), "got: {}", report.text);
    assert!(report
        .text
        .ends_with("OK: hygiene verified for 1 scoped schema(s).\n"));
}

#[test]
fn test_playback_schema_has_two_violations() {
    let dir = tempfile::tempdir().unwrap();
    let contract = write(dir.path(), "openapi.yaml", PLAYBACK_CONTRACT);
    let report = run(&contract, None);
    assert_eq!(report.status.code(), 1);
    let violations: Vec<&str> = report
        .text
        .lines()
        .filter(|l| l.starts_with("VIOLATION"))
        .collect();
    assert_eq!(
        violations,
        vec![
            "VIOLATION [naming] Schema 'PlaybackState' has property 'is_active' with underscores. Use camelCase.",
            "VIOLATION [extensibility] Schema 'PlaybackState' is missing 'additionalProperties: false'.",
        ]
    );
    assert!(report
        .text
        .ends_with("FAIL: 2 hygiene violation(s) in 1 scoped schema(s).\n"));
}

#[test]
fn test_duplicate_operation_key_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let contract = write(
        dir.path(),
        "openapi.yaml",
        "openapi: 3.0.3\npaths:\n  /widgets:\n    get:\n      summary: first\n    get:\n      summary: second\n",
    );
    let report = run(&contract, None);
    assert_eq!(report.status.code(), 5);
    assert!(
        report.text.starts_with("ERROR: ")
            && report.text.contains("duplicate key 'get' found at line 6"),
        "got: {}",
        report.text
    );
    assert_eq!(report.text.lines().count(), 1);
}

#[test]
fn test_expired_exemption_fails_before_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let contract = write(dir.path(), "openapi.yaml", PLAYBACK_CONTRACT);
    let exemptions = write(
        dir.path(),
        "exemptions.json",
        r#"[{"name": "PlaybackState", "reason": "legacy player", "adr_link": "docs/adr/0012.md", "expiry": "2020-01-01"}]"#,
    );
    let report = run(&contract, Some(&exemptions));
    assert_eq!(report.status.code(), 3);
    assert!(!report.text.contains("VIOLATION"), "got: {}", report.text);
    assert!(
        report.text.contains("PlaybackState") && report.text.contains("2020-01-01"),
        "got: {}",
        report.text
    );
}

#[test]
fn test_valid_exemption_suppresses_violations() {
    let dir = tempfile::tempdir().unwrap();
    let contract = write(dir.path(), "openapi.yaml", PLAYBACK_CONTRACT);
    let exemptions = write(
        dir.path(),
        "exemptions.yaml",
        "- name: PlaybackState\n  reason: legacy player\n  adr_link: docs/adr/0012.md\n  expiry: \"2026-03-01\"\n",
    );
    let report = run(&contract, Some(&exemptions));
    assert_eq!(report.status, ExitStatus::Success);
    assert!(report.text.contains("  - PlaybackState (exempt)\n"));
}

#[test]
fn test_malformed_exemption_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let contract = write(dir.path(), "openapi.yaml", WIDGET_CONTRACT);
    let exemptions = write(
        dir.path(),
        "exemptions.yaml",
        "- name: Widget\n  reason: \"\"\n  adr_link: docs/adr/0001.md\n  expiry: never\n",
    );
    let report = run(&contract, Some(&exemptions));
    assert_eq!(report.status.code(), 2);
    assert!(report.text.contains("index 0"), "got: {}", report.text);
}

#[test]
fn test_json_contract_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let contract = write(
        dir.path(),
        "openapi.json",
        r##"{"paths": {"/t": {"get": {"schema": {"$ref": "#/components/schemas/TraceSpan"}}}},
 "components": {"schemas": {"TraceSpan": {"additionalProperties": false, "properties": {"spanId": {}}}}}}"##,
    );
    let report = run(&contract, None);
    assert_eq!(report.status, ExitStatus::Success);
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let contract = write(dir.path(), "openapi.yaml", PLAYBACK_CONTRACT);
    let first = run(&contract, None);
    let second = run(&contract, None);
    assert_eq!(first, second);
}
