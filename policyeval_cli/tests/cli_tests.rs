//! End-to-end CLI tests covering output and exit-code mapping.

use assert_cmd::Command;
use predicates::prelude::*;

const ADMIN_POLICY: &str = r#"{
    "name": "admin-only",
    "effect": "allow",
    "rules": [{"type": "compare", "path": "user.role", "op": "eq", "value": "admin"}]
}"#;

fn policyeval() -> Command {
    Command::cargo_bin("policyeval").unwrap()
}

#[test]
fn test_allowed_prints_allow_and_exits_zero() {
    policyeval()
        .args([
            "evaluate",
            "--policy",
            ADMIN_POLICY,
            "--input",
            r#"{"user": {"role": "admin"}}"#,
        ])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("allow"));
}

#[test]
fn test_denied_prints_deny_and_exits_three() {
    policyeval()
        .args([
            "evaluate",
            "--policy",
            ADMIN_POLICY,
            "--input",
            r#"{"user": {"role": "guest"}}"#,
        ])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("deny"));
}

#[test]
fn test_explain_prints_json_explanation() {
    policyeval()
        .args([
            "evaluate",
            "--policy",
            ADMIN_POLICY,
            "--input",
            r#"{"user": {"role": "admin"}}"#,
            "--explain",
        ])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"matched\": true"))
        .stdout(predicate::str::contains("\"rules\""));
}

#[test]
fn test_policy_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    std::fs::write(&path, ADMIN_POLICY).unwrap();

    policyeval()
        .args([
            "evaluate",
            "--policy",
            path.to_str().unwrap(),
            "--input",
            r#"{"user": {"role": "admin"}}"#,
        ])
        .assert()
        .code(0);
}

#[test]
fn test_invalid_policy_json_exits_two() {
    policyeval()
        .args([
            "evaluate",
            "--policy",
            r#"{"name": "broken"#,
            "--input",
            "{}",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_unknown_rule_type_exits_two() {
    policyeval()
        .args([
            "evaluate",
            "--policy",
            r#"{"name": "x", "rules": [{"type": "no_such_rule"}]}"#,
            "--input",
            "{}",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown rule type"));
}

#[test]
fn test_invalid_strict_value_exits_two() {
    policyeval()
        .args([
            "evaluate",
            "--policy",
            ADMIN_POLICY,
            "--input",
            "{}",
            "--strict",
            "loose",
        ])
        .assert()
        .code(2);
}

#[test]
fn test_strict_raise_on_missing_path_exits_one() {
    policyeval()
        .args([
            "evaluate",
            "--policy",
            ADMIN_POLICY,
            "--input",
            "{}",
            "--strict",
            "raise",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing value"));
}

#[test]
fn test_unknown_subcommand_exits_two() {
    policyeval().arg("frobnicate").assert().code(2);
}
