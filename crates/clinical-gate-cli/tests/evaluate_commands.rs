// crates/clinical-gate-cli/tests/evaluate_commands.rs
// ============================================================================
// Module: CLI Evaluate and Lint Command Tests
// Description: Integration tests for rule evaluation and rule linting.
// Purpose: Ensure decisions print as JSON and lint findings fail the command.
// Dependencies: clinical-gate-cli binary
// ============================================================================

//! ## Overview
//! Runs the CLI binary against rule sets and contexts written to a temp dir.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use clinical_gate_core::PatientHash;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn clinical_gate_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_clinical-gate"))
}

fn run(root: &Path, args: &[&str]) -> Output {
    Command::new(clinical_gate_bin())
        .current_dir(root)
        .env_remove("CLINICAL_GATE_CONFIG")
        .env_remove("CLINICAL_GATE_USE_REAL_LLM")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run clinical-gate")
}

fn dose_rule(logic_extra: &Value) -> Value {
    let mut logic = json!({
        "applicableTo": ["prescription"],
        "conditions": [{"field": "medication.dose_mg", "operator": "greater_than", "value": 40}],
        "color": "RED",
        "message": {"pt": "Dose acima do limite", "en": "Dose above limit"}
    });
    if let (Some(target), Some(extra)) = (logic.as_object_mut(), logic_extra.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    json!({
        "ruleId": "dose-limit",
        "name": "Dose limit",
        "version": 1,
        "category": "clinical",
        "isActive": true,
        "ruleLogic": logic.to_string()
    })
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
}

fn context(dose: u32) -> Value {
    json!({
        "patientHash": PatientHash::from_identifier("MRN-1").as_str(),
        "actionType": "prescription",
        "payload": {"medication": {"dose_mg": dose}}
    })
}

// ============================================================================
// SECTION: Evaluate
// ============================================================================

#[test]
fn evaluate_prints_red_decision() {
    let temp = TempDir::new().unwrap();
    let rules = temp.path().join("rules.json");
    let ctx = temp.path().join("context.json");
    write_json(&rules, &json!([dose_rule(&json!({}))]));
    write_json(&ctx, &context(50));

    let output = run(
        temp.path(),
        &["evaluate", "--context", "context.json", "--rules", "rules.json"],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let decision: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(decision["color"], "RED");
    assert_eq!(decision["overrideRequires"], "supervisor");
    assert_eq!(decision["signals"][0]["ruleId"], "dose-limit");
    assert_eq!(decision["needsChatAssistance"], true);
}

#[test]
fn evaluate_lethal_marker_blocks_override() {
    let temp = TempDir::new().unwrap();
    let ctx = temp.path().join("context.json");
    let mut value = context(500);
    value["rules"] = json!([dose_rule(&json!({
        "message": {"pt": "Dose potencialmente letal", "en": "Potentially lethal dose"}
    }))]);
    write_json(&ctx, &value);

    let output = run(temp.path(), &["evaluate", "--context", "context.json"]);
    assert!(output.status.success());
    let decision: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(decision["color"], "RED");
    assert_eq!(decision["canOverride"], false);
    assert_eq!(decision["overrideRequires"], "blocked");
}

#[test]
fn evaluate_below_threshold_is_green() {
    let temp = TempDir::new().unwrap();
    let ctx = temp.path().join("context.json");
    let mut value = context(20);
    value["rules"] = json!([dose_rule(&json!({}))]);
    write_json(&ctx, &value);

    let output = run(temp.path(), &["evaluate", "--context", "context.json"]);
    assert!(output.status.success());
    let decision: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(decision["color"], "GREEN");
    assert_eq!(decision["signals"], json!([]));
}

#[test]
fn evaluate_rejects_malformed_context() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("context.json"), b"{\"actionType\": 3}").unwrap();
    let output = run(temp.path(), &["evaluate", "--context", "context.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid evaluation context json"));
}

// ============================================================================
// SECTION: Lint
// ============================================================================

#[test]
fn lint_clean_rules_succeeds() {
    let temp = TempDir::new().unwrap();
    write_json(&temp.path().join("rules.json"), &json!([dose_rule(&json!({}))]));
    let output = run(temp.path(), &["rules", "lint", "--rules", "rules.json"]);
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["rules"], 1);
    assert_eq!(report["findings"], json!([]));
}

#[test]
fn lint_reports_unknown_operator_and_fails() {
    let temp = TempDir::new().unwrap();
    let rule = dose_rule(&json!({
        "conditions": [{"field": "medication.dose_mg", "operator": "roughly", "value": 40}]
    }));
    write_json(&temp.path().join("rules.json"), &json!([rule]));
    let output = run(temp.path(), &["rules", "lint", "--rules", "rules.json"]);
    assert!(!output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["findings"][0]["kind"], "unknown_operator");
    assert_eq!(report["findings"][0]["ruleId"], "dose-limit");
}
