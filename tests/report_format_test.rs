//! Tests for the JSON report structure.
//!
//! These tests build a report over the testdata fixtures and verify the
//! serialized shape that CI consumers depend on.

use std::path::PathBuf;

use docguard::config::StyleConvention;
use docguard::coverage;
use docguard::extract;
use docguard::report::{self, JsonReport, UnitReport};
use docguard::validate;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn scan_fixtures() -> JsonReport {
    let mut inventories = Vec::new();
    let mut failures = Vec::new();
    for name in ["documented.py", "partial.py", "broken.py"] {
        let path = testdata_path().join(name);
        let source = std::fs::read_to_string(&path).expect("should read fixture");
        match extract::extract(&path, &source) {
            Ok(inv) => inventories.push(inv),
            Err(e) => failures.push(e),
        }
    }

    let snapshot = coverage::aggregate(&inventories);
    let mut reports = Vec::new();
    for inv in &inventories {
        for unit in &inv.units {
            let result = validate::validate(unit, StyleConvention::Google, false);
            if !result.is_compliant() {
                reports.push(UnitReport {
                    file: inv.path.clone(),
                    result,
                });
            }
        }
    }

    report::build_json(
        "testdata",
        "google",
        inventories.len(),
        &snapshot,
        &reports,
        &failures,
    )
}

#[test]
fn test_json_report_shape() {
    let json = scan_fixtures();

    assert_eq!(json.path, "testdata");
    assert_eq!(json.style, "google");
    assert_eq!(json.files_scanned, 2);

    // documented.py: 5/5, partial.py: 2/6; broken.py excluded entirely
    assert_eq!(json.coverage.total_units, 11);
    assert_eq!(json.coverage.documented_units, 7);

    assert_eq!(json.parse_errors.len(), 1);
    assert!(json.parse_errors[0].file.ends_with("broken.py"));

    assert!(!json.violations.is_empty());
    for v in &json.violations {
        assert!(!v.rule.is_empty());
        assert!(!v.unit.is_empty());
        assert!(v.line > 0);
    }
}

#[test]
fn test_json_report_serializes_and_parses() {
    let json = scan_fixtures();
    let text = report::render_json(&json).unwrap();

    let parsed: JsonReport = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.coverage.total_units, json.coverage.total_units);
    assert_eq!(parsed.violations.len(), json.violations.len());

    // Kind breakdown keys are stable strings
    assert!(parsed.coverage.by_kind.contains_key("function"));
    assert!(parsed.coverage.by_kind.contains_key("class"));
    assert!(parsed.coverage.by_kind.contains_key("method"));
}

#[test]
fn test_missing_doc_violations_are_errors() {
    let json = scan_fixtures();

    let missing: Vec<_> = json
        .violations
        .iter()
        .filter(|v| v.rule == "missing-doc")
        .collect();
    // undocumented, Widget, Widget.render (private helper is skipped)
    assert_eq!(missing.len(), 3);
    assert!(missing.iter().all(|v| v.severity == "error"));
}
