use pakscan::core::check::CheckSpec;
use pakscan::core::driver::Scanner;
use pakscan::core::error::ScanError;
use pakscan::core::package::PackageDescriptor;
use pakscan::core::violation::{ScanReport, Severity};
use serde_json::json;

fn pkg(value: serde_json::Value) -> PackageDescriptor {
    serde_json::from_value(value).unwrap()
}

fn scan_with_config(config: serde_json::Value, packages: &[PackageDescriptor]) -> ScanReport {
    Scanner::builder()
        .check_spec(&CheckSpec::new("deniedPaths").with_config(config))
        .build()
        .unwrap()
        .scan(packages)
        .unwrap()
}

#[test]
fn test_imported_path_matching_pattern_is_flagged() {
    let report = scan_with_config(
        json!({ "denyPatterns": ["^/libs/"] }),
        &[pkg(json!({
            "id": { "group": "test", "name": "p", "version": "1.0" },
            "entries": [
                { "path": "/apps/fine" },
                { "path": "/libs/forbidden" }
            ]
        }))],
    );
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, Severity::Major);
    assert_eq!(violations[0].paths, vec!["/libs/forbidden"]);
    assert_eq!(violations[0].arguments[1], "imported");
}

#[test]
fn test_deleted_path_matching_pattern_is_flagged() {
    let report = scan_with_config(
        json!({ "denyPatterns": ["^/libs/"], "severity": "severe" }),
        &[pkg(json!({
            "id": { "group": "test", "name": "p", "version": "1.0" },
            "entries": [{ "path": "/libs/core", "action": "delete" }]
        }))],
    );
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, Severity::Severe);
    assert_eq!(violations[0].arguments[1], "deleted");
}

#[test]
fn test_no_patterns_means_no_findings() {
    let report = scan_with_config(
        serde_json::Value::Null,
        &[pkg(json!({
            "id": { "group": "test", "name": "p", "version": "1.0" },
            "entries": [{ "path": "/libs/anything" }]
        }))],
    );
    assert!(report.reports[0].violations.is_empty());
}

#[test]
fn test_invalid_regex_is_config_error() {
    let err = Scanner::builder()
        .check_spec(&CheckSpec::new("deniedPaths").with_config(json!({ "denyPatterns": ["["] })))
        .build()
        .unwrap_err();
    assert!(matches!(err, ScanError::Config(_)));
}

#[test]
fn test_invalid_severity_is_config_error() {
    let err = Scanner::builder()
        .check_spec(&CheckSpec::new("deniedPaths").with_config(json!({ "severity": "fatal" })))
        .build()
        .unwrap_err();
    assert!(matches!(err, ScanError::Config(_)));
}
