use pakscan::core::check::CheckSpec;
use pakscan::core::driver::Scanner;
use pakscan::core::error::ScanError;
use pakscan::core::package::PackageDescriptor;
use pakscan::core::violation::{ScanReport, Severity};
use serde_json::json;

fn pkg_with_mode(name: &str, mode: &str) -> PackageDescriptor {
    serde_json::from_value(json!({
        "id": { "group": "test", "name": name, "version": "1.0" },
        "properties": { "acHandling": mode },
        "entries": [{ "path": format!("/apps/{}", name) }]
    }))
    .unwrap()
}

fn scan_with_config(config: serde_json::Value, packages: &[PackageDescriptor]) -> ScanReport {
    Scanner::builder()
        .check_spec(&CheckSpec::new("acHandling").with_config(config))
        .build()
        .unwrap()
        .scan(packages)
        .unwrap()
}

#[test]
fn test_default_level_set_flags_overwrite() {
    let report = scan_with_config(serde_json::Value::Null, &[pkg_with_mode("p", "overwrite")]);
    assert_eq!(report.reports[0].violations.len(), 1);
    let violation = &report.reports[0].violations[0];
    assert_eq!(violation.severity, Severity::Major);
    assert_eq!(violation.arguments[0], "overwrite");
    assert_eq!(violation.packages[0].name, "p");
}

#[test]
fn test_default_level_set_allows_ignore() {
    let report = scan_with_config(serde_json::Value::Null, &[pkg_with_mode("p", "ignore")]);
    assert!(report.reports[0].violations.is_empty());
    assert_eq!(report.worst_severity(), None);
}

#[test]
fn test_level_set_only_ignore_flags_merge() {
    let report = scan_with_config(
        json!({ "levelSet": "only_ignore" }),
        &[pkg_with_mode("a", "merge"), pkg_with_mode("b", "ignore")],
    );
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].arguments[1], "only_ignore");
}

#[test]
fn test_level_set_no_clear_allows_overwrite() {
    let report = scan_with_config(
        json!({ "levelSet": "no_clear" }),
        &[pkg_with_mode("a", "overwrite"), pkg_with_mode("b", "clear")],
    );
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].arguments[0], "clear");
}

#[test]
fn test_explicit_allowed_modes() {
    let report = scan_with_config(
        json!({ "allowedModes": ["merge_preserve"] }),
        &[pkg_with_mode("a", "merge_preserve"), pkg_with_mode("b", "merge")],
    );
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].arguments[0], "merge");
    assert!(violations[0].description.contains("allowedModes"));
}

#[test]
fn test_unknown_level_set_is_config_error() {
    let err = Scanner::builder()
        .check_spec(&CheckSpec::new("acHandling").with_config(json!({ "levelSet": "everything" })))
        .build()
        .unwrap_err();
    assert!(matches!(err, ScanError::Config(msg) if msg.contains("everything")));
}

#[test]
fn test_unknown_mode_in_allowed_modes_is_config_error() {
    let err = Scanner::builder()
        .check_spec(&CheckSpec::new("acHandling").with_config(json!({ "allowedModes": ["destroy"] })))
        .build()
        .unwrap_err();
    assert!(matches!(err, ScanError::Config(_)));
}
