use pakscan::core::check::CheckSpec;
use pakscan::core::driver::Scanner;
use pakscan::core::error::ScanError;
use pakscan::core::package::PackageDescriptor;
use pakscan::core::violation::{ScanReport, Severity};
use serde_json::json;

fn parent_with_children(children: &[&str]) -> PackageDescriptor {
    let subpackages: Vec<serde_json::Value> = children
        .iter()
        .map(|name| {
            json!({
                "path": format!("/etc/packages/{}.zip", name),
                "package": {
                    "id": { "group": "vendor", "name": name, "version": "2.0" }
                }
            })
        })
        .collect();
    serde_json::from_value(json!({
        "id": { "group": "test", "name": "parent", "version": "1.0" },
        "subpackages": subpackages
    }))
    .unwrap()
}

fn scan_with_config(config: serde_json::Value, packages: &[PackageDescriptor]) -> ScanReport {
    Scanner::builder()
        .check_spec(&CheckSpec::new("subpackages").with_config(config))
        .build()
        .unwrap()
        .scan(packages)
        .unwrap()
}

#[test]
fn test_no_config_allows_everything() {
    let report = scan_with_config(serde_json::Value::Null, &[parent_with_children(&["anything"])]);
    assert!(report.reports[0].violations.is_empty());
}

#[test]
fn test_deny_all_flags_every_subpackage_once() {
    let report = scan_with_config(
        json!({ "denyAll": true }),
        &[parent_with_children(&["one", "two"])],
    );
    let violations = &report.reports[0].violations;
    // each child is identified both before and during installation, but the
    // collector dedupes to one finding per child
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].severity, Severity::Major);
    assert_eq!(violations[0].packages[0].name, "one");
    assert_eq!(violations[0].packages[1].name, "parent");
    assert_eq!(violations[1].packages[0].name, "two");
}

#[test]
fn test_rules_allow_matching_ids() {
    let report = scan_with_config(
        json!({ "rules": ["^vendor:"] }),
        &[parent_with_children(&["ok"])],
    );
    assert!(report.reports[0].violations.is_empty());
}

#[test]
fn test_rules_flag_unmatched_ids() {
    let report = scan_with_config(
        json!({ "rules": ["^vendor:approved:"] }),
        &[parent_with_children(&["approved", "rogue"])],
    );
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].packages[0].name, "rogue");
    assert_eq!(violations[0].arguments[0], "vendor:rogue:2.0");
}

#[test]
fn test_nested_subpackage_is_checked_against_rules() {
    let parent: PackageDescriptor = serde_json::from_value(json!({
        "id": { "group": "test", "name": "parent", "version": "1.0" },
        "subpackages": [{
            "path": "/etc/packages/mid.zip",
            "package": {
                "id": { "group": "vendor", "name": "mid", "version": "2.0" },
                "subpackages": [{
                    "path": "/etc/packages/deep.zip",
                    "package": {
                        "id": { "group": "other", "name": "deep", "version": "3.0" }
                    }
                }]
            }
        }]
    }))
    .unwrap();
    let report = scan_with_config(json!({ "rules": ["^vendor:"] }), &[parent]);
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].packages[0].name, "deep");
    assert_eq!(violations[0].packages[1].name, "mid");
}

#[test]
fn test_finding_seen_during_pre_install_resurfaces_on_scan() {
    // pre-installing the parent exposes its subpackages to the check with
    // findings silenced; scanning the same parent afterwards must still
    // report, even though the finding is identical to the silenced one
    let parent = parent_with_children(&["one"]);
    let report = Scanner::builder()
        .check_spec(&CheckSpec::new("subpackages").with_config(json!({ "denyAll": true })))
        .pre_install_package(parent.clone())
        .build()
        .unwrap()
        .scan(&[parent])
        .unwrap();
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].packages[0].name, "one");
}

#[test]
fn test_invalid_rule_pattern_is_config_error() {
    let err = Scanner::builder()
        .check_spec(&CheckSpec::new("subpackages").with_config(json!({ "rules": ["("] })))
        .build()
        .unwrap_err();
    assert!(matches!(err, ScanError::Config(_)));
}
