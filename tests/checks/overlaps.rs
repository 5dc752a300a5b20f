use pakscan::core::check::CheckSpec;
use pakscan::core::driver::Scanner;
use pakscan::core::package::PackageDescriptor;
use pakscan::core::violation::ScanReport;
use serde_json::json;

fn pkg(name: &str, paths: &[&str]) -> PackageDescriptor {
    let entries: Vec<serde_json::Value> = paths.iter().map(|p| json!({ "path": p })).collect();
    serde_json::from_value(json!({
        "id": { "group": "test", "name": name, "version": "1.0" },
        "entries": entries
    }))
    .unwrap()
}

fn scan(packages: &[PackageDescriptor]) -> ScanReport {
    Scanner::builder()
        .check_spec(&CheckSpec::new("overlaps"))
        .build()
        .unwrap()
        .scan(packages)
        .unwrap()
}

#[test]
fn test_disjoint_packages_have_no_overlap() {
    let report = scan(&[pkg("test_a", &["/tmp/a"]), pkg("test_b", &["/tmp/b"])]);
    assert!(report.reports[0].violations.is_empty());
}

#[test]
fn test_overlap_chain_in_forward_order() {
    let report = scan(&[
        pkg("foo", &["/tmp/foo"]),
        pkg("foo_bar", &["/tmp/foo/bar"]),
        pkg("foo_bar_test", &["/tmp/foo/bar/test"]),
    ]);
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 2);
    // each later package overlaps content of the earlier ones
    assert_eq!(violations[0].packages[0].name, "foo_bar");
    assert_eq!(violations[1].packages[0].name, "foo_bar_test");
}

#[test]
fn test_overlap_chain_is_symmetric_in_reverse_order() {
    let report = scan(&[
        pkg("foo_bar_test", &["/tmp/foo/bar/test"]),
        pkg("foo_bar", &["/tmp/foo/bar"]),
        pkg("foo", &["/tmp/foo"]),
    ]);
    assert_eq!(report.reports[0].violations.len(), 2);
}

#[test]
fn test_sibling_paths_do_not_overlap() {
    // path prefix without a segment boundary is not containment
    let report = scan(&[pkg("foo", &["/tmp/foo"]), pkg("foobar", &["/tmp/foobar"])]);
    assert!(report.reports[0].violations.is_empty());
}

#[test]
fn test_deleted_paths_count_as_affected() {
    let eraser: PackageDescriptor = serde_json::from_value(json!({
        "id": { "group": "test", "name": "eraser", "version": "1.0" },
        "entries": [{ "path": "/tmp/foo", "action": "delete" }]
    }))
    .unwrap();
    let report = scan(&[pkg("foo", &["/tmp/foo"]), eraser]);
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].packages[0].name, "eraser");
}

#[test]
fn test_report_all_overlaps_yields_one_per_path() {
    let report = Scanner::builder()
        .check_spec(
            &CheckSpec::new("overlaps").with_config(json!({ "reportAllOverlaps": true })),
        )
        .build()
        .unwrap()
        .scan(&[
            pkg("base", &["/tmp/x", "/tmp/y"]),
            pkg("both", &["/tmp/x/a", "/tmp/y/b"]),
        ])
        .unwrap();
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].paths, vec!["/tmp/x/a"]);
    assert_eq!(violations[1].paths, vec!["/tmp/y/b"]);
}

#[test]
fn test_embedded_package_overlapping_parent_is_flagged() {
    let parent: PackageDescriptor = serde_json::from_value(json!({
        "id": { "group": "test", "name": "parent", "version": "1.0" },
        "entries": [{ "path": "/apps/shared" }],
        "subpackages": [{
            "path": "/etc/packages/child.zip",
            "package": {
                "id": { "group": "test", "name": "child", "version": "1.0" },
                "entries": [{ "path": "/apps/shared/child" }]
            }
        }]
    }))
    .unwrap();
    let report = scan(&[parent]);
    let violations = &report.reports[0].violations;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].packages[0].name, "child");
}
