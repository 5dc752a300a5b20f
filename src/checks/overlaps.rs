//! Detect packages in one scan whose affected paths overlap content already
//! touched by a different package in the same scan.
//!
//! Overlap means path equality or ancestor/descendant containment between
//! the in-flight package's imported/deleted paths and paths affected by an
//! earlier package. Containment makes the rule symmetric with respect to
//! scan order: a parent path scanned after its child overlaps just as a
//! child scanned after its parent does.
//!
//! Config options:
//! - `reportAllOverlaps` (default false): report one violation per
//!   overlapping path instead of one per package.

use crate::core::check::{parse_config, CheckFactory, ProgressCheck};
use crate::core::error::ScanError;
use crate::core::facade::{InspectSession, NodeView};
use crate::core::package::{MetaInfo, PackageId, PackageProperties, PathAction};
use crate::core::violation::{Severity, Violation, ViolationCollector};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

pub const CHECK_NAME: &str = "overlaps";

pub fn factory() -> Box<dyn CheckFactory> {
    Box::new(OverlapsFactory)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Config {
    #[serde(default)]
    report_all_overlaps: bool,
}

struct OverlapsFactory;

impl CheckFactory for OverlapsFactory {
    fn check_name(&self) -> &'static str {
        CHECK_NAME
    }

    fn new_instance(&self, config: &serde_json::Value) -> Result<Box<dyn ProgressCheck>, ScanError> {
        let config: Config = parse_config(CHECK_NAME, config)?;
        Ok(Box::new(Check {
            collector: ViolationCollector::new(),
            report_all_overlaps: config.report_all_overlaps,
            affected: BTreeMap::new(),
            in_flight: BTreeMap::new(),
        }))
    }
}

fn paths_overlap(a: &str, b: &str) -> bool {
    a == b || a.starts_with(&format!("{}/", b)) || b.starts_with(&format!("{}/", a))
}

struct Check {
    collector: ViolationCollector,
    report_all_overlaps: bool,
    /// path -> packages that affected it, for all fully extracted packages
    affected: BTreeMap<String, BTreeSet<PackageId>>,
    /// paths touched so far by packages currently mid-extraction
    in_flight: BTreeMap<PackageId, BTreeSet<String>>,
}

impl Check {
    /// Earlier packages whose affected paths overlap `path`.
    fn overlapping_owners(&self, id: &PackageId, path: &str) -> BTreeSet<PackageId> {
        self.affected
            .iter()
            .filter(|(affected_path, _)| paths_overlap(path, affected_path))
            .flat_map(|(_, owners)| owners.iter())
            .filter(|owner| *owner != id)
            .cloned()
            .collect()
    }

    fn observe(&mut self, id: &PackageId, path: &str) {
        if self.report_all_overlaps {
            let owners = self.overlapping_owners(id, path);
            if !owners.is_empty() {
                let mut violation = Violation::new(
                    Severity::Major,
                    "path {0} imported by {1} overlaps content affected by {2}",
                )
                .with_arg(path)
                .with_arg(id)
                .with_arg(owners.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
                .with_package(id.clone())
                .with_path(path);
                for owner in owners {
                    violation = violation.with_package(owner);
                }
                self.collector.report(violation);
            }
        }
        self.in_flight.entry(id.clone()).or_default().insert(path.to_string());
    }
}

impl ProgressCheck for Check {
    fn check_name(&self) -> &str {
        CHECK_NAME
    }

    fn reported_violations(&self) -> Vec<Violation> {
        self.collector.violations()
    }

    fn started_scan(&mut self) {
        self.collector.reset();
        self.affected.clear();
        self.in_flight.clear();
    }

    fn supports_silencing(&self) -> bool {
        true
    }

    fn set_silenced(&mut self, silenced: bool) {
        self.collector.set_silenced(silenced);
    }

    fn before_extract(
        &mut self,
        id: &PackageId,
        _session: &InspectSession<'_>,
        _properties: &PackageProperties,
        _meta: &MetaInfo,
        _subpackages: &[PackageId],
    ) -> Result<(), ScanError> {
        self.in_flight.insert(id.clone(), BTreeSet::new());
        Ok(())
    }

    fn imported_path(
        &mut self,
        id: &PackageId,
        path: &str,
        _node: &NodeView<'_>,
        _action: PathAction,
    ) -> Result<(), ScanError> {
        self.observe(id, path);
        Ok(())
    }

    fn deleted_path(
        &mut self,
        id: &PackageId,
        path: &str,
        _session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        self.observe(id, path);
        Ok(())
    }

    fn after_extract(&mut self, id: &PackageId, _session: &InspectSession<'_>) -> Result<(), ScanError> {
        let Some(paths) = self.in_flight.remove(id) else {
            return Ok(());
        };
        if !self.report_all_overlaps {
            let mut owners = BTreeSet::new();
            let mut overlapping_paths = BTreeSet::new();
            for path in &paths {
                let found = self.overlapping_owners(id, path);
                if !found.is_empty() {
                    overlapping_paths.insert(path.clone());
                    owners.extend(found);
                }
            }
            if !owners.is_empty() {
                let mut violation = Violation::new(
                    Severity::Major,
                    "package {0} overlaps content affected by {1}",
                )
                .with_arg(id)
                .with_arg(owners.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
                .with_package(id.clone());
                for owner in owners {
                    violation = violation.with_package(owner);
                }
                for path in overlapping_paths {
                    violation = violation.with_path(&path);
                }
                self.collector.report(violation);
            }
        }
        for path in paths {
            self.affected.entry(path).or_default().insert(id.clone());
        }
        Ok(())
    }
}
