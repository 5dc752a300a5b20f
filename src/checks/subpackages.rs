//! Constrain which sub-packages and embedded packages a scanned package may
//! carry.
//!
//! Config options:
//! - `rules`: regular expressions matched against the child package id
//!   (`group:name:version`); when non-empty, a child must match at least one.
//! - `denyAll` (default false): forbid sub-packages entirely.

use crate::core::check::{parse_config, CheckFactory, ProgressCheck};
use crate::core::error::ScanError;
use crate::core::installable::Installable;
use crate::core::package::PackageId;
use crate::core::violation::{Severity, Violation, ViolationCollector};
use regex::Regex;
use serde::Deserialize;

pub const CHECK_NAME: &str = "subpackages";

pub fn factory() -> Box<dyn CheckFactory> {
    Box::new(SubpackagesFactory)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Config {
    #[serde(default)]
    rules: Vec<String>,
    #[serde(default)]
    deny_all: bool,
}

struct SubpackagesFactory;

impl CheckFactory for SubpackagesFactory {
    fn check_name(&self) -> &'static str {
        CHECK_NAME
    }

    fn new_instance(&self, config: &serde_json::Value) -> Result<Box<dyn ProgressCheck>, ScanError> {
        let config: Config = parse_config(CHECK_NAME, config)?;
        let rules = config
            .rules
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|err| ScanError::Config(format!("{}: {}", CHECK_NAME, err)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(Check {
            collector: ViolationCollector::new(),
            rules,
            deny_all: config.deny_all,
        }))
    }
}

struct Check {
    collector: ViolationCollector,
    rules: Vec<Regex>,
    deny_all: bool,
}

impl Check {
    fn observe(&mut self, child: &PackageId, parent: &PackageId) {
        if self.deny_all {
            self.collector.report(
                Violation::new(Severity::Major, "subpackage {0} included by {1} is not allowed")
                    .with_arg(child)
                    .with_arg(parent)
                    .with_package(child.clone())
                    .with_package(parent.clone()),
            );
            return;
        }
        if self.rules.is_empty() {
            return;
        }
        let child_id = child.to_string();
        if !self.rules.iter().any(|rule| rule.is_match(&child_id)) {
            self.collector.report(
                Violation::new(
                    Severity::Major,
                    "subpackage {0} included by {1} matches no allowed rule",
                )
                .with_arg(child)
                .with_arg(parent)
                .with_package(child.clone())
                .with_package(parent.clone()),
            );
        }
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
    }

    fn supports_silencing(&self) -> bool {
        true
    }

    fn set_silenced(&mut self, silenced: bool) {
        self.collector.set_silenced(silenced);
    }

    fn identify_subpackage(&mut self, child: &PackageId, parent: &PackageId) {
        self.observe(child, parent);
    }

    fn identify_embedded_package(
        &mut self,
        child: &PackageId,
        parent: &PackageId,
        _installable: &Installable,
    ) {
        // identify_subpackage already fired for archive-declared subpackages;
        // the collector's equality dedup keeps this from double reporting.
        self.observe(child, parent);
    }
}
