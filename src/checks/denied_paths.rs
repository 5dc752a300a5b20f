//! Reject imports and deletes touching denied repository paths.
//!
//! Config options:
//! - `denyPatterns`: list of regular expressions matched against every
//!   imported or deleted path.
//! - `severity` (default `major`): severity of reported findings.

use crate::core::check::{parse_config, CheckFactory, ProgressCheck};
use crate::core::error::ScanError;
use crate::core::facade::{InspectSession, NodeView};
use crate::core::package::{PackageId, PathAction};
use crate::core::violation::{Severity, Violation, ViolationCollector};
use regex::Regex;
use serde::Deserialize;

pub const CHECK_NAME: &str = "deniedPaths";

pub fn factory() -> Box<dyn CheckFactory> {
    Box::new(DeniedPathsFactory)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Config {
    #[serde(default)]
    deny_patterns: Vec<String>,
    #[serde(default)]
    severity: Option<Severity>,
}

struct DeniedPathsFactory;

impl CheckFactory for DeniedPathsFactory {
    fn check_name(&self) -> &'static str {
        CHECK_NAME
    }

    fn new_instance(&self, config: &serde_json::Value) -> Result<Box<dyn ProgressCheck>, ScanError> {
        let config: Config = parse_config(CHECK_NAME, config)?;
        let patterns = config
            .deny_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|err| ScanError::Config(format!("{}: {}", CHECK_NAME, err)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::new(Check {
            collector: ViolationCollector::new(),
            patterns,
            severity: config.severity.unwrap_or(Severity::Major),
        }))
    }
}

struct Check {
    collector: ViolationCollector,
    patterns: Vec<Regex>,
    severity: Severity,
}

impl Check {
    fn observe(&mut self, id: &PackageId, path: &str, verb: &str) {
        for pattern in &self.patterns {
            if pattern.is_match(path) {
                self.collector.report(
                    Violation::new(self.severity, "path {0} {1} by {2} matches denied pattern {3}")
                        .with_arg(path)
                        .with_arg(verb)
                        .with_arg(id)
                        .with_arg(pattern)
                        .with_package(id.clone())
                        .with_path(path),
                );
            }
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

    fn imported_path(
        &mut self,
        id: &PackageId,
        path: &str,
        _node: &NodeView<'_>,
        _action: PathAction,
    ) -> Result<(), ScanError> {
        self.observe(id, path, "imported");
        Ok(())
    }

    fn deleted_path(
        &mut self,
        id: &PackageId,
        path: &str,
        _session: &InspectSession<'_>,
    ) -> Result<(), ScanError> {
        self.observe(id, path, "deleted");
        Ok(())
    }
}
