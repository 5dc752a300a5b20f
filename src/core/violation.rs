//! Violation model: structured findings and their aggregation into reports.
//!
//! Descriptions are kept as templates with an ordered argument list rather
//! than pre-rendered strings, so consumers can localize or re-aggregate them.

use crate::core::package::PackageId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Finding severity. The "no violation" floor is expressed as `None` in
/// worst-severity computations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Severe => "severe",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            "severe" => Ok(Severity::Severe),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Immutable record of one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub severity: Severity,
    /// Message template with `{0}`, `{1}`, ... placeholders.
    pub description: String,
    pub arguments: Vec<String>,
    pub packages: Vec<PackageId>,
    pub paths: Vec<String>,
}

impl Violation {
    pub fn new(severity: Severity, description: &str) -> Self {
        Self {
            severity,
            description: description.to_string(),
            arguments: Vec::new(),
            packages: Vec::new(),
            paths: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl fmt::Display) -> Self {
        self.arguments.push(arg.to_string());
        self
    }

    pub fn with_package(mut self, id: PackageId) -> Self {
        self.packages.push(id);
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.paths.push(path.to_string());
        self
    }

    /// Substitute template placeholders for display.
    pub fn render(&self) -> String {
        let mut rendered = self.description.clone();
        for (index, arg) in self.arguments.iter().enumerate() {
            rendered = rendered.replace(&format!("{{{}}}", index), arg);
        }
        rendered
    }
}

/// Per-check violation store.
///
/// Uniqueness by equality is enforced only within one check's own collection;
/// two checks may independently report logically identical findings.
///
/// Silencing is enforced here, at the point of storage: a finding reported
/// while silenced is discarded outright, so an identical finding reported
/// after un-silencing is not mistaken for a duplicate.
#[derive(Debug, Default)]
pub struct ViolationCollector {
    violations: Vec<Violation>,
    silenced: bool,
}

impl ViolationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, violation: Violation) {
        if self.silenced {
            return;
        }
        if !self.violations.contains(&violation) {
            self.violations.push(violation);
        }
    }

    /// Toggled by the orchestration layer through the owning check's
    /// `set_silenced`.
    pub fn set_silenced(&mut self, silenced: bool) {
        self.silenced = silenced;
    }

    /// Clear collected findings at scan start.
    pub fn reset(&mut self) {
        self.violations.clear();
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.violations.clone()
    }
}

/// Ordered violations reported by one configured check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub check_name: String,
    pub violations: Vec<Violation>,
}

impl CheckReport {
    pub fn worst_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}

/// Identity and content digest of one scanned top-level package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedPackage {
    pub id: PackageId,
    pub digest: String,
}

/// Aggregated result of one scan unit: one `CheckReport` per configured
/// check, in configuration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub run_id: String,
    pub packages: Vec<ScannedPackage>,
    pub reports: Vec<CheckReport>,
}

impl ScanReport {
    /// Worst severity across all checks, for pass/fail decisions.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.reports.iter().filter_map(CheckReport::worst_severity).max()
    }

    /// Union of all per-check violations, in report order.
    pub fn violations(&self) -> Vec<&Violation> {
        self.reports.iter().flat_map(|r| r.violations.iter()).collect()
    }
}
