//! Report driver: wires packages, configured checks, and repository
//! bootstrap options into a single scan and aggregates the result.
//!
//! Configuration errors surface at build time, before any repository exists.
//! Each `Scanner` owns its checks and is consumed by one scan; the repository
//! is created fresh inside `scan` and torn down on every exit path, so state
//! never leaks across driver invocations.

use crate::core::check::{AliasFacade, CheckSpec, ProgressCheck};
use crate::core::engine::ScanEngine;
use crate::core::error::ScanError;
use crate::core::package::{PackageDescriptor, PackageLocation};
use crate::core::registry;
use crate::core::repo::Repository;
use crate::core::violation::{ScanReport, ScannedPackage};
use std::fmt;
use thiserror::Error;
use ulid::Ulid;

/// A scan that terminated early. Carries the identity of the in-flight
/// package and the cause, plus every violation collected before the abort.
#[derive(Error, Debug)]
#[error("Scan aborted (failed package: {location}): {source}")]
pub struct ScanAborted {
    pub location: PackageLocation,
    #[source]
    pub source: Box<ScanError>,
    pub report: ScanReport,
}

#[derive(Default)]
pub struct ScannerBuilder {
    checks: Vec<Box<dyn ProgressCheck>>,
    initial_paths: Vec<String>,
    pre_install: Vec<PackageDescriptor>,
    config_error: Option<ScanError>,
}

impl ScannerBuilder {
    /// Resolve a declarative check spec against the built-in registry and
    /// configure an instance. Unknown names and malformed configuration are
    /// detected here and fail `build`.
    pub fn check_spec(mut self, spec: &CheckSpec) -> Self {
        if self.config_error.is_some() || spec.skip {
            return self;
        }
        match registry::factory_for(&spec.name) {
            Some(factory) => match factory.new_instance(&spec.config) {
                Ok(check) => {
                    self.checks.push(Box::new(AliasFacade::new(check, spec.alias.clone())));
                }
                Err(err) => self.config_error = Some(err),
            },
            None => {
                self.config_error =
                    Some(ScanError::Config(format!("unknown check: {}", spec.name)));
            }
        }
        self
    }

    /// Add a pre-built check instance. It is still wrapped for aliasing and
    /// silencing support, so the engine can treat all checks uniformly.
    pub fn check(mut self, check: Box<dyn ProgressCheck>) -> Self {
        self.checks.push(Box::new(AliasFacade::new(check, None)));
        self
    }

    /// Same as `check`, with a report-name override.
    pub fn aliased_check(mut self, check: Box<dyn ProgressCheck>, alias: &str) -> Self {
        self.checks.push(Box::new(AliasFacade::new(check, Some(alias.to_string()))));
        self
    }

    /// Force creation of a repository path before the scan.
    pub fn initial_path(mut self, path: &str) -> Self {
        self.initial_paths.push(path.to_string());
        self
    }

    /// Extract a package before the scan proper. Checks observe the
    /// extraction silenced: no findings are recorded for it.
    pub fn pre_install_package(mut self, desc: PackageDescriptor) -> Self {
        self.pre_install.push(desc);
        self
    }

    pub fn build(self) -> Result<Scanner, ScanError> {
        if let Some(err) = self.config_error {
            return Err(err);
        }
        Ok(Scanner {
            checks: self.checks,
            initial_paths: self.initial_paths,
            pre_install: self.pre_install,
        })
    }
}

pub struct Scanner {
    checks: Vec<Box<dyn ProgressCheck>>,
    initial_paths: Vec<String>,
    pre_install: Vec<PackageDescriptor>,
}

// checks are trait objects, so render their names instead of deriving
impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("checks", &self.checks.iter().map(|c| c.check_name()).collect::<Vec<_>>())
            .field("initial_paths", &self.initial_paths)
            .field("pre_install", &self.pre_install.iter().map(|d| &d.id).collect::<Vec<_>>())
            .finish()
    }
}

impl Scanner {
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::default()
    }

    /// Run one scan unit over the given packages.
    ///
    /// Consumes the scanner: check instances are stateful and live for
    /// exactly one scan, and the repository built here is never reused.
    pub fn scan(self, packages: &[PackageDescriptor]) -> Result<ScanReport, Box<ScanAborted>> {
        let run_id = Ulid::new().to_string();
        let scanned: Vec<ScannedPackage> = packages
            .iter()
            .map(|desc| ScannedPackage { id: desc.id.clone(), digest: desc.digest() })
            .collect();

        let mut repo = Repository::new();
        let mut bootstrap_result = Ok(());
        for path in &self.initial_paths {
            if let Err(err) = repo.ensure_path(path, "nt:unstructured") {
                bootstrap_result = Err(err);
                break;
            }
        }

        let mut engine = ScanEngine::new(repo, self.checks);
        let result = bootstrap_result.and_then(|()| engine.run(&self.pre_install, packages));
        let report = ScanReport { run_id, packages: scanned, reports: engine.into_reports() };

        match result {
            Ok(()) => Ok(report),
            Err(ScanError::Aborted { location, source }) => {
                Err(Box::new(ScanAborted { location, source, report }))
            }
            Err(other) => Err(Box::new(ScanAborted {
                location: PackageLocation::Unknown,
                source: Box::new(other),
                report,
            })),
        }
    }
}
