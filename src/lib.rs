//! Pakscan: content package validation by simulated installation.
//!
//! Pakscan validates hierarchical content packages before deployment by
//! installing them into an ephemeral, in-memory repository and running a
//! pluggable set of policy checks against every state transition the
//! simulated install produces. Dangerous or non-conforming package contents
//! (unsafe permission overwrites, colliding sub-packages, disallowed paths)
//! are caught without touching a real target system.
//!
//! # Architecture
//!
//! - **Report driver** ([`core::driver::Scanner`]): wires packages, configured
//!   checks, and repository bootstrap options into one scan.
//! - **Scan engine** ([`core::engine`]): the ordered installation state
//!   machine, including recursive sub-package extraction and the deferred
//!   installable queue.
//! - **Check protocol** ([`core::check::ProgressCheck`]): the lifecycle
//!   contract every validator implements, plus alias/silencing decorators
//!   composed at configuration time.
//! - **Read-only facades** ([`core::facade`]): checks inspect the repository
//!   through wrappers that reject every mutation; only the engine writes.
//! - **Built-in checks** ([`checks`]): acHandling, overlaps, deniedPaths,
//!   subpackages.
//!
//! Execution is single-threaded and deterministic: identical package inputs
//! and check configuration always produce identical reports.
//!
//! # Example
//!
//! ```no_run
//! use pakscan::core::check::CheckSpec;
//! use pakscan::core::driver::Scanner;
//! use pakscan::core::package::{PackageDescriptor, PackageId};
//!
//! let scanner = Scanner::builder()
//!     .check_spec(&CheckSpec::new("acHandling"))
//!     .build()
//!     .unwrap();
//! let package = PackageDescriptor::new(PackageId::new("com.example", "site", "1.0"));
//! let report = scanner.scan(&[package]).unwrap();
//! assert!(report.worst_severity().is_none());
//! ```

pub mod checks;
pub mod core;

use crate::core::check::CheckSpec;
use crate::core::driver::Scanner;
use crate::core::error::ScanError;
use crate::core::output;
use crate::core::package::PackageDescriptor;
use crate::core::registry::BUILTIN_CHECKS;
use crate::core::violation::Severity;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Scan plan consumed by the CLI: checks to configure, package descriptor
/// files to scan, and repository bootstrap options.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScanPlan {
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    #[serde(default)]
    pub packages: Vec<PathBuf>,
    #[serde(default)]
    pub initial_paths: Vec<String>,
    #[serde(default)]
    pub pre_install_packages: Vec<PathBuf>,
}

pub fn load_plan(path: &Path) -> Result<ScanPlan, ScanError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a package descriptor, recording the file it came from so abort
/// messages and reports can point back at the artifact.
pub fn load_descriptor(path: &Path) -> Result<PackageDescriptor, ScanError> {
    let content = std::fs::read_to_string(path)?;
    let mut desc: PackageDescriptor = serde_json::from_str(&content)?;
    if desc.file.is_none() {
        desc.file = Some(path.to_path_buf());
    }
    Ok(desc)
}

#[derive(Parser, Debug)]
#[clap(
    name = "pakscan",
    version = env!("CARGO_PKG_VERSION"),
    about = "Validate content packages by simulating their installation and running policy checks"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan packages according to a plan file.
    Scan {
        /// Path to the JSON scan plan.
        #[clap(long)]
        plan: PathBuf,
        /// Additional package descriptor files, scanned after the plan's.
        packages: Vec<PathBuf>,
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
        /// Exit non-zero when the worst severity reaches this level.
        #[clap(long, default_value = "major")]
        fail_on: Severity,
    },
    /// List the built-in checks.
    Checks,
}

fn build_scanner(plan: &ScanPlan) -> Result<Scanner, ScanError> {
    let mut builder = Scanner::builder();
    for spec in &plan.checks {
        builder = builder.check_spec(spec);
    }
    for path in &plan.initial_paths {
        builder = builder.initial_path(path);
    }
    for file in &plan.pre_install_packages {
        builder = builder.pre_install_package(load_descriptor(file)?);
    }
    builder.build()
}

/// CLI entry point. Exit codes: 0 clean, 1 findings at or above the
/// threshold, 2 aborted scan.
pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Checks => {
            for entry in BUILTIN_CHECKS {
                println!("{}", entry.name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Scan { plan, packages, format, fail_on } => {
            let plan = load_plan(&plan)?;
            let mut descriptors = Vec::new();
            for file in plan.packages.iter().chain(packages.iter()) {
                descriptors.push(load_descriptor(file)?);
            }
            let scanner = build_scanner(&plan)?;
            let (report, aborted) = match scanner.scan(&descriptors) {
                Ok(report) => (report, None),
                Err(aborted) => {
                    let cause = aborted.to_string();
                    (aborted.report.clone(), Some(cause))
                }
            };
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::render_report(&report));
            }
            if let Some(cause) = aborted {
                eprintln!("{}", cause);
                return Ok(ExitCode::from(2));
            }
            if report.worst_severity().is_some_and(|worst| worst >= fail_on) {
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
