//! Limit the `acHandling` mode a package may declare, preventing unforeseen
//! permission changes on installation.
//!
//! Config options:
//! - `allowedModes`: explicit list of allowed modes.
//! - `levelSet`: one of `no_clear`, `no_unsafe`, `only_add`, `only_ignore`
//!   (default `no_unsafe`), each an incrementally narrower allowed set.

use crate::core::check::{parse_config, CheckFactory, ProgressCheck};
use crate::core::error::ScanError;
use crate::core::facade::InspectSession;
use crate::core::package::{AcHandling, MetaInfo, PackageId, PackageProperties};
use crate::core::violation::{Severity, Violation, ViolationCollector};
use serde::Deserialize;

pub const CHECK_NAME: &str = "acHandling";

pub fn factory() -> Box<dyn CheckFactory> {
    Box::new(AcHandlingFactory)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelSet {
    /// Explicit enumeration via `allowedModes`.
    Explicit,
    /// Everything but `clear`.
    NoClear,
    /// Prevent blindly destructive modes (default).
    NoUnsafe,
    /// Only additive ACE changes.
    OnlyAdd,
    /// No ACL changes at all.
    OnlyIgnore,
}

impl LevelSet {
    fn allowed_modes(self) -> &'static [AcHandling] {
        match self {
            LevelSet::Explicit => &[],
            LevelSet::NoClear => &[
                AcHandling::Overwrite,
                AcHandling::Merge,
                AcHandling::MergePreserve,
                AcHandling::Ignore,
            ],
            LevelSet::NoUnsafe => {
                &[AcHandling::Merge, AcHandling::MergePreserve, AcHandling::Ignore]
            }
            LevelSet::OnlyAdd => &[AcHandling::MergePreserve, AcHandling::Ignore],
            LevelSet::OnlyIgnore => &[AcHandling::Ignore],
        }
    }

    fn label(self) -> &'static str {
        match self {
            LevelSet::Explicit => "explicit",
            LevelSet::NoClear => "no_clear",
            LevelSet::NoUnsafe => "no_unsafe",
            LevelSet::OnlyAdd => "only_add",
            LevelSet::OnlyIgnore => "only_ignore",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Config {
    #[serde(default)]
    allowed_modes: Option<Vec<String>>,
    #[serde(default)]
    level_set: Option<String>,
}

struct AcHandlingFactory;

impl CheckFactory for AcHandlingFactory {
    fn check_name(&self) -> &'static str {
        CHECK_NAME
    }

    fn new_instance(&self, config: &serde_json::Value) -> Result<Box<dyn ProgressCheck>, ScanError> {
        let config: Config = parse_config(CHECK_NAME, config)?;
        if let Some(modes) = config.allowed_modes {
            let allowed = modes
                .iter()
                .map(|mode| mode.parse::<AcHandling>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| ScanError::Config(format!("{}: {}", CHECK_NAME, err)))?;
            return Ok(Box::new(Check::new(LevelSet::Explicit, allowed)));
        }
        let level_set = match config.level_set.as_deref() {
            None => LevelSet::NoUnsafe,
            Some("no_clear") => LevelSet::NoClear,
            Some("no_unsafe") => LevelSet::NoUnsafe,
            Some("only_add") => LevelSet::OnlyAdd,
            Some("only_ignore") => LevelSet::OnlyIgnore,
            Some(other) => {
                return Err(ScanError::Config(format!("{}: unknown levelSet: {}", CHECK_NAME, other)));
            }
        };
        Ok(Box::new(Check::new(level_set, Vec::new())))
    }
}

struct Check {
    collector: ViolationCollector,
    level_set: LevelSet,
    allowed_modes: Vec<AcHandling>,
}

impl Check {
    fn new(level_set: LevelSet, allowed_modes: Vec<AcHandling>) -> Self {
        Self { collector: ViolationCollector::new(), level_set, allowed_modes }
    }

    fn allowed(&self) -> &[AcHandling] {
        if self.level_set == LevelSet::Explicit {
            &self.allowed_modes
        } else {
            self.level_set.allowed_modes()
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

    fn before_extract(
        &mut self,
        id: &PackageId,
        _session: &InspectSession<'_>,
        properties: &PackageProperties,
        _meta: &MetaInfo,
        _subpackages: &[PackageId],
    ) -> Result<(), ScanError> {
        let mode = properties.ac_handling;
        if self.allowed().contains(&mode) {
            return Ok(());
        }
        let allowed = self
            .allowed()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let violation = if self.level_set == LevelSet::Explicit {
            Violation::new(
                Severity::Major,
                "acHandling mode {0} is forbidden. acHandling values in allowedModes are {1}",
            )
            .with_arg(mode)
            .with_arg(allowed)
        } else {
            Violation::new(
                Severity::Major,
                "acHandling mode {0} is forbidden. allowed acHandling values in levelSet:{1} are {2}",
            )
            .with_arg(mode)
            .with_arg(self.level_set.label())
            .with_arg(allowed)
        };
        self.collector.report(violation.with_package(id.clone()));
        Ok(())
    }
}
