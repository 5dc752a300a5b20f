//! Built-in check registry.
//!
//! Adding a new built-in check: append one entry to `BUILTIN_CHECKS`.

use crate::core::check::CheckFactory;
use crate::checks::{ac_handling, denied_paths, overlaps, subpackages};

pub struct BuiltinCheck {
    pub name: &'static str,
    pub factory: fn() -> Box<dyn CheckFactory>,
}

/// All check factories resolvable by name from a scan plan.
pub const BUILTIN_CHECKS: &[BuiltinCheck] = &[
    BuiltinCheck { name: ac_handling::CHECK_NAME, factory: ac_handling::factory },
    BuiltinCheck { name: overlaps::CHECK_NAME, factory: overlaps::factory },
    BuiltinCheck { name: denied_paths::CHECK_NAME, factory: denied_paths::factory },
    BuiltinCheck { name: subpackages::CHECK_NAME, factory: subpackages::factory },
];

pub fn factory_for(name: &str) -> Option<Box<dyn CheckFactory>> {
    BUILTIN_CHECKS.iter().find(|entry| entry.name == name).map(|entry| (entry.factory)())
}
