//! Built-in checks. Each illustrates the plugin contract: a factory turning
//! declarative configuration into a configured instance, and lifecycle hooks
//! depositing findings into a per-check collector.

pub mod ac_handling;
pub mod denied_paths;
pub mod overlaps;
pub mod subpackages;
