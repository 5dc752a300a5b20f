//! Core modules of the scan engine: the installation state machine, the
//! check plugin protocol, and the shared data model.

pub mod check;
pub mod driver;
pub mod engine;
pub mod error;
pub mod facade;
pub mod installable;
pub mod output;
pub mod package;
pub mod registry;
pub mod repo;
pub mod violation;
