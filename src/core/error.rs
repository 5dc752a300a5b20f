use crate::core::package::PackageLocation;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Check configuration error: {0}")]
    Config(String),
    #[error("Inspection session is read-only: {0}")]
    ReadOnly(String),
    #[error("Repository error: {0}")]
    Repo(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Aborted scan (failed package: {location}): {source}")]
    Aborted {
        location: PackageLocation,
        #[source]
        source: Box<ScanError>,
    },
}

impl ScanError {
    /// Attach the in-flight package identity to an error bubbling out of a
    /// lifecycle event. The innermost location wins, so a failure inside an
    /// embedded package names the embedded package, not its parent.
    pub(crate) fn abort(self, location: PackageLocation) -> ScanError {
        match self {
            aborted @ ScanError::Aborted { .. } => aborted,
            other => ScanError::Aborted {
                location,
                source: Box::new(other),
            },
        }
    }

    pub fn is_read_only(&self) -> bool {
        match self {
            ScanError::ReadOnly(_) => true,
            ScanError::Aborted { source, .. } => source.is_read_only(),
            _ => false,
        }
    }
}
