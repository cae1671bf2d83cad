use thiserror::Error;

/// Input-malformation failures. All of them are recoverable: the offending
/// appointment is skipped, the run continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid GPS coordinates '{0}'")]
    InvalidGps(String),

    #[error("appointment {0} has no pinned resource")]
    MissingPinnedResource(i64),
}
