use thiserror::Error;

/// Errors reported synchronously by configuration and entity admission.
///
/// Nothing here is raised mid-run: a tick on a finished simulation is the
/// informational [`TickOutcome::AlreadyComplete`](crate::TickOutcome), not an error.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("invalid entity: {0}")]
    InvalidEntity(#[from] EntityError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one execution unit is required")]
    NoExecutionUnits,
    #[error("round-robin quantum must be at least one tick")]
    ZeroQuantum,
    #[error("unrecognized scheduling policy `{0}`")]
    UnknownPolicy(String),
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    #[error("service time must be at least one tick")]
    ZeroServiceTime,
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
