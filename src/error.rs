//! Error types surfaced by the simulator.
//!
//! All errors propagate out of the driver's constructor or `run()`; nothing
//! is recovered locally. The CLI prints the message and exits with code 1.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors produced while building or running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// Malformed or missing experiment/task input.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dependency cycle, self-dependency, undefined dependency, or unknown
    /// experiment name.
    #[error("validation error: {0}")]
    Validation(String),

    /// A task references a host that is not part of the experiment.
    #[error("task '{task}' references unknown host '{host}'")]
    UnknownHost { task: String, host: String },

    /// A container request exceeds the container's capacity. For tasks this
    /// means the declared RAM is larger than the host's RAM.
    #[error("requested amount {requested} exceeds capacity {capacity}")]
    InvalidAmount { requested: u64, capacity: u64 },

    /// A network link was requested for a pair that was never registered.
    #[error("no network link from '{from}' to '{to}'")]
    UnknownLink { from: String, to: String },
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::UnknownHost {
            task: "compile".to_string(),
            host: "HOST_9".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "task 'compile' references unknown host 'HOST_9'"
        );

        let err = SimError::InvalidAmount {
            requested: 2000,
            capacity: 1000,
        };
        assert!(err.to_string().contains("2000"));
        assert!(err.to_string().contains("1000"));
    }
}
