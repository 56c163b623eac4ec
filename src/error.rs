use thiserror::Error;

/// Boxed error returned by caller-supplied hooks such as [`crate::Observer`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while configuring or running a partition.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed configuration or call, detected before any clustering work.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The per-round observer reported a failure and the run was aborted.
    #[error("failed to observe round {round}: {source}")]
    ObserverFailure {
        /// Round (1-based) whose observation failed.
        round: usize,
        #[source]
        source: BoxError,
    },

    /// The worker pool for the run could not be built.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_observer_failure_keeps_source() {
        let source: BoxError = "disk full".into();
        let err = Error::ObserverFailure { round: 3, source };
        assert_eq!(err.to_string(), "failed to observe round 3: disk full");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("disk full"));
    }

    #[test]
    fn test_invalid_argument_message() {
        let err = Error::invalid("k must be greater than 0");
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(err.to_string(), "invalid argument: k must be greater than 0");
    }
}
