//! Error types for snapshot output.

use thiserror::Error;

/// Error raised while writing a statistics snapshot to a sink.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The snapshot could not be rendered as JSON.
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The rendered snapshot could not be written out.
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_error_names_the_cause() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StatsError::from(cause);
        assert!(err.to_string().starts_with("failed to serialize snapshot:"));
    }

    #[test]
    fn io_error_names_the_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed");
        let err = StatsError::from(cause);
        assert_eq!(err.to_string(), "failed to write snapshot: sink closed");
    }
}
