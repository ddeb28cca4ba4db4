//! Error types for counter operations.

use thiserror::Error;

/// Errors reported by the counter stores, the registry and the report
/// engine.
#[derive(Error, Debug)]
pub enum Error {
    /// The named counter does not exist.
    #[error("unknown counter: {0}")]
    NotFound(String),

    /// A counter with this name already exists.
    #[error("counter already exists: {0}")]
    AlreadyExists(String),

    /// Two registries being merged share a counter name.
    #[error("duplicate counter name: {0}")]
    DuplicateName(String),

    /// The requested time unit is not one of `m`, `s`, `ms`.
    #[error("invalid time unit: {0} (valid: m, s, ms)")]
    InvalidTimeUnit(String),

    /// The requested output format is not recognized.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A report could not be serialized to JSON.
    #[error("json error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for counter operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::NotFound("queries".into()).to_string(),
            "unknown counter: queries"
        );
        assert_eq!(
            Error::AlreadyExists("fetch".into()).to_string(),
            "counter already exists: fetch"
        );
        assert_eq!(
            Error::DuplicateName("requests".into()).to_string(),
            "duplicate counter name: requests"
        );
        assert_eq!(
            Error::InvalidTimeUnit("parsecs".into()).to_string(),
            "invalid time unit: parsecs (valid: m, s, ms)"
        );
        assert_eq!(
            Error::UnsupportedFormat("yaml".into()).to_string(),
            "unsupported format: yaml"
        );
    }
}
