//! Error types for constructing an aging map.

use thiserror::Error;

/// Errors raised while building an [`AgingMap`](crate::AgingMap) or its configuration.
///
/// Reads and writes on a constructed map never fail; every variant here is
/// reported before a map exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgingMapError {
    /// The TTL was negative, NaN, or too large to represent as a `Duration`
    #[error("invalid TTL: {seconds} seconds")]
    InvalidTtl {
        /// The rejected value in seconds
        seconds: f64,
    },

    /// A periodic sweep was requested with a zero interval
    #[error("sweep interval must be greater than zero")]
    InvalidSweepInterval,

    /// A periodic sweep was requested outside of a Tokio runtime
    #[error("periodic sweep requires a Tokio runtime")]
    NoRuntime,

    /// An environment variable held an unparseable value
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Name of the environment variable
        var: &'static str,
        /// The raw value that failed to parse
        value: String,
    },
}

impl AgingMapError {
    /// Returns `true` if this error rejected a TTL value.
    pub fn is_invalid_ttl(&self) -> bool {
        matches!(self, AgingMapError::InvalidTtl { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AgingMapError::InvalidTtl { seconds: -1.5 };
        assert_eq!(err.to_string(), "invalid TTL: -1.5 seconds");

        let err = AgingMapError::InvalidEnv {
            var: "AGING_MAP_TTL_SECS",
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value \"abc\" for AGING_MAP_TTL_SECS");
    }

    #[test]
    fn test_is_invalid_ttl() {
        assert!(AgingMapError::InvalidTtl { seconds: -1.0 }.is_invalid_ttl());
        assert!(!AgingMapError::NoRuntime.is_invalid_ttl());
    }
}
