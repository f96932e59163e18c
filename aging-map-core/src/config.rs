use std::time::Duration;

use crate::error::AgingMapError;

/// Environment variable holding the TTL in (fractional) seconds
pub const TTL_ENV_VAR: &str = "AGING_MAP_TTL_SECS";

/// Environment variable holding the sweep interval in (fractional) seconds
pub const SWEEP_INTERVAL_ENV_VAR: &str = "AGING_MAP_SWEEP_INTERVAL_SECS";

/// Configuration for an [`AgingMap`](crate::AgingMap)
///
/// # Example
///
/// ```rust
/// use aging_map_core::AgingMapConfig;
/// use std::time::Duration;
///
/// let config = AgingMapConfig::default()
///     .with_ttl(Duration::from_secs(5))
///     .with_sweep_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgingMapConfig {
    /// Time-to-live applied to every entry (default: 60 seconds)
    pub ttl: Duration,
    /// Interval between background sweeps; `None` disables the sweeper (default)
    pub sweep_interval: Option<Duration>,
}

impl Default for AgingMapConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            sweep_interval: None,
        }
    }
}

impl AgingMapConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL applied to every entry
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enables a background sweep that purges expired entries every `interval`
    ///
    /// The sweep only bounds memory held by keys that are never read again;
    /// reads stay correct without it.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Create a configuration from environment variables.
    ///
    /// Reads:
    /// - `AGING_MAP_TTL_SECS` - TTL in seconds, fractions allowed (defaults to 60)
    /// - `AGING_MAP_SWEEP_INTERVAL_SECS` - Sweep interval in seconds (unset disables sweeping)
    pub fn from_env() -> Result<Self, AgingMapError> {
        Self::from_vars(
            std::env::var(TTL_ENV_VAR).ok().as_deref(),
            std::env::var(SWEEP_INTERVAL_ENV_VAR).ok().as_deref(),
        )
    }

    fn from_vars(ttl: Option<&str>, sweep_interval: Option<&str>) -> Result<Self, AgingMapError> {
        let mut config = Self::default();

        if let Some(raw) = ttl {
            config.ttl = ttl_from_secs(parse_secs(TTL_ENV_VAR, raw)?)?;
        }

        if let Some(raw) = sweep_interval {
            let secs = parse_secs(SWEEP_INTERVAL_ENV_VAR, raw)?;
            let interval = Duration::try_from_secs_f64(secs).map_err(|_| AgingMapError::InvalidEnv {
                var: SWEEP_INTERVAL_ENV_VAR,
                value: raw.to_string(),
            })?;
            config.sweep_interval = Some(interval);
        }

        Ok(config)
    }

    /// Checks settings that can only be rejected at construction time
    pub(crate) fn validate(&self) -> Result<(), AgingMapError> {
        match self.sweep_interval {
            Some(interval) if interval.is_zero() => Err(AgingMapError::InvalidSweepInterval),
            _ => Ok(()),
        }
    }
}

/// Converts a TTL in seconds, rejecting negative, NaN and overflowing values
pub(crate) fn ttl_from_secs(seconds: f64) -> Result<Duration, AgingMapError> {
    Duration::try_from_secs_f64(seconds).map_err(|_| AgingMapError::InvalidTtl { seconds })
}

fn parse_secs(var: &'static str, raw: &str) -> Result<f64, AgingMapError> {
    raw.trim().parse::<f64>().map_err(|_| AgingMapError::InvalidEnv {
        var,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgingMapConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.sweep_interval, None);
    }

    #[test]
    fn test_builder_pattern_chaining() {
        let config = AgingMapConfig::new()
            .with_ttl(Duration::from_millis(500))
            .with_sweep_interval(Duration::from_secs(120));
        assert_eq!(config.ttl, Duration::from_millis(500));
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_from_vars_unset_uses_defaults() {
        let config = AgingMapConfig::from_vars(None, None).unwrap();
        assert_eq!(config, AgingMapConfig::default());
    }

    #[test]
    fn test_from_vars_parses_fractional_seconds() {
        let config = AgingMapConfig::from_vars(Some("1.5"), Some(" 0.25 ")).unwrap();
        assert_eq!(config.ttl, Duration::from_millis(1500));
        assert_eq!(config.sweep_interval, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_from_vars_rejects_negative_ttl() {
        let err = AgingMapConfig::from_vars(Some("-2"), None).unwrap_err();
        assert_eq!(err, AgingMapError::InvalidTtl { seconds: -2.0 });
    }

    #[test]
    fn test_from_vars_rejects_garbage() {
        let err = AgingMapConfig::from_vars(Some("soon"), None).unwrap_err();
        assert_eq!(
            err,
            AgingMapError::InvalidEnv {
                var: TTL_ENV_VAR,
                value: "soon".to_string(),
            }
        );

        let err = AgingMapConfig::from_vars(None, Some("-1")).unwrap_err();
        assert!(matches!(err, AgingMapError::InvalidEnv { var, .. } if var == SWEEP_INTERVAL_ENV_VAR));
    }

    #[test]
    fn test_validate_rejects_zero_sweep_interval() {
        let config = AgingMapConfig::new().with_sweep_interval(Duration::ZERO);
        assert_eq!(config.validate(), Err(AgingMapError::InvalidSweepInterval));
        assert_eq!(AgingMapConfig::new().validate(), Ok(()));
    }

    #[test]
    fn test_ttl_from_secs() {
        assert_eq!(ttl_from_secs(0.0), Ok(Duration::ZERO));
        assert_eq!(ttl_from_secs(2.0), Ok(Duration::from_secs(2)));
        assert!(ttl_from_secs(-0.1).unwrap_err().is_invalid_ttl());
        assert!(ttl_from_secs(f64::NAN).is_err());
        assert!(ttl_from_secs(f64::INFINITY).is_err());
    }
}
