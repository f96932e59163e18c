//! # Aging Map Core
//!
//! A concurrent in-memory map whose entries expire a fixed time after they
//! were written.
//!
//! ## Features
//!
//! - Thread-safe storage using `DashMap`
//! - One TTL for the whole map, stamped on every `set`
//! - Automatic expiration on read (lazy cleanup); an expired entry is never returned
//! - Optional background sweep on a Tokio runtime
//! - Pluggable clock for deterministic tests
//!
//! ## Example
//!
//! ```rust
//! use aging_map_core::{AgingMap, AgingMapConfig};
//! use std::time::Duration;
//!
//! // Correlate completions with the requests that started them
//! let pending: AgingMap<u64, String> = AgingMap::new(Duration::from_secs(30));
//!
//! pending.set(42, "upload".to_string());
//! assert_eq!(pending.get(&42), Some("upload".to_string()));
//!
//! pending.remove(&42);
//! assert!(pending.is_empty());
//!
//! // Negative TTLs are rejected up front
//! assert!(AgingMap::<u64, String>::try_from_secs_f64(-1.0).is_err());
//!
//! // Configuration without a sweep needs no runtime
//! let config = AgingMapConfig::default().with_ttl(Duration::from_secs(5));
//! let map: AgingMap<String, u32> = AgingMap::with_config(config).unwrap();
//! ```

mod clock;
mod config;
mod entry;
mod error;
mod map;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AgingMapConfig, SWEEP_INTERVAL_ENV_VAR, TTL_ENV_VAR};
pub use error::AgingMapError;
pub use map::AgingMap;
