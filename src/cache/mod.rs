//! # TTL Caches
//!
//! Generic, thread-safe key/value caches keyed by `String`, in a fixed-TTL and
//! a variable-TTL flavour, plus the [`CacheRegistry`] that creates them and
//! releases them all at process shutdown.
//!
//! ```rust,ignore
//! use sfk::cache::CacheRegistry;
//! use std::time::Duration;
//!
//! let registry = CacheRegistry::new();
//! let tokens = registry.create::<String>(1, Duration::from_secs(59 * 60));
//! let values = registry.create_variable::<String>(20);
//!
//! tokens.insert("FetchSecretToken", token).await;
//! values.insert("prod-pprof-token", value, Duration::from_secs(6 * 3600)).await;
//!
//! // at shutdown
//! registry.close_all();
//! ```

pub mod registry;
pub mod ttl;

pub use registry::CacheRegistry;
pub use ttl::{TtlCache, VariableTtlCache};
