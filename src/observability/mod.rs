//! # Observability
//!
//! Structured logging for the sfk services.

pub mod logging;

pub use logging::{init_logging, log_config_info, root_span};
