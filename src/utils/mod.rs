//! Shared helpers for logging setup and environment overrides

pub mod env;
pub mod logging;

pub use env::{env_int, env_opt};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config};
