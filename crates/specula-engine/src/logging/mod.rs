//! Logging utilities.
//!
//! Centralizes logger initialization. Intentionally small: the engine logs
//! through the standard `log` facade and does not impose a backend beyond
//! the `env_logger` default installed here.

mod init;

pub use init::{LoggingConfig, init_logging};
