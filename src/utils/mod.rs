//! Utility modules: error types and logging.

pub mod error;
pub mod logging;

pub use error::{DomainPairError, Result};
pub use logging::{init_default_logging, init_logging, LogConfig, LogLevel};
