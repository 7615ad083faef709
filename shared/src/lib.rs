//! Wiring shared by the Lambda binaries: configuration, authentication,
//! client construction and log setup.

pub mod auth;
pub mod config;
pub mod state;
pub mod telemetry;
pub mod types;

pub use config::{Config, ConfigError, LogFormat, StoreBackend};
pub use state::AppState;
