//! # parley-server
//!
//! HTTP server wiring for the Parley auth subsystem: configuration
//! loading, tracing setup, state construction, and the router.

pub mod config;
pub mod observability;
pub mod routes;
pub mod state;

pub use config::{ServerConfig, ServerConfigError, load_config};
pub use routes::app;
pub use state::build_auth_state;
