//! HTTP API server for linkthree.
//!
//! Public page views (`/view/{id}`, `/{slug}`), the page index at `/`, and a
//! versioned JSON API under `/api/v1` for editing, built on axum.

mod config;
mod error;
mod logging;
mod routes;
mod state;

pub use config::{
    Config, ConfigError, CorsConfig, LogFormat, LoggingConfig, ServerConfig, StoreBackend,
    StoreConfig,
};
pub use error::ApiError;
pub use logging::{LoggingError, init as init_logging};
pub use routes::router;
pub use state::{AppState, StateError};
