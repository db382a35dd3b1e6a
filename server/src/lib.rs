//! exrates Server
//!
//! HTTP front end over the cached exchange rate engine: current rates,
//! conversion between any two listed currencies, and the list of supported
//! currency codes.

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod telemetry;

pub use api::app_router;
pub use config::ServerConfig;
pub use state::{build_state, AppState};
