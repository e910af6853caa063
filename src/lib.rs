//! Outreach Directory Library
//!
//! Serves the agency and contact directories to authenticated callers. Contact
//! listings are paginated and capped by a per-identity daily view quota whose
//! counter is carried by the caller rather than stored on the server.

pub mod auth;
pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod pagination;
pub mod quota;
pub mod server;
pub mod service;

pub use config::Config;
pub use error::ApiError;
pub use server::{build_router, start_server, AppState};
