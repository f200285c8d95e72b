//! Parking occupancy service
//!
//! Credential and session-token authority plus the sensor-driven occupancy
//! ledger, served over HTTP with axum.

pub mod error;
pub mod ingestion;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod settings;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
