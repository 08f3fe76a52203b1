//! Sthana server library.
//!
//! HTTP API for the temple directory: public browsing routes, and the admin
//! console backend (generic document proxy, dashboard stats, user roles)
//! behind a bearer-token admin gate.

#![allow(missing_docs)]

pub mod api;
pub mod auth;
pub mod error;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, Collections};
