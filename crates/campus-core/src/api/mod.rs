//! REST API client module for the campus backend.
//!
//! This module provides the `ApiClient` for reading and writing campus
//! resource collections (events, notices, lost & found, users).
//!
//! Every non-success outcome is an `ApiError`; callers in the service layer
//! treat any of them uniformly as "API unavailable".

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
