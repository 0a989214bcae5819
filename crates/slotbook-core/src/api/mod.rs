//! REST API client module for the booking service.
//!
//! This module provides the `ApiClient` gateway and its `ApiError`
//! taxonomy. All outbound calls pass through one method so the request
//! envelope and the authorization-failure teardown are enforced in a
//! single place.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, CONNECTIVITY_MESSAGE};
