//! Farm API client and types.
//!
//! This module provides the interface for communicating with the Koimeret
//! Dairies REST API.

mod client;
pub mod error;
mod resources;
pub mod types;

pub use client::{FarmClient, LogoutOutcome};
pub use error::{ApiError, Result};
pub use types::{Listing, Query, Record, RecordId, RequestOptions, User};
