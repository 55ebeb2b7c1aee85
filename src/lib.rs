//! Koimeret - client library for the Koimeret Dairies farm management API.
//!
//! The crate is layered bottom-up:
//!
//! - [`session`] holds the credential and the logged-in user, persisted
//!   through a pluggable [`session::CredentialStorage`].
//! - [`api`] is the HTTP client and the typed resource wrappers.
//! - [`context`] wires settings, session, client and navigation together and
//!   acts as the error boundary for expired sessions.
//! - [`tasks`], [`views`] and [`app`] run API calls in the background and
//!   fold their results into page state.

pub mod api;
pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod notification;
pub mod session;
pub mod tasks;
pub mod views;
