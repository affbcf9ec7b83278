//! TAPD API client and types.
//!
//! This module provides read-only access to the TAPD REST API: a transport,
//! token handling for app credentials, an allow-listing gateway and the
//! domain-level client built on top of it.

mod auth;
mod client;
pub mod error;
mod gateway;
mod token;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AppCredentials, AuthMode, BasicAuth, Credentials};
pub use client::{TapdClient, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
pub use transport::{Transport, DEFAULT_TIMEOUT_SECS};
pub use types::{Counts, Iteration, Resource};
