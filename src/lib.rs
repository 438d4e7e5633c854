//! lrweb - A client for the LRWeb literature-review backend
//!
//! This crate provides:
//! - A transport client that attaches the caller's identity to every request
//! - Typed accessors for projects, runs and project papers
//! - A client-side query cache with request de-duplication and declared invalidation
//! - CLI views over the above

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod progress;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{Error, Result};
pub use session::Session;
