//! CLI commands implementation

pub mod init;
pub mod papers;
pub mod projects;
pub mod runs;
pub mod status;

pub use init::*;
pub use papers::*;
pub use projects::*;
pub use runs::*;
pub use status::*;

use crate::error::{Error, Result};
use crate::progress::spinner;
use chrono::{DateTime, Local, Utc};
use std::future::Future;

/// Await a request behind a spinner (the loading state)
pub async fn with_spinner<T, Fut>(message: &str, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    let bar = spinner(message.to_string());
    let result = fut.await;
    bar.finish_and_clear();
    result
}

/// Error state of a view: 404 becomes "not found", anything else shows status and body
pub fn print_load_error(resource: &str, err: &Error) {
    if err.is_not_found() {
        eprintln!("✗ {} not found", resource);
    } else {
        eprintln!("✗ Failed to load {}: {}", resource, err);
    }
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
