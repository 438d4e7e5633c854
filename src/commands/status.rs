//! Status command implementation

use crate::config::{Config, OriginMode};
use crate::error::Result;
use crate::identity::IdentityProvider;
use crate::transport::ApiClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub config_exists: bool,
    pub backend_url: String,
    pub mode: OriginMode,
    pub resolved_origin: String,
    pub user_id: String,
    pub anonymous: bool,
    pub backend_connected: bool,
    pub backend_status: Option<String>,
    pub backend_error: Option<String>,
}

/// Get client status and check backend health
pub async fn cmd_status(config: &Config, client: &ApiClient) -> Result<StatusInfo> {
    info!("Getting status");

    let identity = client.identity().identity();
    let (backend_connected, backend_status, backend_error) = match client.health().await {
        Ok(health) => (true, Some(health.status), None),
        Err(e) => {
            debug!("Backend health check failed: {:?}", e);
            (false, None, Some(e.to_string()))
        }
    };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        config_exists: config.paths.config_file.exists(),
        backend_url: config.backend.url.clone(),
        mode: config.backend.mode,
        resolved_origin: client.origin().to_string(),
        user_id: identity.user_id().to_string(),
        anonymous: identity.is_anonymous(),
        backend_connected,
        backend_status,
        backend_error,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 lrweb Status\n");
    if status.config_exists {
        println!("Configuration: {}", status.config_path);
    } else {
        println!("Configuration: {} (not created, using defaults)", status.config_path);
    }

    println!("\nBackend:");
    println!("  URL: {}", status.backend_url);
    println!("  Mode: {:?}", status.mode);
    println!("  Requests go to: {}", status.resolved_origin);

    let connection_status = if status.backend_connected {
        format!(
            "✓ Connected ({})",
            status.backend_status.as_deref().unwrap_or("ok")
        )
    } else {
        format!(
            "✗ Not connected: {}",
            status.backend_error.as_deref().unwrap_or("unknown error")
        )
    };
    println!("  Status: {}", connection_status);

    println!("\nIdentity:");
    if status.anonymous {
        println!("  User: {} (anonymous dev user)", status.user_id);
        println!("  Run 'lrweb init --new-identity' to use a personal id");
    } else {
        println!("  User: {}", status.user_id);
    }
}
