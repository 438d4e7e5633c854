//! Default values for configuration

/// Default backend origin used when talking to the backend directly
pub fn default_backend_url() -> String {
    std::env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Default origin mode
pub fn default_backend_mode() -> super::OriginMode {
    super::OriginMode::Direct
}

/// Same-origin prefix a reverse proxy maps onto the backend
pub fn default_proxy_prefix() -> String {
    "/api".to_string()
}

/// Default request timeout in seconds
pub fn default_timeout_secs() -> u64 {
    30
}

/// Default file (relative to the base dir) holding the persisted user id
pub fn default_identity_file() -> String {
    "user_id".to_string()
}

/// How long a cached query result is served without a network call
pub fn default_stale_time_secs() -> u64 {
    30
}
