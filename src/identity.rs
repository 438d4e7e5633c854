//! Caller identity for the `X-User-Id` header
//!
//! The backend trusts whatever user id the caller sends. This is a placeholder for
//! real authentication: the anonymous identity exists so local development works
//! before a user id has been provisioned, and it must not ship to production.

use crate::config::Config;
use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Header carrying the caller identity
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Env var consulted when no user id is configured explicitly
pub const USER_ID_ENV: &str = "LRWEB_USER_ID";

/// Placeholder user id sent by the anonymous development identity
pub const ANONYMOUS_DEV_USER_ID: Uuid = Uuid::from_u128(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    User(Uuid),
    /// Shared placeholder identity for development only
    AnonymousDev,
}

impl Identity {
    pub fn user_id(&self) -> Uuid {
        match self {
            Identity::User(id) => *id,
            Identity::AnonymousDev => ANONYMOUS_DEV_USER_ID,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::AnonymousDev)
    }

    /// Value for the `X-User-Id` header
    pub fn header_value(&self) -> String {
        self.user_id().hyphenated().to_string()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::User(id) => write!(f, "{}", id),
            Identity::AnonymousDev => write!(f, "{} (anonymous dev)", ANONYMOUS_DEV_USER_ID),
        }
    }
}

/// Source of the caller identity, injected into the transport client
pub trait IdentityProvider: Send + Sync {
    fn identity(&self) -> Identity;
}

/// Fixed identity
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity(pub Identity);

impl IdentityProvider for StaticIdentity {
    fn identity(&self) -> Identity {
        self.0
    }
}

/// Identity persisted in a local file, read once per process
#[derive(Debug)]
pub struct StoredIdentity {
    path: PathBuf,
    resolved: OnceLock<Identity>,
}

impl StoredIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            resolved: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a user id so later processes pick it up
    pub fn persist(path: &Path, user_id: Uuid) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("{}\n", user_id))?;
        debug!("Persisted user id to {:?}", path);
        Ok(())
    }

    fn read(&self) -> Identity {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No persisted user id at {:?}: {}", self.path, e);
                return Identity::AnonymousDev;
            }
        };

        match Uuid::from_str(content.trim()) {
            Ok(id) => Identity::User(id),
            Err(e) => {
                warn!(
                    "Ignoring invalid user id in {:?} ({}); using anonymous dev identity",
                    self.path, e
                );
                Identity::AnonymousDev
            }
        }
    }
}

impl IdentityProvider for StoredIdentity {
    fn identity(&self) -> Identity {
        *self.resolved.get_or_init(|| self.read())
    }
}

/// Pick the identity provider for a configuration
///
/// Order: explicit config user id, `LRWEB_USER_ID`, persisted file, anonymous dev.
pub fn resolve_provider(config: &Config) -> Result<Arc<dyn IdentityProvider>> {
    if let Some(id) = config.identity.user_id {
        return Ok(Arc::new(StaticIdentity(Identity::User(id))));
    }

    if let Ok(raw) = std::env::var(USER_ID_ENV) {
        let id = Uuid::from_str(raw.trim())
            .map_err(|e| Error::Config(format!("{} is not a valid UUID: {}", USER_ID_ENV, e)))?;
        return Ok(Arc::new(StaticIdentity(Identity::User(id))));
    }

    Ok(Arc::new(StoredIdentity::new(config.paths.identity_file.clone())))
}
