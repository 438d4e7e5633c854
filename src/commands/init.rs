//! Init command implementation

use crate::config::{Config, OriginMode};
use crate::error::{Error, Result};
use crate::identity::StoredIdentity;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub force: bool,
    pub backend_url: Option<String>,
    pub mode: Option<OriginMode>,
    /// Persist this user id
    pub user_id: Option<Uuid>,
    /// Generate and persist a fresh user id
    pub new_identity: bool,
}

/// What `init` wrote
#[derive(Debug, Clone)]
pub struct InitReport {
    pub config_path: PathBuf,
    pub identity_path: PathBuf,
    pub persisted_user_id: Option<Uuid>,
}

/// Write the configuration file and, when asked, a persisted identity
pub fn cmd_init(options: InitOptions) -> Result<InitReport> {
    let InitOptions {
        base_dir,
        config_path,
        force,
        backend_url,
        mode,
        user_id,
        new_identity,
    } = options;

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }
    if user_id.is_some() && new_identity {
        return Err(Error::InvalidInput(
            "Use either --user-id or --new-identity, not both".to_string(),
        ));
    }

    let mut config = Config::default();
    config.init_paths(Some(base_dir));
    config.paths.config_file = config_path;
    if let Some(url) = backend_url {
        config.backend.url = url;
    }
    if let Some(mode) = mode {
        config.backend.mode = mode;
    }

    config.validate()?;
    config.save()?;
    info!("Created config at {:?}", config.paths.config_file);

    let persisted_user_id = match (user_id, new_identity) {
        (Some(id), _) => Some(id),
        (None, true) => Some(Uuid::new_v4()),
        (None, false) => None,
    };
    if let Some(id) = persisted_user_id {
        StoredIdentity::persist(&config.paths.identity_file, id)?;
        info!("Stored user id at {:?}", config.paths.identity_file);
    }

    Ok(InitReport {
        config_path: config.paths.config_file.clone(),
        identity_path: config.paths.identity_file.clone(),
        persisted_user_id,
    })
}

pub fn print_init_report(report: &InitReport) {
    println!("✓ lrweb initialized successfully");
    println!("  Config: {}", report.config_path.display());
    match report.persisted_user_id {
        Some(id) => println!("  User id: {} (stored in {})", id, report.identity_path.display()),
        None => println!("  User id: anonymous dev user"),
    }
    println!("\nNext steps:");
    println!("  lrweb status                     # Check the backend connection");
    println!("  lrweb projects create \"Topic\"    # Start a literature review");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, IdentityProvider};
    use tempfile::TempDir;

    fn options_in(dir: &TempDir) -> InitOptions {
        InitOptions {
            base_dir: dir.path().to_path_buf(),
            config_path: dir.path().join("config.toml"),
            ..Default::default()
        }
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = TempDir::new().unwrap();
        let report = cmd_init(InitOptions {
            backend_url: Some("http://backend.test:9000".to_string()),
            mode: Some(OriginMode::Proxy),
            ..options_in(&dir)
        })
        .unwrap();

        let config = Config::load(&report.config_path).unwrap();
        assert_eq!(config.backend.url, "http://backend.test:9000");
        assert_eq!(config.backend.mode, OriginMode::Proxy);
        assert!(report.persisted_user_id.is_none());
    }

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        cmd_init(options_in(&dir)).unwrap();

        let err = cmd_init(options_in(&dir)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        cmd_init(InitOptions {
            force: true,
            ..options_in(&dir)
        })
        .unwrap();
    }

    #[test]
    fn test_init_persists_identity() {
        let dir = TempDir::new().unwrap();
        let report = cmd_init(InitOptions {
            new_identity: true,
            ..options_in(&dir)
        })
        .unwrap();

        let id = report.persisted_user_id.unwrap();
        let stored = StoredIdentity::new(report.identity_path);
        assert_eq!(stored.identity(), Identity::User(id));
    }

    #[test]
    fn test_init_rejects_invalid_backend_url() {
        let dir = TempDir::new().unwrap();
        let err = cmd_init(InitOptions {
            backend_url: Some("ftp://nope".to_string()),
            ..options_in(&dir)
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!dir.path().join("config.toml").exists());
    }
}
