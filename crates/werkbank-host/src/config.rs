use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid listen address: {0}")]
    Addr(String),
    #[error("cannot read or create secret file {path}: {source}")]
    SecretFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Host configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    pub jwt_issuer: String,
    pub jwt_secret: String,
}

impl HostConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_addr =
            std::env::var("WERKBANK_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_string());
        let addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::Addr(raw_addr.clone()))?;

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "werkbank.db".to_string());
        let jwt_issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| "Werkbank".to_string());

        // Explicit secret wins; otherwise fall back to the on-disk secret,
        // minting one on first start.
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                let data_dir =
                    std::env::var("WERKBANK_DATA_DIR").unwrap_or_else(|_| "data".to_string());
                load_or_create_secret(Path::new(&data_dir))?
            }
        };

        Ok(Self {
            addr,
            database_url,
            jwt_issuer,
            jwt_secret,
        })
    }
}

fn load_or_create_secret(dir: &Path) -> Result<String, ConfigError> {
    let path = dir.join("jwt.secret");
    match std::fs::read_to_string(&path) {
        Ok(secret) => Ok(secret.trim().to_string()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
            std::fs::create_dir_all(dir)
                .and_then(|()| std::fs::write(&path, &secret))
                .map_err(|source| ConfigError::SecretFile {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!(path = %path.display(), "generated new jwt secret file");
            Ok(secret)
        }
        Err(source) => Err(ConfigError::SecretFile { path, source }),
    }
}
