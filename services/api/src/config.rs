//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The digest Cloudinary verifies request signatures with. Accounts use SHA-1
/// unless switched to SHA-256 in their security settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl std::str::FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(format!("'{}' is not one of sha1, sha256", other)),
        }
    }
}

/// Credentials for the Cloudinary media service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub signature_algorithm: SignatureAlgorithm,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Postgres connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Live uploads need all three credentials; otherwise uploads are mocked.
    pub cloudinary: Option<CloudinaryCredentials>,
    pub cloudinary_api_base: String,
    pub upload_folder: String,
    pub allowed_origins: Vec<String>,
}

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPLOAD_FOLDER: &str = "recipe-app";
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // --- Server Settings ---
        let bind_address_str = match var("BIND_ADDRESS") {
            Some(address) => address,
            None => {
                let port = match var("PORT") {
                    Some(port) => port.trim().parse::<u16>().map_err(|e| {
                        ConfigError::InvalidValue("PORT".to_string(), e.to_string())
                    })?,
                    None => DEFAULT_PORT,
                };
                format!("0.0.0.0:{}", port)
            }
        };
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var("DATABASE_URL");

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Media Service ---
        let signature_algorithm = match var("CLOUDINARY_SIGNATURE_ALGORITHM") {
            Some(name) => name.parse::<SignatureAlgorithm>().map_err(|e| {
                ConfigError::InvalidValue("CLOUDINARY_SIGNATURE_ALGORITHM".to_string(), e)
            })?,
            None => SignatureAlgorithm::default(),
        };
        let cloudinary = match (
            var("CLOUDINARY_CLOUD_NAME"),
            var("CLOUDINARY_API_KEY"),
            var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryCredentials {
                cloud_name,
                api_key,
                api_secret,
                signature_algorithm,
            }),
            _ => None,
        };
        let cloudinary_api_base = var("CLOUDINARY_API_BASE")
            .unwrap_or_else(|| DEFAULT_CLOUDINARY_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let upload_folder =
            var("UPLOAD_FOLDER").unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string());

        // --- CORS ---
        let allowed_origins = var("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cloudinary,
            cloudinary_api_base,
            upload_folder,
            allowed_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_to_mock_media_and_memory_store() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address.port(), DEFAULT_PORT);
        assert!(config.database_url.is_none());
        assert!(config.cloudinary.is_none());
        assert_eq!(config.upload_folder, DEFAULT_UPLOAD_FOLDER);
        assert_eq!(config.allowed_origins.len(), 2);
    }

    #[test]
    fn needs_all_three_credentials_for_live_uploads() {
        let partial = load(&[
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
        ])
        .unwrap();
        assert!(partial.cloudinary.is_none());

        let full = load(&[
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ])
        .unwrap();
        let credentials = full.cloudinary.unwrap();
        assert_eq!(credentials.cloud_name, "demo");
        assert_eq!(credentials.signature_algorithm, SignatureAlgorithm::Sha1);
    }

    #[test]
    fn signature_algorithm_is_configurable() {
        let config = load(&[
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
            ("CLOUDINARY_SIGNATURE_ALGORITHM", "SHA256"),
        ])
        .unwrap();
        assert_eq!(
            config.cloudinary.unwrap().signature_algorithm,
            SignatureAlgorithm::Sha256
        );

        assert!(matches!(
            load(&[("CLOUDINARY_SIGNATURE_ALGORITHM", "md5")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "CLOUDINARY_SIGNATURE_ALGORITHM"
        ));
    }

    #[test]
    fn port_and_origins_are_parsed() {
        let config = load(&[
            ("PORT", "8080"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn rejects_a_bad_port() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "PORT"
        ));
    }
}
