//! Environment-driven configuration, loaded once at startup.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file (see `main`). Network and path settings have development defaults; the
//! token secret and the Microsoft Graph credentials are required because the
//! service cannot do anything useful without them.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}")]
    Invalid(&'static str),
}

/// Credentials and addressing for the SharePoint document library reached
/// through the Microsoft Graph API.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub site_id: String,
    pub library: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite database holding users and consent records.
    pub db_path: PathBuf,
    /// Directory with the pristine consent template PDFs.
    pub templates_dir: PathBuf,
    pub jwt_secret: String,
    pub graph: GraphConfig,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let port: u16 = port.parse().map_err(|_| ConfigError::Invalid("PORT"))?;

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            db_path: PathBuf::from(
                env::var("CONSENT_DB").unwrap_or_else(|_| "consents.sqlite".to_string()),
            ),
            templates_dir: PathBuf::from(
                env::var("CONSENT_TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string()),
            ),
            jwt_secret: required("JWT_SECRET")?,
            graph: GraphConfig {
                tenant_id: required("AZURE_TENANT_ID")?,
                client_id: required("AZURE_CLIENT_ID")?,
                client_secret: required("AZURE_CLIENT_SECRET")?,
                site_id: required("SHAREPOINT_SITE_ID")?,
                library: required("SHAREPOINT_LIBRARY")?,
            },
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}
