//! Service configuration, read from a TOML file.
//!
//! The file path comes from `CRA_CONFIG` and defaults to `cra-signing.toml`.
//! Every section and field is optional; a missing or unreadable file falls
//! back to the defaults, which keep email delivery disabled.

use anyhow::{anyhow, Context, Result};
use chrono::Locale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::email_service::EmailConfig;
use crate::domain::signature_image::DEFAULT_MAX_IMAGE_BYTES;
use crate::domain::{NotifierOptions, SigningPolicy};

pub const CONFIG_PATH_ENV: &str = "CRA_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "cra-signing.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub email: EmailConfig,
    pub signing: SigningConfig,
    pub documents: DocumentsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://cra-signing.db".to_string(),
            max_connections: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub require_schedule_data: bool,
    pub notify_consultant: bool,
    pub notify_manager: bool,
    pub max_image_bytes: usize,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            require_schedule_data: true,
            notify_consultant: true,
            notify_manager: true,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// POSIX locale name used for month labels, e.g. `fr_FR`
    pub locale: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            locale: "fr_FR".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        let config: AppConfig = toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(config_path: &Path) -> Self {
        match Self::load(config_path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                config
            }
            Err(e) => {
                warn!("Failed to load config from {:?}: {:#}", config_path, e);
                info!("Using default configuration (email notifications disabled)");
                AppConfig::default()
            }
        }
    }

    /// Path from `CRA_CONFIG`, or the default file name
    pub fn path_from_env() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn validate(&self) -> Result<()> {
        self.locale()?;
        if self.signing.max_image_bytes == 0 {
            return Err(anyhow!("signing.max_image_bytes must be positive"));
        }
        if self.email.enabled {
            self.email.validate()?;
        }
        Ok(())
    }

    pub fn locale(&self) -> Result<Locale> {
        Locale::try_from(self.documents.locale.as_str())
            .map_err(|_| anyhow!("Unknown documents.locale: {}", self.documents.locale))
    }

    pub fn signing_policy(&self) -> SigningPolicy {
        SigningPolicy {
            require_schedule_data: self.signing.require_schedule_data,
            max_image_bytes: self.signing.max_image_bytes,
        }
    }

    pub fn notifier_options(&self) -> Result<NotifierOptions> {
        Ok(NotifierOptions {
            notify_consultant: self.signing.notify_consultant,
            notify_manager: self.signing.notify_manager,
            locale: self.locale()?,
        })
    }
}
