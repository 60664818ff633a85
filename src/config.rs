//! Configuration management for the schema gateway
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (solr-schema.toml)
//! - Environment variables (SOLR_SCHEMA__*)
//!
//! ## Example config file (solr-schema.toml):
//! ```toml
//! [engine]
//! timeout_secs = 30
//! user_agent = "solr-schema-sync"
//!
//! [copy_fields]
//! default_max_chars = 256
//! catch_all_field = "_text_"
//!
//! [clients.acme]
//! host = "10.0.0.12"
//! port = 8983
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::engine::{ClientRegistry, Endpoint};

/// Main configuration for the schema gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Transport settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Copy-field planning settings
    #[serde(default)]
    pub copy_fields: CopyFieldConfig,

    /// Tenant registry: client name to engine endpoint
    #[serde(default)]
    pub clients: HashMap<String, Endpoint>,
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Copy-field planning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFieldConfig {
    /// maxChars attached to text/string destinations when the caller gives none
    #[serde(default = "default_max_chars")]
    pub default_max_chars: u32,

    /// Name of the catch-all text field
    #[serde(default = "default_catch_all_field")]
    pub catch_all_field: String,

    /// Type of the catch-all text field when it has to be created
    #[serde(default = "default_catch_all_type")]
    pub catch_all_type: String,

    /// Fields starting with this prefix are internal and never auto-copied
    #[serde(default = "default_internal_prefix")]
    pub internal_prefix: String,
}

// Default value functions
fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("solr-schema-sync/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_chars() -> u32 {
    256
}

fn default_catch_all_field() -> String {
    "_text_".to_string()
}

fn default_catch_all_type() -> String {
    "text_general".to_string()
}

fn default_internal_prefix() -> String {
    "_".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CopyFieldConfig {
    fn default() -> Self {
        Self {
            default_max_chars: default_max_chars(),
            catch_all_field: default_catch_all_field(),
            catch_all_type: default_catch_all_type(),
            internal_prefix: default_internal_prefix(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "solr-schema.toml",
            ".solr-schema.toml",
            "config/solr-schema.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "solr-schema", "solr-schema") {
            let xdg_config = config_dir.config_dir().join("solr-schema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (SOLR_SCHEMA__ENGINE__TIMEOUT_SECS, ...)
        builder = builder.add_source(
            Environment::with_prefix("SOLR_SCHEMA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Tenant registry built from the `[clients]` table
    pub fn client_registry(&self) -> ClientRegistry {
        ClientRegistry::new(self.clients.clone())
    }
}
