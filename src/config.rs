//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `org-catalog-bff.toml` files, CLI arguments and environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream service settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Upstream service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Organization registry base URL.
    #[serde(default = "default_organization_catalog_url")]
    pub organization_catalog_url: String,

    /// National company registry base URL.
    #[serde(default = "default_company_registry_url")]
    pub company_registry_url: String,

    /// SPARQL query endpoint URL.
    #[serde(default = "default_sparql_url")]
    pub sparql_url: String,

    /// Metadata quality service base URL.
    #[serde(default = "default_metadata_quality_url")]
    pub metadata_quality_url: String,

    /// Reference data service base URL (region tables).
    #[serde(default = "default_reference_data_url")]
    pub reference_data_url: String,

    /// Base URL for organization logos.
    #[serde(default = "default_org_logo_url")]
    pub org_logo_url: String,

    /// Per-call request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            organization_catalog_url: default_organization_catalog_url(),
            company_registry_url: default_company_registry_url(),
            sparql_url: default_sparql_url(),
            metadata_quality_url: default_metadata_quality_url(),
            reference_data_url: default_reference_data_url(),
            org_logo_url: default_org_logo_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_organization_catalog_url() -> String {
    "https://organization-catalogue.staging.fellesdatakatalog.digdir.no".to_string()
}

fn default_company_registry_url() -> String {
    "https://data.brreg.no".to_string()
}

fn default_sparql_url() -> String {
    "https://sparql.staging.fellesdatakatalog.digdir.no".to_string()
}

fn default_metadata_quality_url() -> String {
    "https://metadata-quality.staging.fellesdatakatalog.digdir.no".to_string()
}

fn default_reference_data_url() -> String {
    "https://www.staging.fellesdatakatalog.digdir.no/reference-data".to_string()
}

fn default_org_logo_url() -> String {
    "https://orglogo.digdir.no/api/logo/org".to_string()
}

fn default_request_timeout() -> u64 {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but
    /// can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new("org-catalog-bff.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment-variable fallbacks) take
    /// precedence over config file settings, but only when explicitly
    /// provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref url) = args.organization_catalog_url {
            self.upstream.organization_catalog_url = url.clone();
        }
        if let Some(ref url) = args.company_registry_url {
            self.upstream.company_registry_url = url.clone();
        }
        if let Some(ref url) = args.sparql_url {
            self.upstream.sparql_url = url.clone();
        }
        if let Some(ref url) = args.metadata_quality_url {
            self.upstream.metadata_quality_url = url.clone();
        }
        if let Some(ref url) = args.reference_data_url {
            self.upstream.reference_data_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.upstream.request_timeout_seconds = timeout;
        }
    }

    /// Address the HTTP server should bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Generate a default configuration file content.
    #[allow(dead_code)] // Utility for generating example config
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.upstream.company_registry_url,
            "https://data.brreg.no"
        );
        assert_eq!(config.upstream.request_timeout_seconds, 5);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
port = 9090

[upstream]
organization_catalog_url = "http://localhost:8140"
sparql_url = "http://localhost:8200"
request_timeout_seconds = 2
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.upstream.organization_catalog_url,
            "http://localhost:8140"
        );
        assert_eq!(config.upstream.sparql_url, "http://localhost:8200");
        assert_eq!(config.upstream.request_timeout_seconds, 2);
        assert_eq!(
            config.upstream.company_registry_url,
            "https://data.brreg.no"
        );
    }

    #[test]
    fn test_bind_address() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 3000;
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[upstream]"));
    }
}
