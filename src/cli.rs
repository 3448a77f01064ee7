//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap, including
//! validation and environment-variable fallbacks for deployment.

use clap::Parser;
use std::path::PathBuf;

/// org-catalog-bff - organization catalog aggregation service
///
/// Serves merged organization catalog summaries, per-organization catalogs
/// and entity reports, aggregated live from the organization registry, the
/// national company registry, the SPARQL service and the metadata quality
/// service.
///
/// Examples:
///   org-catalog-bff
///   org-catalog-bff --port 9090 --verbose
///   org-catalog-bff --config ./org-catalog-bff.toml
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, value_name = "ADDR", env = "BIND_HOST")]
    pub host: Option<String>,

    /// Port to bind the HTTP server to
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to configuration file
    ///
    /// If not specified, looks for org-catalog-bff.toml in the current
    /// directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Organization registry base URL
    #[arg(long, value_name = "URL", env = "ORGANIZATION_CATALOG_URI")]
    pub organization_catalog_url: Option<String>,

    /// National company registry base URL
    #[arg(long, value_name = "URL", env = "COMPANY_REGISTRY_URI")]
    pub company_registry_url: Option<String>,

    /// SPARQL query endpoint URL
    #[arg(long, value_name = "URL", env = "SPARQL_SERVICE_URI")]
    pub sparql_url: Option<String>,

    /// Metadata quality service base URL
    #[arg(long, value_name = "URL", env = "METADATA_QUALITY_URI")]
    pub metadata_quality_url: Option<String>,

    /// Reference data service base URL
    #[arg(long, value_name = "URL", env = "REFERENCE_DATA_URI")]
    pub reference_data_url: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Validate upstream URL formats
        let urls = [
            ("organization catalog", &self.organization_catalog_url),
            ("company registry", &self.company_registry_url),
            ("sparql", &self.sparql_url),
            ("metadata quality", &self.metadata_quality_url),
            ("reference data", &self.reference_data_url),
        ];
        for (name, url) in urls {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(format!(
                        "{} URL must start with 'http://' or 'https://'",
                        name
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            host: None,
            port: None,
            config: None,
            organization_catalog_url: None,
            company_registry_url: None,
            sparql_url: None,
            metadata_quality_url: None,
            reference_data_url: None,
            timeout: None,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_validation_accepts_defaults() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.sparql_url = Some("not-a-url".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
