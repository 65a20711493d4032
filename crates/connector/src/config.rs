//! Connector configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `CONNECTOR_HOST` - Bind address (default: 0.0.0.0)
//! - `CONNECTOR_PORT` - Listen port (default: 8000)
//! - `CONNECTOR_REDIRECT_URI` - OAuth redirect URI (default: `http://localhost:8000/auth/callback`)
//! - `CONNECTOR_DASHBOARD_URL` - Where the browser goes afterwards (default: `http://localhost:8501`)
//! - `DASHBOARD_DATABASE_URL` / `DATABASE_URL` - Shared token database
//! - `SHOPIFY_API_KEY`, `SHOPIFY_API_SECRET`, `SHOPIFY_API_VERSION`,
//!   `SHOPIFY_SCOPES`, `SHOPIFY_ADMIN_ORIGIN` - As for the dashboard

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use urbannue_dashboard::config::{
    ConfigError, ShopifyConfig, get_database_url, get_env_or_default,
};

const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/auth/callback";
const DEFAULT_DASHBOARD_URL: &str = "http://localhost:8501";

/// Connector configuration.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Dashboard origin, without a trailing slash
    pub dashboard_url: String,
    /// Shopify app settings; `redirect_uri` points back at this service
    pub shopify: ShopifyConfig,
}

impl ConnectorConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("CONNECTOR_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CONNECTOR_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CONNECTOR_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CONNECTOR_PORT".to_string(), e.to_string()))?;

        let redirect_uri = get_env_or_default("CONNECTOR_REDIRECT_URI", DEFAULT_REDIRECT_URI);
        let mut shopify = ShopifyConfig::from_env(&redirect_uri)?;
        shopify.redirect_uri = redirect_uri;

        Ok(Self {
            database_url: get_database_url("DASHBOARD_DATABASE_URL")?,
            host,
            port,
            dashboard_url: get_env_or_default("CONNECTOR_DASHBOARD_URL", DEFAULT_DASHBOARD_URL)
                .trim_end_matches('/')
                .to_string(),
            shopify,
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
