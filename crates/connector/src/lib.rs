//! Urbannue Connector - Shopify OAuth outside the dashboard.
//!
//! A two-endpoint service for installing the app from a link:
//! `/install?shop=` sends the merchant to Shopify's permission page and
//! `/auth/callback` exchanges the code, stores the token and hands the
//! browser to the dashboard with `?shop=`.
//!
//! It keeps no sessions. The OAuth `state` carries its own proof: it is
//! signed with the app secret and expires after ten minutes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod oauth_state;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;
use urbannue_dashboard::shopify::{ShopifyClient, ShopifyError};

use config::ConnectorConfig;

/// Shared connector state.
#[derive(Clone)]
pub struct ConnectorState {
    inner: Arc<ConnectorStateInner>,
}

struct ConnectorStateInner {
    config: ConnectorConfig,
    pool: PgPool,
    shopify: ShopifyClient,
}

impl ConnectorState {
    /// Build the state and its Shopify client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: ConnectorConfig, pool: PgPool) -> Result<Self, ShopifyError> {
        let shopify = ShopifyClient::new(&config.shopify)?;
        Ok(Self {
            inner: Arc::new(ConnectorStateInner {
                config,
                pool,
                shopify,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }
}
