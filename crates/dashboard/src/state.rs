//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::claude::{ClaudeClient, ClaudeError};
use crate::config::DashboardConfig;
use crate::services::assistant::Assistant;
use crate::shopify::{ShopifyClient, ShopifyError};
use crate::tokens::TokenCache;

/// Error building the outbound API clients.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("claude client: {0}")]
    Claude(#[from] ClaudeError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    pool: PgPool,
    shopify: ShopifyClient,
    assistant: Assistant,
    tokens: TokenCache,
}

impl AppState {
    /// Create the application state and its API clients.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if an HTTP client cannot be built.
    pub fn new(config: DashboardConfig, pool: PgPool) -> Result<Self, StateError> {
        let shopify = ShopifyClient::new(&config.shopify)?;
        let claude = ClaudeClient::new(config.claude())?;
        let tokens = TokenCache::new(pool.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify,
                assistant: Assistant::new(claude),
                tokens,
            }),
        })
    }

    /// Get a reference to the dashboard configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Shopify client.
    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }

    /// Get a reference to the store assistant.
    #[must_use]
    pub fn assistant(&self) -> &Assistant {
        &self.inner.assistant
    }

    /// Get a reference to the access token cache.
    #[must_use]
    pub fn tokens(&self) -> &TokenCache {
        &self.inner.tokens
    }
}
