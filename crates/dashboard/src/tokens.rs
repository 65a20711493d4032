//! Process-local cache of Shopify access tokens.
//!
//! Every dashboard load needs the token of the connected store. The
//! database is the source of truth; this cache saves the round trip.

use std::time::Duration;

use moka::future::Cache;
use secrecy::SecretString;
use sqlx::PgPool;
use tracing::instrument;
use urbannue_core::ShopDomain;

use crate::db::{RepositoryError, ShopSessionRepository};

const MAX_CACHED_SHOPS: u64 = 64;
const IDLE_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Token cache in front of [`ShopSessionRepository`].
#[derive(Clone)]
pub struct TokenCache {
    pool: PgPool,
    cache: Cache<ShopDomain, SecretString>,
}

impl TokenCache {
    /// Create an empty cache reading through to `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_SHOPS)
            .time_to_idle(IDLE_EXPIRY)
            .build();

        Self { pool, cache }
    }

    /// Token for `shop`: cache first, then the database.
    ///
    /// Database hits are cached. `None` means the store was never connected
    /// (or has been disconnected).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database lookup fails.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn resolve(&self, shop: &ShopDomain) -> Result<Option<SecretString>, RepositoryError> {
        if let Some(token) = self.cache.get(shop).await {
            tracing::debug!("Token cache hit");
            return Ok(Some(token));
        }

        let Some(session) = ShopSessionRepository::new(&self.pool).get(shop).await? else {
            return Ok(None);
        };

        self.cache
            .insert(shop.clone(), session.access_token.clone())
            .await;
        Ok(Some(session.access_token))
    }

    /// Cache a freshly obtained token.
    pub async fn insert(&self, shop: ShopDomain, token: SecretString) {
        self.cache.insert(shop, token).await;
    }

    /// Whether a token for `shop` is cached.
    #[must_use]
    pub fn contains(&self, shop: &ShopDomain) -> bool {
        self.cache.contains_key(shop)
    }

    /// Forget the token for `shop`.
    pub async fn invalidate(&self, shop: &ShopDomain) {
        self.cache.invalidate(shop).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    fn lazy_pool() -> PgPool {
        // Never connects: these tests only touch cached entries.
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/urbannue_test")
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_resolve_hits_cache() {
        let tokens = TokenCache::new(lazy_pool());
        let shop = ShopDomain::parse("brand").unwrap();

        tokens
            .insert(shop.clone(), SecretString::from("shpat_cached"))
            .await;

        let token = tokens.resolve(&shop).await.unwrap().unwrap();
        assert_eq!(token.expose_secret(), "shpat_cached");
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let tokens = TokenCache::new(lazy_pool());
        let shop = ShopDomain::parse("brand").unwrap();

        tokens
            .insert(shop.clone(), SecretString::from("shpat_cached"))
            .await;
        tokens.invalidate(&shop).await;

        assert!(!tokens.contains(&shop));
    }
}
