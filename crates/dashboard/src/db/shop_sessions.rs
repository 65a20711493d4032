//! Persistence of Shopify access tokens, one row per store.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use urbannue_core::ShopDomain;

use super::RepositoryError;

/// A connected store and its Admin API token.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopSession {
    /// Normalized store domain.
    pub shop: ShopDomain,
    /// Admin API access token.
    pub access_token: SecretString,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// When the store was first connected.
    pub created_at: DateTime<Utc>,
    /// When the token was last replaced.
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Token-free listing entry.
#[derive(Debug, Clone)]
pub struct ShopSessionSummary {
    pub shop: ShopDomain,
    pub scopes: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ShopSessionRow {
    shop_url: String,
    access_token: String,
    scopes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ShopSessionSummaryRow {
    shop_url: String,
    scopes: String,
    updated_at: DateTime<Utc>,
}

fn parse_shop(raw: &str) -> Result<ShopDomain, RepositoryError> {
    ShopDomain::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("stored shop_url '{raw}': {e}")))
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

impl TryFrom<ShopSessionRow> for ShopSession {
    type Error = RepositoryError;

    fn try_from(row: ShopSessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            shop: parse_shop(&row.shop_url)?,
            access_token: SecretString::from(row.access_token),
            scopes: split_scopes(&row.scopes),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ShopSessionSummaryRow> for ShopSessionSummary {
    type Error = RepositoryError;

    fn try_from(row: ShopSessionSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            shop: parse_shop(&row.shop_url)?,
            scopes: split_scopes(&row.scopes),
            updated_at: row.updated_at,
        })
    }
}

/// Repository for shop session database operations.
pub struct ShopSessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopSessionRepository<'a> {
    /// Create a new shop session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the stored session for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopSessionRow>(
            r"
            SELECT shop_url, access_token, scopes, created_at, updated_at
            FROM dashboard.shop_session
            WHERE shop_url = $1
            ",
        )
        .bind(shop.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(ShopSession::try_from).transpose()
    }

    /// Insert or replace the token for a shop. The last writer wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
        scopes: &[String],
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO dashboard.shop_session (shop_url, access_token, scopes)
            VALUES ($1, $2, $3)
            ON CONFLICT (shop_url) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                scopes = EXCLUDED.scopes,
                updated_at = NOW()
            ",
        )
        .bind(shop.as_str())
        .bind(access_token.expose_secret())
        .bind(scopes.join(","))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete the session for a shop.
    ///
    /// Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM dashboard.shop_session WHERE shop_url = $1")
            .bind(shop.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List connected shops, most recently updated first. Tokens are not read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a stored domain no longer parses.
    pub async fn list(&self) -> Result<Vec<ShopSessionSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShopSessionSummaryRow>(
            r"
            SELECT shop_url, scopes, updated_at
            FROM dashboard.shop_session
            ORDER BY updated_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ShopSessionSummary::try_from).collect()
    }
}
