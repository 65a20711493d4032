//! Shopify OAuth and REST client.

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;
use url::form_urlencoded;
use urbannue_core::{OrderSummary, ShopDomain};

use crate::config::ShopifyConfig;

use super::ShopifyError;
use super::signature;
use super::types::{OAuthTokenResponse, OrdersResponse};

/// Most orders requested in one page load.
pub const ORDER_FETCH_LIMIT: u32 = 50;

/// Error bodies are cut to this many bytes before they are logged or stored.
const MAX_ERROR_BODY: usize = 512;

/// Admin API access token obtained from the OAuth exchange.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct AccessToken {
    /// The access token for API calls.
    pub access_token: SecretString,
    /// Granted scopes.
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Shopify Admin API client.
///
/// Holds the app credentials, not a store token: the token is passed per
/// call so one client serves every connected shop.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    api_key: String,
    api_secret: SecretString,
    api_version: String,
    admin_origin: Option<String>,
}

impl ShopifyClient {
    /// Create a new client from the app configuration.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client fails to build.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("urbannue/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
                api_version: config.api_version.clone(),
                admin_origin: config.admin_origin.clone(),
            }),
        })
    }

    /// Base URL for requests to `shop`.
    fn origin(&self, shop: &ShopDomain) -> String {
        self.inner
            .admin_origin
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }

    /// Build the permission page URL the browser is redirected to.
    #[must_use]
    pub fn authorization_url(
        &self,
        shop: &ShopDomain,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.inner.api_key)
            .append_pair("scope", &scopes.join(","))
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", state)
            .finish();

        format!("{}/admin/oauth/authorize?{query}", self.origin(shop))
    }

    /// Verify the `hmac` of an OAuth redirect with this app's secret.
    pub fn verify_callback<'a, I>(&self, params: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
    {
        signature::verify_callback(params, self.inner.api_secret.expose_secret())
    }

    /// Sign arbitrary data with the app secret (hex HMAC-SHA256).
    ///
    /// Used for stateless OAuth `state` values.
    #[must_use]
    pub fn sign(&self, data: &str) -> String {
        signature::callback_signature([("data", data)], self.inner.api_secret.expose_secret())
    }

    /// Exchange an authorization code for a permanent access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if Shopify rejects the code and
    /// `ShopifyError::Http` if the request fails.
    #[instrument(skip(self, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessToken, ShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.origin(shop));

        let params = [
            ("client_id", self.inner.api_key.as_str()),
            ("client_secret", self.inner.api_secret.expose_secret()),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = truncate(response.text().await.unwrap_or_default());
            tracing::warn!(%status, body = %body, "Token exchange rejected");
            return Err(ShopifyError::OAuth(format!(
                "Token exchange failed ({status}): {body}"
            )));
        }

        let token: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| ShopifyError::Parse(e.to_string()))?;

        let scopes = token
            .scope
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        tracing::info!("Obtained Shopify access token");

        Ok(AccessToken {
            access_token: SecretString::from(token.access_token),
            scopes,
        })
    }

    /// Fetch the most recent orders of any status, at most
    /// [`ORDER_FETCH_LIMIT`].
    ///
    /// # Errors
    ///
    /// - `ShopifyError::Unauthorized` on 401 (token revoked or app uninstalled)
    /// - `ShopifyError::RateLimited` on 429; the caller reports it, nothing retries
    /// - `ShopifyError::Api` for any other non-success status
    /// - `ShopifyError::Parse` if the body does not decode
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn fetch_orders(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
        limit: u32,
    ) -> Result<Vec<OrderSummary>, ShopifyError> {
        let limit = limit.min(ORDER_FETCH_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("status", "any")
            .append_pair("limit", &limit.to_string())
            .finish();
        let url = format!(
            "{}/admin/api/{}/orders.json?{query}",
            self.origin(shop),
            self.inner.api_version
        );

        let response = self
            .inner
            .client
            .get(&url)
            .header("X-Shopify-Access-Token", access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => {
                return Err(ShopifyError::Unauthorized(
                    "Invalid API key or access token".to_string(),
                ));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<f64>().ok())
                    .map_or(2, retry_secs);
                tracing::warn!(retry_after, "Shopify rate limit hit");
                return Err(ShopifyError::RateLimited(retry_after));
            }
            s if !s.is_success() => {
                let body = truncate(response.text().await.unwrap_or_default());
                return Err(ShopifyError::Api {
                    status: s.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let body: OrdersResponse = response
            .json()
            .await
            .map_err(|e| ShopifyError::Parse(e.to_string()))?;

        let orders: Vec<OrderSummary> = body
            .orders
            .into_iter()
            .take(ORDER_FETCH_LIMIT as usize)
            .map(OrderSummary::from)
            .collect();

        tracing::debug!(count = orders.len(), "Fetched orders");
        Ok(orders)
    }
}

/// Shopify sends `Retry-After` as fractional seconds (e.g. `2.0`).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn retry_secs(secs: f64) -> u64 {
    secs.ceil().clamp(0.0, 3600.0) as u64
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
