//! Connector HTTP routes.
//!
//! ```text
//! GET /install?shop=...   - Redirect to Shopify's permission page
//! GET /auth/callback      - Verify, exchange, store, redirect to the dashboard
//! GET /health             - Liveness
//! ```

use axum::{
    Router,
    extract::{Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;
use url::form_urlencoded;
use urbannue_core::ShopDomain;
use urbannue_dashboard::db::ShopSessionRepository;

use crate::ConnectorState;
use crate::oauth_state;

pub fn router(state: ConnectorState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/install", get(install))
        .route("/auth/callback", get(callback))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct InstallQuery {
    #[serde(default)]
    pub shop: String,
}

async fn health() -> &'static str {
    "ok"
}

/// Dashboard URL carrying `key=value`.
fn dashboard_redirect(state: &ConnectorState, key: &str, value: &str) -> Redirect {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish();
    Redirect::to(&format!("{}/?{query}", state.config().dashboard_url))
}

/// GET /install?shop=
#[instrument(skip_all)]
async fn install(State(state): State<ConnectorState>, Query(query): Query<InstallQuery>) -> Response {
    let shop = match ShopDomain::parse(&query.shop) {
        Ok(shop) => shop,
        Err(e) => {
            tracing::info!(input = %query.shop, error = %e, "Rejected shop domain");
            return (StatusCode::BAD_REQUEST, format!("Invalid shop: {e}")).into_response();
        }
    };

    let oauth_state = oauth_state::issue(state.shopify(), &shop, Utc::now());
    let shopify_config = &state.config().shopify;
    let auth_url = state.shopify().authorization_url(
        &shop,
        &shopify_config.redirect_uri,
        &shopify_config.scopes,
        &oauth_state,
    );

    tracing::info!(shop = %shop, "Redirecting to Shopify authorization");
    Redirect::to(&auth_url).into_response()
}

/// GET /auth/callback
///
/// The token is stored, never forwarded: the dashboard only learns which
/// shop to show.
#[instrument(skip_all)]
async fn callback(State(state): State<ConnectorState>, RawQuery(query): RawQuery) -> Redirect {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let get = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    };

    if let Some(error) = get("error") {
        tracing::warn!(error, "Shopify authorization denied");
        return dashboard_redirect(&state, "error", "oauth_denied");
    }

    if !state
        .shopify()
        .verify_callback(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    {
        tracing::error!("Invalid HMAC signature in OAuth callback");
        return dashboard_redirect(&state, "error", "oauth_invalid_hmac");
    }

    let (Some(code), Some(callback_state), Some(shop)) = (get("code"), get("state"), get("shop"))
    else {
        tracing::error!("OAuth callback is missing code, state or shop");
        return dashboard_redirect(&state, "error", "oauth_failed");
    };

    let Ok(shop) = ShopDomain::parse(shop) else {
        tracing::error!(shop, "OAuth callback for an invalid shop");
        return dashboard_redirect(&state, "error", "oauth_failed");
    };

    if !oauth_state::verify(state.shopify(), &shop, callback_state, Utc::now()) {
        tracing::error!(shop = %shop, "OAuth state invalid or expired");
        return dashboard_redirect(&state, "error", "oauth_invalid_state");
    }

    let token = match state.shopify().exchange_code(&shop, code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "Failed to exchange OAuth code");
            return dashboard_redirect(&state, "error", "oauth_exchange_failed");
        }
    };

    if let Err(e) = ShopSessionRepository::new(state.pool())
        .upsert(&shop, &token.access_token, &token.scopes)
        .await
    {
        tracing::error!(error = %e, "Failed to save Shopify token");
        return dashboard_redirect(&state, "error", "oauth_save_failed");
    }

    tracing::info!(shop = %shop, "Stored Shopify token");
    dashboard_redirect(&state, "shop", shop.as_str())
}
