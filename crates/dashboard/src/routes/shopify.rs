//! Shopify OAuth routes: connect a store to this browser session.
//!
//! All three routes sit behind the password gate, the callback included:
//! an authorization code is only exchanged for a browser that has unlocked
//! the dashboard and started the install itself.

use axum::{
    Form, Router,
    extract::{RawQuery, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::form_urlencoded;
use urbannue_core::ShopDomain;

use crate::db::ShopSessionRepository;
use crate::middleware::RequireAccess;
use crate::models::{PendingOAuth, session_keys};
use crate::services::{connected_shop, forget_connection};
use crate::state::AppState;

/// Build the Shopify OAuth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shopify/connect", post(connect))
        .route("/shopify/callback", get(callback))
        .route("/shopify/disconnect", post(disconnect))
}

#[derive(Debug, Deserialize)]
pub struct ConnectForm {
    #[serde(default)]
    pub shop: String,
}

/// Query parameters of the OAuth redirect, kept in order for the HMAC.
#[derive(Debug, Default)]
pub struct CallbackParams {
    pairs: Vec<(String, String)>,
}

impl CallbackParams {
    /// Decode a raw query string.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    /// First value of `key`, if present and non-empty.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &str)> + Clone {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn redirect_error(code: &str) -> Redirect {
    Redirect::to(&format!("/?error={code}"))
}

/// POST /shopify/connect - Start OAuth for the submitted store.
#[instrument(skip_all)]
async fn connect(
    State(state): State<AppState>,
    RequireAccess(_grant): RequireAccess,
    session: Session,
    Form(form): Form<ConnectForm>,
) -> Redirect {
    let shop = match ShopDomain::parse(&form.shop) {
        Ok(shop) => shop,
        Err(e) => {
            tracing::info!(input = %form.shop, error = %e, "Rejected shop domain");
            return redirect_error("invalid_shop");
        }
    };

    let pending = PendingOAuth {
        state: uuid::Uuid::new_v4().simple().to_string(),
        shop,
    };

    if let Err(e) = session.insert(session_keys::PENDING_OAUTH, &pending).await {
        tracing::error!(error = %e, "Failed to store OAuth state");
        return redirect_error("connect_failed");
    }

    let shopify_config = &state.config().shopify;
    let auth_url = state.shopify().authorization_url(
        &pending.shop,
        &shopify_config.redirect_uri,
        &shopify_config.scopes,
        &pending.state,
    );

    tracing::info!(shop = %pending.shop, "Redirecting to Shopify authorization");
    Redirect::to(&auth_url)
}

/// GET /shopify/callback - Finish OAuth and remember the store.
#[instrument(skip_all)]
async fn callback(
    State(state): State<AppState>,
    RequireAccess(_grant): RequireAccess,
    session: Session,
    RawQuery(query): RawQuery,
) -> Redirect {
    let params = CallbackParams::parse(query.as_deref().unwrap_or_default());

    if let Some(error) = params.get("error") {
        let description = params.get("error_description").unwrap_or_default();
        tracing::warn!(error, description, "Shopify authorization denied");
        return redirect_error("oauth_denied");
    }

    if !state.shopify().verify_callback(params.iter()) {
        tracing::error!("Invalid HMAC signature in OAuth callback");
        return redirect_error("oauth_invalid_hmac");
    }

    let (Some(code), Some(callback_state), Some(shop_param)) =
        (params.get("code"), params.get("state"), params.get("shop"))
    else {
        tracing::error!("OAuth callback is missing code, state or shop");
        return redirect_error("oauth_failed");
    };

    // Single use: the pending install is gone whatever happens next.
    let pending = session
        .remove::<PendingOAuth>(session_keys::PENDING_OAUTH)
        .await
        .ok()
        .flatten();

    let Some(pending) = pending.filter(|p| p.state == callback_state) else {
        tracing::error!("OAuth state mismatch");
        return redirect_error("oauth_invalid_state");
    };

    if ShopDomain::parse(shop_param).ok().as_ref() != Some(&pending.shop) {
        tracing::error!(shop = shop_param, expected = %pending.shop, "OAuth shop mismatch");
        return redirect_error("oauth_invalid_state");
    }
    let shop = pending.shop;

    let token = match state.shopify().exchange_code(&shop, code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "Failed to exchange OAuth code");
            return redirect_error("oauth_exchange_failed");
        }
    };

    if let Err(e) = ShopSessionRepository::new(state.pool())
        .upsert(&shop, &token.access_token, &token.scopes)
        .await
    {
        tracing::error!(error = %e, "Failed to save Shopify token");
        return redirect_error("oauth_save_failed");
    }

    state
        .tokens()
        .insert(shop.clone(), token.access_token)
        .await;

    if let Err(e) = session.insert(session_keys::CONNECTED_SHOP, &shop).await {
        tracing::error!(error = %e, "Failed to remember connected shop");
        return redirect_error("oauth_failed");
    }

    tracing::info!(shop = %shop, scopes = ?token.scopes, "Connected Shopify store");
    Redirect::to("/?success=connected")
}

/// POST /shopify/disconnect - Delete the stored token and forget the store.
#[instrument(skip_all)]
async fn disconnect(
    State(state): State<AppState>,
    RequireAccess(_grant): RequireAccess,
    session: Session,
) -> Redirect {
    let Some(shop) = connected_shop(&session).await else {
        return Redirect::to("/");
    };

    if let Err(e) = ShopSessionRepository::new(state.pool()).delete(&shop).await {
        tracing::error!(error = %e, "Failed to delete Shopify token");
        return redirect_error("disconnect_failed");
    }

    forget_connection(state.tokens(), &session, &shop).await;

    tracing::info!(shop = %shop, "Disconnected Shopify store");
    Redirect::to("/?success=disconnected")
}
