//! Loads everything the dashboard page shows.
//!
//! Nothing here fails the request: each stage that goes wrong adds a
//! notice and the page renders with whatever was loaded.

use tower_sessions::Session;
use tracing::{instrument, warn};
use urbannue_core::{OrderMetrics, OrderSummary, ShopDomain};

use crate::models::session_keys;
use crate::shopify::{ORDER_FETCH_LIMIT, ShopifyError};
use crate::state::AppState;
use crate::tokens::TokenCache;

/// Data behind one dashboard render.
#[derive(Debug, Clone)]
pub struct DashboardData {
    /// Store shown, if one is connected in this session.
    pub shop: Option<ShopDomain>,
    /// Orders, newest first, at most [`ORDER_FETCH_LIMIT`].
    pub orders: Vec<OrderSummary>,
    /// Metrics over `orders`.
    pub metrics: OrderMetrics,
    /// Problems to show above the metrics.
    pub notices: Vec<String>,
}

impl DashboardData {
    fn new(shop: Option<ShopDomain>) -> Self {
        Self {
            shop,
            orders: Vec::new(),
            metrics: OrderMetrics::from_orders(&[]),
            notices: Vec::new(),
        }
    }
}

/// The store connected in this browser session, if any.
pub async fn connected_shop(session: &Session) -> Option<ShopDomain> {
    match session.get::<ShopDomain>(session_keys::CONNECTED_SHOP).await {
        Ok(shop) => shop,
        Err(e) => {
            warn!(error = %e, "Failed to read connected shop from session");
            None
        }
    }
}

/// Drop every process-local trace of `shop` after its stored token is gone:
/// the cached token and, if it is the one shown, the session's shop.
pub async fn forget_connection(tokens: &TokenCache, session: &Session, shop: &ShopDomain) {
    tokens.invalidate(shop).await;

    if connected_shop(session).await.as_ref() != Some(shop) {
        return;
    }
    if let Err(e) = session
        .remove::<ShopDomain>(session_keys::CONNECTED_SHOP)
        .await
    {
        warn!(error = %e, "Failed to clear connected shop");
    }
}

/// Resolve the connected store's token and fetch its orders.
#[instrument(skip(state, session))]
pub async fn load_dashboard(state: &AppState, session: &Session) -> DashboardData {
    let Some(shop) = connected_shop(session).await else {
        return DashboardData::new(None);
    };

    let mut data = DashboardData::new(Some(shop.clone()));

    let token = match state.tokens().resolve(&shop).await {
        Ok(Some(token)) => token,
        Ok(None) => {
            data.notices.push(format!(
                "No access token is stored for {shop}. Connect the store again."
            ));
            return data;
        }
        Err(e) => {
            warn!(error = %e, "Failed to load access token");
            data.notices
                .push("The stored access token could not be loaded.".to_string());
            return data;
        }
    };

    match state
        .shopify()
        .fetch_orders(&shop, &token, ORDER_FETCH_LIMIT)
        .await
    {
        Ok(orders) => {
            data.metrics = OrderMetrics::from_orders(&orders);
            data.orders = orders;
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch orders");
            if matches!(e, ShopifyError::Unauthorized(_)) {
                state.tokens().invalidate(&shop).await;
            }
            data.notices.push(e.user_message());
        }
    }

    data
}
