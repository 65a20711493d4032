//! Dashboard page: connection form, metrics, orders table and the assistant.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use urbannue_core::{OrderMetrics, OrderSummary, ShopDomain};

use crate::filters;
use crate::middleware::RequireAccess;
use crate::models::session_keys;
use crate::services::{AnswerMode, DashboardData, load_dashboard};
use crate::state::AppState;

/// Metrics formatted for display.
#[derive(Debug, Clone)]
pub struct MetricsView {
    pub order_count: String,
    pub total_revenue: String,
    pub average_order_value: String,
    pub total_items: String,
    pub paid_count: String,
    pub pending_count: String,
}

impl From<&OrderMetrics> for MetricsView {
    fn from(metrics: &OrderMetrics) -> Self {
        Self {
            order_count: metrics.order_count.to_string(),
            total_revenue: format_money(metrics.total_revenue, &metrics.currency),
            average_order_value: format_money(metrics.average_order_value, &metrics.currency),
            total_items: metrics.total_items.to_string(),
            paid_count: metrics.paid_count.to_string(),
            pending_count: metrics.pending_count.to_string(),
        }
    }
}

/// One row of the orders table.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub total: String,
    pub item_count: u32,
    pub status: &'static str,
    pub status_label: &'static str,
}

impl From<&OrderSummary> for OrderRow {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id,
            name: order.name.clone(),
            created_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            total: format_money(order.total_price, &order.currency),
            item_count: order.item_count,
            status: order.financial_status.as_str(),
            status_label: order.financial_status.label(),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shop: Option<String>,
    pub metrics: MetricsView,
    pub orders: Vec<OrderRow>,
    pub notices: Vec<String>,
    pub error_message: Option<String>,
    pub success_message: Option<String>,
    pub question: String,
    pub answer: Option<String>,
    pub analysis_mode: bool,
}

impl DashboardTemplate {
    /// Page for `data` with an empty assistant panel.
    #[must_use]
    pub fn new(data: &DashboardData) -> Self {
        Self {
            shop: data.shop.as_ref().map(ToString::to_string),
            metrics: MetricsView::from(&data.metrics),
            orders: data.orders.iter().map(OrderRow::from).collect(),
            notices: data.notices.clone(),
            error_message: None,
            success_message: None,
            question: String::new(),
            answer: None,
            analysis_mode: false,
        }
    }

    /// Show a question and its answer.
    #[must_use]
    pub fn with_answer(mut self, question: String, answer: String, mode: AnswerMode) -> Self {
        self.question = question;
        self.answer = Some(answer);
        self.analysis_mode = mode == AnswerMode::Analysis;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub success: Option<String>,
    pub error: Option<String>,
    /// Store connected elsewhere (the standalone connector) to show here.
    pub shop: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// GET /
///
/// With `?shop=`, switches this session to a store whose token is already
/// stored, then redirects back to the plain page.
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    RequireAccess(_grant): RequireAccess,
    session: Session,
    Query(params): Query<DashboardQuery>,
) -> Response {
    if let Some(shop) = params.shop.as_deref() {
        return select_shop(&state, &session, shop).await.into_response();
    }

    let data = load_dashboard(&state, &session).await;

    let mut page = DashboardTemplate::new(&data);
    page.success_message = params.success.as_deref().map(success_message);
    page.error_message = params.error.as_deref().map(error_message);
    page.into_response()
}

async fn select_shop(state: &AppState, session: &Session, input: &str) -> Redirect {
    let Ok(shop) = ShopDomain::parse(input) else {
        return Redirect::to("/?error=invalid_shop");
    };

    match state.tokens().resolve(&shop).await {
        Ok(Some(_)) => {}
        Ok(None) => return Redirect::to("/?error=unknown_shop"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to look up shop token");
            return Redirect::to("/?error=unknown_shop");
        }
    }

    if let Err(e) = session.insert(session_keys::CONNECTED_SHOP, &shop).await {
        tracing::error!(error = %e, "Failed to remember connected shop");
        return Redirect::to("/?error=connect_failed");
    }

    tracing::info!(shop = %shop, "Switched to stored shop");
    Redirect::to("/?success=connected")
}

/// Amount with two decimals and its currency code, e.g. `USD 150.00`.
fn format_money(amount: Decimal, currency: &str) -> String {
    format!("{currency} {amount:.2}")
}

fn success_message(code: &str) -> String {
    match code {
        "connected" => "Store connected. Orders are loaded below.".to_string(),
        "disconnected" => "Store disconnected and its access token deleted.".to_string(),
        _ => format!("Success: {code}"),
    }
}

/// Map an error code from a redirect to the text shown on the page.
pub fn error_message(code: &str) -> String {
    match code {
        "invalid_shop" => "Enter a store domain like brand-name.myshopify.com.".to_string(),
        "connect_failed" => "Could not start the Shopify authorization. Please try again.".to_string(),
        "oauth_denied" => "The Shopify authorization was denied.".to_string(),
        "oauth_invalid_hmac" => "Invalid security signature. Please try again.".to_string(),
        "oauth_invalid_state" => "Invalid state parameter. Please try again.".to_string(),
        "oauth_failed" => "The Shopify authorization failed. Please try again.".to_string(),
        "oauth_exchange_failed" => "Failed to exchange the authorization code.".to_string(),
        "oauth_save_failed" => "Failed to save the access token.".to_string(),
        "disconnect_failed" => "Failed to disconnect the store.".to_string(),
        "unknown_shop" => "That store has not been connected yet.".to_string(),
        _ => format!("Error: {code}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::{DateTime, Utc};
    use urbannue_core::FinancialStatus;

    use super::*;

    fn order() -> OrderSummary {
        OrderSummary {
            id: 7,
            name: "#1007".to_string(),
            total_price: Decimal::from_str("150").unwrap(),
            currency: "CAD".to_string(),
            created_at: DateTime::parse_from_rfc3339("2026-05-04T09:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            item_count: 3,
            financial_status: FinancialStatus::PartiallyRefunded,
        }
    }

    #[test]
    fn test_format_money_pads_two_decimals() {
        assert_eq!(format_money(Decimal::from_str("150").unwrap(), "USD"), "USD 150.00");
        assert_eq!(format_money(Decimal::from_str("9.5").unwrap(), "EUR"), "EUR 9.50");
    }

    #[test]
    fn test_order_row() {
        let row = OrderRow::from(&order());
        assert_eq!(row.name, "#1007");
        assert_eq!(row.created_at, "2026-05-04 09:30");
        assert_eq!(row.total, "CAD 150.00");
        assert_eq!(row.status, "partially_refunded");
        assert_eq!(row.status_label, "Partially refunded");
    }

    #[test]
    fn test_error_message_codes() {
        assert_eq!(
            error_message("oauth_invalid_hmac"),
            "Invalid security signature. Please try again."
        );
        assert_eq!(error_message("teapot"), "Error: teapot");
        assert_eq!(success_message("teapot"), "Success: teapot");
    }

    #[test]
    fn test_dashboard_renders_orders_and_answer() {
        let orders = vec![order()];
        let data = DashboardData {
            shop: Some(ShopDomain::parse("brand").unwrap()),
            metrics: OrderMetrics::from_orders(&orders),
            orders,
            notices: vec!["Heads up".to_string()],
        };

        let html = DashboardTemplate::new(&data)
            .with_answer(
                "Biggest order?".to_string(),
                "<b>#1007</b>".to_string(),
                AnswerMode::Narrative,
            )
            .render()
            .unwrap();

        assert!(html.contains("brand.myshopify.com"));
        assert!(html.contains("#1007"));
        assert!(html.contains("CAD 150.00"));
        assert!(html.contains("Heads up"));
        assert!(html.contains("&#60;b&#62;#1007&#60;/b&#62;"));
        assert!(!html.contains("<b>#1007</b>"));
    }

    #[test]
    fn test_dashboard_without_shop_shows_connect_form() {
        let data = DashboardData {
            shop: None,
            orders: Vec::new(),
            metrics: OrderMetrics::from_orders(&[]),
            notices: Vec::new(),
        };

        let html = DashboardTemplate::new(&data).render().unwrap();
        assert!(html.contains("action=\"/shopify/connect\""));
        assert!(!html.contains("action=\"/assistant\""));
    }
}
