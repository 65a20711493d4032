//! Wire types for the Shopify REST Admin API.
//!
//! Only the fields the dashboard reads are declared; serde ignores the rest.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use urbannue_core::{FinancialStatus, OrderSummary};

/// OAuth token response from `/admin/oauth/access_token`.
#[derive(Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub scope: String,
}

/// Envelope of `GET /admin/api/{version}/orders.json`.
#[derive(Debug, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<RestOrder>,
}

/// One order as returned by the REST API.
#[derive(Debug, Deserialize)]
pub struct RestOrder {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub total_price: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub line_items: Vec<RestLineItem>,
}

/// Line item; only counted.
#[derive(Debug, Deserialize)]
pub struct RestLineItem {
    #[serde(default)]
    pub quantity: u32,
}

impl From<RestOrder> for OrderSummary {
    fn from(order: RestOrder) -> Self {
        let item_count = u32::try_from(order.line_items.len()).unwrap_or(u32::MAX);
        Self {
            name: if order.name.is_empty() {
                format!("#{}", order.id)
            } else {
                order.name
            },
            id: order.id,
            total_price: order.total_price,
            currency: order
                .currency
                .unwrap_or_else(|| urbannue_core::OrderMetrics::DEFAULT_CURRENCY.to_string()),
            created_at: order.created_at,
            item_count,
            financial_status: order
                .financial_status
                .as_deref()
                .map_or(FinancialStatus::Unknown, FinancialStatus::from_shopify),
        }
    }
}
