//! Order summaries and the metrics derived from them.
//!
//! An [`OrderSummary`] is the flat projection of a Shopify order that the
//! dashboard renders in its table and hands to the assistant as context.
//! Summaries are fetched fresh on every page load and never stored.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Order financial status (from Shopify).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
    /// Payment is pending.
    Pending,
    /// Payment has been authorized but not captured.
    Authorized,
    /// Order has been partially paid.
    PartiallyPaid,
    /// Order has been paid in full.
    Paid,
    /// Order has been partially refunded.
    PartiallyRefunded,
    /// Order has been fully refunded.
    Refunded,
    /// Authorization was voided.
    Voided,
    /// Any status this version does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

impl FinancialStatus {
    /// Parse Shopify's `financial_status` string. Unrecognized values map to
    /// [`FinancialStatus::Unknown`].
    #[must_use]
    pub fn from_shopify(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "authorized" => Self::Authorized,
            "partially_paid" => Self::PartiallyPaid,
            "paid" => Self::Paid,
            "partially_refunded" => Self::PartiallyRefunded,
            "refunded" => Self::Refunded,
            "voided" => Self::Voided,
            _ => Self::Unknown,
        }
    }

    /// Snake-case key, as used by Shopify.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authorized => "authorized",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
            Self::Voided => "voided",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Authorized => "Authorized",
            Self::PartiallyPaid => "Partially paid",
            Self::Paid => "Paid",
            Self::PartiallyRefunded => "Partially refunded",
            Self::Refunded => "Refunded",
            Self::Voided => "Voided",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the order's total counts toward revenue.
    #[must_use]
    pub const fn counts_toward_revenue(self) -> bool {
        !matches!(self, Self::Refunded | Self::Voided)
    }

    /// Whether money has been collected.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid | Self::PartiallyRefunded)
    }

    /// Whether the order is still waiting on payment.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending | Self::Authorized | Self::PartiallyPaid)
    }
}

impl std::fmt::Display for FinancialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only projection of a Shopify order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Shopify numeric order ID.
    pub id: i64,
    /// Display name (e.g., "#1001").
    pub name: String,
    /// Order total including tax and shipping.
    pub total_price: Decimal,
    /// ISO 4217 currency code of `total_price`.
    pub currency: String,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// Number of line items on the order.
    pub item_count: u32,
    /// Payment state.
    pub financial_status: FinancialStatus,
}

/// Summary metrics over a set of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderMetrics {
    /// Number of orders considered.
    pub order_count: usize,
    /// Sum of totals for orders that count toward revenue.
    pub total_revenue: Decimal,
    /// `total_revenue` divided by the number of revenue orders, 2 dp.
    pub average_order_value: Decimal,
    /// Total line items across all orders.
    pub total_items: u64,
    /// Orders that are paid (fully or partially refunded).
    pub paid_count: usize,
    /// Orders still waiting on payment.
    pub pending_count: usize,
    /// Currency of the first order, `USD` when there are none.
    pub currency: String,
}

impl OrderMetrics {
    /// Default currency when no orders are available.
    pub const DEFAULT_CURRENCY: &'static str = "USD";

    /// Compute metrics over `orders`.
    #[must_use]
    pub fn from_orders(orders: &[OrderSummary]) -> Self {
        let revenue_orders: Vec<&OrderSummary> = orders
            .iter()
            .filter(|o| o.financial_status.counts_toward_revenue())
            .collect();

        let total_revenue: Decimal = revenue_orders.iter().map(|o| o.total_price).sum();
        let average_order_value = if revenue_orders.is_empty() {
            Decimal::ZERO
        } else {
            (total_revenue / Decimal::from(revenue_orders.len()))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };

        Self {
            order_count: orders.len(),
            total_revenue,
            average_order_value,
            total_items: orders.iter().map(|o| u64::from(o.item_count)).sum(),
            paid_count: orders
                .iter()
                .filter(|o| o.financial_status.is_paid())
                .count(),
            pending_count: orders
                .iter()
                .filter(|o| o.financial_status.is_pending())
                .count(),
            currency: orders.first().map_or_else(
                || Self::DEFAULT_CURRENCY.to_string(),
                |o| o.currency.clone(),
            ),
        }
    }
}
