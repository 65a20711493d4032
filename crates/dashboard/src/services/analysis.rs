//! Analysis tools the assistant can call in [`AnswerMode::Analysis`].
//!
//! Every tool runs over the orders already fetched for the page, in
//! process. Nothing the model sends is executed; inputs are deserialized
//! into typed structs and anything else is rejected.
//!
//! [`AnswerMode::Analysis`]: super::assistant::AnswerMode::Analysis

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use urbannue_core::{FinancialStatus, OrderMetrics, OrderSummary};

use crate::claude::{ClaudeError, Tool};

const DEFAULT_TOP_ORDERS: usize = 5;
const MAX_TOP_ORDERS: usize = 20;

/// Tool definitions offered to the model.
#[must_use]
pub fn analysis_tools() -> Vec<Tool> {
    vec![order_metrics_tool(), group_orders_tool(), top_orders_tool()]
}

fn order_metrics_tool() -> Tool {
    Tool {
        name: "order_metrics".to_string(),
        description: "Compute summary metrics (order count, revenue, average order value, \
            items, paid and pending counts) over the loaded orders, optionally filtered by \
            payment status and creation date. USE THIS for totals and averages."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "financial_status": {
                    "type": "string",
                    "enum": ["pending", "authorized", "partially_paid", "paid",
                             "partially_refunded", "refunded", "voided"],
                    "description": "Only include orders with this payment status"
                },
                "created_after": {
                    "type": "string",
                    "description": "Only include orders created on or after this date (YYYY-MM-DD)"
                },
                "created_before": {
                    "type": "string",
                    "description": "Only include orders created before this date (YYYY-MM-DD)"
                }
            }
        }),
    }
}

fn group_orders_tool() -> Tool {
    Tool {
        name: "group_orders".to_string(),
        description: "Group the loaded orders by payment status or by day and return one \
            value per group. USE THIS for breakdowns and trends."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "by": {
                    "type": "string",
                    "enum": ["financial_status", "day"]
                },
                "metric": {
                    "type": "string",
                    "enum": ["count", "revenue", "items"],
                    "description": "count = number of orders, revenue = sum of totals \
                        (refunded and voided orders excluded), items = line items"
                }
            },
            "required": ["by", "metric"]
        }),
    }
}

fn top_orders_tool() -> Tool {
    Tool {
        name: "top_orders".to_string(),
        description: "Return the largest loaded orders by total price or by number of line items."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "by": {
                    "type": "string",
                    "enum": ["total_price", "item_count"]
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_TOP_ORDERS,
                    "description": "How many orders to return (default 5)"
                }
            },
            "required": ["by"]
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MetricsInput {
    financial_status: Option<FinancialStatus>,
    created_after: Option<NaiveDate>,
    created_before: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum GroupBy {
    FinancialStatus,
    Day,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum GroupMetric {
    Count,
    Revenue,
    Items,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupInput {
    by: GroupBy,
    metric: GroupMetric,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RankBy {
    TotalPrice,
    ItemCount,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TopInput {
    by: RankBy,
    limit: Option<usize>,
}

fn parse_input<T: DeserializeOwned>(
    tool: &str,
    input: &serde_json::Value,
) -> Result<T, ClaudeError> {
    // Models sometimes send `null` for tools without required fields.
    let value = if input.is_null() {
        json!({})
    } else {
        input.clone()
    };
    serde_json::from_value(value)
        .map_err(|e| ClaudeError::ToolExecution(format!("invalid input for {tool}: {e}")))
}

/// Executes analysis tools over a fixed set of orders.
pub struct OrderAnalyzer<'a> {
    orders: &'a [OrderSummary],
}

impl<'a> OrderAnalyzer<'a> {
    #[must_use]
    pub const fn new(orders: &'a [OrderSummary]) -> Self {
        Self { orders }
    }

    /// Run a tool and return its JSON result as a string.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::ToolExecution` for unknown tools and invalid input.
    pub fn execute(&self, name: &str, input: &serde_json::Value) -> Result<String, ClaudeError> {
        let result = match name {
            "order_metrics" => self.order_metrics(&parse_input(name, input)?)?,
            "group_orders" => self.group_orders(&parse_input(name, input)?),
            "top_orders" => self.top_orders(&parse_input(name, input)?)?,
            _ => {
                return Err(ClaudeError::ToolExecution(format!("unknown tool: {name}")));
            }
        };
        Ok(result.to_string())
    }

    fn order_metrics(&self, input: &MetricsInput) -> Result<serde_json::Value, ClaudeError> {
        if let (Some(after), Some(before)) = (input.created_after, input.created_before) {
            if after >= before {
                return Err(ClaudeError::ToolExecution(
                    "created_after must be earlier than created_before".to_string(),
                ));
            }
        }

        let filtered: Vec<OrderSummary> = self
            .orders
            .iter()
            .filter(|o| {
                input
                    .financial_status
                    .is_none_or(|status| o.financial_status == status)
            })
            .filter(|o| {
                input
                    .created_after
                    .is_none_or(|date| o.created_at.date_naive() >= date)
            })
            .filter(|o| {
                input
                    .created_before
                    .is_none_or(|date| o.created_at.date_naive() < date)
            })
            .cloned()
            .collect();

        let metrics = OrderMetrics::from_orders(&filtered);
        Ok(json!({
            "filters": {
                "financial_status": input.financial_status.map(FinancialStatus::as_str),
                "created_after": input.created_after,
                "created_before": input.created_before,
            },
            "metrics": metrics,
        }))
    }

    fn group_orders(&self, input: &GroupInput) -> serde_json::Value {
        let mut groups: BTreeMap<String, Decimal> = BTreeMap::new();

        for order in self.orders {
            let key = match input.by {
                GroupBy::FinancialStatus => order.financial_status.as_str().to_string(),
                GroupBy::Day => order.created_at.date_naive().to_string(),
            };
            let value = match input.metric {
                GroupMetric::Count => Decimal::ONE,
                GroupMetric::Revenue if order.financial_status.counts_toward_revenue() => {
                    order.total_price
                }
                GroupMetric::Revenue => Decimal::ZERO,
                GroupMetric::Items => Decimal::from(order.item_count),
            };
            *groups.entry(key).or_default() += value;
        }

        let rows: Vec<serde_json::Value> = groups
            .into_iter()
            .map(|(group, value)| json!({ "group": group, "value": value }))
            .collect();

        json!({
            "currency": currency_of(self.orders),
            "groups": rows,
        })
    }

    fn top_orders(&self, input: &TopInput) -> Result<serde_json::Value, ClaudeError> {
        let limit = input.limit.unwrap_or(DEFAULT_TOP_ORDERS);
        if !(1..=MAX_TOP_ORDERS).contains(&limit) {
            return Err(ClaudeError::ToolExecution(format!(
                "limit must be between 1 and {MAX_TOP_ORDERS}"
            )));
        }

        let mut ranked: Vec<&OrderSummary> = self.orders.iter().collect();
        match input.by {
            RankBy::TotalPrice => ranked.sort_by(|a, b| b.total_price.cmp(&a.total_price)),
            RankBy::ItemCount => ranked.sort_by(|a, b| b.item_count.cmp(&a.item_count)),
        }
        ranked.truncate(limit);

        Ok(json!({ "orders": ranked }))
    }
}

fn currency_of(orders: &[OrderSummary]) -> &str {
    orders
        .first()
        .map_or(OrderMetrics::DEFAULT_CURRENCY, |o| o.currency.as_str())
}
