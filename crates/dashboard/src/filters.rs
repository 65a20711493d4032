//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Badge class for a financial status key.
///
/// Usage in templates: `{{ order.status|status_class }}`
#[askama::filter_fn]
pub fn status_class(value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(badge_class(&value.to_string()))
}

fn badge_class(status: &str) -> &'static str {
    match status {
        "paid" => "badge badge-success",
        "pending" | "authorized" | "partially_paid" => "badge badge-warning",
        "refunded" | "partially_refunded" | "voided" => "badge badge-muted",
        _ => "badge",
    }
}
