//! Connected shop management.

use urbannue_core::ShopDomain;
use urbannue_dashboard::db::{ShopSessionRepository, ShopSessionSummary};

use super::{CommandError, connect};

/// Print every connected shop, most recently updated first.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let shops = ShopSessionRepository::new(&pool).list().await?;

    if shops.is_empty() {
        tracing::info!("No shops connected");
        return Ok(());
    }

    for shop in &shops {
        println!("{}", format_summary(shop));
    }
    Ok(())
}

/// Delete the stored token of `shop`.
///
/// Only the local record goes; the app stays installed at Shopify.
pub async fn forget(shop: &str) -> Result<(), CommandError> {
    let shop = ShopDomain::parse(shop)?;
    let pool = connect().await?;

    if ShopSessionRepository::new(&pool).delete(&shop).await? {
        tracing::info!(shop = %shop, "Shop forgotten");
    } else {
        tracing::warn!(shop = %shop, "No stored token for shop");
    }
    Ok(())
}

fn format_summary(shop: &ShopSessionSummary) -> String {
    let scopes = if shop.scopes.is_empty() {
        "-".to_string()
    } else {
        shop.scopes.join(",")
    };
    format!(
        "{:<40} {:<32} {}",
        shop.shop.as_str(),
        scopes,
        shop.updated_at.format("%Y-%m-%d %H:%M UTC")
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_format_summary() {
        let summary = ShopSessionSummary {
            shop: ShopDomain::parse("brand").unwrap(),
            scopes: vec!["read_orders".to_string()],
            updated_at: Utc.with_ymd_and_hms(2026, 6, 1, 8, 5, 0).unwrap(),
        };

        let line = format_summary(&summary);
        assert!(line.starts_with("brand.myshopify.com"));
        assert!(line.contains("read_orders"));
        assert!(line.ends_with("2026-06-01 08:05 UTC"));
    }

    #[test]
    fn test_format_summary_without_scopes() {
        let summary = ShopSessionSummary {
            shop: ShopDomain::parse("brand").unwrap(),
            scopes: Vec::new(),
            updated_at: Utc.with_ymd_and_hms(2026, 6, 1, 8, 5, 0).unwrap(),
        };
        assert!(format_summary(&summary).contains(" - "));
    }
}
