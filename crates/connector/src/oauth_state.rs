//! Signed, self-expiring OAuth `state` values.
//!
//! Format: `{issued_at}.{nonce}.{signature}` where the signature is the
//! app-secret HMAC of `{shop}|{issued_at}|{nonce}`. A state is only valid
//! for the shop it was issued for.

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use urbannue_core::ShopDomain;
use urbannue_dashboard::shopify::ShopifyClient;

/// How long an install link stays usable, in seconds.
pub const STATE_TTL_SECS: i64 = 10 * 60;

fn signing_input(shop: &ShopDomain, issued_at: i64, nonce: &str) -> String {
    format!("{shop}|{issued_at}|{nonce}")
}

/// Issue a state for `shop` at `now`.
#[must_use]
pub fn issue(shopify: &ShopifyClient, shop: &ShopDomain, now: DateTime<Utc>) -> String {
    let issued_at = now.timestamp();
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let signature = shopify.sign(&signing_input(shop, issued_at, &nonce));
    format!("{issued_at}.{nonce}.{signature}")
}

/// Check that `state` was issued by [`issue`] for `shop` and has not expired.
#[must_use]
pub fn verify(shopify: &ShopifyClient, shop: &ShopDomain, state: &str, now: DateTime<Utc>) -> bool {
    let mut parts = state.splitn(3, '.');
    let (Some(issued_at), Some(nonce), Some(signature)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(issued_at) = issued_at.parse::<i64>() else {
        return false;
    };

    let age = now.timestamp() - issued_at;
    if !(0..=STATE_TTL_SECS).contains(&age) {
        return false;
    }

    let expected = shopify.sign(&signing_input(shop, issued_at, nonce));
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use secrecy::SecretString;
    use urbannue_dashboard::config::ShopifyConfig;

    use super::*;

    fn client(secret: &str) -> ShopifyClient {
        ShopifyClient::new(&ShopifyConfig {
            api_key: "key".to_string(),
            api_secret: SecretString::from(secret),
            api_version: "2024-01".to_string(),
            scopes: vec!["read_orders".to_string()],
            redirect_uri: "http://localhost:8000/auth/callback".to_string(),
            admin_origin: None,
        })
        .unwrap()
    }

    #[test]
    fn test_issued_state_verifies() {
        let shopify = client("k7Pq2mZx9");
        let shop = ShopDomain::parse("brand").unwrap();
        let now = Utc::now();

        let state = issue(&shopify, &shop, now);
        assert!(verify(&shopify, &shop, &state, now + Duration::seconds(30)));
    }

    #[test]
    fn test_state_bound_to_shop() {
        let shopify = client("k7Pq2mZx9");
        let now = Utc::now();
        let state = issue(&shopify, &ShopDomain::parse("brand").unwrap(), now);

        assert!(!verify(&shopify, &ShopDomain::parse("other").unwrap(), &state, now));
    }

    #[test]
    fn test_state_expires() {
        let shopify = client("k7Pq2mZx9");
        let shop = ShopDomain::parse("brand").unwrap();
        let now = Utc::now();
        let state = issue(&shopify, &shop, now);

        assert!(!verify(
            &shopify,
            &shop,
            &state,
            now + Duration::seconds(STATE_TTL_SECS + 1)
        ));
        assert!(!verify(&shopify, &shop, &state, now - Duration::seconds(5)));
    }

    #[test]
    fn test_state_from_other_secret_rejected() {
        let shop = ShopDomain::parse("brand").unwrap();
        let now = Utc::now();
        let state = issue(&client("k7Pq2mZx9"), &shop, now);

        assert!(!verify(&client("Zr8wN3vb1"), &shop, &state, now));
    }

    #[test]
    fn test_malformed_state_rejected() {
        let shopify = client("k7Pq2mZx9");
        let shop = ShopDomain::parse("brand").unwrap();
        let now = Utc::now();

        assert!(!verify(&shopify, &shop, "", now));
        assert!(!verify(&shopify, &shop, "abc", now));
        assert!(!verify(&shopify, &shop, "notanumber.n.sig", now));
    }
}
