//! HMAC verification for Shopify OAuth redirects.
//!
//! Shopify signs the query string of the redirect back to the app: every
//! parameter except `hmac` (and the legacy `signature`), sorted by key,
//! joined as `key=value&key=value`, HMAC-SHA256 with the app secret, hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Build the message Shopify signs from the callback parameters.
fn signing_message<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = params
        .into_iter()
        .filter(|(k, _)| *k != "hmac" && *k != "signature")
        .collect();
    pairs.sort_unstable();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn keyed_mac(secret: &str) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes()).ok()
}

/// Hex HMAC-SHA256 signature Shopify would attach to `params`.
///
/// `hmac` and `signature` entries are ignored, so a full callback query can
/// be passed as is. Returns an empty string (which never verifies) if the
/// key is rejected.
pub fn callback_signature<'a, I>(params: I, secret: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let Some(mut mac) = keyed_mac(secret) else {
        return String::new();
    };
    mac.update(signing_message(params).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify the `hmac` parameter of an OAuth callback.
///
/// Returns `false` when the parameter is missing or not hex. The comparison
/// is constant-time.
pub fn verify_callback<'a, I>(params: I, secret: &str) -> bool
where
    I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
{
    let Some(provided) = params
        .clone()
        .into_iter()
        .find_map(|(k, v)| (k == "hmac").then_some(v))
    else {
        return false;
    };

    let Ok(provided) = hex::decode(provided) else {
        return false;
    };

    let Some(mut mac) = keyed_mac(secret) else {
        return false;
    };
    mac.update(signing_message(params).as_bytes());
    mac.verify_slice(&provided).is_ok()
}
