//! Shopify Admin API client.
//!
//! Covers exactly what the dashboard needs from Shopify:
//!
//! - the OAuth authorization-code install flow ([`ShopifyClient::authorization_url`],
//!   [`ShopifyClient::exchange_code`], [`verify_callback`])
//! - the REST orders endpoint ([`ShopifyClient::fetch_orders`])
//!
//! # Security
//!
//! The client secret is posted to Shopify during the code exchange. Every
//! request goes to a [`ShopDomain`](urbannue_core::ShopDomain), which only
//! parses for `*.myshopify.com` hosts, so the secret cannot be sent elsewhere.

mod client;
mod signature;
pub mod types;

pub use client::{AccessToken, ORDER_FETCH_LIMIT, ShopifyClient};
pub use signature::{callback_signature, verify_callback};

use thiserror::Error;

/// Errors that can occur when talking to Shopify.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The authorization-code exchange was rejected.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// The stored access token was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("Shopify API returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ShopifyError {
    /// Short explanation suitable for a dashboard notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => "Shopify could not be reached.".to_string(),
            Self::OAuth(_) => "Shopify rejected the authorization.".to_string(),
            Self::Unauthorized(_) => {
                "Shopify rejected the stored access token. Reconnect the store.".to_string()
            }
            Self::RateLimited(secs) => {
                format!("Shopify is rate limiting requests. Try again in {secs} seconds.")
            }
            Self::Api { status, .. } => format!("Shopify returned an error (HTTP {status})."),
            Self::Parse(_) => "Shopify sent a response that could not be read.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::RateLimited(2);
        assert_eq!(err.to_string(), "Rate limited, retry after 2 seconds");

        let err = ShopifyError::Api {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Shopify API returned 404: Not Found");
    }

    #[test]
    fn test_user_message_does_not_leak_body() {
        let err = ShopifyError::Api {
            status: 500,
            body: "stack trace with secrets".to_string(),
        };
        let message = err.user_message();
        assert!(message.contains("500"));
        assert!(!message.contains("secrets"));
    }

    #[test]
    fn test_unauthorized_suggests_reconnect() {
        let err = ShopifyError::Unauthorized("Invalid API key or access token".to_string());
        assert!(err.user_message().contains("Reconnect"));
    }
}
