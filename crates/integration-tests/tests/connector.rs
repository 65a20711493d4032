//! The standalone install/callback service.

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use chrono::{Duration, Utc};
use secrecy::SecretString;
use serde_json::json;
use tower::ServiceExt;
use url::Url;
use urbannue_connector::{ConnectorState, config::ConnectorConfig, oauth_state, routes};
use urbannue_core::ShopDomain;
use urbannue_integration_tests::{
    SHOPIFY_API_KEY, body_text, location, shopify_config, signed_query, unreachable_pool,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DASHBOARD_URL: &str = "http://dashboard.test";
const REDIRECT_URI: &str = "http://connector.test/auth/callback";

struct Connector {
    router: Router,
    state: ConnectorState,
    shopify: MockServer,
}

impl Connector {
    async fn spawn() -> Self {
        let shopify = MockServer::start().await;
        let config = ConnectorConfig {
            database_url: SecretString::from("postgres://127.0.0.1:1/urbannue_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8000,
            dashboard_url: DASHBOARD_URL.to_string(),
            shopify: shopify_config(&shopify.uri(), REDIRECT_URI),
        };
        let state = ConnectorState::new(config, unreachable_pool()).unwrap();

        Self {
            router: routes::router(state.clone()),
            state,
            shopify,
        }
    }

    async fn get(&self, uri: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn state_for(&self, shop: &str) -> String {
        let shop = ShopDomain::parse(shop).unwrap();
        oauth_state::issue(self.state.shopify(), &shop, Utc::now())
    }

    async fn mount_token_exchange(&self) {
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "shpat_connector",
                "scope": "read_orders"
            })))
            .mount(&self.shopify)
            .await;
    }
}

#[tokio::test]
async fn test_health() {
    let connector = Connector::spawn().await;
    let response = connector.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_install_redirects_with_signed_state() {
    let connector = Connector::spawn().await;

    let response = connector.get("/install?shop=brand").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let url = Url::parse(&location(&response)).unwrap();
    let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], SHOPIFY_API_KEY);
    assert_eq!(params["redirect_uri"], REDIRECT_URI);

    let shop = ShopDomain::parse("brand").unwrap();
    assert!(oauth_state::verify(
        connector.state.shopify(),
        &shop,
        &params["state"],
        Utc::now()
    ));
}

#[tokio::test]
async fn test_install_rejects_invalid_shop() {
    let connector = Connector::spawn().await;

    let response = connector.get("/install?shop=brand.example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.starts_with("Invalid shop"));

    let response = connector.get("/install").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_denied() {
    let connector = Connector::spawn().await;

    let response = connector
        .get("/auth/callback?error=access_denied&shop=brand.myshopify.com")
        .await;
    assert_eq!(location(&response), "http://dashboard.test/?error=oauth_denied");
}

#[tokio::test]
async fn test_callback_rejects_bad_hmac() {
    let connector = Connector::spawn().await;
    let state = connector.state_for("brand");

    let response = connector
        .get(&format!(
            "/auth/callback?code=abc&shop=brand.myshopify.com&state={state}&hmac=00ff"
        ))
        .await;
    assert_eq!(
        location(&response),
        "http://dashboard.test/?error=oauth_invalid_hmac"
    );
}

#[tokio::test]
async fn test_callback_rejects_state_for_other_shop() {
    let connector = Connector::spawn().await;
    let state = connector.state_for("other-brand");

    let query = signed_query(&[
        ("code", "abc"),
        ("shop", "brand.myshopify.com"),
        ("state", &state),
    ]);
    let response = connector.get(&format!("/auth/callback?{query}")).await;
    assert_eq!(
        location(&response),
        "http://dashboard.test/?error=oauth_invalid_state"
    );
}

#[tokio::test]
async fn test_callback_rejects_expired_state() {
    let connector = Connector::spawn().await;
    let shop = ShopDomain::parse("brand").unwrap();
    let issued = Utc::now() - Duration::seconds(oauth_state::STATE_TTL_SECS + 60);
    let state = oauth_state::issue(connector.state.shopify(), &shop, issued);

    let query = signed_query(&[
        ("code", "abc"),
        ("shop", "brand.myshopify.com"),
        ("state", &state),
    ]);
    let response = connector.get(&format!("/auth/callback?{query}")).await;
    assert_eq!(
        location(&response),
        "http://dashboard.test/?error=oauth_invalid_state"
    );
}

#[tokio::test]
async fn test_callback_exchange_failure() {
    let connector = Connector::spawn().await;
    Mock::given(method("POST"))
        .and(path("/admin/oauth/access_token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid code"))
        .mount(&connector.shopify)
        .await;

    let state = connector.state_for("brand");
    let query = signed_query(&[
        ("code", "abc"),
        ("shop", "brand.myshopify.com"),
        ("state", &state),
    ]);
    let response = connector.get(&format!("/auth/callback?{query}")).await;
    assert_eq!(
        location(&response),
        "http://dashboard.test/?error=oauth_exchange_failed"
    );
}

#[tokio::test]
async fn test_callback_reports_save_failure() {
    let connector = Connector::spawn().await;
    connector.mount_token_exchange().await;

    let state = connector.state_for("brand");
    let query = signed_query(&[
        ("code", "abc"),
        ("shop", "brand.myshopify.com"),
        ("state", &state),
        ("timestamp", "1780000000"),
    ]);
    let response = connector.get(&format!("/auth/callback?{query}")).await;

    // The pool never connects, so the token cannot be stored
    assert_eq!(
        location(&response),
        "http://dashboard.test/?error=oauth_save_failed"
    );
    assert!(!location(&response).contains("shpat_connector"));
}
