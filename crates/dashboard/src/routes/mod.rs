//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Database round trip
//!
//! # Password gate
//! GET  /login                  - Access code form
//! POST /login                  - Check the code and unlock the session
//! POST /logout                 - Clear the session
//!
//! # Dashboard (gated)
//! GET  /                       - Connection form, metrics and orders
//!
//! # Shopify OAuth (gated)
//! POST /shopify/connect        - Start OAuth for a store domain
//! GET  /shopify/callback       - Verify and exchange the code
//! POST /shopify/disconnect     - Delete the stored token
//!
//! # Assistant (gated)
//! POST /assistant              - Answer a question, render the page
//! POST /api/assistant/stream   - Answer a question as server-sent events
//! ```

use axum::Router;
use tower_http::services::ServeDir;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;

pub mod assistant;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod shopify;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/dashboard/static";

/// All dashboard routes, without state or layers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(shopify::router())
        .merge(assistant::router())
}

/// Routes plus static files and sessions, ready to serve.
///
/// Generic over the session store so tests can use an in-memory one.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes()
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(sessions)
        .with_state(state)
}
