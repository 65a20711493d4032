//! Login and logout for the password gate.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::{grant_access, password_matches, revoke_access};
use crate::models::{AccessGrant, session_keys};
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Submitted login form. No `Debug`: it carries the password.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

fn login_error_message(code: &str) -> String {
    match code {
        "invalid" => "Incorrect access code.".to_string(),
        "session" => "Could not start a session. Please try again.".to_string(),
        _ => "Please enter the access code.".to_string(),
    }
}

/// GET /login
async fn login_page(session: Session, Query(query): Query<LoginQuery>) -> Response {
    let granted = session
        .get::<AccessGrant>(session_keys::ACCESS)
        .await
        .ok()
        .flatten()
        .is_some();
    if granted {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        error: query.error.as_deref().map(login_error_message),
    }
    .into_response()
}

/// POST /login
#[instrument(skip_all)]
async fn login(State(state): State<AppState>, session: Session, Form(form): Form<LoginForm>) -> Response {
    if !password_matches(&form.password, &state.config().access_password) {
        tracing::warn!("Rejected access code");
        return Redirect::to("/login?error=invalid").into_response();
    }

    if let Err(e) = grant_access(&session).await {
        tracing::error!(error = %e, "Failed to store access grant");
        return Redirect::to("/login?error=session").into_response();
    }

    tracing::info!("Dashboard unlocked");
    Redirect::to("/").into_response()
}

/// POST /logout
async fn logout(session: Session) -> Redirect {
    if let Err(e) = revoke_access(&session).await {
        tracing::warn!(error = %e, "Failed to clear session on logout");
    }
    Redirect::to("/login")
}
