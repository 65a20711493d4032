//! Password gate.
//!
//! Every page except `/login` and the health checks requires an
//! [`AccessGrant`] in the session. The grant is the only thing login sets;
//! there are no user accounts.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tower_sessions::Session;

use crate::models::{AccessGrant, session_keys};

/// Extractor that requires the access password to have been entered.
///
/// Redirects to `/login` for pages and answers 401 for `/api/` requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAccess(_grant): RequireAccess) -> impl IntoResponse {
///     "only visible after login"
/// }
/// ```
pub struct RequireAccess(pub AccessGrant);

/// Rejection for [`RequireAccess`].
#[derive(Debug)]
pub enum AccessRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AccessRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAccess
where
    S: Send + Sync,
{
    type Rejection = AccessRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let rejection = if parts.uri.path().starts_with("/api/") {
            AccessRejection::Unauthorized
        } else {
            AccessRejection::RedirectToLogin
        };

        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(rejection);
        };

        let grant: AccessGrant = session
            .get(session_keys::ACCESS)
            .await
            .ok()
            .flatten()
            .ok_or(rejection)?;

        Ok(Self(grant))
    }
}

/// Compare a submitted password against the configured one in constant time.
#[must_use]
pub fn password_matches(candidate: &str, expected: &SecretString) -> bool {
    candidate
        .as_bytes()
        .ct_eq(expected.expose_secret().as_bytes())
        .into()
}

/// Record a successful login.
///
/// The session ID is cycled first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn grant_access(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::ACCESS, AccessGrant::now()).await
}

/// Log out: drop every value in the session and delete it from the store.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn revoke_access(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
