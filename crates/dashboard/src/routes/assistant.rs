//! Assistant routes: ask a question about the loaded orders.

use std::convert::Infallible;

use axum::{
    Form, Json, Router,
    extract::State,
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::post,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAccess;
use crate::services::{AnswerMode, AssistantError, DashboardData, load_dashboard};
use crate::state::AppState;

use super::dashboard::DashboardTemplate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/assistant", post(ask))
        .route("/api/assistant/stream", post(ask_stream))
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub mode: AnswerMode,
}

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    pub question: String,
}

const NO_SHOP: &str = "Connect a Shopify store before asking a question.";

/// Why a question cannot be sent for the loaded data, if it cannot.
fn unanswerable(data: &DashboardData) -> Option<&'static str> {
    if data.shop.is_none() {
        Some(NO_SHOP)
    } else if data.orders.is_empty() && !data.notices.is_empty() {
        Some("The orders could not be loaded, so there is nothing to ask about yet.")
    } else {
        None
    }
}

/// POST /assistant
///
/// Reloads the orders and renders the dashboard with the answer. Failures
/// become the answer text.
#[instrument(skip_all)]
async fn ask(
    State(state): State<AppState>,
    RequireAccess(_grant): RequireAccess,
    session: Session,
    Form(form): Form<AskForm>,
) -> Response {
    let data = load_dashboard(&state, &session).await;

    let answer = match (&data.shop, unanswerable(&data)) {
        (Some(shop), None) => {
            state
                .assistant()
                .answer_or_message(shop, &data.orders, &form.question, form.mode)
                .await
        }
        (_, reason) => reason.unwrap_or(NO_SHOP).to_string(),
    };

    DashboardTemplate::new(&data)
        .with_answer(form.question, answer, form.mode)
        .into_response()
}

/// POST /api/assistant/stream
///
/// Server-sent events: `delta` events carry answer text as it is generated,
/// then one `done` event. A failure at any point is a single `error` event
/// with displayable text. `delta` and `error` data is a JSON string.
#[instrument(skip_all)]
async fn ask_stream(
    State(state): State<AppState>,
    RequireAccess(_grant): RequireAccess,
    session: Session,
    Json(request): Json<StreamRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let data = load_dashboard(&state, &session).await;
    if let Some(reason) = unanswerable(&data) {
        return Err(AppError::BadRequest(reason.to_string()));
    }
    let DashboardData { shop, orders, .. } = data;
    let Some(shop) = shop else {
        return Err(AppError::BadRequest(NO_SHOP.to_string()));
    };

    let assistant = state.assistant().clone();
    let question = request.question;

    let events = async_stream::stream! {
        match assistant.stream_answer(&shop, &orders, &question).await {
            Ok(deltas) => {
                let mut deltas = std::pin::pin!(deltas);
                let mut failed = false;
                while let Some(delta) = deltas.next().await {
                    match delta {
                        Ok(text) => yield Ok(text_event("delta", &text)),
                        Err(e) => {
                            tracing::warn!(error = %e, "Assistant stream failed");
                            yield Ok(error_event(&AssistantError::Claude(e)));
                            failed = true;
                            break;
                        }
                    }
                }
                if !failed {
                    yield Ok(Event::default().event("done").data(""));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Assistant stream could not start");
                yield Ok(error_event(&e));
            }
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// SSE event whose data is `text` as a JSON string, so line breaks in the
/// model output never split or end a data line.
fn text_event(name: &str, text: &str) -> Event {
    Event::default().event(name).data(encode_text(text))
}

fn encode_text(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

fn error_event(error: &AssistantError) -> Event {
    text_event("error", &error.user_message())
}
