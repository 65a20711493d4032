//! Store assistant: forwards a question plus the fetched orders to Claude.
//!
//! Two answer modes:
//!
//! - [`AnswerMode::Narrative`]: one request, the model reads the order table
//!   from the system prompt and answers in prose.
//! - [`AnswerMode::Analysis`]: the model may call the tools in
//!   [`super::analysis`], which compute over the same orders in process.

use askama::Template;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use urbannue_core::{OrderMetrics, OrderSummary, ShopDomain};

use crate::claude::{
    ClaudeClient, ClaudeError, ContentBlock, ContentBlockDelta, Message, StopReason, StreamEvent,
};

use super::analysis::{OrderAnalyzer, analysis_tools};

/// Maximum number of tool use rounds before giving up.
pub const MAX_TOOL_ITERATIONS: usize = 5;

/// Questions longer than this are rejected before any API call.
pub const MAX_QUESTION_CHARS: usize = 2000;

/// System prompt for the assistant.
#[derive(Template)]
#[template(path = "assistant/system_prompt.txt")]
struct SystemPromptTemplate<'a> {
    shop: &'a str,
    today: String,
    metrics: &'a OrderMetrics,
    orders_json: String,
    analysis: bool,
}

/// How the assistant should answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Prose answer from the order table in the prompt.
    #[default]
    Narrative,
    /// Prose answer backed by in-process analysis tools.
    Analysis,
}

impl AnswerMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::Analysis => "analysis",
        }
    }
}

/// Errors that can occur while answering a question.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// The question is empty or whitespace.
    #[error("question is empty")]
    EmptyQuestion,

    /// The question exceeds [`MAX_QUESTION_CHARS`].
    #[error("question is longer than {MAX_QUESTION_CHARS} characters")]
    QuestionTooLong,

    /// Claude API error.
    #[error("Claude API error: {0}")]
    Claude(#[from] ClaudeError),

    /// The model kept requesting tools.
    #[error("too many tool iterations")]
    TooManyToolIterations,

    /// The model finished without any text.
    #[error("the model returned no text")]
    EmptyAnswer,

    /// The system prompt could not be built.
    #[error("prompt error: {0}")]
    Prompt(String),
}

impl AssistantError {
    /// Text shown to the user in place of an answer.
    #[must_use]
    pub fn user_message(&self) -> String {
        let reason = match self {
            Self::EmptyQuestion => "please type a question first".to_string(),
            Self::QuestionTooLong => {
                format!("questions are limited to {MAX_QUESTION_CHARS} characters")
            }
            Self::Claude(e) => e.user_message(),
            Self::TooManyToolIterations => "the analysis took too many steps".to_string(),
            Self::EmptyAnswer => "the AI service returned an empty answer".to_string(),
            Self::Prompt(_) => "the order data could not be prepared".to_string(),
        };
        format!("The assistant could not answer: {reason}.")
    }
}

/// The store assistant.
#[derive(Clone)]
pub struct Assistant {
    claude: ClaudeClient,
}

impl Assistant {
    #[must_use]
    pub const fn new(claude: ClaudeClient) -> Self {
        Self { claude }
    }

    /// Answer `question` about `orders`.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::EmptyQuestion` or `QuestionTooLong` before any
    /// API call, and `Claude`, `TooManyToolIterations` or `EmptyAnswer` when
    /// the round trip fails.
    #[instrument(skip(self, orders, question), fields(shop = %shop, orders = orders.len(), mode = mode.as_str()))]
    pub async fn ask(
        &self,
        shop: &ShopDomain,
        orders: &[OrderSummary],
        question: &str,
        mode: AnswerMode,
    ) -> Result<String, AssistantError> {
        let question = validate_question(question)?;
        let system = render_system_prompt(shop, orders, mode)?;
        let messages = vec![Message::user(question)];

        let answer = match mode {
            AnswerMode::Narrative => {
                let response = self.claude.chat(messages, Some(system), None).await?;
                response.text()
            }
            AnswerMode::Analysis => self.run_tool_loop(messages, system, orders).await?,
        };

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AssistantError::EmptyAnswer);
        }

        info!(chars = answer.len(), "Assistant answered");
        Ok(answer.to_string())
    }

    /// Like [`ask`](Self::ask), but a failure becomes the text to display.
    pub async fn answer_or_message(
        &self,
        shop: &ShopDomain,
        orders: &[OrderSummary],
        question: &str,
        mode: AnswerMode,
    ) -> String {
        match self.ask(shop, orders, question, mode).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Assistant failed");
                e.user_message()
            }
        }
    }

    /// Stream a narrative answer as text fragments.
    ///
    /// # Errors
    ///
    /// Returns an error if the question is invalid or the request cannot be
    /// started. Errors after that are yielded as stream items.
    #[instrument(skip(self, orders, question), fields(shop = %shop, orders = orders.len()))]
    pub async fn stream_answer(
        &self,
        shop: &ShopDomain,
        orders: &[OrderSummary],
        question: &str,
    ) -> Result<impl Stream<Item = Result<String, ClaudeError>>, AssistantError> {
        let question = validate_question(question)?;
        let system = render_system_prompt(shop, orders, AnswerMode::Narrative)?;

        let events = self
            .claude
            .chat_stream(vec![Message::user(question)], Some(system), None)
            .await?;

        Ok(events.filter_map(|event| {
            futures::future::ready(match event {
                Ok(StreamEvent::ContentBlockDelta {
                    delta: ContentBlockDelta::TextDelta { text },
                    ..
                }) => Some(Ok(text)),
                Ok(StreamEvent::Error { error }) => Some(Err(ClaudeError::Api {
                    error_type: error.error_type,
                    message: error.message,
                })),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
        }))
    }

    /// Call Claude with the analysis tools until it stops asking for them.
    async fn run_tool_loop(
        &self,
        mut messages: Vec<Message>,
        system: String,
        orders: &[OrderSummary],
    ) -> Result<String, AssistantError> {
        let tools = analysis_tools();
        let analyzer = OrderAnalyzer::new(orders);

        for iteration in 1..=MAX_TOOL_ITERATIONS {
            let response = self
                .claude
                .chat(messages.clone(), Some(system.clone()), Some(tools.clone()))
                .await?;

            if response.stop_reason != Some(StopReason::ToolUse) {
                return Ok(response.text());
            }

            let results: Vec<ContentBlock> = response
                .tool_uses()
                .map(|(id, name, input)| {
                    let (content, is_error) = match analyzer.execute(name, input) {
                        Ok(result) => (result, None),
                        Err(e) => {
                            warn!(tool = name, error = %e, "Analysis tool failed");
                            (e.to_string(), Some(true))
                        }
                    };
                    info!(tool = name, iteration, "Analysis tool executed");
                    ContentBlock::ToolResult {
                        tool_use_id: id.to_string(),
                        content,
                        is_error,
                    }
                })
                .collect();

            if results.is_empty() {
                return Ok(response.text());
            }

            messages.push(Message::assistant_blocks(response.content));
            messages.push(Message::tool_results(results));
        }

        warn!("Too many tool iterations, stopping");
        Err(AssistantError::TooManyToolIterations)
    }
}

fn validate_question(question: &str) -> Result<&str, AssistantError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AssistantError::EmptyQuestion);
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(AssistantError::QuestionTooLong);
    }
    Ok(question)
}

fn render_system_prompt(
    shop: &ShopDomain,
    orders: &[OrderSummary],
    mode: AnswerMode,
) -> Result<String, AssistantError> {
    let metrics = OrderMetrics::from_orders(orders);
    let orders_json =
        serde_json::to_string(orders).map_err(|e| AssistantError::Prompt(e.to_string()))?;

    SystemPromptTemplate {
        shop: shop.as_str(),
        today: chrono::Utc::now().date_naive().to_string(),
        metrics: &metrics,
        orders_json,
        analysis: mode == AnswerMode::Analysis,
    }
    .render()
    .map_err(|e| AssistantError::Prompt(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use urbannue_core::FinancialStatus;

    use super::*;

    fn orders() -> Vec<OrderSummary> {
        vec![OrderSummary {
            id: 42,
            name: "#1042".to_string(),
            total_price: Decimal::from_str("64.00").unwrap(),
            currency: "USD".to_string(),
            created_at: DateTime::parse_from_rfc3339("2026-06-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            item_count: 2,
            financial_status: FinancialStatus::Paid,
        }]
    }

    #[test]
    fn test_validate_question() {
        assert!(matches!(
            validate_question("   \n"),
            Err(AssistantError::EmptyQuestion)
        ));
        assert_eq!(validate_question("  Top order?  ").unwrap(), "Top order?");

        let long = "a".repeat(MAX_QUESTION_CHARS + 1);
        assert!(matches!(
            validate_question(&long),
            Err(AssistantError::QuestionTooLong)
        ));
    }

    #[test]
    fn test_system_prompt_contains_orders_and_metrics() {
        let shop = ShopDomain::parse("brand").unwrap();
        let prompt = render_system_prompt(&shop, &orders(), AnswerMode::Narrative).unwrap();

        assert!(prompt.contains("brand.myshopify.com"));
        assert!(prompt.contains("\"name\":\"#1042\""));
        assert!(prompt.contains("64.00"));
        assert!(!prompt.contains("order_metrics"));
    }

    #[test]
    fn test_system_prompt_mentions_tools_in_analysis_mode() {
        let shop = ShopDomain::parse("brand").unwrap();
        let prompt = render_system_prompt(&shop, &orders(), AnswerMode::Analysis).unwrap();
        assert!(prompt.contains("order_metrics"));
    }

    #[test]
    fn test_system_prompt_with_no_orders() {
        let shop = ShopDomain::parse("brand").unwrap();
        let prompt = render_system_prompt(&shop, &[], AnswerMode::Narrative).unwrap();
        assert!(prompt.contains("[]"));
    }

    #[test]
    fn test_user_message_prefix() {
        let message = AssistantError::EmptyQuestion.user_message();
        assert_eq!(
            message,
            "The assistant could not answer: please type a question first."
        );
    }

    #[test]
    fn test_answer_mode_deserialize() {
        let mode: AnswerMode = serde_json::from_str("\"analysis\"").unwrap();
        assert_eq!(mode, AnswerMode::Analysis);
        assert_eq!(AnswerMode::default(), AnswerMode::Narrative);
    }
}
