//! Error types for the Claude API client.

use thiserror::Error;

/// Errors that can occur when interacting with the Claude API.
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Claude API returned an error.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed, or the key cannot be sent as a header.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// Tool execution failed.
    #[error("tool execution error: {0}")]
    ToolExecution(String),
}

impl ClaudeError {
    /// Short explanation suitable for showing next to the question box.
    ///
    /// Transport and parse details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited(secs) => {
                format!("the AI service is busy, try again in {secs} seconds")
            }
            Self::Unauthorized(_) => "the AI service rejected the configured API key".to_string(),
            Self::Api { message, .. } => format!("the AI service returned an error: {message}"),
            Self::Http(_) | Self::Stream(_) => "the AI service could not be reached".to_string(),
            Self::Parse(_) => "the AI service sent a response that could not be read".to_string(),
            Self::ToolExecution(msg) => format!("an analysis step failed: {msg}"),
        }
    }
}

/// API error response from Claude.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_error_display() {
        let err = ClaudeError::RateLimited(30);
        assert_eq!(err.to_string(), "rate limited, retry after 30 seconds");

        let err = ClaudeError::Api {
            error_type: "overloaded_error".to_string(),
            message: "Overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (overloaded_error): Overloaded");
    }

    #[test]
    fn test_user_message_hides_parse_details() {
        let err = ClaudeError::Parse("expected value at line 1 column 1".to_string());
        let message = err.user_message();
        assert!(!message.contains("line 1"));
        assert!(message.contains("could not be read"));
    }

    #[test]
    fn test_user_message_mentions_retry_delay() {
        assert!(ClaudeError::RateLimited(12).user_message().contains("12 seconds"));
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "type": "error",
            "error": {
                "type": "invalid_request_error",
                "message": "max_tokens is too large"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error_type, "error");
        assert_eq!(response.error.error_type, "invalid_request_error");
        assert_eq!(response.error.message, "max_tokens is too large");
    }
}
