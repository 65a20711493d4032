//! Claude API integration for the store assistant.
//!
//! Wraps the Anthropic Messages API: plain chat, tool use, and SSE
//! streaming. The assistant service decides what to send; this module only
//! speaks the wire format.

mod client;
mod error;
pub mod types;

pub use client::ClaudeClient;
pub use error::{ApiError, ApiErrorResponse, ClaudeError};
pub use types::{
    ChatRequest, ChatResponse, ContentBlock, ContentBlockDelta, Message, MessageContent,
    StopReason, StreamEvent, Tool, Usage,
};
