//! Urbannue Core - Shared domain types.
//!
//! This crate provides the types used by every Urbannue Pro component:
//! - `dashboard` - Password-gated analytics dashboard and AI assistant
//! - `connector` - Standalone Shopify OAuth install/callback service
//! - `cli` - Migrations and shop session management
//!
//! # Architecture
//!
//! The core crate contains only types and pure calculations - no I/O, no
//! database access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Shop domains, order summaries, and order metrics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
