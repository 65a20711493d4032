//! Urbannue Dashboard library.
//!
//! Password-gated Shopify analytics: connect a store over OAuth, see its
//! recent orders and metrics, and ask Claude questions about them.
//!
//! The binary in `main.rs` wires these modules into a server; the
//! standalone connector reuses the Shopify client, configuration helpers
//! and repository from here.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod claude;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
pub mod tokens;
