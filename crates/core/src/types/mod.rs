//! Core types for Urbannue Pro.

pub mod order;
pub mod shop;

pub use order::{FinancialStatus, OrderMetrics, OrderSummary};
pub use shop::{ShopDomain, ShopDomainError};
