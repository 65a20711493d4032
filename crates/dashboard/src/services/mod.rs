//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `analysis` - In-process order analysis tools offered to Claude
//! - `assistant` - Question round trip to Claude with the fetched orders
//! - `dashboard` - Token resolution, order fetching and metrics for the page

pub mod analysis;
pub mod assistant;
pub mod dashboard;

pub use assistant::{AnswerMode, Assistant, AssistantError};
pub use dashboard::{DashboardData, connected_shop, forget_connection, load_dashboard};
