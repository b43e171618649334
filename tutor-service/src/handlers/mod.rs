//! HTTP handlers for the tutor service.

pub mod analysis;
pub mod extract;
pub mod health;
pub mod questions;

pub use analysis::analyze_answer;
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use questions::{ask_question, get_history};
