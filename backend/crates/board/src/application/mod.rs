//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.

pub mod block_answer;
pub mod close_expired;
pub mod config;
pub mod create_request;
pub mod list_answers;
pub mod remove_report;
pub mod report_answer;
pub mod select_answer;
pub mod submit_answer;
pub mod sweep;
pub mod unblock_answer;
