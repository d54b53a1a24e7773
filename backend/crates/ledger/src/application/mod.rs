//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.

pub mod get_balance;
pub mod get_point_history;
