//! Application Configuration
//!
//! Configuration for the board application layer.

use std::time::Duration;

/// Board application configuration
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Reports needed before an answer is auto-hidden
    pub report_hide_threshold: i32,
    /// Submissions allowed per author per UTC calendar day
    pub daily_submission_cap: i64,
    /// Age after which an open request is auto-closed
    pub request_timeout: Duration,
    /// Settlement sweep period
    pub sweep_period: Duration,
    /// Max requests settled per sweep pass
    pub sweep_batch_limit: i64,
    /// Points granted for a free-standing share (0 disables the grant)
    pub share_reward: i64,
    /// Longest accepted answer content, in characters
    pub max_content_chars: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            report_hide_threshold: 3,
            daily_submission_cap: 3,
            request_timeout: Duration::from_secs(3 * 3600),
            sweep_period: Duration::from_secs(300),
            sweep_batch_limit: 100,
            share_reward: 2,
            max_content_chars: 500,
        }
    }
}

impl BoardConfig {
    /// Timeout as a chrono duration for timestamp arithmetic
    pub fn request_timeout_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.request_timeout)
            .unwrap_or_else(|_| chrono::Duration::hours(3))
    }
}
