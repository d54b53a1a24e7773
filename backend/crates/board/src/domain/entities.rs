//! Domain Entities
//!
//! Core business entities for the board domain. `Request` and `StatusLog`
//! carry a `version` counter; every conditional write compares it and bumps
//! it, which is the whole concurrency story of this crate.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{ReportId, RequestId, StatusLogId, UserId};

/// Geographic position attached at creation time by the (external) place
/// collaborator; never touched by settlement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Request entity - a question with a points reward pool
///
/// Lifecycle: open (`closed=false, point_handled=false`), then exactly one
/// closure path flips both flags together. Terminal afterwards.
#[derive(Debug, Clone)]
pub struct Request {
    pub request_id: RequestId,
    pub requester_id: UserId,
    /// Total points at stake, fixed at creation
    pub reward_pool: i64,
    pub position: Option<Position>,
    pub closed: bool,
    /// Settlement idempotency guard, persisted with the same version unit
    pub point_handled: bool,
    /// Optimistic lock counter
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Request {
    /// Create a new open request
    pub fn new(
        requester_id: UserId,
        reward_pool: i64,
        position: Option<Position>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id: RequestId::new(),
            requester_id,
            reward_pool,
            position,
            closed: false,
            point_handled: false,
            version: 0,
            created_at: at,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Whether the request has outlived the timeout threshold
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.created_at > timeout
    }
}

/// StatusLog entity - an answer to a request, or a free-standing share
#[derive(Debug, Clone)]
pub struct StatusLog {
    pub status_log_id: StatusLogId,
    /// None for free-standing shares
    pub request_id: Option<RequestId>,
    pub author_id: UserId,
    pub content: String,
    /// At most one true per request
    pub selected: bool,
    pub hidden: bool,
    pub report_count: i32,
    /// Free-share reward idempotency flag
    pub rewarded: bool,
    /// Optimistic lock counter
    pub version: i64,
    pub position: Option<Position>,
    pub created_at: DateTime<Utc>,
}

impl StatusLog {
    /// Create a new visible, unselected answer
    pub fn new(
        request_id: Option<RequestId>,
        author_id: UserId,
        content: impl Into<String>,
        position: Option<Position>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            status_log_id: StatusLogId::new(),
            request_id,
            author_id,
            content: content.into(),
            selected: false,
            hidden: false,
            report_count: 0,
            rewarded: false,
            version: 0,
            position,
            created_at: at,
        }
    }

    /// A share not attached to any request
    pub fn is_free_share(&self) -> bool {
        self.request_id.is_none()
    }

    /// Counts toward visibility queries and reward distribution
    pub fn is_visible(&self) -> bool {
        !self.hidden
    }
}

/// Report entity - one user's report against an answer
#[derive(Debug, Clone)]
pub struct Report {
    pub report_id: ReportId,
    pub status_log_id: StatusLogId,
    pub reporter_id: UserId,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        status_log_id: StatusLogId,
        reporter_id: UserId,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            report_id: ReportId::new(),
            status_log_id,
            reporter_id,
            reason: reason.into(),
            created_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_open_and_unhandled() {
        let request = Request::new(UserId::new(), 10, None, Utc::now());
        assert!(request.is_open());
        assert!(!request.point_handled);
        assert_eq!(request.version, 0);
    }

    #[test]
    fn test_request_expiry() {
        let created = Utc::now();
        let request = Request::new(UserId::new(), 10, None, created);
        let timeout = Duration::hours(3);

        assert!(!request.is_expired(created + Duration::hours(2), timeout));
        // Exactly at the threshold is not yet expired
        assert!(!request.is_expired(created + Duration::hours(3), timeout));
        assert!(request.is_expired(created + Duration::hours(3) + Duration::seconds(1), timeout));
    }

    #[test]
    fn test_free_share() {
        let share = StatusLog::new(None, UserId::new(), "quiet right now", None, Utc::now());
        assert!(share.is_free_share());
        assert!(share.is_visible());
        assert!(!share.rewarded);

        let answer = StatusLog::new(
            Some(RequestId::new()),
            UserId::new(),
            "about 20 minutes",
            None,
            Utc::now(),
        );
        assert!(!answer.is_free_share());
    }
}
