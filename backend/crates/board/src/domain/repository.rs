//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//!
//! The discipline for every mutation here: the application layer loads a
//! record, decides, and hands the loaded entity back; the repository's
//! write is conditioned on `version` being unchanged and fails with
//! `VersionConflict` otherwise. Methods that touch the ledger do both
//! writes in one transaction.

use chrono::{DateTime, Utc};
use kernel::id::{ReportId, RequestId, StatusLogId, UserId};
use ledger::PointEntry;

use crate::domain::entities::{Report, Request, StatusLog};
use crate::domain::services::Settlement;
use crate::error::BoardResult;

/// Request repository trait
#[trait_variant::make(RequestRepository: Send)]
pub trait LocalRequestRepository {
    /// Persist a new open request
    async fn create(&self, request: &Request) -> BoardResult<()>;

    /// Load a request by ID
    async fn find_request(&self, request_id: &RequestId) -> BoardResult<Option<Request>>;

    /// Open, unsettled requests created before `cutoff` that have no
    /// selected answer, oldest first
    async fn list_expired_open(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> BoardResult<Vec<Request>>;
}

/// StatusLog repository trait
#[trait_variant::make(StatusLogRepository: Send)]
pub trait LocalStatusLogRepository {
    /// Persist a new answer
    async fn create_log(&self, log: &StatusLog) -> BoardResult<()>;

    /// Persist a free-standing share and post its reward in one transaction
    async fn create_log_with_reward(
        &self,
        log: &StatusLog,
        reward: &PointEntry,
    ) -> BoardResult<()>;

    /// Load an answer by ID
    async fn find_log(&self, status_log_id: &StatusLogId) -> BoardResult<Option<StatusLog>>;

    /// Non-hidden answers for a request, newest first
    async fn list_visible(&self, request_id: &RequestId) -> BoardResult<Vec<StatusLog>>;

    /// Whether the request already has a selected answer
    async fn has_selected(&self, request_id: &RequestId) -> BoardResult<bool>;

    /// Submissions by an author since `since` (daily cap window)
    async fn count_submitted_since(
        &self,
        author_id: &UserId,
        since: DateTime<Utc>,
    ) -> BoardResult<i64>;
}

/// Report repository trait
#[trait_variant::make(ReportRepository: Send)]
pub trait LocalReportRepository {
    /// Load a report by ID
    async fn find_report(&self, report_id: &ReportId) -> BoardResult<Option<Report>>;
}

/// Settlement repository trait - the two closure paths
///
/// Both methods run one transaction: CAS-close the request with
/// `point_handled=false` re-checked in the same conditional write, move the
/// points, commit. A lost CAS rolls everything back and returns
/// `VersionConflict`; no partial ledger writes survive.
#[trait_variant::make(SettlementRepository: Send)]
pub trait LocalSettlementRepository {
    /// Manual path: mark `winner` selected (CAS on its version, must still
    /// be visible and unselected), close the request, pay the full pool to
    /// the winner.
    async fn settle_selection(
        &self,
        request: &Request,
        winner: &StatusLog,
        at: DateTime<Utc>,
    ) -> BoardResult<Settlement>;

    /// Automatic path: close the request, debit the pool, re-read visible
    /// answers inside the transaction and credit each a floor share; the
    /// remainder (or, with no visible answers, the whole pool) is forfeited.
    async fn settle_timeout(&self, request: &Request, at: DateTime<Utc>)
    -> BoardResult<Settlement>;
}

/// Moderation repository trait
///
/// Counter changes, the hide flag, and any ledger movement commit or fail
/// together. The `new_count`/`hidden` decisions are computed by the caller
/// from the loaded answer; the version CAS guarantees the decision was made
/// against current state.
#[trait_variant::make(ModerationRepository: Send)]
pub trait LocalModerationRepository {
    /// Insert the report, set the answer's count/hidden (CAS), and bump the
    /// author's report count
    async fn file_report(
        &self,
        report: &Report,
        answer: &StatusLog,
        new_count: i32,
        hidden: bool,
    ) -> BoardResult<()>;

    /// Delete the report, set the answer's count/hidden (CAS), and decrement
    /// the author's report count (floored at zero)
    async fn remove_report(
        &self,
        report: &Report,
        answer: &StatusLog,
        new_count: i32,
        hidden: bool,
    ) -> BoardResult<()>;

    /// Force-hide (CAS); posts `refund` when the answer's reward is clawed
    /// back, clearing `rewarded`
    async fn apply_block(
        &self,
        answer: &StatusLog,
        refund: Option<PointEntry>,
    ) -> BoardResult<()>;

    /// Force-unhide (CAS); posts `reissue` when the answer's reward is
    /// granted again, setting `rewarded`
    async fn apply_unblock(
        &self,
        answer: &StatusLog,
        reissue: Option<PointEntry>,
    ) -> BoardResult<()>;
}

/// Everything the HTTP layer needs from one storage backend
pub trait BoardRepository:
    RequestRepository
    + StatusLogRepository
    + ReportRepository
    + SettlementRepository
    + ModerationRepository
{
}

impl<T> BoardRepository for T where
    T: RequestRepository
        + StatusLogRepository
        + ReportRepository
        + SettlementRepository
        + ModerationRepository
{
}
