//! In-Memory Repository Implementation
//!
//! Mirrors the PostgreSQL semantics behind a single mutex: every method
//! that the Pg backend runs as one transaction runs here under one lock
//! acquisition, with the same CAS version checks. Ledger movements go
//! through `MemLedgerRepository::post_batch`, which validates the whole
//! batch before applying any of it, so a failed settlement leaves the
//! board state untouched just like a rolled-back transaction would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use kernel::id::{ReportId, RequestId, StatusLogId, UserId};
use ledger::{FundsGuard, MemLedgerRepository, PointEntry};
use uuid::Uuid;

use crate::domain::entities::{Report, Request, StatusLog};
use crate::domain::repository::{
    ModerationRepository, ReportRepository, RequestRepository, SettlementRepository,
    StatusLogRepository,
};
use crate::domain::services::{
    SELECTION_REASON, Settlement, SettlementCredit, TIMEOUT_CREDIT_REASON, TIMEOUT_DEBIT_REASON,
    split_reward,
};
use crate::error::{BoardError, BoardResult};

#[derive(Default)]
struct State {
    requests: HashMap<Uuid, Request>,
    logs: HashMap<Uuid, StatusLog>,
    reports: HashMap<Uuid, Report>,
}

/// In-memory board store backed by an in-memory ledger
#[derive(Clone)]
pub struct MemBoardRepository {
    state: Arc<Mutex<State>>,
    ledger: Arc<MemLedgerRepository>,
}

impl MemBoardRepository {
    pub fn new(ledger: Arc<MemLedgerRepository>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            ledger,
        }
    }

    /// The ledger this board posts to (test inspection)
    pub fn ledger(&self) -> &Arc<MemLedgerRepository> {
        &self.ledger
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("board state lock poisoned")
    }
}

impl RequestRepository for MemBoardRepository {
    async fn create(&self, request: &Request) -> BoardResult<()> {
        let mut state = self.lock();
        state
            .requests
            .insert(request.request_id.into_uuid(), request.clone());
        Ok(())
    }

    async fn find_request(&self, request_id: &RequestId) -> BoardResult<Option<Request>> {
        let state = self.lock();
        Ok(state.requests.get(request_id.as_uuid()).cloned())
    }

    async fn list_expired_open(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> BoardResult<Vec<Request>> {
        let state = self.lock();
        let mut expired: Vec<Request> = state
            .requests
            .values()
            .filter(|r| !r.closed && !r.point_handled && r.created_at < cutoff)
            .filter(|r| {
                !state
                    .logs
                    .values()
                    .any(|l| l.request_id == Some(r.request_id) && l.selected)
            })
            .cloned()
            .collect();
        expired.sort_by_key(|r| r.created_at);
        expired.truncate(limit.max(0) as usize);
        Ok(expired)
    }
}

impl StatusLogRepository for MemBoardRepository {
    async fn create_log(&self, log: &StatusLog) -> BoardResult<()> {
        let mut state = self.lock();
        state.logs.insert(log.status_log_id.into_uuid(), log.clone());
        Ok(())
    }

    async fn create_log_with_reward(
        &self,
        log: &StatusLog,
        reward: &PointEntry,
    ) -> BoardResult<()> {
        let mut state = self.lock();
        // Ledger first: a failed post must leave no orphan log.
        self.ledger
            .post_batch(&[(reward.clone(), FundsGuard::Enforce)])?;
        state.logs.insert(log.status_log_id.into_uuid(), log.clone());
        Ok(())
    }

    async fn find_log(&self, status_log_id: &StatusLogId) -> BoardResult<Option<StatusLog>> {
        let state = self.lock();
        Ok(state.logs.get(status_log_id.as_uuid()).cloned())
    }

    async fn list_visible(&self, request_id: &RequestId) -> BoardResult<Vec<StatusLog>> {
        let state = self.lock();
        let mut visible: Vec<StatusLog> = state
            .logs
            .values()
            .filter(|l| l.request_id == Some(*request_id) && !l.hidden)
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visible)
    }

    async fn has_selected(&self, request_id: &RequestId) -> BoardResult<bool> {
        let state = self.lock();
        Ok(state
            .logs
            .values()
            .any(|l| l.request_id == Some(*request_id) && l.selected))
    }

    async fn count_submitted_since(
        &self,
        author_id: &UserId,
        since: DateTime<Utc>,
    ) -> BoardResult<i64> {
        let state = self.lock();
        Ok(state
            .logs
            .values()
            .filter(|l| l.author_id == *author_id && l.created_at >= since)
            .count() as i64)
    }
}

impl ReportRepository for MemBoardRepository {
    async fn find_report(&self, report_id: &ReportId) -> BoardResult<Option<Report>> {
        let state = self.lock();
        Ok(state.reports.get(report_id.as_uuid()).cloned())
    }
}

impl SettlementRepository for MemBoardRepository {
    async fn settle_selection(
        &self,
        request: &Request,
        winner: &StatusLog,
        at: DateTime<Utc>,
    ) -> BoardResult<Settlement> {
        let mut state = self.lock();

        check_request_cas(&state, request)?;
        let stored_winner = state
            .logs
            .get(winner.status_log_id.as_uuid())
            .ok_or(BoardError::AnswerNotFound)?;
        if stored_winner.version != winner.version
            || stored_winner.hidden
            || stored_winner.selected
        {
            return Err(BoardError::VersionConflict);
        }

        let posts = vec![
            (
                PointEntry::deduct(
                    request.requester_id,
                    request.reward_pool,
                    SELECTION_REASON,
                    at,
                )?,
                FundsGuard::Exempt,
            ),
            (
                PointEntry::earn(winner.author_id, request.reward_pool, SELECTION_REASON, at)?,
                FundsGuard::Enforce,
            ),
        ];
        self.ledger.post_batch(&posts)?;

        apply_close(&mut state, request);
        let stored_winner = state
            .logs
            .get_mut(winner.status_log_id.as_uuid())
            .ok_or(BoardError::AnswerNotFound)?;
        stored_winner.selected = true;
        stored_winner.version += 1;

        Ok(Settlement {
            request_id: request.request_id,
            debited: request.reward_pool,
            credits: vec![SettlementCredit {
                user_id: winner.author_id,
                amount: request.reward_pool,
            }],
            forfeited: 0,
        })
    }

    async fn settle_timeout(
        &self,
        request: &Request,
        at: DateTime<Utc>,
    ) -> BoardResult<Settlement> {
        let mut state = self.lock();

        check_request_cas(&state, request)?;

        // Visible answers as of now, under the same lock as the close.
        let answerers: Vec<UserId> = state
            .logs
            .values()
            .filter(|l| l.request_id == Some(request.request_id) && !l.hidden)
            .map(|l| l.author_id)
            .collect();

        let split = split_reward(request.reward_pool, answerers.len());
        let mut posts = vec![(
            PointEntry::deduct(
                request.requester_id,
                request.reward_pool,
                TIMEOUT_DEBIT_REASON,
                at,
            )?,
            FundsGuard::Exempt,
        )];
        let mut credits = Vec::new();
        if split.per_share > 0 {
            for author in &answerers {
                posts.push((
                    PointEntry::earn(*author, split.per_share, TIMEOUT_CREDIT_REASON, at)?,
                    FundsGuard::Enforce,
                ));
                credits.push(SettlementCredit {
                    user_id: *author,
                    amount: split.per_share,
                });
            }
        }
        self.ledger.post_batch(&posts)?;

        apply_close(&mut state, request);

        Ok(Settlement {
            request_id: request.request_id,
            debited: request.reward_pool,
            credits,
            forfeited: split.forfeited,
        })
    }
}

// Same ordering as the settlement methods above: read-only CAS checks,
// then the fallible ledger write, then the infallible board mutations.
impl ModerationRepository for MemBoardRepository {
    async fn file_report(
        &self,
        report: &Report,
        answer: &StatusLog,
        new_count: i32,
        hidden: bool,
    ) -> BoardResult<()> {
        let mut state = self.lock();
        check_log_cas(&state, answer)?;
        self.ledger
            .bump_report_count(&answer.author_id, 1)
            .map_err(|_| BoardError::UserNotFound)?;
        state.reports.insert(report.report_id.into_uuid(), report.clone());
        apply_moderation(&mut state, answer, new_count, hidden, answer.rewarded);
        Ok(())
    }

    async fn remove_report(
        &self,
        report: &Report,
        answer: &StatusLog,
        new_count: i32,
        hidden: bool,
    ) -> BoardResult<()> {
        let mut state = self.lock();
        if !state.reports.contains_key(report.report_id.as_uuid()) {
            return Err(BoardError::ReportNotFound);
        }
        check_log_cas(&state, answer)?;
        self.ledger
            .bump_report_count(&answer.author_id, -1)
            .map_err(|_| BoardError::UserNotFound)?;
        state.reports.remove(report.report_id.as_uuid());
        apply_moderation(&mut state, answer, new_count, hidden, answer.rewarded);
        Ok(())
    }

    async fn apply_block(
        &self,
        answer: &StatusLog,
        refund: Option<PointEntry>,
    ) -> BoardResult<()> {
        let mut state = self.lock();
        check_log_cas(&state, answer)?;
        let rewarded_after = answer.rewarded && refund.is_none();
        if let Some(refund) = refund {
            self.ledger.post_batch(&[(refund, FundsGuard::Exempt)])?;
        }
        apply_moderation(&mut state, answer, answer.report_count, true, rewarded_after);
        Ok(())
    }

    async fn apply_unblock(
        &self,
        answer: &StatusLog,
        reissue: Option<PointEntry>,
    ) -> BoardResult<()> {
        let mut state = self.lock();
        check_log_cas(&state, answer)?;
        let rewarded_after = answer.rewarded || reissue.is_some();
        if let Some(reissue) = reissue {
            self.ledger.post_batch(&[(reissue, FundsGuard::Enforce)])?;
        }
        apply_moderation(&mut state, answer, answer.report_count, false, rewarded_after);
        Ok(())
    }
}

/// The mem-side equivalent of the request CAS: fail if the stored version
/// moved or the request was already settled.
fn check_request_cas(state: &State, request: &Request) -> BoardResult<()> {
    let stored = state
        .requests
        .get(request.request_id.as_uuid())
        .ok_or(BoardError::RequestNotFound)?;
    if stored.version != request.version || stored.point_handled {
        return Err(BoardError::VersionConflict);
    }
    Ok(())
}

fn apply_close(state: &mut State, request: &Request) {
    if let Some(stored) = state.requests.get_mut(request.request_id.as_uuid()) {
        stored.closed = true;
        stored.point_handled = true;
        stored.version += 1;
    }
}

/// Read-only log CAS: fail if the stored answer is missing or its version
/// moved past the caller's snapshot.
fn check_log_cas(state: &State, answer: &StatusLog) -> BoardResult<()> {
    let stored = state
        .logs
        .get(answer.status_log_id.as_uuid())
        .ok_or(BoardError::AnswerNotFound)?;
    if stored.version != answer.version {
        return Err(BoardError::VersionConflict);
    }
    Ok(())
}

fn apply_moderation(
    state: &mut State,
    answer: &StatusLog,
    new_count: i32,
    hidden: bool,
    rewarded: bool,
) {
    if let Some(stored) = state.logs.get_mut(answer.status_log_id.as_uuid()) {
        stored.report_count = new_count;
        stored.hidden = hidden;
        stored.rewarded = rewarded;
        stored.version += 1;
    }
}
