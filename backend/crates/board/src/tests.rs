//! Board Crate Tests
//!
//! End-to-end tests over the in-memory repositories with a controlled
//! clock: settlement math, the at-most-once closure guarantee, moderation
//! state transitions, and the submission cap.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use kernel::clock::{Clock, FixedClock};
use kernel::id::{RequestId, UserId};
use ledger::{LedgerError, LedgerRepository, MemLedgerRepository};

use crate::application::block_answer::BlockAnswerUseCase;
use crate::application::close_expired::CloseExpiredRequestUseCase;
use crate::application::config::BoardConfig;
use crate::application::create_request::{CreateRequestInput, CreateRequestUseCase};
use crate::application::remove_report::RemoveReportUseCase;
use crate::application::report_answer::{ReportAnswerInput, ReportAnswerUseCase};
use crate::application::select_answer::SelectAnswerUseCase;
use crate::application::submit_answer::{SubmitAnswerInput, SubmitAnswerUseCase};
use crate::application::sweep::SettlementSweep;
use crate::application::unblock_answer::UnblockAnswerUseCase;
use crate::domain::entities::{Report, Request, StatusLog};
use crate::domain::repository::{
    ModerationRepository, ReportRepository, RequestRepository, StatusLogRepository,
};
use crate::error::BoardError;
use crate::infra::memory::MemBoardRepository;

struct Harness {
    ledger: Arc<MemLedgerRepository>,
    board: Arc<MemBoardRepository>,
    config: Arc<BoardConfig>,
    clock: Arc<FixedClock>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(BoardConfig::default())
    }

    fn with_config(config: BoardConfig) -> Self {
        let ledger = Arc::new(MemLedgerRepository::new());
        let board = Arc::new(MemBoardRepository::new(ledger.clone()));
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Self {
            ledger,
            board,
            config: Arc::new(config),
            clock: Arc::new(FixedClock::at(start)),
        }
    }

    fn dyn_clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    fn seed(&self, balance: i64) -> UserId {
        let user = UserId::new();
        self.ledger.seed_user(user, balance);
        user
    }

    async fn create_request(&self, requester: UserId, pool: i64) -> Request {
        CreateRequestUseCase::new(self.board.clone(), self.ledger.clone(), self.dyn_clock())
            .execute(CreateRequestInput {
                requester_id: requester,
                reward_pool: pool,
                position: None,
            })
            .await
            .expect("request creation failed")
    }

    async fn submit(
        &self,
        request_id: Option<RequestId>,
        author: UserId,
        content: &str,
    ) -> Result<StatusLog, BoardError> {
        SubmitAnswerUseCase::new(
            self.board.clone(),
            self.board.clone(),
            self.ledger.clone(),
            self.config.clone(),
            self.dyn_clock(),
        )
        .execute(SubmitAnswerInput {
            request_id,
            author_id: author,
            content: content.to_string(),
            position: None,
        })
        .await
    }

    fn select_uc(&self) -> SelectAnswerUseCase<MemBoardRepository, MemBoardRepository, MemBoardRepository> {
        SelectAnswerUseCase::new(
            self.board.clone(),
            self.board.clone(),
            self.board.clone(),
            self.dyn_clock(),
        )
    }

    fn close_uc(&self) -> CloseExpiredRequestUseCase<MemBoardRepository, MemBoardRepository> {
        CloseExpiredRequestUseCase::new(
            self.board.clone(),
            self.board.clone(),
            self.config.clone(),
            self.dyn_clock(),
        )
    }

    fn report_uc(&self) -> ReportAnswerUseCase<MemBoardRepository, MemBoardRepository, MemLedgerRepository> {
        ReportAnswerUseCase::new(
            self.board.clone(),
            self.board.clone(),
            self.ledger.clone(),
            self.config.clone(),
            self.dyn_clock(),
        )
    }

    fn block_uc(&self) -> BlockAnswerUseCase<MemBoardRepository, MemBoardRepository> {
        BlockAnswerUseCase::new(
            self.board.clone(),
            self.board.clone(),
            self.config.clone(),
            self.dyn_clock(),
        )
    }

    fn unblock_uc(&self) -> UnblockAnswerUseCase<MemBoardRepository, MemBoardRepository> {
        UnblockAnswerUseCase::new(
            self.board.clone(),
            self.board.clone(),
            self.config.clone(),
            self.dyn_clock(),
        )
    }

    async fn balance(&self, user: &UserId) -> i64 {
        self.ledger.balance(user).await.expect("user missing")
    }
}

// ----------------------------------------------------------------------------
// Request creation and submissions
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_create_request_requires_funds() {
    let h = Harness::new();
    let poor = h.seed(5);

    let err = CreateRequestUseCase::new(h.board.clone(), h.ledger.clone(), h.dyn_clock())
        .execute(CreateRequestInput {
            requester_id: poor,
            reward_pool: 10,
            position: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BoardError::Ledger(LedgerError::InsufficientFunds { balance: 5, requested: 10 })
    ));

    // The pool is only reserved, not moved, at creation time.
    let rich = h.seed(10);
    h.create_request(rich, 10).await;
    assert_eq!(h.balance(&rich).await, 10);
}

#[tokio::test]
async fn test_create_request_rejects_nonpositive_pool() {
    let h = Harness::new();
    let user = h.seed(100);

    let uc = CreateRequestUseCase::new(h.board.clone(), h.ledger.clone(), h.dyn_clock());
    for pool in [0, -5] {
        let err = uc
            .execute(CreateRequestInput {
                requester_id: user,
                reward_pool: pool,
                position: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::InvalidRewardPool(p) if p == pool));
    }
}

#[tokio::test]
async fn test_free_share_grants_reward() {
    let h = Harness::new();
    let author = h.seed(0);

    let share = h.submit(None, author, "quiet at the station").await.unwrap();
    assert!(share.is_free_share());
    assert!(share.rewarded);
    assert_eq!(h.balance(&author).await, h.config.share_reward);

    // A request answer earns nothing at submission time.
    let requester = h.seed(50);
    let request = h.create_request(requester, 10).await;
    let answer = h
        .submit(Some(request.request_id), author, "two people in line")
        .await
        .unwrap();
    assert!(!answer.rewarded);
    assert_eq!(h.balance(&author).await, h.config.share_reward);
}

#[tokio::test]
async fn test_free_share_with_grant_disabled() {
    let h = Harness::with_config(BoardConfig {
        share_reward: 0,
        ..BoardConfig::default()
    });
    let author = h.seed(0);

    let share = h.submit(None, author, "nothing going on").await.unwrap();
    assert!(!share.rewarded);
    assert_eq!(h.balance(&author).await, 0);
    assert_eq!(h.ledger.entry_count(), 0);
}

#[tokio::test]
async fn test_daily_cap_resets_at_midnight() {
    let h = Harness::new();
    let author = h.seed(0);

    for i in 0..h.config.daily_submission_cap {
        h.submit(None, author, &format!("update {i}")).await.unwrap();
    }
    let err = h.submit(None, author, "one too many").await.unwrap_err();
    assert!(matches!(err, BoardError::RateLimited { cap } if cap == h.config.daily_submission_cap));

    // Past midnight the window is fresh.
    h.clock.advance(Duration::hours(13));
    h.submit(None, author, "new day").await.unwrap();
}

#[tokio::test]
async fn test_submit_to_closed_request_rejected() {
    let h = Harness::new();
    let requester = h.seed(50);
    let answerer = h.seed(0);
    let request = h.create_request(requester, 5).await;

    h.clock.advance(Duration::hours(4));
    h.close_uc().execute(&request).await.unwrap();

    let err = h
        .submit(Some(request.request_id), answerer, "too late")
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::RequestClosed));
}

// ----------------------------------------------------------------------------
// Manual settlement (selection)
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_selection_pays_full_pool_to_winner() {
    let h = Harness::new();
    let requester = h.seed(100);
    let winner = h.seed(0);
    let loser = h.seed(0);

    let request = h.create_request(requester, 7).await;
    let winning = h
        .submit(Some(request.request_id), winner, "about 20 minutes")
        .await
        .unwrap();
    h.submit(Some(request.request_id), loser, "no idea").await.unwrap();

    let settlement = h
        .select_uc()
        .execute(winning.status_log_id, requester)
        .await
        .unwrap();

    // The whole pool, no split, no remainder.
    assert!(settlement.is_balanced());
    assert_eq!(settlement.debited, 7);
    assert_eq!(settlement.forfeited, 0);
    assert_eq!(settlement.credits.len(), 1);
    assert_eq!(h.balance(&requester).await, 93);
    assert_eq!(h.balance(&winner).await, 7);
    assert_eq!(h.balance(&loser).await, 0);

    let stored = h.board.find_log(&winning.status_log_id).await.unwrap().unwrap();
    assert!(stored.selected);
    let stored_request = h.board.find_request(&request.request_id).await.unwrap().unwrap();
    assert!(stored_request.closed);
    assert!(stored_request.point_handled);
}

#[tokio::test]
async fn test_selection_requires_request_owner() {
    let h = Harness::new();
    let requester = h.seed(50);
    let answerer = h.seed(0);
    let stranger = h.seed(0);

    let request = h.create_request(requester, 5).await;
    let answer = h
        .submit(Some(request.request_id), answerer, "crowded")
        .await
        .unwrap();

    let err = h
        .select_uc()
        .execute(answer.status_log_id, stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::NotRequestOwner));
    assert_eq!(h.ledger.entry_count(), 0);
}

#[tokio::test]
async fn test_selection_rejects_hidden_answer() {
    let h = Harness::new();
    let requester = h.seed(50);
    let answerer = h.seed(0);
    let admin = UserId::new();

    let request = h.create_request(requester, 5).await;
    let answer = h
        .submit(Some(request.request_id), answerer, "spam")
        .await
        .unwrap();
    h.block_uc().execute(answer.status_log_id, admin).await.unwrap();

    let err = h
        .select_uc()
        .execute(answer.status_log_id, requester)
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::AnswerHidden));
}

#[tokio::test]
async fn test_free_share_cannot_be_selected() {
    let h = Harness::new();
    let author = h.seed(0);
    let share = h.submit(None, author, "just sharing").await.unwrap();

    let err = h
        .select_uc()
        .execute(share.status_log_id, author)
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::NotARequestAnswer));
}

// ----------------------------------------------------------------------------
// Automatic settlement (timeout)
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_timeout_splits_floor_and_forfeits_remainder() {
    let h = Harness::new();
    let requester = h.seed(100);
    let a = h.seed(0);
    let b = h.seed(0);
    let c = h.seed(0);

    let request = h.create_request(requester, 10).await;
    for (author, text) in [(a, "quiet"), (b, "busy"), (c, "closed early")] {
        h.submit(Some(request.request_id), author, text).await.unwrap();
    }

    h.clock.advance(Duration::hours(4));
    let settlement = h.close_uc().execute(&request).await.unwrap();

    // floor(10/3) == 3 each, 1 forfeited.
    assert!(settlement.is_balanced());
    assert_eq!(settlement.debited, 10);
    assert_eq!(settlement.total_credited(), 9);
    assert_eq!(settlement.forfeited, 1);
    assert_eq!(h.balance(&requester).await, 90);
    assert_eq!(h.balance(&a).await, 3);
    assert_eq!(h.balance(&b).await, 3);
    assert_eq!(h.balance(&c).await, 3);
}

#[tokio::test]
async fn test_timeout_with_no_answers_forfeits_pool() {
    let h = Harness::new();
    let requester = h.seed(20);
    let request = h.create_request(requester, 5).await;

    h.clock.advance(Duration::hours(4));
    let settlement = h.close_uc().execute(&request).await.unwrap();

    assert!(settlement.is_balanced());
    assert_eq!(settlement.forfeited, 5);
    assert!(settlement.credits.is_empty());
    // Debited even though nobody is paid.
    assert_eq!(h.balance(&requester).await, 15);
    assert_eq!(h.ledger.entry_count(), 1);
}

#[tokio::test]
async fn test_timeout_pool_smaller_than_answerers_forfeits_everything() {
    let h = Harness::new();
    let requester = h.seed(20);
    let a = h.seed(0);
    let b = h.seed(0);
    let c = h.seed(0);

    let request = h.create_request(requester, 2).await;
    for (author, text) in [(a, "one"), (b, "two"), (c, "three")] {
        h.submit(Some(request.request_id), author, text).await.unwrap();
    }

    h.clock.advance(Duration::hours(4));
    let settlement = h.close_uc().execute(&request).await.unwrap();

    // floor(2/3) == 0: no zero-amount credits are posted.
    assert_eq!(settlement.forfeited, 2);
    assert!(settlement.credits.is_empty());
    assert_eq!(h.balance(&a).await, 0);
    assert_eq!(h.ledger.entry_count(), 1);
}

#[tokio::test]
async fn test_timeout_excludes_hidden_answers() {
    let h = Harness::new();
    let requester = h.seed(50);
    let visible = h.seed(0);
    let hidden = h.seed(0);
    let admin = UserId::new();

    let request = h.create_request(requester, 10).await;
    h.submit(Some(request.request_id), visible, "fine").await.unwrap();
    let bad = h.submit(Some(request.request_id), hidden, "spam").await.unwrap();
    h.block_uc().execute(bad.status_log_id, admin).await.unwrap();

    h.clock.advance(Duration::hours(4));
    let settlement = h.close_uc().execute(&request).await.unwrap();

    // The hidden answer gets no share; one visible answerer takes floor(10/1).
    assert_eq!(settlement.credits.len(), 1);
    assert_eq!(h.balance(&visible).await, 10);
    assert_eq!(h.balance(&hidden).await, 0);
}

#[tokio::test]
async fn test_not_yet_expired_request_is_not_closed() {
    let h = Harness::new();
    let requester = h.seed(20);
    let request = h.create_request(requester, 5).await;

    h.clock.advance(Duration::hours(2));
    let err = h.close_uc().execute(&request).await.unwrap_err();
    assert!(matches!(err, BoardError::Internal(_)));
    assert_eq!(h.balance(&requester).await, 20);
}

// ----------------------------------------------------------------------------
// At-most-once settlement
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_settlement_runs_at_most_once() {
    let h = Harness::new();
    let requester = h.seed(50);
    let answerer = h.seed(0);

    let request = h.create_request(requester, 9).await;
    h.submit(Some(request.request_id), answerer, "ok").await.unwrap();

    h.clock.advance(Duration::hours(4));
    h.close_uc().execute(&request).await.unwrap();
    let entries_after_first = h.ledger.entry_count();

    // A second closer holding the same stale snapshot loses the CAS.
    let err = h.close_uc().execute(&request).await.unwrap_err();
    assert!(matches!(err, BoardError::VersionConflict));
    assert_eq!(h.ledger.entry_count(), entries_after_first);
    assert_eq!(h.balance(&requester).await, 41);
    assert_eq!(h.balance(&answerer).await, 9);
}

#[tokio::test]
async fn test_selection_and_timeout_are_mutually_exclusive() {
    let h = Harness::new();
    let requester = h.seed(50);
    let answerer = h.seed(0);

    let request = h.create_request(requester, 7).await;
    let answer = h.submit(Some(request.request_id), answerer, "ok").await.unwrap();

    // Both closers loaded the request while it was open; selection commits
    // first, the sweep's attempt must change nothing.
    h.clock.advance(Duration::hours(4));
    h.select_uc().execute(answer.status_log_id, requester).await.unwrap();
    let entries_after_selection = h.ledger.entry_count();

    let err = h.close_uc().execute(&request).await.unwrap_err();
    assert!(matches!(
        err,
        BoardError::AlreadySelected | BoardError::VersionConflict
    ));
    assert_eq!(h.ledger.entry_count(), entries_after_selection);
    assert_eq!(h.balance(&answerer).await, 7);
}

#[tokio::test]
async fn test_stale_selection_after_timeout_fails() {
    let h = Harness::new();
    let requester = h.seed(50);
    let answerer = h.seed(0);

    let request = h.create_request(requester, 6).await;
    let answer = h.submit(Some(request.request_id), answerer, "ok").await.unwrap();

    h.clock.advance(Duration::hours(4));
    h.close_uc().execute(&request).await.unwrap();

    let err = h
        .select_uc()
        .execute(answer.status_log_id, requester)
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::RequestClosed));
    // The timeout split stands: floor(6/1) to the single answerer.
    assert_eq!(h.balance(&answerer).await, 6);
}

// ----------------------------------------------------------------------------
// Moderation
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_report_threshold_hides_answer() {
    let h = Harness::new();
    let author = h.seed(0);
    let requester = h.seed(50);
    let request = h.create_request(requester, 5).await;
    let answer = h.submit(Some(request.request_id), author, "junk").await.unwrap();

    let uc = h.report_uc();
    for i in 0..h.config.report_hide_threshold {
        let reporter = h.seed(0);
        let out = uc
            .execute(ReportAnswerInput {
                answer_id: answer.status_log_id,
                reporter_id: reporter,
                reason: "misleading".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.report_count, i + 1);
        // Hidden exactly when the count reaches the threshold, not before.
        assert_eq!(out.hidden, i + 1 >= h.config.report_hide_threshold);
    }

    let stored = h.board.find_log(&answer.status_log_id).await.unwrap().unwrap();
    assert!(stored.hidden);
    assert_eq!(stored.report_count, 3);

    // The author's directory-level counter tracked each report.
    let account = h.ledger.find_account(&author).await.unwrap().unwrap();
    assert_eq!(account.report_count, 3);
}

#[tokio::test]
async fn test_remove_report_unhides_below_threshold() {
    let h = Harness::new();
    let author = h.seed(0);
    let answer = h.submit(None, author, "contested").await.unwrap();

    let report_uc = h.report_uc();
    let mut last = None;
    for _ in 0..h.config.report_hide_threshold {
        let reporter = h.seed(0);
        last = Some(
            report_uc
                .execute(ReportAnswerInput {
                    answer_id: answer.status_log_id,
                    reporter_id: reporter,
                    reason: "spam".into(),
                })
                .await
                .unwrap(),
        );
    }
    let last = last.unwrap();
    assert!(last.hidden);

    let admin = UserId::new();
    let remove_uc = RemoveReportUseCase::new(
        h.board.clone(),
        h.board.clone(),
        h.board.clone(),
        h.config.clone(),
    );
    let out = remove_uc
        .execute(last.report.report_id, admin)
        .await
        .unwrap();
    assert_eq!(out.report_count, 2);
    assert!(!out.hidden);

    let stored = h.board.find_log(&answer.status_log_id).await.unwrap().unwrap();
    assert!(!stored.hidden);
    let account = h.ledger.find_account(&author).await.unwrap().unwrap();
    assert_eq!(account.report_count, 2);

    // Removing it twice fails; the report is gone.
    let err = remove_uc.execute(last.report.report_id, admin).await.unwrap_err();
    assert!(matches!(err, BoardError::ReportNotFound));
}

#[tokio::test]
async fn test_block_claws_back_share_reward_once() {
    let h = Harness::new();
    let author = h.seed(0);
    let admin = UserId::new();

    let share = h.submit(None, author, "reward bait").await.unwrap();
    assert_eq!(h.balance(&author).await, 2);

    let uc = h.block_uc();
    let out = uc.execute(share.status_log_id, admin).await.unwrap();
    assert!(out.hidden);
    assert!(out.changed);
    assert_eq!(h.balance(&author).await, 0);
    let entries = h.ledger.entry_count();

    // Idempotent: a repeat block posts nothing.
    let out = uc.execute(share.status_log_id, admin).await.unwrap();
    assert!(!out.changed);
    assert_eq!(h.ledger.entry_count(), entries);
    assert_eq!(h.balance(&author).await, 0);
}

#[tokio::test]
async fn test_block_clawback_may_overdraw() {
    let h = Harness::new();
    let author = h.seed(0);
    let admin = UserId::new();

    let share = h.submit(None, author, "spend it fast").await.unwrap();
    // The author spends the grant before the admin acts.
    let spend = ledger::PointEntry::deduct(author, 2, "spent elsewhere", h.clock.now()).unwrap();
    h.ledger.post_batch(&[(spend, ledger::FundsGuard::Enforce)]).unwrap();
    assert_eq!(h.balance(&author).await, 0);

    h.block_uc().execute(share.status_log_id, admin).await.unwrap();
    assert_eq!(h.balance(&author).await, -2);
}

#[tokio::test]
async fn test_unblock_reissues_clawed_back_reward() {
    let h = Harness::new();
    let author = h.seed(0);
    let admin = UserId::new();

    let share = h.submit(None, author, "wrongly flagged").await.unwrap();
    h.block_uc().execute(share.status_log_id, admin).await.unwrap();
    assert_eq!(h.balance(&author).await, 0);

    let out = h.unblock_uc().execute(share.status_log_id, admin).await.unwrap();
    assert!(!out.hidden);
    assert!(out.changed);
    assert_eq!(h.balance(&author).await, 2);

    let stored = h.board.find_log(&share.status_log_id).await.unwrap().unwrap();
    assert!(stored.rewarded);

    // Unblocking a visible answer is a no-op.
    let entries = h.ledger.entry_count();
    let out = h.unblock_uc().execute(share.status_log_id, admin).await.unwrap();
    assert!(!out.changed);
    assert_eq!(h.ledger.entry_count(), entries);
}

#[tokio::test]
async fn test_unblock_of_request_answer_posts_nothing() {
    let h = Harness::new();
    let requester = h.seed(50);
    let author = h.seed(0);
    let admin = UserId::new();

    let request = h.create_request(requester, 5).await;
    let answer = h.submit(Some(request.request_id), author, "fine").await.unwrap();
    h.block_uc().execute(answer.status_log_id, admin).await.unwrap();

    // No grant was ever attached to a request answer.
    h.unblock_uc().execute(answer.status_log_id, admin).await.unwrap();
    assert_eq!(h.balance(&author).await, 0);
    assert_eq!(h.ledger.entry_count(), 0);
}

#[tokio::test]
async fn test_stale_block_posts_no_ledger_entries() {
    let h = Harness::new();
    let author = h.seed(0);

    let share = h.submit(None, author, "granted then reported").await.unwrap();
    assert_eq!(h.balance(&author).await, 2);
    let entries = h.ledger.entry_count();

    // A report lands after our snapshot, bumping the stored version.
    let reporter = h.seed(0);
    h.report_uc()
        .execute(ReportAnswerInput {
            answer_id: share.status_log_id,
            reporter_id: reporter,
            reason: "late".into(),
        })
        .await
        .unwrap();

    let clawback =
        ledger::PointEntry::deduct(author, 2, "share reward clawback", h.clock.now()).unwrap();
    let err = h.board.apply_block(&share, Some(clawback)).await.unwrap_err();
    assert!(matches!(err, BoardError::VersionConflict));

    // The lost race must leave no trace: no clawback entry, no hide.
    assert_eq!(h.ledger.entry_count(), entries);
    assert_eq!(h.balance(&author).await, 2);
    let stored = h.board.find_log(&share.status_log_id).await.unwrap().unwrap();
    assert!(!stored.hidden);
}

#[tokio::test]
async fn test_stale_report_leaves_counters_untouched() {
    let h = Harness::new();
    let author = h.seed(0);
    let answer = h.submit(None, author, "contested").await.unwrap();

    let reporter = h.seed(0);
    h.report_uc()
        .execute(ReportAnswerInput {
            answer_id: answer.status_log_id,
            reporter_id: reporter,
            reason: "first".into(),
        })
        .await
        .unwrap();

    // Filing against the pre-report snapshot loses the version race.
    let late = Report::new(answer.status_log_id, h.seed(0), "second", h.clock.now());
    let err = h.board.file_report(&late, &answer, 2, false).await.unwrap_err();
    assert!(matches!(err, BoardError::VersionConflict));

    // Neither the directory counter nor the report store moved.
    let account = h.ledger.find_account(&author).await.unwrap().unwrap();
    assert_eq!(account.report_count, 1);
    assert!(h.board.find_report(&late.report_id).await.unwrap().is_none());
    let stored = h.board.find_log(&answer.status_log_id).await.unwrap().unwrap();
    assert_eq!(stored.report_count, 1);
}

// ----------------------------------------------------------------------------
// Sweep
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_sweep_settles_only_expired_requests() {
    let h = Harness::new();
    let requester = h.seed(100);
    let answerer = h.seed(0);

    let old_a = h.create_request(requester, 6).await;
    let old_b = h.create_request(requester, 5).await;
    h.submit(Some(old_a.request_id), answerer, "ok").await.unwrap();

    h.clock.advance(Duration::hours(4));
    let fresh = h.create_request(requester, 8).await;

    let sweep = SettlementSweep::new(
        h.board.clone(),
        h.board.clone(),
        h.board.clone(),
        h.config.clone(),
        h.dyn_clock(),
    );
    let stats = sweep.run_once().await.unwrap();
    assert_eq!(stats.scanned, 2);
    assert_eq!(stats.settled, 2);
    assert_eq!(stats.conflicts, 0);
    assert_eq!(stats.failures, 0);

    // old_a paid its answerer, old_b forfeited, fresh untouched.
    assert_eq!(h.balance(&answerer).await, 6);
    assert_eq!(h.balance(&requester).await, 89);
    let fresh_stored = h.board.find_request(&fresh.request_id).await.unwrap().unwrap();
    assert!(fresh_stored.is_open());

    // A second pass finds nothing to do.
    let stats = sweep.run_once().await.unwrap();
    assert_eq!(stats.scanned, 0);
}

#[tokio::test]
async fn test_sweep_skips_requests_with_selected_answer() {
    let h = Harness::new();
    let requester = h.seed(50);
    let answerer = h.seed(0);

    let request = h.create_request(requester, 7).await;
    let answer = h.submit(Some(request.request_id), answerer, "ok").await.unwrap();
    h.select_uc().execute(answer.status_log_id, requester).await.unwrap();

    h.clock.advance(Duration::hours(4));
    let sweep = SettlementSweep::new(
        h.board.clone(),
        h.board.clone(),
        h.board.clone(),
        h.config.clone(),
        h.dyn_clock(),
    );
    let stats = sweep.run_once().await.unwrap();
    assert_eq!(stats.scanned, 0);
    assert_eq!(h.balance(&answerer).await, 7);
}

// ----------------------------------------------------------------------------
// Conservation
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_points_are_conserved_across_mixed_settlements() {
    let h = Harness::new();
    let requester = h.seed(100);
    let users: Vec<UserId> = (0..3).map(|_| h.seed(10)).collect();
    let initial_total = 100 + 3 * 10;

    // Manual settlement: pool 7 to one winner.
    let manual = h.create_request(requester, 7).await;
    let winning = h.submit(Some(manual.request_id), users[0], "a").await.unwrap();
    h.select_uc().execute(winning.status_log_id, requester).await.unwrap();

    // Timeout settlement: pool 10 across 3, remainder forfeited.
    let auto = h.create_request(requester, 10).await;
    for (user, text) in users.iter().zip(["b", "c", "d"]) {
        h.submit(Some(auto.request_id), *user, text).await.unwrap();
    }
    h.clock.advance(Duration::hours(4));
    h.close_uc().execute(&auto).await.unwrap();

    let mut total = h.balance(&requester).await;
    for user in &users {
        total += h.balance(user).await;
    }
    // Everything missing from the system is exactly the forfeited remainder.
    assert_eq!(initial_total - total, 1);

    // Each user's entry history sums to their balance delta.
    for user in &users {
        let delta: i64 = h.ledger.entries_for(user).iter().map(|e| e.amount).sum();
        assert_eq!(delta, h.balance(user).await - 10);
    }
}
