//! Submit Answer Use Case
//!
//! Creates a StatusLog targeting an open request, or a free-standing share.
//! Free-standing shares earn the fixed share reward immediately, in the same
//! transaction that persists them, and carry `rewarded=true` so moderation
//! can claw the grant back exactly once.

use std::sync::Arc;

use kernel::clock::Clock;
use kernel::id::{RequestId, UserId};
use ledger::{LedgerRepository, PointEntry};

use crate::application::config::BoardConfig;
use crate::domain::entities::{Position, StatusLog};
use crate::domain::repository::{RequestRepository, StatusLogRepository};
use crate::error::{BoardError, BoardResult};

/// Reason string on free-share reward entries
pub const SHARE_REWARD_REASON: &str = "free share reward";

/// Input DTO for submit answer
#[derive(Debug, Clone)]
pub struct SubmitAnswerInput {
    /// None submits a free-standing share
    pub request_id: Option<RequestId>,
    pub author_id: UserId,
    pub content: String,
    pub position: Option<Position>,
}

/// Submit answer use case
pub struct SubmitAnswerUseCase<S, R, L>
where
    S: StatusLogRepository,
    R: RequestRepository,
    L: LedgerRepository,
{
    status_log_repo: Arc<S>,
    request_repo: Arc<R>,
    ledger_repo: Arc<L>,
    config: Arc<BoardConfig>,
    clock: Arc<dyn Clock>,
}

impl<S, R, L> SubmitAnswerUseCase<S, R, L>
where
    S: StatusLogRepository,
    R: RequestRepository,
    L: LedgerRepository,
{
    pub fn new(
        status_log_repo: Arc<S>,
        request_repo: Arc<R>,
        ledger_repo: Arc<L>,
        config: Arc<BoardConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status_log_repo,
            request_repo,
            ledger_repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, input: SubmitAnswerInput) -> BoardResult<StatusLog> {
        let content = input.content.trim();
        if content.is_empty() {
            return Err(BoardError::InvalidContent("content is empty".into()));
        }
        if content.chars().count() > self.config.max_content_chars {
            return Err(BoardError::InvalidContent(format!(
                "content exceeds {} characters",
                self.config.max_content_chars
            )));
        }

        let account = self
            .ledger_repo
            .find_account(&input.author_id)
            .await?
            .ok_or(BoardError::UserNotFound)?;
        if !account.active {
            return Err(BoardError::UserInactive);
        }

        // Daily cap over the current UTC calendar day
        let submitted_today = self
            .status_log_repo
            .count_submitted_since(&input.author_id, self.clock.start_of_day())
            .await?;
        if submitted_today >= self.config.daily_submission_cap {
            return Err(BoardError::RateLimited {
                cap: self.config.daily_submission_cap,
            });
        }

        if let Some(request_id) = &input.request_id {
            let request = self
                .request_repo
                .find_request(request_id)
                .await?
                .ok_or(BoardError::RequestNotFound)?;
            if !request.is_open() {
                return Err(BoardError::RequestClosed);
            }
        }

        let now = self.clock.now();
        let mut log = StatusLog::new(
            input.request_id,
            input.author_id,
            content,
            input.position,
            now,
        );

        if log.is_free_share() && self.config.share_reward > 0 {
            log.rewarded = true;
            let reward = PointEntry::reward(
                input.author_id,
                self.config.share_reward,
                SHARE_REWARD_REASON,
                now,
            )?;
            self.status_log_repo
                .create_log_with_reward(&log, &reward)
                .await?;
        } else {
            self.status_log_repo.create_log(&log).await?;
        }

        tracing::info!(
            status_log_id = %log.status_log_id,
            author_id = %log.author_id,
            free_share = log.is_free_share(),
            "Answer submitted"
        );

        Ok(log)
    }
}
