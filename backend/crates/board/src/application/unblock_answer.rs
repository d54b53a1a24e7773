//! Unblock Answer Use Case
//!
//! Admin force-unhide. A free-standing share whose reward was clawed back
//! gets it reissued in the same transaction. Idempotent: unblocking a
//! visible answer does nothing and posts nothing.

use std::sync::Arc;

use kernel::clock::Clock;
use kernel::id::{StatusLogId, UserId};
use ledger::PointEntry;

use crate::application::block_answer::ModerationActionOutput;
use crate::application::config::BoardConfig;
use crate::domain::repository::{ModerationRepository, StatusLogRepository};
use crate::error::{BoardError, BoardResult};

/// Reason string on reissue entries
pub const REWARD_REISSUE_REASON: &str = "share reward reissue";

/// Unblock answer use case
pub struct UnblockAnswerUseCase<S, M>
where
    S: StatusLogRepository,
    M: ModerationRepository,
{
    status_log_repo: Arc<S>,
    moderation_repo: Arc<M>,
    config: Arc<BoardConfig>,
    clock: Arc<dyn Clock>,
}

impl<S, M> UnblockAnswerUseCase<S, M>
where
    S: StatusLogRepository,
    M: ModerationRepository,
{
    pub fn new(
        status_log_repo: Arc<S>,
        moderation_repo: Arc<M>,
        config: Arc<BoardConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status_log_repo,
            moderation_repo,
            config,
            clock,
        }
    }

    pub async fn execute(
        &self,
        answer_id: StatusLogId,
        admin_id: UserId,
    ) -> BoardResult<ModerationActionOutput> {
        let answer = self
            .status_log_repo
            .find_log(&answer_id)
            .await?
            .ok_or(BoardError::AnswerNotFound)?;

        if !answer.hidden {
            tracing::debug!(
                status_log_id = %answer_id,
                admin_id = %admin_id,
                "Unblock skipped, answer already visible"
            );
            return Ok(ModerationActionOutput {
                answer_id,
                hidden: false,
                changed: false,
            });
        }

        // Reward eligibility: only free-standing shares carry the grant,
        // and only when it is not already held.
        let reissue = if answer.is_free_share()
            && !answer.rewarded
            && self.config.share_reward > 0
        {
            Some(PointEntry::reward(
                answer.author_id,
                self.config.share_reward,
                REWARD_REISSUE_REASON,
                self.clock.now(),
            )?)
        } else {
            None
        };
        let reissued = reissue.is_some();

        self.moderation_repo.apply_unblock(&answer, reissue).await?;

        tracing::info!(
            status_log_id = %answer_id,
            admin_id = %admin_id,
            reissued,
            "Answer unblocked"
        );

        Ok(ModerationActionOutput {
            answer_id,
            hidden: false,
            changed: true,
        })
    }
}
