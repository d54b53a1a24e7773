//! Block Answer Use Case
//!
//! Admin force-hide. If the answer carries a free-share reward, the grant
//! is reversed in the same transaction. Idempotent: blocking an already
//! hidden answer does nothing and posts nothing.

use std::sync::Arc;

use kernel::clock::Clock;
use kernel::id::{StatusLogId, UserId};
use ledger::PointEntry;

use crate::application::config::BoardConfig;
use crate::domain::repository::{ModerationRepository, StatusLogRepository};
use crate::error::{BoardError, BoardResult};

/// Reason string on clawback entries
pub const REWARD_CLAWBACK_REASON: &str = "share reward clawback";

/// Output DTO for admin moderation actions
#[derive(Debug, Clone)]
pub struct ModerationActionOutput {
    pub answer_id: StatusLogId,
    pub hidden: bool,
    /// False when the action was an idempotent no-op
    pub changed: bool,
}

/// Block answer use case
pub struct BlockAnswerUseCase<S, M>
where
    S: StatusLogRepository,
    M: ModerationRepository,
{
    status_log_repo: Arc<S>,
    moderation_repo: Arc<M>,
    config: Arc<BoardConfig>,
    clock: Arc<dyn Clock>,
}

impl<S, M> BlockAnswerUseCase<S, M>
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

        if answer.hidden {
            tracing::debug!(
                status_log_id = %answer_id,
                admin_id = %admin_id,
                "Block skipped, answer already hidden"
            );
            return Ok(ModerationActionOutput {
                answer_id,
                hidden: true,
                changed: false,
            });
        }

        let refund = if answer.rewarded && self.config.share_reward > 0 {
            Some(PointEntry::deduct(
                answer.author_id,
                self.config.share_reward,
                REWARD_CLAWBACK_REASON,
                self.clock.now(),
            )?)
        } else {
            None
        };
        let clawed_back = refund.is_some();

        self.moderation_repo.apply_block(&answer, refund).await?;

        tracing::info!(
            status_log_id = %answer_id,
            admin_id = %admin_id,
            clawed_back,
            "Answer blocked"
        );

        Ok(ModerationActionOutput {
            answer_id,
            hidden: true,
            changed: true,
        })
    }
}
