//! Select Answer Use Case
//!
//! The manual closure path: the requester picks a winner, the request
//! closes, and the whole pool goes to that single answerer. No split math
//! on this path.

use std::sync::Arc;

use kernel::clock::Clock;
use kernel::id::{StatusLogId, UserId};

use crate::domain::repository::{RequestRepository, SettlementRepository, StatusLogRepository};
use crate::domain::services::Settlement;
use crate::error::{BoardError, BoardResult};

/// Select answer use case
pub struct SelectAnswerUseCase<R, S, T>
where
    R: RequestRepository,
    S: StatusLogRepository,
    T: SettlementRepository,
{
    request_repo: Arc<R>,
    status_log_repo: Arc<S>,
    settlement_repo: Arc<T>,
    clock: Arc<dyn Clock>,
}

impl<R, S, T> SelectAnswerUseCase<R, S, T>
where
    R: RequestRepository,
    S: StatusLogRepository,
    T: SettlementRepository,
{
    pub fn new(
        request_repo: Arc<R>,
        status_log_repo: Arc<S>,
        settlement_repo: Arc<T>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            request_repo,
            status_log_repo,
            settlement_repo,
            clock,
        }
    }

    /// `caller_id` must be the requester of the answer's parent request.
    ///
    /// A lost race against the sweep (or another selection) surfaces as
    /// `VersionConflict`; the caller may reload and retry, and will then
    /// see the request closed.
    pub async fn execute(
        &self,
        answer_id: StatusLogId,
        caller_id: UserId,
    ) -> BoardResult<Settlement> {
        let answer = self
            .status_log_repo
            .find_log(&answer_id)
            .await?
            .ok_or(BoardError::AnswerNotFound)?;

        let request_id = answer.request_id.ok_or(BoardError::NotARequestAnswer)?;

        let request = self
            .request_repo
            .find_request(&request_id)
            .await?
            .ok_or(BoardError::RequestNotFound)?;

        if request.requester_id != caller_id {
            return Err(BoardError::NotRequestOwner);
        }
        if !request.is_open() || request.point_handled {
            return Err(BoardError::RequestClosed);
        }
        if answer.hidden {
            return Err(BoardError::AnswerHidden);
        }
        if answer.selected {
            return Err(BoardError::AlreadySelected);
        }

        let settlement = self
            .settlement_repo
            .settle_selection(&request, &answer, self.clock.now())
            .await?;

        tracing::info!(
            request_id = %request.request_id,
            winner = %answer.author_id,
            reward_pool = request.reward_pool,
            "Request settled by selection"
        );

        Ok(settlement)
    }
}
