//! Close Expired Request Use Case
//!
//! The automatic closure path, driven by the settlement sweep. The pool is
//! debited whether or not anyone answered; visible answerers split it by
//! floor division, the remainder is forfeited.

use std::sync::Arc;

use kernel::clock::Clock;

use crate::application::config::BoardConfig;
use crate::domain::entities::Request;
use crate::domain::repository::{SettlementRepository, StatusLogRepository};
use crate::domain::services::Settlement;
use crate::error::{BoardError, BoardResult};

/// Close expired request use case
pub struct CloseExpiredRequestUseCase<S, T>
where
    S: StatusLogRepository,
    T: SettlementRepository,
{
    status_log_repo: Arc<S>,
    settlement_repo: Arc<T>,
    config: Arc<BoardConfig>,
    clock: Arc<dyn Clock>,
}

impl<S, T> CloseExpiredRequestUseCase<S, T>
where
    S: StatusLogRepository,
    T: SettlementRepository,
{
    pub fn new(
        status_log_repo: Arc<S>,
        settlement_repo: Arc<T>,
        config: Arc<BoardConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status_log_repo,
            settlement_repo,
            config,
            clock,
        }
    }

    /// Settle one expired request. `request` is the candidate as loaded by
    /// the sweep; the version CAS inside `settle_timeout` decides whether
    /// that snapshot is still current.
    pub async fn execute(&self, request: &Request) -> BoardResult<Settlement> {
        let now = self.clock.now();

        if !request.is_open() || request.point_handled {
            return Err(BoardError::RequestClosed);
        }
        if !request.is_expired(now, self.config.request_timeout_chrono()) {
            return Err(BoardError::Internal(format!(
                "Request {} is not yet expired",
                request.request_id
            )));
        }
        if self
            .status_log_repo
            .has_selected(&request.request_id)
            .await?
        {
            return Err(BoardError::AlreadySelected);
        }

        let settlement = self.settlement_repo.settle_timeout(request, now).await?;

        tracing::info!(
            request_id = %request.request_id,
            debited = settlement.debited,
            answerers = settlement.credits.len(),
            forfeited = settlement.forfeited,
            "Request settled by timeout"
        );

        Ok(settlement)
    }
}
