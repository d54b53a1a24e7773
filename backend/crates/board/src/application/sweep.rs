//! Settlement Sweep
//!
//! Periodic, stateless trigger for the automatic closure path. Each pass
//! lists expired open requests and settles them one by one, each in its own
//! transaction; one request's failure never aborts the rest of the pass.
//!
//! Multiple nodes may run this concurrently. A request another closer got
//! to first simply loses its CAS here and is logged as a conflict; the
//! winner's settlement stands and `point_handled` keeps the payout single.

use std::sync::Arc;

use kernel::clock::Clock;

use crate::application::close_expired::CloseExpiredRequestUseCase;
use crate::application::config::BoardConfig;
use crate::domain::repository::{RequestRepository, SettlementRepository, StatusLogRepository};
use crate::error::{BoardError, BoardResult};

/// Counters for one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Candidates seen
    pub scanned: u32,
    /// Requests settled by this pass
    pub settled: u32,
    /// Candidates lost to a concurrent closer
    pub conflicts: u32,
    /// Candidates that failed for any other reason
    pub failures: u32,
}

/// Settlement sweep
pub struct SettlementSweep<R, S, T>
where
    R: RequestRepository,
    S: StatusLogRepository,
    T: SettlementRepository,
{
    request_repo: Arc<R>,
    close_expired: CloseExpiredRequestUseCase<S, T>,
    config: Arc<BoardConfig>,
    clock: Arc<dyn Clock>,
}

impl<R, S, T> SettlementSweep<R, S, T>
where
    R: RequestRepository,
    S: StatusLogRepository,
    T: SettlementRepository,
{
    pub fn new(
        request_repo: Arc<R>,
        status_log_repo: Arc<S>,
        settlement_repo: Arc<T>,
        config: Arc<BoardConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let close_expired = CloseExpiredRequestUseCase::new(
            status_log_repo,
            settlement_repo,
            config.clone(),
            clock.clone(),
        );
        Self {
            request_repo,
            close_expired,
            config,
            clock,
        }
    }

    /// One sweep pass. Never returns an error for an individual request;
    /// only listing the candidates can fail the pass itself.
    pub async fn run_once(&self) -> BoardResult<SweepStats> {
        let cutoff = self.clock.now() - self.config.request_timeout_chrono();
        let candidates = self
            .request_repo
            .list_expired_open(cutoff, self.config.sweep_batch_limit)
            .await?;

        let mut stats = SweepStats::default();
        for request in &candidates {
            stats.scanned += 1;
            match self.close_expired.execute(request).await {
                Ok(settlement) => {
                    stats.settled += 1;
                    tracing::debug!(
                        request_id = %request.request_id,
                        credits = settlement.credits.len(),
                        forfeited = settlement.forfeited,
                        "Sweep settled request"
                    );
                }
                Err(BoardError::VersionConflict)
                | Err(BoardError::RequestClosed)
                | Err(BoardError::AlreadySelected) => {
                    // Superseded by a concurrent closer; the next pass will
                    // not see this request again.
                    stats.conflicts += 1;
                    tracing::warn!(
                        request_id = %request.request_id,
                        "Sweep lost request to a concurrent closer"
                    );
                }
                Err(e) => {
                    stats.failures += 1;
                    tracing::error!(
                        request_id = %request.request_id,
                        error = %e,
                        "Sweep failed to settle request"
                    );
                }
            }
        }

        if stats.scanned > 0 {
            tracing::info!(
                scanned = stats.scanned,
                settled = stats.settled,
                conflicts = stats.conflicts,
                failures = stats.failures,
                "Settlement sweep pass completed"
            );
        }

        Ok(stats)
    }

    /// Run the sweep on its fixed period until the task is dropped.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.config.sweep_period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = self.run_once().await {
                tracing::error!(error = %e, "Settlement sweep pass aborted");
            }
        }
    }
}
