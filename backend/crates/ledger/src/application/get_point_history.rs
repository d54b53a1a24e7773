//! Get Point History Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entities::PointEntry;
use crate::domain::repository::LedgerRepository;
use crate::error::{LedgerError, LedgerResult};

/// Default page size when the caller does not specify one
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
/// Hard ceiling on a single history page
pub const MAX_HISTORY_LIMIT: i64 = 200;

/// Output DTO for point history
#[derive(Debug, Clone)]
pub struct PointHistoryOutput {
    pub user_id: UserId,
    pub point_balance: i64,
    pub entries: Vec<PointEntry>,
}

/// Get point history use case
pub struct GetPointHistoryUseCase<L>
where
    L: LedgerRepository,
{
    ledger_repo: Arc<L>,
}

impl<L> GetPointHistoryUseCase<L>
where
    L: LedgerRepository,
{
    pub fn new(ledger_repo: Arc<L>) -> Self {
        Self { ledger_repo }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> LedgerResult<PointHistoryOutput> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        let account = self
            .ledger_repo
            .find_account(&user_id)
            .await?
            .ok_or(LedgerError::UserNotFound)?;

        let entries = self.ledger_repo.history(&user_id, limit).await?;

        tracing::debug!(
            user_id = %user_id,
            entries = entries.len(),
            "Point history fetched"
        );

        Ok(PointHistoryOutput {
            user_id,
            point_balance: account.point_balance,
            entries,
        })
    }
}
