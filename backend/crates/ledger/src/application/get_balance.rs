//! Get Balance Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::repository::LedgerRepository;
use crate::error::LedgerResult;

/// Get balance use case
pub struct GetBalanceUseCase<L>
where
    L: LedgerRepository,
{
    ledger_repo: Arc<L>,
}

impl<L> GetBalanceUseCase<L>
where
    L: LedgerRepository,
{
    pub fn new(ledger_repo: Arc<L>) -> Self {
        Self { ledger_repo }
    }

    pub async fn execute(&self, user_id: UserId) -> LedgerResult<i64> {
        self.ledger_repo.balance(&user_id).await
    }
}
