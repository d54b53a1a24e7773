//! Create Request Use Case
//!
//! A request's pool is funds-checked here, at creation. That reservation is
//! why the close-time pool debit is exempt from the balance guard.

use std::sync::Arc;

use kernel::clock::Clock;
use kernel::id::UserId;
use ledger::{LedgerError, LedgerRepository};

use crate::domain::entities::{Position, Request};
use crate::domain::repository::RequestRepository;
use crate::error::{BoardError, BoardResult};

/// Input DTO for create request
#[derive(Debug, Clone)]
pub struct CreateRequestInput {
    pub requester_id: UserId,
    pub reward_pool: i64,
    pub position: Option<Position>,
}

/// Create request use case
pub struct CreateRequestUseCase<R, L>
where
    R: RequestRepository,
    L: LedgerRepository,
{
    request_repo: Arc<R>,
    ledger_repo: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<R, L> CreateRequestUseCase<R, L>
where
    R: RequestRepository,
    L: LedgerRepository,
{
    pub fn new(request_repo: Arc<R>, ledger_repo: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self {
            request_repo,
            ledger_repo,
            clock,
        }
    }

    pub async fn execute(&self, input: CreateRequestInput) -> BoardResult<Request> {
        if input.reward_pool <= 0 {
            return Err(BoardError::InvalidRewardPool(input.reward_pool));
        }

        let account = self
            .ledger_repo
            .find_account(&input.requester_id)
            .await?
            .ok_or(BoardError::UserNotFound)?;

        if !account.active {
            return Err(BoardError::UserInactive);
        }

        if account.point_balance < input.reward_pool {
            return Err(BoardError::Ledger(LedgerError::InsufficientFunds {
                balance: account.point_balance,
                requested: input.reward_pool,
            }));
        }

        let request = Request::new(
            input.requester_id,
            input.reward_pool,
            input.position,
            self.clock.now(),
        );
        self.request_repo.create(&request).await?;

        tracing::info!(
            request_id = %request.request_id,
            requester_id = %request.requester_id,
            reward_pool = request.reward_pool,
            "Request created"
        );

        Ok(request)
    }
}
