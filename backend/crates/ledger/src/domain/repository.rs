//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use crate::domain::entities::{FundsGuard, PointEntry, UserAccount};
use crate::error::LedgerResult;
use kernel::id::UserId;

/// Ledger repository trait
///
/// `post` runs in its own transaction: append the entry and move the cached
/// balance atomically. Other domains that need a post inside **their**
/// transaction use the infrastructure-level primitive directly instead of
/// this trait.
#[trait_variant::make(LedgerRepository: Send)]
pub trait LocalLedgerRepository {
    /// Append an entry and adjust the user's balance, atomically.
    /// Returns the resulting balance.
    async fn post(&self, entry: &PointEntry, guard: FundsGuard) -> LedgerResult<i64>;

    /// Point history for a user, newest first
    async fn history(&self, user_id: &UserId, limit: i64) -> LedgerResult<Vec<PointEntry>>;

    /// Current cached balance
    async fn balance(&self, user_id: &UserId) -> LedgerResult<i64>;

    /// Look up the user directory row
    async fn find_account(&self, user_id: &UserId) -> LedgerResult<Option<UserAccount>>;
}
