//! In-Memory Repository Implementation
//!
//! Mirrors the PostgreSQL semantics (atomic post, funds guard, per-user
//! balance cache) behind a mutex. Used by tests and by other crates' tests
//! through their in-memory repositories.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use kernel::id::UserId;
use uuid::Uuid;

use crate::domain::entities::{FundsGuard, PointEntry, UserAccount};
use crate::domain::repository::LedgerRepository;
use crate::error::{LedgerError, LedgerResult};

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, UserAccount>,
    entries: Vec<PointEntry>,
}

/// In-memory ledger store
#[derive(Clone, Default)]
pub struct MemLedgerRepository {
    state: Arc<Mutex<State>>,
}

impl MemLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user directory row
    pub fn upsert_account(&self, account: UserAccount) {
        let mut state = self.lock();
        state.accounts.insert(account.user_id.into_uuid(), account);
    }

    /// Seed an active account with a starting balance
    pub fn seed_user(&self, user_id: UserId, point_balance: i64) {
        self.upsert_account(UserAccount {
            user_id,
            point_balance,
            report_count: 0,
            active: true,
        });
    }

    /// Adjust a user's report count, floored at zero
    pub fn bump_report_count(&self, user_id: &UserId, delta: i32) -> LedgerResult<i32> {
        let mut state = self.lock();
        let account = state
            .accounts
            .get_mut(user_id.as_uuid())
            .ok_or(LedgerError::UserNotFound)?;
        account.report_count = (account.report_count + delta).max(0);
        Ok(account.report_count)
    }

    /// Apply a batch of posts atomically: all entries are validated against
    /// the pre-batch state before any balance moves, so a failing batch
    /// leaves no partial writes (same guarantee the Pg transaction gives).
    pub fn post_batch(&self, posts: &[(PointEntry, FundsGuard)]) -> LedgerResult<Vec<i64>> {
        let mut state = self.lock();

        // Validation pass over a scratch copy of the balances.
        let mut projected: HashMap<Uuid, i64> = HashMap::new();
        for (entry, guard) in posts {
            if entry.amount == 0 {
                return Err(LedgerError::InvalidAmount(0));
            }
            let uuid = entry.user_id.into_uuid();
            let current = match projected.get(&uuid) {
                Some(balance) => *balance,
                None => {
                    state
                        .accounts
                        .get(&uuid)
                        .ok_or(LedgerError::UserNotFound)?
                        .point_balance
                }
            };
            let next = current + entry.amount;
            if *guard == FundsGuard::Enforce && entry.amount < 0 && next < 0 {
                return Err(LedgerError::InsufficientFunds {
                    balance: current,
                    requested: -entry.amount,
                });
            }
            projected.insert(uuid, next);
        }

        // Apply pass.
        let mut balances = Vec::with_capacity(posts.len());
        for (entry, _) in posts {
            let uuid = entry.user_id.into_uuid();
            let account = state
                .accounts
                .get_mut(&uuid)
                .ok_or(LedgerError::UserNotFound)?;
            account.point_balance += entry.amount;
            balances.push(account.point_balance);
            state.entries.push(entry.clone());
        }
        Ok(balances)
    }

    /// All entries for a user, oldest first (test inspection helper)
    pub fn entries_for(&self, user_id: &UserId) -> Vec<PointEntry> {
        let state = self.lock();
        state
            .entries
            .iter()
            .filter(|e| e.user_id.as_uuid() == user_id.as_uuid())
            .cloned()
            .collect()
    }

    /// Total number of ledger entries (test inspection helper)
    pub fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("ledger state lock poisoned")
    }
}

impl LedgerRepository for MemLedgerRepository {
    async fn post(&self, entry: &PointEntry, guard: FundsGuard) -> LedgerResult<i64> {
        let balances = self.post_batch(&[(entry.clone(), guard)])?;
        Ok(balances[0])
    }

    async fn history(&self, user_id: &UserId, limit: i64) -> LedgerResult<Vec<PointEntry>> {
        let state = self.lock();
        if !state.accounts.contains_key(user_id.as_uuid()) {
            return Err(LedgerError::UserNotFound);
        }
        let mut entries: Vec<PointEntry> = state
            .entries
            .iter()
            .filter(|e| e.user_id.as_uuid() == user_id.as_uuid())
            .cloned()
            .collect();
        entries.reverse(); // newest first
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }

    async fn balance(&self, user_id: &UserId) -> LedgerResult<i64> {
        let state = self.lock();
        state
            .accounts
            .get(user_id.as_uuid())
            .map(|a| a.point_balance)
            .ok_or(LedgerError::UserNotFound)
    }

    async fn find_account(&self, user_id: &UserId) -> LedgerResult<Option<UserAccount>> {
        let state = self.lock();
        Ok(state.accounts.get(user_id.as_uuid()).cloned())
    }
}
