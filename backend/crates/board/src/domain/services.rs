//! Domain Services
//!
//! Pure settlement math, shared by both closure paths and by tests.

use kernel::id::{RequestId, UserId};

/// Reason string on settlement entries for the manual path
pub const SELECTION_REASON: &str = "selection settlement";
/// Reason string on settlement debits for the timeout path
pub const TIMEOUT_DEBIT_REASON: &str = "auto-close settlement";
/// Reason string on settlement credits for the timeout path
pub const TIMEOUT_CREDIT_REASON: &str = "auto-close distribution";

/// Result of splitting a reward pool across answerers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardSplit {
    /// Floor share per answerer (zero when there are no answerers)
    pub per_share: i64,
    /// Total actually paid out (`per_share * shares`)
    pub paid: i64,
    /// Remainder, neither paid nor refunded
    pub forfeited: i64,
}

/// Floor-divide the pool across `shares` answerers.
///
/// The remainder is forfeited. This mirrors the manual path's asymmetry:
/// a selected answer takes the whole pool, the timeout path splits it.
pub fn split_reward(pool: i64, shares: usize) -> RewardSplit {
    if shares == 0 {
        return RewardSplit {
            per_share: 0,
            paid: 0,
            forfeited: pool,
        };
    }
    let per_share = pool / shares as i64;
    let paid = per_share * shares as i64;
    RewardSplit {
        per_share,
        paid,
        forfeited: pool - paid,
    }
}

/// One credit leg of a settlement
#[derive(Debug, Clone)]
pub struct SettlementCredit {
    pub user_id: UserId,
    pub amount: i64,
}

/// Outcome of a committed settlement
///
/// `debited + sum(credits) + forfeited == 0` when the debit is counted
/// negative; tests assert this conservation property.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub request_id: RequestId,
    /// Points removed from the requester (positive quantity)
    pub debited: i64,
    pub credits: Vec<SettlementCredit>,
    /// Points that left the requester but were paid to no one
    pub forfeited: i64,
}

impl Settlement {
    pub fn total_credited(&self) -> i64 {
        self.credits.iter().map(|c| c.amount).sum()
    }

    /// Conservation check: everything debited is either credited or forfeited
    pub fn is_balanced(&self) -> bool {
        self.debited == self.total_credited() + self.forfeited
    }
}
