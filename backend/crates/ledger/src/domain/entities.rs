//! Domain Entities
//!
//! Core business entities for the ledger domain.

use chrono::{DateTime, Utc};
use kernel::id::{PointId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Classification of a point movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum PointType {
    /// Points earned by answering (settlement credits)
    Earn = 0,
    /// Points deducted (settlement debits, clawbacks)
    Deduct = 1,
    /// Fixed rewards (free-standing share grant, admin reissue)
    Reward = 2,
}

impl PointType {
    /// Get numeric ID for database storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// Get string code for serialization/API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Earn => "earn",
            Self::Deduct => "deduct",
            Self::Reward => "reward",
        }
    }

    /// Restore from a database ID
    pub fn from_id(id: i16) -> LedgerResult<Self> {
        match id {
            0 => Ok(Self::Earn),
            1 => Ok(Self::Deduct),
            2 => Ok(Self::Reward),
            other => Err(LedgerError::Internal(format!(
                "Unknown point type id: {other}"
            ))),
        }
    }
}

/// Ledger entry - one immutable signed point movement
///
/// The sign convention follows the conservation invariant: `Earn` and
/// `Reward` entries carry positive amounts, `Deduct` entries negative ones,
/// so summing `amount` over a user reproduces the cached balance.
#[derive(Debug, Clone)]
pub struct PointEntry {
    pub point_id: PointId,
    pub user_id: UserId,
    /// Signed amount, never zero
    pub amount: i64,
    /// Free-text reason ("selection settlement", "auto-close distribution", ...)
    pub reason: String,
    pub entry_type: PointType,
    pub created_at: DateTime<Utc>,
}

impl PointEntry {
    /// Create an entry with an explicit signed amount
    ///
    /// Fails with `InvalidAmount` for zero, or for a sign that contradicts
    /// the entry type.
    pub fn new(
        user_id: UserId,
        amount: i64,
        reason: impl Into<String>,
        entry_type: PointType,
        at: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(0));
        }
        let sign_ok = match entry_type {
            PointType::Earn | PointType::Reward => amount > 0,
            PointType::Deduct => amount < 0,
        };
        if !sign_ok {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Ok(Self {
            point_id: PointId::new(),
            user_id,
            amount,
            reason: reason.into(),
            entry_type,
            created_at: at,
        })
    }

    /// Positive earn entry (`amount > 0`)
    pub fn earn(
        user_id: UserId,
        amount: i64,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        Self::new(user_id, amount, reason, PointType::Earn, at)
    }

    /// Deduction entry; `amount` is the positive quantity to remove
    pub fn deduct(
        user_id: UserId,
        amount: i64,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Self::new(user_id, -amount, reason, PointType::Deduct, at)
    }

    /// Fixed reward entry (`amount > 0`)
    pub fn reward(
        user_id: UserId,
        amount: i64,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        Self::new(user_id, amount, reason, PointType::Reward, at)
    }
}

/// Balance-check policy for a post
///
/// User-initiated deductions must not overdraw the balance. Settlement
/// forfeiture deductions are exempt: the pool was funds-checked when the
/// request was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundsGuard {
    /// Reject the post if it would leave the balance negative
    Enforce,
    /// Apply unconditionally
    Exempt,
}

/// The user directory's row, as far as the ledger sees it
///
/// `point_balance` is owned by this crate; `report_count` is owned by the
/// moderation side and only read here.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub user_id: UserId,
    pub point_balance: i64,
    pub report_count: i32,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_zero_amount_rejected() {
        let user = UserId::new();
        let err = PointEntry::new(user, 0, "zero", PointType::Earn, now()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(0)));
    }

    #[test]
    fn test_sign_convention() {
        let user = UserId::new();

        let earn = PointEntry::earn(user, 7, "selection settlement", now()).unwrap();
        assert_eq!(earn.amount, 7);
        assert_eq!(earn.entry_type, PointType::Earn);

        let deduct = PointEntry::deduct(user, 7, "selection settlement", now()).unwrap();
        assert_eq!(deduct.amount, -7);
        assert_eq!(deduct.entry_type, PointType::Deduct);

        let reward = PointEntry::reward(user, 2, "share reward", now()).unwrap();
        assert_eq!(reward.amount, 2);
    }

    #[test]
    fn test_contradicting_sign_rejected() {
        let user = UserId::new();
        assert!(PointEntry::new(user, -3, "bad", PointType::Earn, now()).is_err());
        assert!(PointEntry::new(user, 3, "bad", PointType::Deduct, now()).is_err());
        assert!(PointEntry::deduct(user, -3, "bad", now()).is_err());
    }

    #[test]
    fn test_point_type_roundtrip() {
        for t in [PointType::Earn, PointType::Deduct, PointType::Reward] {
            assert_eq!(PointType::from_id(t.id()).unwrap(), t);
        }
        assert!(PointType::from_id(9).is_err());
    }
}
