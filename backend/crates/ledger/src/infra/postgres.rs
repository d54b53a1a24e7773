//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{PointId, UserId};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entities::{FundsGuard, PointEntry, PointType, UserAccount};
use crate::domain::repository::LedgerRepository;
use crate::error::{LedgerError, LedgerResult};

/// Transactional post primitive
///
/// Appends the entry and moves the cached balance inside the **caller's**
/// transaction. Both writes commit or fail together with whatever else the
/// caller does in that transaction; this is what keeps settlement and
/// moderation refunds atomic with their state flips.
///
/// The balance `UPDATE` takes the row lock on `users`, which is the only
/// serialization needed for concurrent balance movements.
pub async fn post_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry: &PointEntry,
    guard: FundsGuard,
) -> LedgerResult<i64> {
    if entry.amount == 0 {
        return Err(LedgerError::InvalidAmount(0));
    }

    let new_balance = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE users
        SET point_balance = point_balance + $2
        WHERE user_id = $1
        RETURNING point_balance
        "#,
    )
    .bind(entry.user_id.as_uuid())
    .bind(entry.amount)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(LedgerError::UserNotFound)?;

    if guard == FundsGuard::Enforce && entry.amount < 0 && new_balance < 0 {
        // Caller rolls the transaction back; the balance write above never lands.
        return Err(LedgerError::InsufficientFunds {
            balance: new_balance - entry.amount,
            requested: -entry.amount,
        });
    }

    sqlx::query(
        r#"
        INSERT INTO points (
            point_id,
            user_id,
            amount,
            reason,
            point_type,
            created_at
        ) VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(entry.point_id.as_uuid())
    .bind(entry.user_id.as_uuid())
    .bind(entry.amount)
    .bind(&entry.reason)
    .bind(entry.entry_type.id())
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await?;

    tracing::info!(
        point_id = %entry.point_id,
        user_id = %entry.user_id,
        amount = entry.amount,
        point_type = entry.entry_type.code(),
        new_balance,
        "Point entry posted"
    );

    Ok(new_balance)
}

/// PostgreSQL-backed ledger repository
#[derive(Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LedgerRepository for PgLedgerRepository {
    async fn post(&self, entry: &PointEntry, guard: FundsGuard) -> LedgerResult<i64> {
        let mut tx = self.pool.begin().await?;
        let new_balance = post_in_tx(&mut tx, entry, guard).await?;
        tx.commit().await?;
        Ok(new_balance)
    }

    async fn history(&self, user_id: &UserId, limit: i64) -> LedgerResult<Vec<PointEntry>> {
        let rows = sqlx::query_as::<_, PointRow>(
            r#"
            SELECT
                point_id,
                user_id,
                amount,
                reason,
                point_type,
                created_at
            FROM points
            WHERE user_id = $1
            ORDER BY created_at DESC, point_id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_entry()).collect()
    }

    async fn balance(&self, user_id: &UserId) -> LedgerResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT point_balance FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::UserNotFound)
    }

    async fn find_account(&self, user_id: &UserId) -> LedgerResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                user_id,
                point_balance,
                report_count,
                active
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_account()))
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct PointRow {
    point_id: Uuid,
    user_id: Uuid,
    amount: i64,
    reason: String,
    point_type: i16,
    created_at: DateTime<Utc>,
}

impl PointRow {
    fn into_entry(self) -> LedgerResult<PointEntry> {
        Ok(PointEntry {
            point_id: PointId::from_uuid(self.point_id),
            user_id: UserId::from_uuid(self.user_id),
            amount: self.amount,
            reason: self.reason,
            entry_type: PointType::from_id(self.point_type)?,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    user_id: Uuid,
    point_balance: i64,
    report_count: i32,
    active: bool,
}

impl AccountRow {
    fn into_account(self) -> UserAccount {
        UserAccount {
            user_id: UserId::from_uuid(self.user_id),
            point_balance: self.point_balance,
            report_count: self.report_count,
            active: self.active,
        }
    }
}
