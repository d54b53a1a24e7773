//! PostgreSQL Repository Implementations
//!
//! Every conditional write follows the same CAS shape:
//! `UPDATE ... SET version = version + 1 WHERE id = $1 AND version = $2`,
//! and zero affected rows means `VersionConflict`, rolling the enclosing
//! transaction back. Ledger movements go through `ledger::post_in_tx` so
//! they commit with the state flip or not at all.

use chrono::{DateTime, Utc};
use kernel::id::{ReportId, RequestId, StatusLogId, UserId};
use ledger::{FundsGuard, PointEntry, post_in_tx};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entities::{Position, Report, Request, StatusLog};
use crate::domain::repository::{
    ModerationRepository, ReportRepository, RequestRepository, SettlementRepository,
    StatusLogRepository,
};
use crate::domain::services::{
    SELECTION_REASON, Settlement, SettlementCredit, TIMEOUT_CREDIT_REASON, TIMEOUT_DEBIT_REASON,
    split_reward,
};
use crate::error::{BoardError, BoardResult};

/// PostgreSQL-backed board repository
#[derive(Clone)]
pub struct PgBoardRepository {
    pool: PgPool,
}

impl PgBoardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Request Repository Implementation
// ============================================================================

impl RequestRepository for PgBoardRepository {
    async fn create(&self, request: &Request) -> BoardResult<()> {
        sqlx::query(
            r#"
            INSERT INTO requests (
                request_id,
                requester_id,
                reward_pool,
                latitude,
                longitude,
                closed,
                point_handled,
                version,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(request.request_id.as_uuid())
        .bind(request.requester_id.as_uuid())
        .bind(request.reward_pool)
        .bind(request.position.map(|p| p.latitude))
        .bind(request.position.map(|p| p.longitude))
        .bind(request.closed)
        .bind(request.point_handled)
        .bind(request.version)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_request(&self, request_id: &RequestId) -> BoardResult<Option<Request>> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT
                request_id,
                requester_id,
                reward_pool,
                latitude,
                longitude,
                closed,
                point_handled,
                version,
                created_at
            FROM requests
            WHERE request_id = $1
            "#,
        )
        .bind(request_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_request()))
    }

    async fn list_expired_open(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> BoardResult<Vec<Request>> {
        let rows = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT
                r.request_id,
                r.requester_id,
                r.reward_pool,
                r.latitude,
                r.longitude,
                r.closed,
                r.point_handled,
                r.version,
                r.created_at
            FROM requests r
            WHERE r.closed = FALSE
              AND r.point_handled = FALSE
              AND r.created_at < $1
              AND NOT EXISTS (
                  SELECT 1 FROM status_logs s
                  WHERE s.request_id = r.request_id AND s.selected = TRUE
              )
            ORDER BY r.created_at
            LIMIT $2
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_request()).collect())
    }
}

// ============================================================================
// StatusLog Repository Implementation
// ============================================================================

impl StatusLogRepository for PgBoardRepository {
    async fn create_log(&self, log: &StatusLog) -> BoardResult<()> {
        insert_status_log(&self.pool, log).await
    }

    async fn create_log_with_reward(
        &self,
        log: &StatusLog,
        reward: &PointEntry,
    ) -> BoardResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_status_log(&mut *tx, log).await?;
        post_in_tx(&mut tx, reward, FundsGuard::Enforce).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_log(&self, status_log_id: &StatusLogId) -> BoardResult<Option<StatusLog>> {
        let row = sqlx::query_as::<_, StatusLogRow>(
            r#"
            SELECT
                status_log_id,
                request_id,
                author_id,
                content,
                selected,
                hidden,
                report_count,
                rewarded,
                version,
                latitude,
                longitude,
                created_at
            FROM status_logs
            WHERE status_log_id = $1
            "#,
        )
        .bind(status_log_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_status_log()))
    }

    async fn list_visible(&self, request_id: &RequestId) -> BoardResult<Vec<StatusLog>> {
        let rows = sqlx::query_as::<_, StatusLogRow>(
            r#"
            SELECT
                status_log_id,
                request_id,
                author_id,
                content,
                selected,
                hidden,
                report_count,
                rewarded,
                version,
                latitude,
                longitude,
                created_at
            FROM status_logs
            WHERE request_id = $1 AND hidden = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(request_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_status_log()).collect())
    }

    async fn has_selected(&self, request_id: &RequestId) -> BoardResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM status_logs WHERE request_id = $1 AND selected = TRUE)",
        )
        .bind(request_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_submitted_since(
        &self,
        author_id: &UserId,
        since: DateTime<Utc>,
    ) -> BoardResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM status_logs WHERE author_id = $1 AND created_at >= $2",
        )
        .bind(author_id.as_uuid())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// ============================================================================
// Report Repository Implementation
// ============================================================================

impl ReportRepository for PgBoardRepository {
    async fn find_report(&self, report_id: &ReportId) -> BoardResult<Option<Report>> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT
                report_id,
                status_log_id,
                reporter_id,
                reason,
                created_at
            FROM reports
            WHERE report_id = $1
            "#,
        )
        .bind(report_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_report()))
    }
}

// ============================================================================
// Settlement Repository Implementation
// ============================================================================

impl SettlementRepository for PgBoardRepository {
    async fn settle_selection(
        &self,
        request: &Request,
        winner: &StatusLog,
        at: DateTime<Utc>,
    ) -> BoardResult<Settlement> {
        let mut tx = self.pool.begin().await?;

        // point_handled is re-checked in the same conditional write as the
        // version; a closer that already settled cannot match either.
        close_request_cas(&mut tx, request).await?;

        let marked = sqlx::query(
            r#"
            UPDATE status_logs
            SET selected = TRUE, version = version + 1
            WHERE status_log_id = $1
              AND version = $2
              AND hidden = FALSE
              AND selected = FALSE
            "#,
        )
        .bind(winner.status_log_id.as_uuid())
        .bind(winner.version)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if marked == 0 {
            return Err(BoardError::VersionConflict);
        }

        let debit = PointEntry::deduct(
            request.requester_id,
            request.reward_pool,
            SELECTION_REASON,
            at,
        )?;
        post_in_tx(&mut tx, &debit, FundsGuard::Exempt).await?;

        let credit = PointEntry::earn(
            winner.author_id,
            request.reward_pool,
            SELECTION_REASON,
            at,
        )?;
        post_in_tx(&mut tx, &credit, FundsGuard::Enforce).await?;

        tx.commit().await?;

        Ok(Settlement {
            request_id: request.request_id,
            debited: request.reward_pool,
            credits: vec![SettlementCredit {
                user_id: winner.author_id,
                amount: request.reward_pool,
            }],
            forfeited: 0,
        })
    }

    async fn settle_timeout(
        &self,
        request: &Request,
        at: DateTime<Utc>,
    ) -> BoardResult<Settlement> {
        let mut tx = self.pool.begin().await?;

        close_request_cas(&mut tx, request).await?;

        let debit = PointEntry::deduct(
            request.requester_id,
            request.reward_pool,
            TIMEOUT_DEBIT_REASON,
            at,
        )?;
        post_in_tx(&mut tx, &debit, FundsGuard::Exempt).await?;

        // Visible answers as of this transaction, not as of the sweep's
        // earlier candidate scan.
        let answers = sqlx::query_as::<_, StatusLogRow>(
            r#"
            SELECT
                status_log_id,
                request_id,
                author_id,
                content,
                selected,
                hidden,
                report_count,
                rewarded,
                version,
                latitude,
                longitude,
                created_at
            FROM status_logs
            WHERE request_id = $1 AND hidden = FALSE
            "#,
        )
        .bind(request.request_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?;

        let split = split_reward(request.reward_pool, answers.len());
        let mut credits = Vec::new();
        if split.per_share > 0 {
            for answer in &answers {
                let author = UserId::from_uuid(answer.author_id);
                let credit =
                    PointEntry::earn(author, split.per_share, TIMEOUT_CREDIT_REASON, at)?;
                post_in_tx(&mut tx, &credit, FundsGuard::Enforce).await?;
                credits.push(SettlementCredit {
                    user_id: author,
                    amount: split.per_share,
                });
            }
        }

        tx.commit().await?;

        Ok(Settlement {
            request_id: request.request_id,
            debited: request.reward_pool,
            credits,
            forfeited: split.forfeited,
        })
    }
}

/// CAS-close a request inside `tx`
async fn close_request_cas(
    tx: &mut Transaction<'_, Postgres>,
    request: &Request,
) -> BoardResult<()> {
    let closed = sqlx::query(
        r#"
        UPDATE requests
        SET closed = TRUE, point_handled = TRUE, version = version + 1
        WHERE request_id = $1
          AND version = $2
          AND point_handled = FALSE
        "#,
    )
    .bind(request.request_id.as_uuid())
    .bind(request.version)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if closed == 0 {
        return Err(BoardError::VersionConflict);
    }
    Ok(())
}

// ============================================================================
// Moderation Repository Implementation
// ============================================================================

impl ModerationRepository for PgBoardRepository {
    async fn file_report(
        &self,
        report: &Report,
        answer: &StatusLog,
        new_count: i32,
        hidden: bool,
    ) -> BoardResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO reports (
                report_id,
                status_log_id,
                reporter_id,
                reason,
                created_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(report.report_id.as_uuid())
        .bind(report.status_log_id.as_uuid())
        .bind(report.reporter_id.as_uuid())
        .bind(&report.reason)
        .bind(report.created_at)
        .execute(&mut *tx)
        .await?;

        update_moderation_cas(&mut tx, answer, new_count, hidden, answer.rewarded).await?;
        bump_author_report_count(&mut tx, &answer.author_id, 1).await?;

        tx.commit().await?;

        tracing::info!(
            report_id = %report.report_id,
            status_log_id = %answer.status_log_id,
            report_count = new_count,
            hidden,
            "Report filed"
        );

        Ok(())
    }

    async fn remove_report(
        &self,
        report: &Report,
        answer: &StatusLog,
        new_count: i32,
        hidden: bool,
    ) -> BoardResult<()> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM reports WHERE report_id = $1")
            .bind(report.report_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            // Removed by a concurrent admin action since it was loaded.
            return Err(BoardError::ReportNotFound);
        }

        update_moderation_cas(&mut tx, answer, new_count, hidden, answer.rewarded).await?;
        bump_author_report_count(&mut tx, &answer.author_id, -1).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn apply_block(
        &self,
        answer: &StatusLog,
        refund: Option<PointEntry>,
    ) -> BoardResult<()> {
        let mut tx = self.pool.begin().await?;

        let rewarded_after = answer.rewarded && refund.is_none();
        update_moderation_cas(&mut tx, answer, answer.report_count, true, rewarded_after)
            .await?;

        if let Some(refund) = refund {
            // Clawback applies even if the author already spent the grant.
            post_in_tx(&mut tx, &refund, FundsGuard::Exempt).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn apply_unblock(
        &self,
        answer: &StatusLog,
        reissue: Option<PointEntry>,
    ) -> BoardResult<()> {
        let mut tx = self.pool.begin().await?;

        let rewarded_after = answer.rewarded || reissue.is_some();
        update_moderation_cas(&mut tx, answer, answer.report_count, false, rewarded_after)
            .await?;

        if let Some(reissue) = reissue {
            post_in_tx(&mut tx, &reissue, FundsGuard::Enforce).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// CAS-update an answer's moderation state inside `tx`
async fn update_moderation_cas(
    tx: &mut Transaction<'_, Postgres>,
    answer: &StatusLog,
    new_count: i32,
    hidden: bool,
    rewarded: bool,
) -> BoardResult<()> {
    let updated = sqlx::query(
        r#"
        UPDATE status_logs
        SET report_count = $3, hidden = $4, rewarded = $5, version = version + 1
        WHERE status_log_id = $1 AND version = $2
        "#,
    )
    .bind(answer.status_log_id.as_uuid())
    .bind(answer.version)
    .bind(new_count)
    .bind(hidden)
    .bind(rewarded)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(BoardError::VersionConflict);
    }
    Ok(())
}

/// Adjust the author's directory-level report count, floored at zero
async fn bump_author_report_count(
    tx: &mut Transaction<'_, Postgres>,
    author_id: &UserId,
    delta: i32,
) -> BoardResult<()> {
    let updated = sqlx::query(
        "UPDATE users SET report_count = GREATEST(report_count + $2, 0) WHERE user_id = $1",
    )
    .bind(author_id.as_uuid())
    .bind(delta)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(BoardError::UserNotFound);
    }
    Ok(())
}

/// Insert helper shared by the plain and with-reward creation paths
async fn insert_status_log<'e, E>(executor: E, log: &StatusLog) -> BoardResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO status_logs (
            status_log_id,
            request_id,
            author_id,
            content,
            selected,
            hidden,
            report_count,
            rewarded,
            version,
            latitude,
            longitude,
            created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(log.status_log_id.as_uuid())
    .bind(log.request_id.as_ref().map(|id| *id.as_uuid()))
    .bind(log.author_id.as_uuid())
    .bind(&log.content)
    .bind(log.selected)
    .bind(log.hidden)
    .bind(log.report_count)
    .bind(log.rewarded)
    .bind(log.version)
    .bind(log.position.map(|p| p.latitude))
    .bind(log.position.map(|p| p.longitude))
    .bind(log.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct RequestRow {
    request_id: Uuid,
    requester_id: Uuid,
    reward_pool: i64,
    latitude: Option<f64>,
    longitude: Option<f64>,
    closed: bool,
    point_handled: bool,
    version: i64,
    created_at: DateTime<Utc>,
}

impl RequestRow {
    fn into_request(self) -> Request {
        Request {
            request_id: RequestId::from_uuid(self.request_id),
            requester_id: UserId::from_uuid(self.requester_id),
            reward_pool: self.reward_pool,
            position: position_from(self.latitude, self.longitude),
            closed: self.closed,
            point_handled: self.point_handled,
            version: self.version,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatusLogRow {
    status_log_id: Uuid,
    request_id: Option<Uuid>,
    author_id: Uuid,
    content: String,
    selected: bool,
    hidden: bool,
    report_count: i32,
    rewarded: bool,
    version: i64,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
}

impl StatusLogRow {
    fn into_status_log(self) -> StatusLog {
        StatusLog {
            status_log_id: StatusLogId::from_uuid(self.status_log_id),
            request_id: self.request_id.map(RequestId::from_uuid),
            author_id: UserId::from_uuid(self.author_id),
            content: self.content,
            selected: self.selected,
            hidden: self.hidden,
            report_count: self.report_count,
            rewarded: self.rewarded,
            version: self.version,
            position: position_from(self.latitude, self.longitude),
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    report_id: Uuid,
    status_log_id: Uuid,
    reporter_id: Uuid,
    reason: String,
    created_at: DateTime<Utc>,
}

impl ReportRow {
    fn into_report(self) -> Report {
        Report {
            report_id: ReportId::from_uuid(self.report_id),
            status_log_id: StatusLogId::from_uuid(self.status_log_id),
            reporter_id: UserId::from_uuid(self.reporter_id),
            reason: self.reason,
            created_at: self.created_at,
        }
    }
}

fn position_from(latitude: Option<f64>, longitude: Option<f64>) -> Option<Position> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Position {
            latitude,
            longitude,
        }),
        _ => None,
    }
}
