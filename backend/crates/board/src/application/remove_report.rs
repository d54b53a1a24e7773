//! Remove Report Use Case
//!
//! Admin false-positive removal: deletes the report, decrements both
//! counters (floored at zero), and un-hides the answer when its count
//! drops below the threshold.

use std::sync::Arc;

use kernel::id::{ReportId, UserId};

use crate::application::config::BoardConfig;
use crate::domain::repository::{ModerationRepository, ReportRepository, StatusLogRepository};
use crate::error::{BoardError, BoardResult};

/// Output DTO for remove report
#[derive(Debug, Clone)]
pub struct RemoveReportOutput {
    pub report_count: i32,
    pub hidden: bool,
}

/// Remove report use case
pub struct RemoveReportUseCase<P, S, M>
where
    P: ReportRepository,
    S: StatusLogRepository,
    M: ModerationRepository,
{
    report_repo: Arc<P>,
    status_log_repo: Arc<S>,
    moderation_repo: Arc<M>,
    config: Arc<BoardConfig>,
}

impl<P, S, M> RemoveReportUseCase<P, S, M>
where
    P: ReportRepository,
    S: StatusLogRepository,
    M: ModerationRepository,
{
    pub fn new(
        report_repo: Arc<P>,
        status_log_repo: Arc<S>,
        moderation_repo: Arc<M>,
        config: Arc<BoardConfig>,
    ) -> Self {
        Self {
            report_repo,
            status_log_repo,
            moderation_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        report_id: ReportId,
        admin_id: UserId,
    ) -> BoardResult<RemoveReportOutput> {
        let report = self
            .report_repo
            .find_report(&report_id)
            .await?
            .ok_or(BoardError::ReportNotFound)?;

        let answer = self
            .status_log_repo
            .find_log(&report.status_log_id)
            .await?
            .ok_or(BoardError::AnswerNotFound)?;

        let new_count = (answer.report_count - 1).max(0);
        let hidden = answer.hidden && new_count >= self.config.report_hide_threshold;

        self.moderation_repo
            .remove_report(&report, &answer, new_count, hidden)
            .await?;

        tracing::info!(
            report_id = %report_id,
            status_log_id = %answer.status_log_id,
            admin_id = %admin_id,
            report_count = new_count,
            unhidden = answer.hidden && !hidden,
            "Report removed as false positive"
        );

        Ok(RemoveReportOutput {
            report_count: new_count,
            hidden,
        })
    }
}
