//! Report Answer Use Case
//!
//! Appends a report and bumps both counters (answer and author). Crossing
//! the threshold hides the answer; it does not claw back an existing
//! free-share reward, clawback is an explicit admin block.

use std::sync::Arc;

use kernel::clock::Clock;
use kernel::id::{StatusLogId, UserId};
use ledger::LedgerRepository;

use crate::application::config::BoardConfig;
use crate::domain::entities::Report;
use crate::domain::repository::{ModerationRepository, StatusLogRepository};
use crate::error::{BoardError, BoardResult};

/// Input DTO for report answer
#[derive(Debug, Clone)]
pub struct ReportAnswerInput {
    pub answer_id: StatusLogId,
    pub reporter_id: UserId,
    pub reason: String,
}

/// Output DTO for report answer
#[derive(Debug, Clone)]
pub struct ReportAnswerOutput {
    pub report: Report,
    pub report_count: i32,
    pub hidden: bool,
}

/// Report answer use case
pub struct ReportAnswerUseCase<S, M, L>
where
    S: StatusLogRepository,
    M: ModerationRepository,
    L: LedgerRepository,
{
    status_log_repo: Arc<S>,
    moderation_repo: Arc<M>,
    ledger_repo: Arc<L>,
    config: Arc<BoardConfig>,
    clock: Arc<dyn Clock>,
}

impl<S, M, L> ReportAnswerUseCase<S, M, L>
where
    S: StatusLogRepository,
    M: ModerationRepository,
    L: LedgerRepository,
{
    pub fn new(
        status_log_repo: Arc<S>,
        moderation_repo: Arc<M>,
        ledger_repo: Arc<L>,
        config: Arc<BoardConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            status_log_repo,
            moderation_repo,
            ledger_repo,
            config,
            clock,
        }
    }

    pub async fn execute(&self, input: ReportAnswerInput) -> BoardResult<ReportAnswerOutput> {
        let answer = self
            .status_log_repo
            .find_log(&input.answer_id)
            .await?
            .ok_or(BoardError::AnswerNotFound)?;

        self.ledger_repo
            .find_account(&input.reporter_id)
            .await?
            .ok_or(BoardError::UserNotFound)?;

        let report = Report::new(
            input.answer_id,
            input.reporter_id,
            input.reason,
            self.clock.now(),
        );

        let new_count = answer.report_count + 1;
        let hidden = answer.hidden || new_count >= self.config.report_hide_threshold;

        self.moderation_repo
            .file_report(&report, &answer, new_count, hidden)
            .await?;

        if hidden && !answer.hidden {
            tracing::info!(
                status_log_id = %answer.status_log_id,
                report_count = new_count,
                "Answer hidden by report threshold"
            );
        }

        Ok(ReportAnswerOutput {
            report,
            report_count: new_count,
            hidden,
        })
    }
}
