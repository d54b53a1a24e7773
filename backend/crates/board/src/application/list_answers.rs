//! List Visible Answers Use Case

use std::sync::Arc;

use kernel::id::RequestId;

use crate::domain::entities::StatusLog;
use crate::domain::repository::{RequestRepository, StatusLogRepository};
use crate::error::{BoardError, BoardResult};

/// List visible answers use case
pub struct ListAnswersUseCase<R, S>
where
    R: RequestRepository,
    S: StatusLogRepository,
{
    request_repo: Arc<R>,
    status_log_repo: Arc<S>,
}

impl<R, S> ListAnswersUseCase<R, S>
where
    R: RequestRepository,
    S: StatusLogRepository,
{
    pub fn new(request_repo: Arc<R>, status_log_repo: Arc<S>) -> Self {
        Self {
            request_repo,
            status_log_repo,
        }
    }

    /// Non-hidden answers for the request, newest first
    pub async fn execute(&self, request_id: RequestId) -> BoardResult<Vec<StatusLog>> {
        self.request_repo
            .find_request(&request_id)
            .await?
            .ok_or(BoardError::RequestNotFound)?;

        self.status_log_repo.list_visible(&request_id).await
    }
}
