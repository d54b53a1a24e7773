//! HTTP Handlers
//!
//! Thin adapters: decode the DTO, run the use case, encode the result.
//! All business rules live in the application layer.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::clock::Clock;
use kernel::id::{ReportId, RequestId, StatusLogId, UserId};
use ledger::LedgerRepository;
use uuid::Uuid;

use crate::application::block_answer::BlockAnswerUseCase;
use crate::application::config::BoardConfig;
use crate::application::create_request::{CreateRequestInput, CreateRequestUseCase};
use crate::application::list_answers::ListAnswersUseCase;
use crate::application::remove_report::RemoveReportUseCase;
use crate::application::report_answer::{ReportAnswerInput, ReportAnswerUseCase};
use crate::application::select_answer::SelectAnswerUseCase;
use crate::application::submit_answer::{SubmitAnswerInput, SubmitAnswerUseCase};
use crate::application::unblock_answer::UnblockAnswerUseCase;
use crate::domain::repository::BoardRepository;
use crate::error::BoardResult;
use crate::presentation::dto::{
    AdminQuery, AnswerDto, AnswerListResponse, CreateRequestRequest, ModerationActionRequest,
    ModerationActionResponse, RemoveReportResponse, ReportAnswerRequest, ReportAnswerResponse,
    RequestDto, SelectAnswerRequest, SettlementResponse, SubmitAnswerRequest,
};

/// Shared state for board handlers
#[derive(Clone)]
pub struct BoardAppState<R, L>
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub ledger: Arc<L>,
    pub config: Arc<BoardConfig>,
    pub clock: Arc<dyn Clock>,
}

/// POST /api/board/requests
pub async fn create_request<R, L>(
    State(state): State<BoardAppState<R, L>>,
    Json(body): Json<CreateRequestRequest>,
) -> BoardResult<(StatusCode, Json<RequestDto>)>
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = CreateRequestUseCase::new(
        state.repo.clone(),
        state.ledger.clone(),
        state.clock.clone(),
    );
    let request = use_case
        .execute(CreateRequestInput {
            requester_id: UserId::from_uuid(body.requester_id),
            reward_pool: body.reward_pool,
            position: body.position.map(Into::into),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RequestDto::from(&request))))
}

/// POST /api/board/answers
pub async fn submit_answer<R, L>(
    State(state): State<BoardAppState<R, L>>,
    Json(body): Json<SubmitAnswerRequest>,
) -> BoardResult<(StatusCode, Json<AnswerDto>)>
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = SubmitAnswerUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.ledger.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    let log = use_case
        .execute(SubmitAnswerInput {
            request_id: body.request_id.map(RequestId::from_uuid),
            author_id: UserId::from_uuid(body.author_id),
            content: body.content,
            position: body.position.map(Into::into),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AnswerDto::from(&log))))
}

/// GET /api/board/requests/{request_id}/answers
pub async fn list_answers<R, L>(
    State(state): State<BoardAppState<R, L>>,
    Path(request_id): Path<Uuid>,
) -> BoardResult<Json<AnswerListResponse>>
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = ListAnswersUseCase::new(state.repo.clone(), state.repo.clone());
    let answers = use_case.execute(RequestId::from_uuid(request_id)).await?;

    Ok(Json(AnswerListResponse {
        request_id,
        answers: answers.iter().map(AnswerDto::from).collect(),
    }))
}

/// POST /api/board/answers/{answer_id}/select
pub async fn select_answer<R, L>(
    State(state): State<BoardAppState<R, L>>,
    Path(answer_id): Path<Uuid>,
    Json(body): Json<SelectAnswerRequest>,
) -> BoardResult<Json<SettlementResponse>>
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = SelectAnswerUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.clock.clone(),
    );
    let settlement = use_case
        .execute(
            StatusLogId::from_uuid(answer_id),
            UserId::from_uuid(body.caller_id),
        )
        .await?;

    Ok(Json(SettlementResponse::from(&settlement)))
}

/// POST /api/board/answers/{answer_id}/reports
pub async fn report_answer<R, L>(
    State(state): State<BoardAppState<R, L>>,
    Path(answer_id): Path<Uuid>,
    Json(body): Json<ReportAnswerRequest>,
) -> BoardResult<(StatusCode, Json<ReportAnswerResponse>)>
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = ReportAnswerUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.ledger.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    let output = use_case
        .execute(ReportAnswerInput {
            answer_id: StatusLogId::from_uuid(answer_id),
            reporter_id: UserId::from_uuid(body.reporter_id),
            reason: body.reason,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReportAnswerResponse {
            report_id: output.report.report_id.into_uuid(),
            answer_id,
            report_count: output.report_count,
            hidden: output.hidden,
        }),
    ))
}

/// DELETE /api/board/reports/{report_id}
pub async fn remove_report<R, L>(
    State(state): State<BoardAppState<R, L>>,
    Path(report_id): Path<Uuid>,
    Query(query): Query<AdminQuery>,
) -> BoardResult<Json<RemoveReportResponse>>
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = RemoveReportUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );
    let output = use_case
        .execute(
            ReportId::from_uuid(report_id),
            UserId::from_uuid(query.admin_id),
        )
        .await?;

    Ok(Json(RemoveReportResponse {
        report_count: output.report_count,
        hidden: output.hidden,
    }))
}

/// POST /api/board/answers/{answer_id}/block
pub async fn block_answer<R, L>(
    State(state): State<BoardAppState<R, L>>,
    Path(answer_id): Path<Uuid>,
    Json(body): Json<ModerationActionRequest>,
) -> BoardResult<Json<ModerationActionResponse>>
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = BlockAnswerUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    let output = use_case
        .execute(
            StatusLogId::from_uuid(answer_id),
            UserId::from_uuid(body.admin_id),
        )
        .await?;

    Ok(Json(ModerationActionResponse {
        answer_id: output.answer_id.into_uuid(),
        hidden: output.hidden,
        changed: output.changed,
    }))
}

/// POST /api/board/answers/{answer_id}/unblock
pub async fn unblock_answer<R, L>(
    State(state): State<BoardAppState<R, L>>,
    Path(answer_id): Path<Uuid>,
    Json(body): Json<ModerationActionRequest>,
) -> BoardResult<Json<ModerationActionResponse>>
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = UnblockAnswerUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    );
    let output = use_case
        .execute(
            StatusLogId::from_uuid(answer_id),
            UserId::from_uuid(body.admin_id),
        )
        .await?;

    Ok(Json(ModerationActionResponse {
        answer_id: output.answer_id.into_uuid(),
        hidden: output.hidden,
        changed: output.changed,
    }))
}
