//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use kernel::id::UserId;
use uuid::Uuid;

use crate::application::get_balance::GetBalanceUseCase;
use crate::application::get_point_history::GetPointHistoryUseCase;
use crate::domain::repository::LedgerRepository;
use crate::error::LedgerResult;
use crate::presentation::dto::{BalanceResponse, HistoryQuery, HistoryResponse, PointEntryDto};

/// Shared state for ledger handlers
#[derive(Clone)]
pub struct LedgerAppState<L>
where
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<L>,
}

/// GET /api/ledger/users/{id}/points
pub async fn get_point_history<L>(
    State(state): State<LedgerAppState<L>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> LedgerResult<Json<HistoryResponse>>
where
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = GetPointHistoryUseCase::new(state.repo.clone());
    let output = use_case
        .execute(UserId::from_uuid(user_id), query.limit)
        .await?;

    Ok(Json(HistoryResponse {
        user_id,
        point_balance: output.point_balance,
        entries: output.entries.iter().map(PointEntryDto::from).collect(),
    }))
}

/// GET /api/ledger/users/{id}/balance
pub async fn get_balance<L>(
    State(state): State<LedgerAppState<L>>,
    Path(user_id): Path<Uuid>,
) -> LedgerResult<Json<BalanceResponse>>
where
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let use_case = GetBalanceUseCase::new(state.repo.clone());
    let point_balance = use_case.execute(UserId::from_uuid(user_id)).await?;

    Ok(Json(BalanceResponse {
        user_id,
        point_balance,
    }))
}
