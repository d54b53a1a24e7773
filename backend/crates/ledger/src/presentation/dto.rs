//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::PointEntry;

/// Query for GET /api/ledger/users/{id}/points
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// One ledger entry in API form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointEntryDto {
    pub point_id: Uuid,
    pub amount: i64,
    pub reason: String,
    pub point_type: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<&PointEntry> for PointEntryDto {
    fn from(entry: &PointEntry) -> Self {
        Self {
            point_id: entry.point_id.into_uuid(),
            amount: entry.amount,
            reason: entry.reason.clone(),
            point_type: entry.entry_type.code(),
            created_at: entry.created_at,
        }
    }
}

/// Response for GET /api/ledger/users/{id}/points
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub user_id: Uuid,
    pub point_balance: i64,
    pub entries: Vec<PointEntryDto>,
}

/// Response for GET /api/ledger/users/{id}/balance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub point_balance: i64,
}
