//! API DTOs (Data Transfer Objects)
//!
//! Caller identity arrives in the body (or query, for DELETE); the gateway
//! in front of this service authenticates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Position, Request, StatusLog};
use crate::domain::services::Settlement;

/// Geographic position in API form
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDto {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Position> for PositionDto {
    fn from(p: Position) -> Self {
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

impl From<PositionDto> for Position {
    fn from(p: PositionDto) -> Self {
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

/// Request body for POST /api/board/requests
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestRequest {
    pub requester_id: Uuid,
    pub reward_pool: i64,
    #[serde(default)]
    pub position: Option<PositionDto>,
}

/// A request in API form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDto {
    pub request_id: Uuid,
    pub requester_id: Uuid,
    pub reward_pool: i64,
    pub position: Option<PositionDto>,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Request> for RequestDto {
    fn from(request: &Request) -> Self {
        Self {
            request_id: request.request_id.into_uuid(),
            requester_id: request.requester_id.into_uuid(),
            reward_pool: request.reward_pool,
            position: request.position.map(PositionDto::from),
            closed: request.closed,
            created_at: request.created_at,
        }
    }
}

/// Request body for POST /api/board/answers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    /// Omitted for a free-standing share
    #[serde(default)]
    pub request_id: Option<Uuid>,
    pub author_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub position: Option<PositionDto>,
}

/// An answer in API form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDto {
    pub answer_id: Uuid,
    pub request_id: Option<Uuid>,
    pub author_id: Uuid,
    pub content: String,
    pub selected: bool,
    pub position: Option<PositionDto>,
    pub created_at: DateTime<Utc>,
}

impl From<&StatusLog> for AnswerDto {
    fn from(log: &StatusLog) -> Self {
        Self {
            answer_id: log.status_log_id.into_uuid(),
            request_id: log.request_id.map(|id| id.into_uuid()),
            author_id: log.author_id.into_uuid(),
            content: log.content.clone(),
            selected: log.selected,
            position: log.position.map(PositionDto::from),
            created_at: log.created_at,
        }
    }
}

/// Response for GET /api/board/requests/{id}/answers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerListResponse {
    pub request_id: Uuid,
    pub answers: Vec<AnswerDto>,
}

/// Request body for POST /api/board/answers/{id}/select
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectAnswerRequest {
    pub caller_id: Uuid,
}

/// One settlement credit in API form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementCreditDto {
    pub user_id: Uuid,
    pub amount: i64,
}

/// Response for the settlement endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub request_id: Uuid,
    pub debited: i64,
    pub credits: Vec<SettlementCreditDto>,
    pub forfeited: i64,
}

impl From<&Settlement> for SettlementResponse {
    fn from(settlement: &Settlement) -> Self {
        Self {
            request_id: settlement.request_id.into_uuid(),
            debited: settlement.debited,
            credits: settlement
                .credits
                .iter()
                .map(|c| SettlementCreditDto {
                    user_id: c.user_id.into_uuid(),
                    amount: c.amount,
                })
                .collect(),
            forfeited: settlement.forfeited,
        }
    }
}

/// Request body for POST /api/board/answers/{id}/reports
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnswerRequest {
    pub reporter_id: Uuid,
    pub reason: String,
}

/// Response for POST /api/board/answers/{id}/reports
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnswerResponse {
    pub report_id: Uuid,
    pub answer_id: Uuid,
    pub report_count: i32,
    pub hidden: bool,
}

/// Query for DELETE /api/board/reports/{id}
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuery {
    pub admin_id: Uuid,
}

/// Response for DELETE /api/board/reports/{id}
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveReportResponse {
    pub report_count: i32,
    pub hidden: bool,
}

/// Request body for the admin block/unblock endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationActionRequest {
    pub admin_id: Uuid,
}

/// Response for the admin block/unblock endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationActionResponse {
    pub answer_id: Uuid,
    pub hidden: bool,
    pub changed: bool,
}
