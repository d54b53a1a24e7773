//! Board Router

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use kernel::clock::Clock;
use ledger::{LedgerRepository, PgLedgerRepository};

use crate::application::config::BoardConfig;
use crate::domain::repository::BoardRepository;
use crate::infra::postgres::PgBoardRepository;
use crate::presentation::handlers::{self, BoardAppState};

/// Create the board router with the PostgreSQL repositories
pub fn board_router(
    repo: PgBoardRepository,
    ledger: PgLedgerRepository,
    config: Arc<BoardConfig>,
    clock: Arc<dyn Clock>,
) -> Router {
    board_router_generic(repo, ledger, config, clock)
}

/// Create a board router for any repository implementation
pub fn board_router_generic<R, L>(
    repo: R,
    ledger: L,
    config: Arc<BoardConfig>,
    clock: Arc<dyn Clock>,
) -> Router
where
    R: BoardRepository + Clone + Send + Sync + 'static,
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let state = BoardAppState {
        repo: Arc::new(repo),
        ledger: Arc::new(ledger),
        config,
        clock,
    };

    Router::new()
        .route("/requests", post(handlers::create_request::<R, L>))
        .route(
            "/requests/{request_id}/answers",
            get(handlers::list_answers::<R, L>),
        )
        .route("/answers", post(handlers::submit_answer::<R, L>))
        .route(
            "/answers/{answer_id}/select",
            post(handlers::select_answer::<R, L>),
        )
        .route(
            "/answers/{answer_id}/reports",
            post(handlers::report_answer::<R, L>),
        )
        .route(
            "/answers/{answer_id}/block",
            post(handlers::block_answer::<R, L>),
        )
        .route(
            "/answers/{answer_id}/unblock",
            post(handlers::unblock_answer::<R, L>),
        )
        .route("/reports/{report_id}", delete(handlers::remove_report::<R, L>))
        .with_state(state)
}
