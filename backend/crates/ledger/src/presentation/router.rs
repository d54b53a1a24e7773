//! Ledger Router

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::domain::repository::LedgerRepository;
use crate::infra::postgres::PgLedgerRepository;
use crate::presentation::handlers::{self, LedgerAppState};

/// Create the ledger router with the PostgreSQL repository
pub fn ledger_router(repo: PgLedgerRepository) -> Router {
    ledger_router_generic(repo)
}

/// Create a ledger router for any repository implementation
pub fn ledger_router_generic<L>(repo: L) -> Router
where
    L: LedgerRepository + Clone + Send + Sync + 'static,
{
    let state = LedgerAppState {
        repo: Arc::new(repo),
    };

    Router::new()
        .route("/users/{user_id}/points", get(handlers::get_point_history::<L>))
        .route("/users/{user_id}/balance", get(handlers::get_balance::<L>))
        .with_state(state)
}
