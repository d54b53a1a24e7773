//! Points Ledger Module
//!
//! Append-only record of point movements per user, plus each user's cached
//! balance. Source of truth for every balance shown or spent anywhere else.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, repository traits
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL / in-memory implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Invariants
//! - Ledger entries are immutable once written; corrections are new entries
//! - `sum(points.amount)` per user always equals `users.point_balance`,
//!   enforced by writing both in one transaction
//! - This crate never calls into other domain crates, so its transactional
//!   primitive is safe to reuse inside their transactions

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use domain::entities::{FundsGuard, PointEntry, PointType, UserAccount};
pub use domain::repository::LedgerRepository;
pub use error::{LedgerError, LedgerResult};
pub use infra::memory::MemLedgerRepository;
pub use infra::postgres::{PgLedgerRepository, post_in_tx};
pub use presentation::router::{ledger_router, ledger_router_generic};
