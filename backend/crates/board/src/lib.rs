//! Request Board Module
//!
//! The request settlement and moderation engine: the Request lifecycle
//! (open, then closed by selection or by timeout), the StatusLog answer
//! board with its report/hide state machine, and the settlement paths that
//! move the reward pool through the points ledger exactly once.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, pure settlement math, repository traits
//! - `application/` - Use cases and the settlement sweep
//! - `infra/` - PostgreSQL / in-memory implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Concurrency Model
//! - Requests and answers carry a version counter; every read-decide-write
//!   goes through a conditional write on that version (compare-and-swap)
//! - A lost CAS surfaces as `Conflict` and rolls back completely; callers
//!   reload and retry, the sweep just moves on
//! - `point_handled` is re-checked inside the same conditional write, so
//!   settlement happens at most once per request no matter how many
//!   closers race (manual selection, multiple sweep nodes)

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::BoardConfig;
pub use application::sweep::{SettlementSweep, SweepStats};
pub use error::{BoardError, BoardResult};
pub use infra::memory::MemBoardRepository;
pub use infra::postgres::PgBoardRepository;
pub use presentation::router::{board_router, board_router_generic};

#[cfg(test)]
mod tests;
