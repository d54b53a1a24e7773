//! Domain Layer
//!
//! Entities and repository traits for the points ledger.

pub mod entities;
pub mod repository;
