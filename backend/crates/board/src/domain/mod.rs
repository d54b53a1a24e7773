//! Domain Layer
//!
//! Entities, settlement math, and repository traits for the board domain.

pub mod entities;
pub mod repository;
pub mod services;
