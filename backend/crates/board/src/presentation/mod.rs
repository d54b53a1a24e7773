//! Presentation Layer
//!
//! HTTP handlers, DTOs, and routing.

pub mod dto;
pub mod handlers;
pub mod router;
