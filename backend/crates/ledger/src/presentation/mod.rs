//! Presentation Layer - HTTP
//!
//! DTOs, handlers, and the router.

pub mod dto;
pub mod handlers;
pub mod router;
