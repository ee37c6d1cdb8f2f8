//! HTTP/REST API layer for Draftfun.
//!
//! Axum-based REST API at `/api/v1/` with SSE generation streaming,
//! envelope response format, and CORS support.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
