//! Shared domain types for draftfun.
//!
//! This crate contains the core domain types used across the platform:
//! conversation messages, stream events, generation sessions, saved games,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod game;
pub mod llm;
pub mod session;
