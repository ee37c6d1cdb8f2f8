//! Infrastructure layer for Draftfun.
//!
//! Contains implementations of the traits defined in `draftfun-core`:
//! SQLite storage for the game catalog and the OpenRouter streaming
//! generation backend.

pub mod config;
pub mod llm;
pub mod sqlite;
