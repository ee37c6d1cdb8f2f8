//! Generation backend implementations.

pub mod openrouter;
