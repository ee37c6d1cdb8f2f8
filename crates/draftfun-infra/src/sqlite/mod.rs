//! SQLite persistence for the game catalog.

pub mod game;
pub mod pool;
