//! Generation session logic and repository trait definitions for Draftfun.
//!
//! This crate defines the "ports" (backend and repository traits) that the
//! infrastructure layer implements. It depends only on `draftfun-types` --
//! never on `draftfun-infra` or any database/IO crate.

pub mod backend;
pub mod detect;
pub mod feedback;
pub mod prompt;
pub mod repository;
pub mod session;
pub mod supervisor;
pub mod window;
