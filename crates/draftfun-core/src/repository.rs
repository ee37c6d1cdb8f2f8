//! GameRepository trait definition.
//!
//! Provides CRUD operations for published games and their ratings.

use draftfun_types::error::RepositoryError;
use draftfun_types::game::{Game, GamePage, NewGame, Rating, RatingSummary};
use uuid::Uuid;

/// Number of games per listing page.
pub const GAME_PAGE_SIZE: u32 = 6;

/// Repository trait for game and rating persistence.
///
/// Implementations live in draftfun-infra (e.g., `SqliteGameRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait GameRepository: Send + Sync {
    /// Publish a new game.
    fn insert(
        &self,
        game: &NewGame,
    ) -> impl std::future::Future<Output = Result<Game, RepositoryError>> + Send;

    /// Get a game by its unique ID.
    fn get(
        &self,
        game_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Game>, RepositoryError>> + Send;

    /// List one page of games, newest first. Pages are zero-indexed
    /// and [`GAME_PAGE_SIZE`] entries long.
    fn list(
        &self,
        page: u32,
    ) -> impl std::future::Future<Output = Result<GamePage, RepositoryError>> + Send;

    /// Delete a game and its ratings.
    fn delete(
        &self,
        game_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Record a user's rating of a game, 1 through 5. One rating per
    /// (game, user); re-rating replaces the previous value.
    fn upsert_rating(
        &self,
        game_id: &Uuid,
        user_id: &str,
        rating: u8,
    ) -> impl std::future::Future<Output = Result<Rating, RepositoryError>> + Send;

    /// Aggregate rating summary for a game.
    fn rating_summary(
        &self,
        game_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<RatingSummary, RepositoryError>> + Send;
}
