//! SQLite game repository implementation.
//!
//! Implements `GameRepository` from `draftfun-core` using sqlx with
//! split read/write pools: raw queries, private Row structs, reads on
//! the reader pool and writes on the writer pool.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use draftfun_core::repository::{GameRepository, GAME_PAGE_SIZE};
use draftfun_types::error::RepositoryError;
use draftfun_types::game::{Game, GamePage, NewGame, Rating, RatingSummary};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `GameRepository`.
pub struct SqliteGameRepository {
    pool: DatabasePool,
}

impl SqliteGameRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct GameRow {
    id: String,
    name: String,
    description: Option<String>,
    code: String,
    username: String,
    created_at: String,
}

impl GameRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            code: row.try_get("code")?,
            username: row.try_get("username")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_game(self) -> Result<Game, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid game id: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Game {
            id,
            name: self.name,
            description: self.description,
            code: self.code,
            username: self.username,
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// GameRepository implementation
// ---------------------------------------------------------------------------

impl GameRepository for SqliteGameRepository {
    async fn insert(&self, game: &NewGame) -> Result<Game, RepositoryError> {
        let created = Game {
            id: Uuid::now_v7(),
            name: game.name.clone(),
            description: game.description.clone(),
            code: game.code.clone(),
            username: game.username.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO games (id, name, description, code, username, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(created.id.to_string())
        .bind(&created.name)
        .bind(&created.description)
        .bind(&created.code)
        .bind(&created.username)
        .bind(format_datetime(&created.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(created)
    }

    async fn get(&self, game_id: &Uuid) -> Result<Option<Game>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM games WHERE id = ?")
            .bind(game_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let game_row =
                    GameRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(game_row.into_game()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, page: u32) -> Result<GamePage, RepositoryError> {
        let offset = i64::from(page) * i64::from(GAME_PAGE_SIZE);
        let rows = sqlx::query("SELECT * FROM games ORDER BY created_at DESC LIMIT ? OFFSET ?")
            .bind(i64::from(GAME_PAGE_SIZE))
            .bind(offset)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut games = Vec::with_capacity(rows.len());
        for row in &rows {
            let game_row =
                GameRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            games.push(game_row.into_game()?);
        }

        let (total_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(GamePage {
            games,
            total_count: total_count as u64,
            page,
            page_size: GAME_PAGE_SIZE,
        })
    }

    async fn delete(&self, game_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM games WHERE id = ?")
            .bind(game_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("game {game_id}")));
        }

        Ok(())
    }

    async fn upsert_rating(
        &self,
        game_id: &Uuid,
        user_id: &str,
        rating: u8,
    ) -> Result<Rating, RepositoryError> {
        if !(1..=5).contains(&rating) {
            return Err(RepositoryError::Conflict(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
        if self.get(game_id).await?.is_none() {
            return Err(RepositoryError::NotFound(format!("game {game_id}")));
        }

        let created = Rating {
            game_id: *game_id,
            user_id: user_id.to_string(),
            rating,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO ratings (game_id, user_id, rating, created_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT (game_id, user_id) DO UPDATE SET rating = excluded.rating, created_at = excluded.created_at"#,
        )
        .bind(created.game_id.to_string())
        .bind(&created.user_id)
        .bind(i64::from(created.rating))
        .bind(format_datetime(&created.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(created)
    }

    async fn rating_summary(&self, game_id: &Uuid) -> Result<RatingSummary, RepositoryError> {
        let (average, count): (Option<f64>, i64) =
            sqlx::query_as("SELECT AVG(rating), COUNT(*) FROM ratings WHERE game_id = ?")
                .bind(game_id.to_string())
                .fetch_one(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(RatingSummary {
            average: average.unwrap_or(0.0),
            count: count as u64,
        })
    }
}
