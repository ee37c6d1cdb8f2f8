//! Game catalog types: stored games, ratings, and listing pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published game: a single self-contained HTML artifact plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub code: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for publishing a new game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGame {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub code: String,
    pub username: String,
}

/// A user's rating of a game, 1 through 5. One rating per (game, user);
/// re-rating overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub game_id: Uuid,
    pub user_id: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
}

/// Aggregate rating summary for a game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: u64,
}

/// One page of a game listing, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamePage {
    pub games: Vec<Game>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl GamePage {
    pub fn has_more(&self) -> bool {
        let seen = u64::from(self.page.saturating_add(1)) * u64::from(self.page_size);
        seen < self.total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game() -> Game {
        Game {
            id: Uuid::now_v7(),
            name: "snake".to_string(),
            description: None,
            code: "<!DOCTYPE html><html></html>".to_string(),
            username: "ada".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_game_serde_roundtrip() {
        let game = sample_game();
        let json = serde_json::to_string(&game).unwrap();
        let parsed: Game = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, game);
    }

    #[test]
    fn test_game_page_has_more() {
        let page = GamePage {
            games: vec![],
            total_count: 13,
            page: 0,
            page_size: 6,
        };
        assert!(page.has_more());

        let last = GamePage {
            games: vec![],
            total_count: 13,
            page: 2,
            page_size: 6,
        };
        assert!(!last.has_more());
    }

    #[test]
    fn test_none_description_omitted_from_json() {
        let game = sample_game();
        let json = serde_json::to_string(&game).unwrap();
        assert!(!json.contains("description"));
    }
}
