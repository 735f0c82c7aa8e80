use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a matchmaking room. Stored as lowercase text in
/// `game.game_state`. A room never returns to `Waiting` once it has left
/// it; `Closed` and `Finished` are terminal and reaped by the sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Waiting,
    Game,
    Finished,
    Closed,
}

impl RoomState {
    /// States that count as a live game for the one-room-per-player check.
    pub fn is_active(self) -> bool {
        matches!(self, RoomState::Waiting | RoomState::Game)
    }
}

/// One row of the `game` table: a matchmaking/game session.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: i32,
    pub room_code: String,
    pub player1: i64,
    pub player2: Option<i64>,
    pub game_state: RoomState,
    pub sender_hod: i32,
    pub protect_hod: i32,
    pub zone_sender: Option<i32>,
    pub zone_protect1: Option<i32>,
    pub zone_protect2: Option<i32>,
    pub bet: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the `users` table. Inventory lives in `cards` as a
/// space-separated token list (see [`crate::cards::Inventory`]).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: String,
    pub balance: i32,
    pub cards: String,
    pub is_premium: bool,
    pub photo_url: Option<String>,
    pub allows_write_to_pm: bool,
    pub winner: i32,
    pub games: i32,
    pub loses: i32,
    pub last_activity: Option<String>,
    pub ban: Option<i32>,
    pub case_free: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sponsor {
    pub position: i32,
    pub name: String,
    pub url_channel: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states() {
        assert!(RoomState::Waiting.is_active());
        assert!(RoomState::Game.is_active());
        assert!(!RoomState::Finished.is_active());
        assert!(!RoomState::Closed.is_active());
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RoomState::Waiting).unwrap(),
            "\"waiting\""
        );
        let s: RoomState = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(s, RoomState::Closed);
    }
}
