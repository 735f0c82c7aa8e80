//! Room Manager: creation, lookup, join and patching of `game` rows.
//!
//! The one invariant enforced here is that a player owns at most one
//! non-terminal room (`waiting` or `game`) at a time. Both admission paths
//! (create, and a patch that sets `player2`) take a per-player advisory
//! transaction lock before the check-then-act, so two concurrent
//! admissions for the same player serialize instead of racing.

use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Room;
use crate::error::ApiError;

const ACTIVE_ROOM: &str = "SELECT * FROM game \
     WHERE (player1 = $1 OR player2 = $1) AND game_state IN ('waiting', 'game')";

const ACTIVE_ROOM_EXCLUDING: &str = "SELECT * FROM game \
     WHERE (player1 = $1 OR player2 = $1) AND game_state IN ('waiting', 'game') \
     AND id <> $2";

/// Whitelisted patch for `PUT /api/game/room/{id}`. Unknown keys are
/// rejected at deserialization, never forwarded to SQL.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomUpdate {
    pub player2: Option<i64>,
    pub game_state: Option<crate::db::models::RoomState>,
    pub sender_hod: Option<i32>,
    pub protect_hod: Option<i32>,
    pub zone_sender: Option<i32>,
    pub zone_protect1: Option<i32>,
    pub zone_protect2: Option<i32>,
    pub bet: Option<i32>,
}

impl RoomUpdate {
    pub fn is_empty(&self) -> bool {
        self.player2.is_none()
            && self.game_state.is_none()
            && self.sender_hod.is_none()
            && self.protect_hod.is_none()
            && self.zone_sender.is_none()
            && self.zone_protect1.is_none()
            && self.zone_protect2.is_none()
            && self.bet.is_none()
    }
}

/// The single active room for `player`, if any. More than one matching
/// row means the admission invariant has been violated; the first is
/// returned and the corruption is logged.
pub async fn active_room_for<'e, E>(
    exec: E,
    player: i64,
    exclude_room: Option<i32>,
) -> sqlx::Result<Option<Room>>
where
    E: sqlx::PgExecutor<'e>,
{
    let rooms: Vec<Room> = match exclude_room {
        Some(id) => {
            sqlx::query_as(ACTIVE_ROOM_EXCLUDING)
                .bind(player)
                .bind(id)
                .fetch_all(exec)
                .await?
        }
        None => sqlx::query_as(ACTIVE_ROOM).bind(player).fetch_all(exec).await?,
    };

    if rooms.len() > 1 {
        log::warn!(
            "player {player} is in {} active rooms at once; admission invariant broken",
            rooms.len()
        );
    }
    Ok(rooms.into_iter().next())
}

/// Insert a `waiting` room for `player1`. Fails with `Conflict` when the
/// player already has a live room (surfacing its code) or when the room
/// code is taken.
pub async fn create_room(
    db: &PgPool,
    room_code: &str,
    player1: i64,
    bet: i32,
) -> Result<Room, ApiError> {
    let mut tx = db.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(player1)
        .execute(&mut *tx)
        .await?;

    if let Some(active) = active_room_for(&mut *tx, player1, None).await? {
        return Err(ApiError::already_active(active.room_code));
    }

    let inserted = sqlx::query_as::<_, Room>(
        "INSERT INTO game (room_code, player1, bet) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(room_code)
    .bind(player1)
    .bind(bet)
    .fetch_one(&mut *tx)
    .await;

    let room = match inserted {
        Ok(room) => room,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("A room with this code already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    tx.commit().await?;
    Ok(room)
}

/// The literal row for `room_code`, including `closed` rooms. Visibility
/// filtering is the caller's concern.
pub async fn find_by_code(db: &PgPool, room_code: &str) -> sqlx::Result<Option<Room>> {
    sqlx::query_as("SELECT * FROM game WHERE room_code = $1")
        .bind(room_code)
        .fetch_optional(db)
        .await
}

pub async fn find_by_id(db: &PgPool, id: i32) -> sqlx::Result<Option<Room>> {
    sqlx::query_as("SELECT * FROM game WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Apply a partial update. `updated_at` is always refreshed, which is what
/// keeps the sweeper's staleness clocks at bay for live rooms. When the
/// patch seats `player2`, that player's admission invariant is re-checked
/// (excluding this room) under the same advisory lock as `create_room`.
pub async fn update_room(
    db: &PgPool,
    id: i32,
    patch: &RoomUpdate,
) -> Result<Option<Room>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    if let Some(player2) = patch.player2 {
        let mut tx = db.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(player2)
            .execute(&mut *tx)
            .await?;

        if let Some(active) = active_room_for(&mut *tx, player2, Some(id)).await? {
            return Err(ApiError::already_active(active.room_code));
        }

        let mut qb = update_query(id, patch);
        let room = qb
            .build_query_as::<Room>()
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(room)
    } else {
        let mut qb = update_query(id, patch);
        Ok(qb.build_query_as::<Room>().fetch_optional(db).await?)
    }
}

pub async fn delete_room(db: &PgPool, id: i32) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM game WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

fn update_query(id: i32, patch: &RoomUpdate) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("UPDATE game SET updated_at = CURRENT_TIMESTAMP");

    if let Some(v) = patch.player2 {
        qb.push(", player2 = ").push_bind(v);
    }
    if let Some(v) = patch.game_state {
        qb.push(", game_state = ").push_bind(v);
    }
    if let Some(v) = patch.sender_hod {
        qb.push(", sender_hod = ").push_bind(v);
    }
    if let Some(v) = patch.protect_hod {
        qb.push(", protect_hod = ").push_bind(v);
    }
    if let Some(v) = patch.zone_sender {
        qb.push(", zone_sender = ").push_bind(v);
    }
    if let Some(v) = patch.zone_protect1 {
        qb.push(", zone_protect1 = ").push_bind(v);
    }
    if let Some(v) = patch.zone_protect2 {
        qb.push(", zone_protect2 = ").push_bind(v);
    }
    if let Some(v) = patch.bet {
        qb.push(", bet = ").push_bind(v);
    }

    qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
    qb
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::RoomState;

    #[test]
    fn empty_patch_detected() {
        assert!(RoomUpdate::default().is_empty());
        let patch = RoomUpdate {
            bet: Some(5),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn unknown_patch_keys_rejected() {
        let err = serde_json::from_str::<RoomUpdate>(r#"{"room_code": "HACK"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn update_query_only_names_present_fields() {
        let patch = RoomUpdate {
            player2: Some(7),
            game_state: Some(RoomState::Game),
            ..Default::default()
        };
        let sql = update_query(3, &patch).into_sql();
        assert!(sql.contains("updated_at = CURRENT_TIMESTAMP"));
        assert!(sql.contains("player2 = $1"));
        assert!(sql.contains("game_state = $2"));
        assert!(!sql.contains("bet ="));
        assert!(sql.ends_with("RETURNING *"));
    }
}
