//! Room lifecycle endpoints.
//!
//! Clients poll these routes; there is no push channel. A room that goes
//! `closed` is hidden from code lookups but still visible by id for the
//! short grace window before the sweeper deletes it.

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::db::models::RoomState;
use crate::db::room_repo::{self, RoomUpdate};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateRoomReq {
    pub room_code: String,
    pub player1: i64,
    #[serde(default)]
    pub bet: i32,
}

/// POST /api/game/room
#[post("/game/room")]
pub async fn create_room(
    info: web::Json<CreateRoomReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let code = info.room_code.trim();
    if code.is_empty() || info.player1 == 0 {
        return Err(ApiError::validation("Room code and player id are required"));
    }

    let room = room_repo::create_room(&db, code, info.player1, info.bet).await?;
    log::info!("room {} created by player {}", room.room_code, room.player1);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Room created!",
        "room": room,
    })))
}

/// GET /api/game/room/{room_code}
///
/// `closed` rooms report 404 even though the row still exists.
#[get("/game/room/{room_code}")]
pub async fn find_room(
    path: web::Path<String>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let code = path.into_inner();
    match room_repo::find_by_code(&db, &code).await? {
        Some(room) if room.game_state == RoomState::Closed => {
            Err(ApiError::not_found("Room is closed"))
        }
        Some(room) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "room": room,
        }))),
        None => Err(ApiError::not_found("Room not found")),
    }
}

/// GET /api/game/room/id/{room_id} — the literal row, `closed` included.
#[get("/game/room/id/{room_id}")]
pub async fn find_room_by_id(
    path: web::Path<i32>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    match room_repo::find_by_id(&db, path.into_inner()).await? {
        Some(room) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "room": room,
        }))),
        None => Err(ApiError::not_found("Room not found")),
    }
}

/// GET /api/game/check-active/{user_id}
#[get("/game/check-active/{user_id}")]
pub async fn check_active(
    path: web::Path<i64>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let active = room_repo::active_room_for(&**db, path.into_inner(), None).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "active_game": active,
    })))
}

/// PUT /api/game/room/{room_id}
///
/// Partial update over the whitelisted field set. Setting `player2` is the
/// join path and re-runs the one-active-room check for that player.
#[put("/game/room/{room_id}")]
pub async fn update_room(
    path: web::Path<i32>,
    patch: web::Json<RoomUpdate>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    match room_repo::update_room(&db, id, &patch).await? {
        Some(room) => {
            log::info!("room {} updated", room.room_code);
            Ok(HttpResponse::Ok().json(json!({
                "status": "success",
                "message": "Room updated!",
                "room": room,
            })))
        }
        None => Err(ApiError::not_found("Room not found")),
    }
}

/// DELETE /api/game/room/{room_id}
#[delete("/game/room/{room_id}")]
pub async fn delete_room(
    path: web::Path<i32>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    if room_repo::delete_room(&db, path.into_inner()).await? {
        Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "Room deleted!",
        })))
    } else {
        Err(ApiError::not_found("Room not found"))
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // The id route must come before the code route so `/room/id/{n}` is
    // not captured as a room code.
    cfg.service(create_room)
        .service(find_room_by_id)
        .service(find_room)
        .service(check_active)
        .service(update_room)
        .service(delete_room);
}
