//! Balance leaderboard queries.

use actix_web::{get, web, HttpResponse};
use serde::Serialize;
use serde_json::json;
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;

#[derive(Debug, FromRow, Serialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub balance: i32,
    pub photo_url: Option<String>,
}

/// GET /api/leaderboard — top 10 by balance.
#[get("/leaderboard")]
pub async fn leaderboard(db: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let rows: Vec<LeaderboardEntry> = sqlx::query_as(
        "SELECT id, first_name, last_name, username, balance, photo_url \
         FROM users ORDER BY balance DESC LIMIT 10",
    )
    .fetch_all(&**db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "leaderboard": rows,
    })))
}

/// GET /api/leaderboard/position/{user_id}
#[get("/leaderboard/position/{user_id}")]
pub async fn position(
    path: web::Path<i64>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let position: Option<i64> = sqlx::query_scalar(
        "SELECT position FROM ( \
            SELECT id, ROW_NUMBER() OVER (ORDER BY balance DESC) AS position FROM users \
         ) ranked WHERE id = $1",
    )
    .bind(path.into_inner())
    .fetch_optional(&**db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "position": position,
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(leaderboard).service(position);
}
