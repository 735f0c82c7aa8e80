//! User account endpoints (Telegram profile mirror + balance/stats).

use actix_web::{get, post, put, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::db::models::User;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SearchParams {
    pub id: Option<i64>,
    pub username: Option<String>,
}

/// GET /api/user/search?id=|username=
#[get("/user/search")]
pub async fn search_user(
    web::Query(params): web::Query<SearchParams>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let user: Option<User> = match (params.id, params.username.as_deref()) {
        (Some(id), _) => {
            sqlx::query_as("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&**db)
                .await?
        }
        (None, Some(username)) => {
            sqlx::query_as("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&**db)
                .await?
        }
        (None, None) => {
            return Err(ApiError::validation("An id or username is required"));
        }
    };

    let body = match user {
        Some(user) => json!({ "status": "success", "user": user }),
        None => json!({ "status": "success", "user": null, "message": "User not found" }),
    };
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/user/{id}
///
/// Fetching a profile counts as activity: `last_activity` and
/// `updated_at` are refreshed, which also feeds the online counter.
#[get("/user/{id}")]
pub async fn get_user(
    path: web::Path<i64>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let now = Utc::now();
    let last_activity = now.format("%H:%M:%S").to_string();

    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET last_activity = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 RETURNING *",
    )
    .bind(&last_activity)
    .bind(user_id)
    .fetch_optional(&**db)
    .await?;

    let body = match user {
        Some(user) => {
            let formatted = user.created_at.format("%d.%m.%Y %H:%M").to_string();
            let mut value = serde_json::to_value(&user).unwrap_or_default();
            value["created_at_formatted"] = json!(formatted);
            json!({ "status": "success", "user": value })
        }
        None => json!({ "status": "success", "user": null, "message": "User not found" }),
    };
    Ok(HttpResponse::Ok().json(body))
}

#[derive(Deserialize)]
pub struct CreateUserReq {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub allows_write_to_pm: bool,
}

/// POST /api/user — idempotent: creating an existing id returns the row.
#[post("/user")]
pub async fn create_user(
    info: web::Json<CreateUserReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    if info.id == 0 || info.first_name.trim().is_empty() {
        return Err(ApiError::validation("An id and first name are required"));
    }

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(info.id)
        .fetch_optional(&**db)
        .await?;
    if let Some(user) = existing {
        log::info!("user {} already exists, returning as-is", user.id);
        return Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "User already exists",
            "user": user,
        })));
    }

    let user: User = sqlx::query_as(
        "INSERT INTO users \
            (id, first_name, last_name, username, language_code, is_premium, \
             photo_url, allows_write_to_pm, balance, cards) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 10, '') \
         RETURNING *",
    )
    .bind(info.id)
    .bind(info.first_name.trim())
    .bind(&info.last_name)
    .bind(&info.username)
    .bind(info.language_code.as_deref().unwrap_or("en"))
    .bind(info.is_premium)
    .bind(&info.photo_url)
    .bind(info.allows_write_to_pm)
    .fetch_one(&**db)
    .await?;

    log::info!("user {} created with starting balance 10", user.id);
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "User created!",
        "user": user,
    })))
}

#[derive(Deserialize)]
pub struct BalanceReq {
    pub balance: Option<i32>,
}

/// PUT /api/user/{id}/balance
#[put("/user/{id}/balance")]
pub async fn set_balance(
    path: web::Path<i64>,
    info: web::Json<BalanceReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let balance = info
        .balance
        .ok_or_else(|| ApiError::validation("A balance is required"))?;

    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET balance = $1, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2 RETURNING *",
    )
    .bind(balance)
    .bind(path.into_inner())
    .fetch_optional(&**db)
    .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "Balance updated!",
            "user": user,
        }))),
        None => Err(ApiError::not_found("User not found")),
    }
}

#[derive(Deserialize)]
pub struct GameStatsReq {
    #[serde(default)]
    pub winner: i32,
    #[serde(default)]
    pub games: i32,
    #[serde(default)]
    pub loses: i32,
}

/// PUT /api/user/{id}/game-stats — adds deltas to the counters.
#[put("/user/{id}/game-stats")]
pub async fn add_game_stats(
    path: web::Path<i64>,
    info: web::Json<GameStatsReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET winner = winner + $1, games = games + $2, loses = loses + $3, \
         updated_at = CURRENT_TIMESTAMP WHERE id = $4 RETURNING *",
    )
    .bind(info.winner)
    .bind(info.games)
    .bind(info.loses)
    .bind(path.into_inner())
    .fetch_optional(&**db)
    .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "Stats updated!",
            "user": user,
        }))),
        None => Err(ApiError::not_found("User not found")),
    }
}

/// GET /api/online-count — users active within the last 5 minutes.
#[get("/online-count")]
pub async fn online_count(db: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE updated_at > NOW() - INTERVAL '5 minutes'",
    )
    .fetch_one(&**db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "onlineCount": count,
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // `search` is a literal segment and must be registered before the
    // `{id}` capture.
    cfg.service(search_user)
        .service(get_user)
        .service(create_user)
        .service(set_balance)
        .service(add_game_stats)
        .service(online_count);
}
