//! Admin panel endpoints: maintenance flag, user moderation.

use actix_web::{get, put, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, PgPool};

use crate::db::models::User;
use crate::error::ApiError;

/// GET /api/admin/maintenance — self-heals a missing singleton row.
#[get("/admin/maintenance")]
pub async fn get_maintenance(db: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let row: Option<(i32, String)> =
        sqlx::query_as("SELECT maintenance, whitelist FROM admin LIMIT 1")
            .fetch_optional(&**db)
            .await?;

    let (maintenance, whitelist) = match row {
        Some(row) => row,
        None => {
            sqlx::query("INSERT INTO admin (maintenance, whitelist) VALUES (0, '')")
                .execute(&**db)
                .await?;
            (0, String::new())
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "maintenance": maintenance,
        "whitelist": whitelist,
    })))
}

#[derive(Deserialize)]
pub struct MaintenanceReq {
    pub maintenance: Option<i32>,
    pub whitelist: Option<String>,
}

/// PUT /api/admin/maintenance
#[put("/admin/maintenance")]
pub async fn set_maintenance(
    info: web::Json<MaintenanceReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let maintenance = info
        .maintenance
        .ok_or_else(|| ApiError::validation("A maintenance flag is required"))?;

    match &info.whitelist {
        Some(whitelist) => {
            sqlx::query("UPDATE admin SET maintenance = $1, whitelist = $2")
                .bind(maintenance)
                .bind(whitelist)
                .execute(&**db)
                .await?;
        }
        None => {
            sqlx::query("UPDATE admin SET maintenance = $1")
                .bind(maintenance)
                .execute(&**db)
                .await?;
        }
    }

    log::info!("maintenance flag set to {maintenance}");
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Maintenance flag updated!",
        "maintenance": maintenance,
        "whitelist": info.whitelist.clone().unwrap_or_default(),
    })))
}

#[derive(Debug, FromRow, Serialize)]
pub struct AdminUserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub balance: i32,
    pub ban: Option<i32>,
    pub photo_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// GET /api/admin/users — full user list, newest first.
#[get("/admin/users")]
pub async fn list_users(db: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let users: Vec<AdminUserRow> = sqlx::query_as(
        "SELECT id, first_name, last_name, username, balance, ban, photo_url, created_at \
         FROM users ORDER BY created_at DESC",
    )
    .fetch_all(&**db)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "users": users,
    })))
}

#[derive(Deserialize)]
pub struct CardsReq {
    pub cards: Option<String>,
}

/// PUT /api/admin/user/{id}/cards — overwrite the raw inventory string.
#[put("/admin/user/{id}/cards")]
pub async fn set_cards(
    path: web::Path<i64>,
    info: web::Json<CardsReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET cards = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(info.cards.as_deref().unwrap_or(""))
    .bind(path.into_inner())
    .fetch_optional(&**db)
    .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "Cards updated!",
            "user": user,
        }))),
        None => Err(ApiError::not_found("User not found")),
    }
}

#[derive(Deserialize)]
pub struct BanReq {
    pub ban: Option<i32>,
}

/// PUT /api/admin/user/{id}/ban — set (1) or clear the ban flag.
#[put("/admin/user/{id}/ban")]
pub async fn set_ban(
    path: web::Path<i64>,
    info: web::Json<BanReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET ban = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(info.ban)
    .bind(path.into_inner())
    .fetch_optional(&**db)
    .await?;

    match user {
        Some(user) => {
            let verb = if info.ban == Some(1) { "banned" } else { "unbanned" };
            log::info!("user {} {verb}", user.id);
            Ok(HttpResponse::Ok().json(json!({
                "status": "success",
                "message": format!("User {verb}!"),
                "user": user,
            })))
        }
        None => Err(ApiError::not_found("User not found")),
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_maintenance)
        .service(set_maintenance)
        .service(list_users)
        .service(set_cards)
        .service(set_ban);
}
