//! Sponsor slots (three fixed positions shown in the client).

use actix_web::{delete, get, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::db::models::Sponsor;
use crate::error::ApiError;

fn check_position(position: i32) -> Result<(), ApiError> {
    if (1..=3).contains(&position) {
        Ok(())
    } else {
        Err(ApiError::validation("Position must be 1, 2 or 3"))
    }
}

/// GET /api/sponsors
#[get("/sponsors")]
pub async fn list_sponsors(db: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let sponsors: Vec<Sponsor> =
        sqlx::query_as("SELECT * FROM sponsors ORDER BY position ASC")
            .fetch_all(&**db)
            .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "sponsors": sponsors,
    })))
}

#[derive(Deserialize)]
pub struct SponsorReq {
    pub name: String,
    pub url_channel: String,
    pub photo_url: String,
}

/// PUT /api/admin/sponsors/{position} — upsert.
#[put("/admin/sponsors/{position}")]
pub async fn upsert_sponsor(
    path: web::Path<i32>,
    info: web::Json<SponsorReq>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let position = path.into_inner();
    check_position(position)?;
    if info.name.trim().is_empty()
        || info.url_channel.trim().is_empty()
        || info.photo_url.trim().is_empty()
    {
        return Err(ApiError::validation(
            "name, url_channel and photo_url are all required",
        ));
    }

    let sponsor: Sponsor = sqlx::query_as(
        "INSERT INTO sponsors (position, name, url_channel, photo_url) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (position) DO UPDATE \
            SET name = EXCLUDED.name, \
                url_channel = EXCLUDED.url_channel, \
                photo_url = EXCLUDED.photo_url, \
                updated_at = CURRENT_TIMESTAMP \
         RETURNING *",
    )
    .bind(position)
    .bind(info.name.trim())
    .bind(info.url_channel.trim())
    .bind(info.photo_url.trim())
    .fetch_one(&**db)
    .await?;

    log::info!("sponsor slot {position} set to {}", sponsor.name);
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Sponsor saved!",
        "sponsor": sponsor,
    })))
}

/// DELETE /api/admin/sponsors/{position}
#[delete("/admin/sponsors/{position}")]
pub async fn delete_sponsor(
    path: web::Path<i32>,
    db: web::Data<PgPool>,
) -> Result<HttpResponse, ApiError> {
    let position = path.into_inner();
    check_position(position)?;

    let deleted = sqlx::query("DELETE FROM sponsors WHERE position = $1")
        .bind(position)
        .execute(&**db)
        .await?
        .rows_affected();

    if deleted > 0 {
        Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "message": "Sponsor deleted!",
        })))
    } else {
        Err(ApiError::not_found("Sponsor not found"))
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_sponsors)
        .service(upsert_sponsor)
        .service(delete_sponsor);
}
