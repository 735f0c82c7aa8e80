//! Liveness and database round-trip probes.

use actix_web::{get, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::env;

use crate::error::ApiError;

/// GET /api/test
#[get("/test")]
pub async fn test() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Server is up!",
        "timestamp": Utc::now(),
        "environment": env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
    }))
}

/// GET /api/test-db
#[get("/test-db")]
pub async fn test_db(db: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let (current_time, db_version): (DateTime<Utc>, String) =
        sqlx::query_as("SELECT NOW(), version()")
            .fetch_one(&**db)
            .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Database connected!",
        "current_time": current_time,
        "db_version": db_version,
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(test).service(test_db);
}
