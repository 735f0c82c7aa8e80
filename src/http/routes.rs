use crate::http;
use actix_web::web;

/// Mount every HTTP sub-module under `/api`.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(http::health::init_routes)
            .configure(http::users::init_routes)
            .configure(http::cards::init_routes)
            .configure(http::rooms::init_routes)
            .configure(http::leaderboard::init_routes)
            .configure(http::sponsors::init_routes)
            .configure(http::admin::init_routes)
            .configure(http::subscription::init_routes),
    );
}
