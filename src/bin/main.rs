use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use cardmatch_server::{cleanup, db, http};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3004".into());

    // Postgres pool
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to create Postgres pool");

    db::schema::init(&db_pool)
        .await
        .expect("Failed to initialise database schema");

    // Start the background room sweeper
    let _sweeper = cleanup::Sweeper::start(db_pool.clone());
    log::info!("room auto-cleanup active (every {}s)", cardmatch_server::config::settings().sweep_interval);

    log::info!("listening on {server_addr}");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(db_pool.clone()))
            .configure(http::routes::init_routes)
    })
    .bind(&server_addr)?
    .run()
    .await
}
