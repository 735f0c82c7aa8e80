//! HTTP-surface tests for the room routes: paths, envelope shape, and
//! the Conflict payload. Skipped when DATABASE_URL is not set.

use actix_web::{test, web, App};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use sqlx::PgPool;

use cardmatch_server::db::schema;
use cardmatch_server::http;

async fn test_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    schema::init(&pool).await.ok()?;
    Some(pool)
}

fn random_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect()
}

fn random_player() -> i64 {
    -rand::rng().random_range(1_000_000..i64::MAX)
}

macro_rules! app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .configure(http::routes::init_routes),
        )
        .await
    };
}

#[actix_rt::test]
async fn create_join_and_delete_round_trip() {
    let Some(pool) = test_pool().await else { return };
    let app = app!(pool);
    let (code, host, guest) = (random_code(), random_player(), random_player());

    // Create.
    let req = test::TestRequest::post()
        .uri("/api/game/room")
        .set_json(json!({ "room_code": code, "player1": host, "bet": 10 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["room"]["game_state"], "waiting");
    assert_eq!(body["room"]["bet"], 10);
    let room_id = body["room"]["id"].as_i64().unwrap();

    // Lookup by code.
    let req = test::TestRequest::get()
        .uri(&format!("/api/game/room/{code}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["room"]["room_code"], code.as_str());

    // Join as player2 and move to `game`.
    let req = test::TestRequest::put()
        .uri(&format!("/api/game/room/{room_id}"))
        .set_json(json!({ "player2": guest, "game_state": "game" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["room"]["player2"], guest);
    assert_eq!(body["room"]["game_state"], "game");

    // Both players now report this room as active.
    let req = test::TestRequest::get()
        .uri(&format!("/api/game/check-active/{guest}"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["active_game"]["id"].as_i64().unwrap(), room_id);

    // Delete.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/game/room/{room_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get()
        .uri(&format!("/api/game/room/id/{room_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_rt::test]
async fn conflict_envelope_carries_active_room() {
    let Some(pool) = test_pool().await else { return };
    let app = app!(pool);
    let (code, player) = (random_code(), random_player());

    let req = test::TestRequest::post()
        .uri("/api/game/room")
        .set_json(json!({ "room_code": code, "player1": player }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let room_id = body["room"]["id"].as_i64().unwrap();

    // Same player, second room: 400 with the existing room's code.
    let req = test::TestRequest::post()
        .uri("/api/game/room")
        .set_json(json!({ "room_code": random_code(), "player1": player }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["active_room"], code.as_str());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/game/room/{room_id}"))
        .to_request();
    test::call_service(&app, req).await;
}

#[actix_rt::test]
async fn missing_fields_and_empty_patch_are_rejected() {
    let Some(pool) = test_pool().await else { return };
    let app = app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/game/room")
        .set_json(json!({ "room_code": "", "player1": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = test::TestRequest::put()
        .uri("/api/game/room/999999")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    // Unknown patch keys are rejected before they reach SQL.
    let req = test::TestRequest::put()
        .uri("/api/game/room/999999")
        .set_json(json!({ "room_code": "HACK" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}
