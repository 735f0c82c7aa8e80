//! Room Manager + sweeper tests against a live Postgres instance.
//!
//! Each test runs when DATABASE_URL is set (via .env or the environment)
//! and is a no-op otherwise. Rows use random codes and player ids so
//! tests can run in parallel against one database.

use chrono::{Duration, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use sqlx::PgPool;

use cardmatch_server::cleanup;
use cardmatch_server::db::models::{Room, RoomState};
use cardmatch_server::db::room_repo::{self, RoomUpdate};
use cardmatch_server::db::schema;
use cardmatch_server::error::ApiError;

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
    // Negative ids keep test rows clear of real Telegram ids.
    -rand::rng().random_range(1_000_000..i64::MAX)
}

async fn backdate(pool: &PgPool, id: i32, seconds: i64) {
    sqlx::query("UPDATE game SET updated_at = $1 WHERE id = $2")
        .bind(Utc::now() - Duration::seconds(seconds))
        .bind(id)
        .execute(pool)
        .await
        .expect("backdate room");
}

async fn drop_room(pool: &PgPool, id: i32) {
    let _ = room_repo::delete_room(pool, id).await;
}

#[tokio::test]
async fn duplicate_room_code_conflicts() {
    let Some(pool) = test_pool().await else { return };
    let code = random_code();

    let room = room_repo::create_room(&pool, &code, random_player(), 10)
        .await
        .expect("first create");

    let err = room_repo::create_room(&pool, &code, random_player(), 0)
        .await
        .expect_err("second create must conflict");
    assert!(matches!(err, ApiError::Conflict { .. }));

    // No second row was inserted.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game WHERE room_code = $1")
        .bind(&code)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    drop_room(&pool, room.id).await;
}

#[tokio::test]
async fn player_cannot_hold_two_active_rooms() {
    let Some(pool) = test_pool().await else { return };
    let player = random_player();

    let first = room_repo::create_room(&pool, &random_code(), player, 0)
        .await
        .expect("first room");

    let err = room_repo::create_room(&pool, &random_code(), player, 0)
        .await
        .expect_err("player already active");
    match err {
        ApiError::Conflict { active_room, .. } => {
            assert_eq!(active_room.as_deref(), Some(first.room_code.as_str()));
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    drop_room(&pool, first.id).await;
}

#[tokio::test]
async fn concurrent_creates_admit_exactly_one() {
    let Some(pool) = test_pool().await else { return };
    let player = random_player();
    let (code_a, code_b) = (random_code(), random_code());

    let (a, b) = tokio::join!(
        room_repo::create_room(&pool, &code_a, player, 0),
        room_repo::create_room(&pool, &code_b, player, 0),
    );
    assert!(
        a.is_ok() != b.is_ok(),
        "exactly one of two racing creates must win (a: {}, b: {})",
        a.is_ok(),
        b.is_ok()
    );

    let active = room_repo::active_room_for(&pool, player, None)
        .await
        .unwrap()
        .expect("winner room");
    drop_room(&pool, active.id).await;
}

#[tokio::test]
async fn closed_room_hidden_by_code_but_visible_by_id() {
    let Some(pool) = test_pool().await else { return };
    let code = random_code();
    let room = room_repo::create_room(&pool, &code, random_player(), 0)
        .await
        .unwrap();

    sqlx::query("UPDATE game SET game_state = 'closed', updated_at = CURRENT_TIMESTAMP WHERE id = $1")
        .bind(room.id)
        .execute(&pool)
        .await
        .unwrap();

    let by_code = room_repo::find_by_code(&pool, &code).await.unwrap().unwrap();
    assert_eq!(by_code.game_state, RoomState::Closed); // handler turns this into a 404

    let by_id = room_repo::find_by_id(&pool, room.id).await.unwrap().unwrap();
    assert_eq!(by_id.game_state, RoomState::Closed);

    drop_room(&pool, room.id).await;
}

#[tokio::test]
async fn join_conflict_leaves_player2_unset() {
    let Some(pool) = test_pool().await else { return };
    let joiner = random_player();

    // The joiner already sits in their own waiting room.
    let own = room_repo::create_room(&pool, &random_code(), joiner, 0)
        .await
        .unwrap();
    let target = room_repo::create_room(&pool, &random_code(), random_player(), 0)
        .await
        .unwrap();

    let patch = RoomUpdate {
        player2: Some(joiner),
        ..Default::default()
    };
    let err = room_repo::update_room(&pool, target.id, &patch)
        .await
        .expect_err("join must conflict");
    match err {
        ApiError::Conflict { active_room, .. } => {
            assert_eq!(active_room.as_deref(), Some(own.room_code.as_str()));
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    let target_now: Room = room_repo::find_by_id(&pool, target.id).await.unwrap().unwrap();
    assert_eq!(target_now.player2, None);

    drop_room(&pool, own.id).await;
    drop_room(&pool, target.id).await;
}

#[tokio::test]
async fn empty_patch_is_a_validation_error() {
    let Some(pool) = test_pool().await else { return };
    let err = room_repo::update_room(&pool, 1, &RoomUpdate::default())
        .await
        .expect_err("empty patch");
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn sweep_closes_then_reaps_stale_waiting_rooms() {
    let Some(pool) = test_pool().await else { return };
    let room = room_repo::create_room(&pool, &random_code(), random_player(), 0)
        .await
        .unwrap();

    // Older than the 5-minute waiting threshold: first sweep closes it.
    backdate(&pool, room.id, 6 * 60).await;
    cleanup::sweep(&pool, Utc::now()).await.unwrap();
    let closed = room_repo::find_by_id(&pool, room.id).await.unwrap().unwrap();
    assert_eq!(closed.game_state, RoomState::Closed);

    // Backdate past the 10-second grace window; the next sweep reaps it.
    // Time is driven by backdating, so no real waiting.
    backdate(&pool, room.id, 11).await;
    cleanup::sweep(&pool, Utc::now()).await.unwrap();
    assert!(room_repo::find_by_id(&pool, room.id).await.unwrap().is_none());
}

#[tokio::test]
async fn sweep_finishes_then_reaps_stale_games() {
    let Some(pool) = test_pool().await else { return };
    let room = room_repo::create_room(&pool, &random_code(), random_player(), 0)
        .await
        .unwrap();
    sqlx::query("UPDATE game SET game_state = 'game' WHERE id = $1")
        .bind(room.id)
        .execute(&pool)
        .await
        .unwrap();

    backdate(&pool, room.id, 31).await;
    cleanup::sweep(&pool, Utc::now()).await.unwrap();
    let finished = room_repo::find_by_id(&pool, room.id).await.unwrap().unwrap();
    assert_eq!(finished.game_state, RoomState::Finished);

    backdate(&pool, room.id, 61).await;
    cleanup::sweep(&pool, Utc::now()).await.unwrap();
    assert!(room_repo::find_by_id(&pool, room.id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_resets_the_staleness_clock() {
    let Some(pool) = test_pool().await else { return };
    let room = room_repo::create_room(&pool, &random_code(), random_player(), 0)
        .await
        .unwrap();

    backdate(&pool, room.id, 6 * 60).await;

    // Any legitimate activity refreshes updated_at...
    let patch = RoomUpdate {
        bet: Some(25),
        ..Default::default()
    };
    let updated = room_repo::update_room(&pool, room.id, &patch)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.updated_at > room.updated_at);

    // ...so the next sweep leaves the room alone.
    cleanup::sweep(&pool, Utc::now()).await.unwrap();
    let still_there = room_repo::find_by_id(&pool, room.id).await.unwrap().unwrap();
    assert_eq!(still_there.game_state, RoomState::Waiting);

    drop_room(&pool, room.id).await;
}

#[tokio::test]
async fn sweeper_task_starts_and_stops() {
    let Some(pool) = test_pool().await else { return };
    let sweeper = cleanup::Sweeper::start(pool);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    sweeper.stop();
}
