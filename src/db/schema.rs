//! Startup schema bootstrap.
//!
//! Tables are created idempotently on boot so a fresh Postgres instance is
//! usable without a separate migration step.

use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT PRIMARY KEY,
        first_name VARCHAR(255) NOT NULL,
        last_name VARCHAR(255),
        username VARCHAR(255),
        language_code VARCHAR(10) NOT NULL DEFAULT 'en',
        balance INTEGER NOT NULL DEFAULT 10,
        cards TEXT NOT NULL DEFAULT '',
        is_premium BOOLEAN NOT NULL DEFAULT false,
        photo_url TEXT,
        allows_write_to_pm BOOLEAN NOT NULL DEFAULT false,
        winner INTEGER NOT NULL DEFAULT 0,
        games INTEGER NOT NULL DEFAULT 0,
        loses INTEGER NOT NULL DEFAULT 0,
        last_activity VARCHAR(20),
        ban INTEGER,
        case_free BIGINT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS game (
        id SERIAL PRIMARY KEY,
        room_code VARCHAR(4) UNIQUE NOT NULL,
        player1 BIGINT NOT NULL,
        player2 BIGINT,
        game_state VARCHAR(20) NOT NULL DEFAULT 'waiting',
        sender_hod INTEGER NOT NULL DEFAULT 0,
        protect_hod INTEGER NOT NULL DEFAULT 0,
        zone_sender INTEGER,
        zone_protect1 INTEGER,
        zone_protect2 INTEGER,
        bet INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_game_room_code ON game(room_code)",
    "CREATE INDEX IF NOT EXISTS idx_game_player1 ON game(player1)",
    "CREATE INDEX IF NOT EXISTS idx_game_player2 ON game(player2)",
    "CREATE INDEX IF NOT EXISTS idx_game_state ON game(game_state)",
    r#"
    CREATE TABLE IF NOT EXISTS admin (
        maintenance INTEGER NOT NULL DEFAULT 0,
        whitelist TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sponsors (
        position INTEGER PRIMARY KEY CHECK (position IN (1, 2, 3)),
        name VARCHAR(255) NOT NULL,
        url_channel TEXT NOT NULL,
        photo_url TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sponsors_position ON sponsors(position)",
];

/// Create all tables and indexes, then seed the singleton `admin` row.
pub async fn init(db: &PgPool) -> anyhow::Result<()> {
    for stmt in STATEMENTS {
        sqlx::query(stmt).execute(db).await?;
    }

    let have_admin: Option<i32> = sqlx::query_scalar("SELECT maintenance FROM admin LIMIT 1")
        .fetch_optional(db)
        .await?;
    if have_admin.is_none() {
        sqlx::query("INSERT INTO admin (maintenance, whitelist) VALUES (0, '')")
            .execute(db)
            .await?;
    }

    log::info!("database schema initialised (users, game, admin, sponsors)");
    Ok(())
}
