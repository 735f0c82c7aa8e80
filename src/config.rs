//! Runtime configuration for the card-game server.

use once_cell::sync::Lazy;
use std::env;

#[derive(Debug)]
pub struct Settings {
    /// Seconds between cleanup sweeps.
    pub sweep_interval: u64,
    /// Seconds a `waiting` room may sit untouched before it is closed.
    pub waiting_timeout: i64,
    /// Seconds a `closed` room is retained before deletion.
    pub closed_grace: i64,
    /// Seconds a `game` room may sit untouched before it is auto-finished.
    pub game_timeout: i64,
    /// Seconds a `finished` room is retained before deletion.
    pub finished_retention: i64,
    /// Seconds between free-case openings per user.
    pub free_case_cooldown: i64,
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

impl Settings {
    fn from_env() -> Self {
        Settings {
            sweep_interval: env_i64("SWEEP_INTERVAL", 60) as u64,
            waiting_timeout: env_i64("ROOM_WAITING_TIMEOUT", 300),
            closed_grace: env_i64("ROOM_CLOSED_GRACE", 10),
            game_timeout: env_i64("ROOM_GAME_TIMEOUT", 30),
            finished_retention: env_i64("ROOM_FINISHED_RETENTION", 60),
            free_case_cooldown: env_i64("FREE_CASE_COOLDOWN", 60),
        }
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
