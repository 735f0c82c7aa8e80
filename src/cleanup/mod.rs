//! Periodic reaper for abandoned and expired rooms.
//!
//! Once per minute the sweep advances room state by elapsed time and
//! deletes terminal rows past their retention window:
//!
//! 1. `waiting`  untouched > 5 min  → `closed`
//! 2. `closed`   older than 10 s    → deleted
//! 3. `game`     untouched > 30 s   → `finished`
//! 4. `finished` older than 1 min   → deleted
//!
//! Steps 1 and 3 run before their matching delete so a room that turns
//! terminal during this pass cannot be reaped in the same pass. Rooms are
//! parked in `closed`/`finished` for a short grace window rather than
//! deleted outright, so an in-flight client can still observe a terminal
//! state before lookups start returning 404.
//!
//! All four statements are idempotent bulk predicates over `updated_at`,
//! so a missed or failed tick is simply caught up by the next one.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::settings;
use crate::db::models::RoomState;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// `waiting` rooms closed for inactivity.
    pub closed: u64,
    /// `closed` rooms deleted after the grace window.
    pub reaped_closed: u64,
    /// `game` rooms auto-finished.
    pub finished: u64,
    /// `finished` rooms deleted after retention.
    pub reaped_finished: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        *self == SweepReport::default()
    }
}

/// Staleness cutoffs for one sweep, computed from an injected `now` so
/// tests can drive time instead of sleeping through it.
#[derive(Debug, Clone, Copy)]
pub struct Cutoffs {
    pub waiting: DateTime<Utc>,
    pub closed: DateTime<Utc>,
    pub game: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

impl Cutoffs {
    pub fn at(now: DateTime<Utc>) -> Self {
        let s = settings();
        Cutoffs {
            waiting: now - Duration::seconds(s.waiting_timeout),
            closed: now - Duration::seconds(s.closed_grace),
            game: now - Duration::seconds(s.game_timeout),
            finished: now - Duration::seconds(s.finished_retention),
        }
    }
}

async fn advance_state(
    db: &PgPool,
    from: RoomState,
    to: RoomState,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(
        "UPDATE game SET game_state = $1, updated_at = $2 \
         WHERE game_state = $3 AND updated_at < $4",
    )
    .bind(to)
    .bind(now)
    .bind(from)
    .bind(cutoff)
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

async fn reap_state(db: &PgPool, state: RoomState, cutoff: DateTime<Utc>) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM game WHERE game_state = $1 AND updated_at < $2")
        .bind(state)
        .bind(cutoff)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

/// One full sweep pass as of `now`. Statement order matters: close before
/// reaping closed, finish before reaping finished.
pub async fn sweep(db: &PgPool, now: DateTime<Utc>) -> anyhow::Result<SweepReport> {
    let cutoffs = Cutoffs::at(now);

    let report = SweepReport {
        closed: advance_state(db, RoomState::Waiting, RoomState::Closed, cutoffs.waiting, now)
            .await?,
        reaped_closed: reap_state(db, RoomState::Closed, cutoffs.closed).await?,
        finished: advance_state(db, RoomState::Game, RoomState::Finished, cutoffs.game, now)
            .await?,
        reaped_finished: reap_state(db, RoomState::Finished, cutoffs.finished).await?,
    };

    Ok(report)
}

/// Handle to the background sweep task. Dropping the handle does not stop
/// the task; call [`Sweeper::stop`] for that (tests do, the server never
/// does).
pub struct Sweeper {
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep loop on the current Tokio runtime. Errors are
    /// logged and swallowed so a transient store failure never kills the
    /// task.
    pub fn start(db: PgPool) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker =
                interval(std::time::Duration::from_secs(settings().sweep_interval));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match sweep(&db, Utc::now()).await {
                    Ok(report) if !report.is_empty() => {
                        log::info!(
                            "room sweep: closed {}, finished {}, reaped {} closed / {} finished",
                            report.closed,
                            report.finished,
                            report.reaped_closed,
                            report.reaped_finished
                        );
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("room sweep failed: {e:?}"),
                }
            }
        });
        Sweeper { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}
