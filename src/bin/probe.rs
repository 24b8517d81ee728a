//! Headless versus client for operators and smoke tests.
//!
//! Joins the room, plays by spawning a piece every half second, and mirrors
//! the match as JSON lines on stdout. With `PROBE_DIE_AFTER_MS` set it reports
//! its own death after that delay.
//!
//! Environment: `TETRIS_SERVER_HOST`, `TETRIS_SERVER_PORT`, `PROBE_AVATAR`,
//! `PROBE_DIE_AFTER_MS`.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use tetris_versus::client::{JoinStatus, MatchSync, RoomJoin, RoomJoinConfig};
use tetris_versus::core::{VersusLogic, VersusState};
use tetris_versus::net::{Session, SessionConfig};
use tetris_versus::types::{MinoState, PlayerDescription, PlayerSide, DEFAULT_PORT};

const FRAME: Duration = Duration::from_millis(16);
const SPAWN_EVERY: Duration = Duration::from_millis(500);

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ProbeEvent<'a> {
    Ready {
        player_id: u32,
        seed: u64,
        roster: &'a [PlayerDescription],
    },
    EnemyPiece {
        mino: MinoState,
    },
    EnemyBoard {
        filled: usize,
    },
    GameOver {
        winner_id: u32,
        loser_id: u32,
        won: bool,
    },
    Failed {
        reason: String,
    },
}

fn emit(event: &ProbeEvent<'_>) -> Result<()> {
    let line = serde_json::to_string(event).context("failed to encode probe event")?;
    println!("{line}");
    Ok(())
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<()> {
    tetris_versus::init_tracing();

    let host = std::env::var("TETRIS_SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env_or("TETRIS_SERVER_PORT", DEFAULT_PORT);
    let avatar_id: u32 = env_or("PROBE_AVATAR", 0);
    let die_after = std::env::var("PROBE_DIE_AFTER_MS")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .map(Duration::from_millis);

    let mut session = Session::new(SessionConfig::default())?;
    session
        .connect(&host, port)
        .with_context(|| format!("failed to reach {host}:{port}"))?;

    let mut join = RoomJoin::new(
        RoomJoinConfig {
            avatar_id,
            ..RoomJoinConfig::default()
        },
        Instant::now(),
    );
    let (seed, player_id) = loop {
        match join.poll(&mut session, Instant::now()) {
            JoinStatus::Ready { seed, player_id } => break (seed, player_id),
            JoinStatus::Failed(failure) => {
                emit(&ProbeEvent::Failed {
                    reason: failure.to_string(),
                })?;
                return Ok(());
            }
            _ => std::thread::sleep(FRAME),
        }
    };
    emit(&ProbeEvent::Ready {
        player_id,
        seed,
        roster: join.roster(),
    })?;

    let mut sync = MatchSync::new(VersusState::new(seed), player_id);
    let started = Instant::now();
    let mut last_spawn = started;
    sync.logic_mut().spawn_next();

    while session.is_connected() {
        let before = sync.logic().side(PlayerSide::Remote).clone();
        sync.process_packets(&mut session);
        let after = sync.logic().side(PlayerSide::Remote);
        if after.mino != before.mino {
            emit(&ProbeEvent::EnemyPiece { mino: after.mino })?;
        }
        if after.board != before.board {
            emit(&ProbeEvent::EnemyBoard {
                filled: after.board.filled(),
            })?;
        }

        if let Some(result) = sync.result() {
            emit(&ProbeEvent::GameOver {
                winner_id: result.winner_id,
                loser_id: result.loser_id,
                won: !sync.logic().is_game_over(PlayerSide::Local),
            })?;
            break;
        }

        if die_after.is_some_and(|d| started.elapsed() >= d) {
            sync.report_dead(&session)?;
        }
        if last_spawn.elapsed() >= SPAWN_EVERY {
            sync.logic_mut().spawn_next();
            last_spawn = Instant::now();
        }
        sync.sync_to_server(&session);
        std::thread::sleep(FRAME);
    }

    if let Some(shutdown) = sync.leave(&mut session) {
        let _ = shutdown.wait();
    }
    info!("probe finished");
    Ok(())
}
