//! Client side of the join handshake.
//!
//! ```text
//! AwaitAccepted --Accepted--> Registering --AssignId--> Joining
//!   --RoomJoinAccepted--> WaitingForOpponent --SendBagSeed, AllPlayersReady--> Ready
//! ```
//!
//! Every stage before `WaitingForOpponent` must hear back from the server
//! within `response_timeout`; waiting for an opponent is unbounded. A dropped
//! connection fails the join at any stage.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use tetris_versus_net::Session;
use tetris_versus_protocol::{Message, MessageKind};
use tetris_versus_types::{PlayerDescription, PlayerId, SERVER_RESPONSE_TIMEOUT_MS};

#[derive(Debug, Clone)]
pub struct RoomJoinConfig {
    pub response_timeout: Duration,
    pub avatar_id: u32,
}

impl Default for RoomJoinConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_millis(SERVER_RESPONSE_TIMEOUT_MS),
            avatar_id: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinFailure {
    #[error("server did not respond in time")]
    Timeout,
    #[error("connection to the server was lost")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStatus {
    AwaitAccepted,
    Registering,
    Joining,
    WaitingForOpponent,
    Ready { seed: u64, player_id: PlayerId },
    Failed(JoinFailure),
}

impl JoinStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JoinStatus::Ready { .. } | JoinStatus::Failed(_))
    }
}

#[derive(Debug)]
pub struct RoomJoin {
    config: RoomJoinConfig,
    status: JoinStatus,
    stage_since: Instant,
    seed: Option<u64>,
    roster: Vec<PlayerDescription>,
}

impl RoomJoin {
    /// Start waiting for `Accepted`; call right after `Session::connect`.
    pub fn new(config: RoomJoinConfig, now: Instant) -> Self {
        Self {
            config,
            status: JoinStatus::AwaitAccepted,
            stage_since: now,
            seed: None,
            roster: Vec::new(),
        }
    }

    pub fn status(&self) -> JoinStatus {
        self.status
    }

    /// Room members as last reported by the server.
    pub fn roster(&self) -> &[PlayerDescription] {
        &self.roster
    }

    fn advance(&mut self, status: JoinStatus, now: Instant) {
        debug!(from = ?self.status, to = ?status, "join stage");
        self.status = status;
        self.stage_since = now;
    }

    fn fail(&mut self, failure: JoinFailure, now: Instant) {
        warn!(stage = ?self.status, %failure, "room join failed");
        self.advance(JoinStatus::Failed(failure), now);
    }

    /// Drain the session and advance. Call once per frame.
    pub fn poll(&mut self, session: &mut Session, now: Instant) -> JoinStatus {
        if self.status.is_finished() {
            return self.status;
        }
        while let Some(message) = session.try_recv() {
            self.handle(session, &message, now);
            if self.status.is_finished() {
                return self.status;
            }
        }
        if !session.is_connected() {
            self.fail(JoinFailure::Disconnected, now);
        } else if self.awaiting_server()
            && now.saturating_duration_since(self.stage_since) > self.config.response_timeout
        {
            self.fail(JoinFailure::Timeout, now);
        }
        self.status
    }

    /// Poll until finished or `limit` elapses.
    pub fn wait(&mut self, session: &mut Session, limit: Duration) -> JoinStatus {
        let deadline = Instant::now() + limit;
        loop {
            let status = self.poll(session, Instant::now());
            if status.is_finished() || Instant::now() >= deadline {
                return status;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn awaiting_server(&self) -> bool {
        matches!(
            self.status,
            JoinStatus::AwaitAccepted | JoinStatus::Registering | JoinStatus::Joining
        )
    }

    fn send(&mut self, session: &Session, message: &Message, now: Instant) {
        if session.send(message).is_err() {
            self.fail(JoinFailure::Disconnected, now);
        }
    }

    fn handle(&mut self, session: &mut Session, message: &Message, now: Instant) {
        match message.kind() {
            MessageKind::ServerPing => self.send(session, &Message::client_pong(), now),
            MessageKind::ServerPong => trace!("server pong"),
            MessageKind::Accepted if self.status == JoinStatus::AwaitAccepted => {
                info!("accepted by server, registering");
                let me = PlayerDescription {
                    unique_id: 0,
                    avatar_id: self.config.avatar_id,
                };
                self.advance(JoinStatus::Registering, now);
                self.send(session, &Message::register(me), now);
            }
            MessageKind::AssignId if self.status == JoinStatus::Registering => {
                match message.read::<u32>() {
                    Ok(id) => {
                        info!(id, "player id assigned");
                        session.set_player_id(id);
                        self.advance(JoinStatus::Joining, now);
                        self.send(session, &Message::request_room_join(), now);
                    }
                    Err(e) => warn!(error = %e, "bad AssignId payload ignored"),
                }
            }
            MessageKind::RoomJoinAccepted if self.status == JoinStatus::Joining => {
                self.advance(JoinStatus::WaitingForOpponent, now);
            }
            MessageKind::RoomPlayerList => match message.read::<Vec<PlayerDescription>>() {
                Ok(list) => self.roster = list,
                Err(e) => warn!(error = %e, "bad roster ignored"),
            },
            MessageKind::RoomPlayerJoined => match message.read::<PlayerDescription>() {
                Ok(player) => {
                    debug!(id = player.unique_id, "opponent joined");
                    self.roster.push(player);
                }
                Err(e) => warn!(error = %e, "bad RoomPlayerJoined ignored"),
            },
            MessageKind::RoomPlayerLeft => {
                if let Ok(id) = message.read::<u32>() {
                    debug!(id, "opponent left");
                    self.roster.retain(|p| p.unique_id != id);
                }
            }
            MessageKind::SendBagSeed => match message.read::<u64>() {
                Ok(seed) => self.seed = Some(seed),
                Err(e) => warn!(error = %e, "bad seed payload ignored"),
            },
            MessageKind::AllPlayersReady => match (self.seed, session.player_id()) {
                (Some(seed), Some(player_id)) => {
                    info!(seed, player_id, "match ready");
                    self.advance(JoinStatus::Ready { seed, player_id }, now);
                }
                _ => warn!("AllPlayersReady before seed and id; ignored"),
            },
            kind => warn!(?kind, stage = ?self.status, "unexpected message during join ignored"),
        }
    }
}
