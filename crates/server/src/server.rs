//! Versus server: accept loop plus the single-threaded tick loop.
//!
//! The accept loop runs on the network runtime and does exactly one thing
//! per socket: check the [`AcceptPolicy`], assign an id and hand the
//! connection to the logic thread as [`NetEvent::Connected`]. Everything
//! else (registry, room, relay, liveness) happens in [`Server::update`] on
//! the caller's thread.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::task::JoinHandle as TaskHandle;
use tracing::{debug, info, trace, warn};

use tetris_versus_net::{
    inbox, Connection, ConnectionId, Inbox, InboxSender, NetEvent, NetRuntime,
    DEFAULT_WRITE_TIMEOUT,
};
use tetris_versus_protocol::{Message, MessageKind};
use tetris_versus_types::{PlayerDescription, PlayerId};

use crate::config::ServerConfig;
use crate::liveness::LivenessMonitor;
use crate::registry::{IdAllocator, Registry};
use crate::relay::{self, Route};
use crate::room::{generate_seed, JoinOutcome, Room, RoomPhase};

/// Decides whether a freshly accepted socket may proceed. Rejected sockets
/// are dropped before an id or session exists.
pub trait AcceptPolicy: Send + Sync + 'static {
    fn allow(&self, peer: SocketAddr) -> bool;
}

impl<F> AcceptPolicy for F
where
    F: Fn(SocketAddr) -> bool + Send + Sync + 'static,
{
    fn allow(&self, peer: SocketAddr) -> bool {
        self(peer)
    }
}

/// Accept every peer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AcceptPolicy for AllowAll {
    fn allow(&self, _peer: SocketAddr) -> bool {
        true
    }
}

pub struct Server {
    config: ServerConfig,
    registry: Registry,
    room: Room,
    liveness: LivenessMonitor,
    inbox: Inbox<NetEvent>,
    local_addr: SocketAddr,
    accept_task: TaskHandle<()>,
    runtime: NetRuntime,
}

impl Server {
    /// Bind the listener and start accepting.
    ///
    /// Safe to call from async code: the socket is bound synchronously and
    /// only handed to the server's own runtime. [`Server::update`] and
    /// [`Server::run`] block and belong on a plain thread.
    pub fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        Self::bind_with_policy(config, AllowAll)
    }

    pub fn bind_with_policy(
        config: ServerConfig,
        policy: impl AcceptPolicy,
    ) -> anyhow::Result<Self> {
        let runtime =
            NetRuntime::new(config.net_threads).context("failed to start network runtime")?;
        let addr = config.socket_addr()?;
        let std_listener =
            std::net::TcpListener::bind(addr).with_context(|| format!("failed to bind {addr}"))?;
        std_listener
            .set_nonblocking(true)
            .context("failed to make listener non-blocking")?;
        let local_addr = std_listener
            .local_addr()
            .context("failed to read bound address")?;
        let listener = {
            let _guard = runtime.handle().enter();
            TcpListener::from_std(std_listener).context("failed to register listener")?
        };

        let (events, inbox) = inbox::channel(runtime.handle().clone());
        let accept_task = runtime
            .handle()
            .spawn(accept_loop(listener, Box::new(policy), events));
        info!(%local_addr, "server listening");

        let liveness =
            LivenessMonitor::new(config.ping_interval, config.pong_timeout, Instant::now());
        Ok(Self {
            config,
            registry: Registry::new(),
            room: Room::new(),
            liveness,
            inbox,
            local_addr,
            accept_task,
            runtime,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn room_phase(&self) -> RoomPhase {
        self.room.phase()
    }

    pub fn room_members(&self) -> &[PlayerId] {
        self.room.members()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    pub fn session_count(&self) -> usize {
        self.registry.session_count()
    }

    pub fn runtime(&self) -> &NetRuntime {
        &self.runtime
    }

    /// One tick: wait up to `config.tick` for the first event, drain the
    /// rest without blocking, then run liveness.
    pub fn update(&mut self) {
        if let Some(event) = self.inbox.pop_timeout(self.config.tick) {
            self.handle_event(event);
            while let Some(event) = self.inbox.pop_nonblocking() {
                self.handle_event(event);
            }
        }
        self.check_liveness(Instant::now());
    }

    /// Tick until `stop` is set, then close every connection.
    pub fn run(&mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            self.update();
        }
        info!("server stopping");
        self.registry.disconnect_all();
    }

    fn handle_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Connected(conn) => {
                let id = conn.id();
                self.registry.insert_connection(conn);
                self.registry.send_to(id, &Message::accepted());
                debug!(id, "connection stored, sent Accepted");
            }
            NetEvent::Message { id, message } => self.handle_message(id, message),
            NetEvent::Disconnected { id } => self.handle_disconnect(id),
        }
    }

    fn handle_message(&mut self, id: ConnectionId, message: Message) {
        if self.registry.connection(id).is_none() {
            warn!(id, kind = ?message.kind(), "message from unknown connection");
            return;
        }
        match message.kind() {
            MessageKind::RegisterWithServer => self.on_register(id, &message),
            MessageKind::UnregisterWithServer => self.on_unregister(id, &message),
            MessageKind::ClientPong => {
                if let Some(session) = self.registry.session_mut(id) {
                    session.last_pong = Instant::now();
                    trace!(id, "pong");
                }
            }
            MessageKind::ClientPing => self.registry.send_to(id, &Message::server_pong()),
            MessageKind::RequestRoomJoin => self.on_room_join(id),
            MessageKind::PlayerDead => self.on_player_dead(id, &message),
            kind if kind.is_relayed() => self.relay(id, message),
            kind => warn!(id, ?kind, "unexpected message ignored"),
        }
    }

    fn on_register(&mut self, id: PlayerId, message: &Message) {
        let descriptor = match message.read::<PlayerDescription>() {
            Ok(d) => d,
            Err(e) => {
                warn!(id, error = %e, "bad registration payload ignored");
                return;
            }
        };
        match self.registry.register(id, descriptor, Instant::now()) {
            Some(stored) => {
                info!(id, avatar = stored.avatar_id, "player registered");
                self.registry.send_to(id, &Message::assign_id(id));
            }
            None => warn!(id, "repeated registration ignored"),
        }
    }

    fn on_unregister(&mut self, id: PlayerId, message: &Message) {
        if self.registry.remove_session(id).is_none() {
            warn!(id, "unregister from unregistered connection ignored");
            return;
        }
        if let Ok(named) = message.read::<u32>() {
            if named != id {
                warn!(id, named, "unregister names another player; using sender");
            }
        }
        info!(id, "player unregistered");
        self.leave_room(id);
        if let Some(conn) = self.registry.connection(id) {
            // Disconnected follows once the flush completes
            let _ = conn.shutdown();
        }
    }

    fn on_room_join(&mut self, id: PlayerId) {
        if !self.registry.is_validated(id) {
            warn!(id, "room join from unregistered connection ignored");
            return;
        }
        self.registry.send_to(id, &Message::room_join_accepted());

        match self.room.join(id, generate_seed) {
            JoinOutcome::Joined { existing, seed } => {
                info!(id, "player joined room");
                let roster: Vec<PlayerDescription> = self
                    .room
                    .members()
                    .iter()
                    .filter_map(|&m| self.registry.session(m))
                    .map(|s| s.descriptor)
                    .collect();
                self.registry
                    .send_to(id, &Message::room_player_list(&roster));

                if let (Some(other), Some(joiner)) = (existing, self.registry.session(id)) {
                    self.registry
                        .send_to(other, &Message::room_player_joined(joiner.descriptor));
                }

                if let Some(seed) = seed {
                    info!(seed, members = ?self.room.members(), "room ready");
                    let seed_msg = Message::bag_seed(seed);
                    let ready_msg = Message::all_players_ready();
                    for &m in self.room.members() {
                        self.registry.send_to(m, &seed_msg);
                        self.registry.send_to(m, &ready_msg);
                    }
                }
            }
            JoinOutcome::AlreadyMember => debug!(id, "already in room"),
            JoinOutcome::NotAdmitted => {
                info!(id, phase = ?self.room.phase(), "room unavailable, join acknowledged only")
            }
        }
    }

    fn on_player_dead(&mut self, id: PlayerId, message: &Message) {
        match message.read::<u32>() {
            Ok(named) if named != id => {
                warn!(id, named, "PlayerDead names another player; sender loses");
            }
            Ok(_) => {}
            Err(e) => warn!(id, error = %e, "bad PlayerDead payload; sender loses"),
        }
        if !self.arbitrate(id) {
            debug!(id, phase = ?self.room.phase(), "PlayerDead outside a running match");
        }
    }

    fn relay(&mut self, from: PlayerId, message: Message) {
        match relay::route(&self.room, from, message.kind()) {
            Route::Forward(to) => self.registry.send_to(to, &message),
            Route::Drop(reason) => {
                debug!(from, kind = ?message.kind(), ?reason, "relay dropped")
            }
        }
    }

    /// Send `GameOver` with `loser` losing, if the room is running a match.
    fn arbitrate(&mut self, loser: PlayerId) -> bool {
        let Some(info) = relay::arbitrate(&mut self.room, loser) else {
            return false;
        };
        info!(winner = info.winner_id, loser = info.loser_id, "game over");
        let msg = Message::game_over(info);
        self.registry.send_to(info.winner_id, &msg);
        self.registry.send_to(info.loser_id, &msg);
        true
    }

    /// A member leaving a running match concedes it, which also releases the
    /// room. The opponent hears `RoomPlayerLeft` either way.
    fn leave_room(&mut self, id: PlayerId) {
        if !self.room.is_member(id) {
            return;
        }
        let opponent = self.room.other(id);
        if self.arbitrate(id) {
            debug!(id, "left a running match");
        } else if let Some(out) = self.room.leave(id) {
            debug!(id, phase_before = ?out.phase_before, "left room");
        }
        if let Some(opponent) = opponent {
            self.registry
                .send_to(opponent, &Message::room_player_left(id));
        }
    }

    fn handle_disconnect(&mut self, id: ConnectionId) {
        let (conn, session) = self.registry.remove(id);
        if conn.is_none() {
            return;
        }
        info!(id, registered = session.is_some(), "connection dropped");
        self.leave_room(id);
    }

    fn check_liveness(&mut self, now: Instant) {
        if self.liveness.ping_due(now) {
            let ping = Message::server_ping();
            for session in self.registry.sessions().filter(|s| s.validated && !s.closing) {
                self.registry.send_to(session.id, &ping);
            }
        }

        for id in self.liveness.expired(self.registry.sessions(), now) {
            warn!(id, timeout = ?self.config.pong_timeout, "pong timeout, dropping player");
            if let Some(session) = self.registry.session_mut(id) {
                session.closing = true;
            }
            if let Some(conn) = self.registry.connection(id) {
                conn.disconnect();
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.accept_task.abort();
        self.registry.disconnect_all();
    }
}

async fn accept_loop(
    listener: TcpListener,
    policy: Box<dyn AcceptPolicy>,
    events: InboxSender<NetEvent>,
) {
    let handle = Handle::current();
    let mut ids = IdAllocator::default();
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "accept failed");
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }
        };
        if !policy.allow(peer) {
            info!(%peer, "connection denied");
            continue;
        }
        let _ = stream.set_nodelay(true);
        let id = ids.next_id();
        info!(id, %peer, "connection accepted");
        Connection::accept(
            &handle,
            id,
            stream,
            Some(peer),
            events.clone(),
            DEFAULT_WRITE_TIMEOUT,
        );
    }
}

/// A server ticking on its own thread.
pub struct ServerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Stop the tick loop and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Bind a server and run it on a dedicated thread. Callable from sync or
/// async code.
pub fn start_server(config: ServerConfig) -> anyhow::Result<(ServerHandle, SocketAddr)> {
    let mut server = Server::bind(config)?;
    let addr = server.local_addr();
    let stop = Arc::new(AtomicBool::new(false));
    let thread = std::thread::Builder::new()
        .name("tetris-server".to_string())
        .spawn({
            let stop = Arc::clone(&stop);
            move || server.run(&stop)
        })
        .context("failed to spawn server thread")?;
    Ok((
        ServerHandle {
            stop,
            thread: Some(thread),
        },
        addr,
    ))
}
