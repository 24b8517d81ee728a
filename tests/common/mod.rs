#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};

use tetris_versus::protocol::{encode, FrameDecoder, Message, MessageKind};
use tetris_versus::server::{start_server, ServerConfig, ServerHandle};
use tetris_versus::types::PlayerDescription;

pub const WAIT: Duration = Duration::from_secs(2);

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    }
}

pub fn spawn_server(config: ServerConfig) -> (ServerHandle, SocketAddr) {
    start_server(config).expect("start server")
}

#[derive(Debug)]
pub enum Read {
    Message(Message),
    Timeout,
    Closed,
}

/// Raw protocol client speaking frames directly over TCP.
pub struct WireClient {
    stream: TcpStream,
    decoder: FrameDecoder,
    pub id: u32,
}

impl WireClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = tokio::time::timeout(WAIT, TcpStream::connect(addr))
            .await
            .expect("timeout connecting")
            .expect("connect");
        Self {
            stream,
            decoder: FrameDecoder::new(),
            id: 0,
        }
    }

    pub async fn send(&mut self, message: &Message) {
        self.stream.write_all(&encode(message)).await.unwrap();
        self.stream.flush().await.unwrap();
    }

    pub async fn read(&mut self, wait: Duration) -> Read {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(message) = self.decoder.next_message().expect("valid frame") {
                return Read::Message(message);
            }
            let mut buf = [0u8; 4096];
            match timeout_at(deadline, self.stream.read(&mut buf)).await {
                Err(_) => return Read::Timeout,
                Ok(Ok(0)) | Ok(Err(_)) => return Read::Closed,
                Ok(Ok(n)) => self.decoder.extend(&buf[..n]),
            }
        }
    }

    /// Next message other than `ServerPing`; panics on timeout or close.
    pub async fn next(&mut self) -> Message {
        loop {
            match self.read(WAIT).await {
                Read::Message(m) if m.kind() == MessageKind::ServerPing => continue,
                Read::Message(m) => return m,
                other => panic!("expected a message, got {other:?}"),
            }
        }
    }

    pub async fn expect(&mut self, kind: MessageKind) -> Message {
        let message = self.next().await;
        assert_eq!(message.kind(), kind, "unexpected message {message:?}");
        message
    }

    /// Everything except pings that arrives within `wait`.
    pub async fn drain_for(&mut self, wait: Duration) -> Vec<Message> {
        let deadline = Instant::now() + wait;
        let mut out = Vec::new();
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.read(left).await {
                Read::Message(m) if m.kind() == MessageKind::ServerPing => {}
                Read::Message(m) => out.push(m),
                Read::Timeout | Read::Closed => return out,
            }
        }
    }

    /// Wait for the server to close the stream, answering nothing.
    pub async fn wait_closed(&mut self, wait: Duration) -> bool {
        let deadline = Instant::now() + wait;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.read(left).await {
                Read::Message(_) => {}
                Read::Closed => return true,
                Read::Timeout => return false,
            }
        }
    }

    /// `Accepted` -> register -> `AssignId`.
    pub async fn register(&mut self, avatar_id: u32) -> u32 {
        self.expect(MessageKind::Accepted).await;
        self.send(&Message::register(PlayerDescription {
            unique_id: 0,
            avatar_id,
        }))
        .await;
        let id = self
            .expect(MessageKind::AssignId)
            .await
            .read::<u32>()
            .unwrap();
        self.id = id;
        id
    }

    /// Request a room seat; returns the roster the server reported.
    pub async fn join(&mut self) -> Vec<PlayerDescription> {
        self.send(&Message::request_room_join()).await;
        self.expect(MessageKind::RoomJoinAccepted).await;
        self.expect(MessageKind::RoomPlayerList)
            .await
            .read::<Vec<PlayerDescription>>()
            .unwrap()
    }
}

/// Two registered clients in a `Ready` room. Returns them with the seed.
pub async fn ready_pair(addr: SocketAddr) -> (WireClient, WireClient, u64) {
    let mut a = WireClient::connect(addr).await;
    a.register(1).await;
    let mut b = WireClient::connect(addr).await;
    b.register(2).await;

    a.join().await;
    b.join().await;

    a.expect(MessageKind::RoomPlayerJoined).await;
    let seed_a = a.expect(MessageKind::SendBagSeed).await.read::<u64>().unwrap();
    a.expect(MessageKind::AllPlayersReady).await;
    let seed_b = b.expect(MessageKind::SendBagSeed).await.read::<u64>().unwrap();
    b.expect(MessageKind::AllPlayersReady).await;

    assert_eq!(seed_a, seed_b);
    (a, b, seed_a)
}
