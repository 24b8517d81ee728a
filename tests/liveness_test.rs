mod common;

use std::time::{Duration, Instant};

use common::{spawn_server, test_config, Read, WireClient};
use tetris_versus::protocol::{Message, MessageKind};
use tetris_versus::server::ServerConfig;
use tetris_versus::types::PlayerDescription;

const PONG_TIMEOUT: Duration = Duration::from_millis(300);

fn fast_config() -> ServerConfig {
    ServerConfig {
        ping_interval: Duration::from_millis(50),
        pong_timeout: PONG_TIMEOUT,
        tick: Duration::from_millis(5),
        ..test_config()
    }
}

#[tokio::test]
async fn silent_player_is_dropped_no_earlier_than_timeout() {
    let (_server, addr) = spawn_server(fast_config());
    let mut a = WireClient::connect(addr).await;
    a.expect(MessageKind::Accepted).await;
    a.send(&Message::register(PlayerDescription::default())).await;
    a.expect(MessageKind::AssignId).await;
    // the server started the session's pong clock before sending AssignId
    let registered_at = Instant::now();

    let mut pinged = false;
    loop {
        match a.read(Duration::from_secs(2)).await {
            Read::Message(m) if m.kind() == MessageKind::ServerPing => pinged = true,
            Read::Message(_) => {}
            Read::Closed => break,
            Read::Timeout => panic!("silent player was never dropped"),
        }
    }
    assert!(pinged, "validated session should be pinged");
    assert!(registered_at.elapsed() > PONG_TIMEOUT);
}

#[tokio::test]
async fn answering_pings_keeps_player_connected() {
    let (_server, addr) = spawn_server(fast_config());
    let mut a = WireClient::connect(addr).await;
    a.register(0).await;

    let until = Instant::now() + PONG_TIMEOUT * 3;
    while Instant::now() < until {
        match a.read(Duration::from_millis(100)).await {
            Read::Message(m) if m.kind() == MessageKind::ServerPing => {
                a.send(&Message::client_pong()).await
            }
            Read::Message(_) | Read::Timeout => {}
            Read::Closed => panic!("responsive player was dropped"),
        }
    }
}

#[tokio::test]
async fn unregistered_connection_is_not_pinged_or_timed_out() {
    let (_server, addr) = spawn_server(fast_config());
    let mut a = WireClient::connect(addr).await;
    a.expect(MessageKind::Accepted).await;

    match a.read(PONG_TIMEOUT * 2).await {
        Read::Timeout => {}
        other => panic!("expected silence, got {other:?}"),
    }
}

#[tokio::test]
async fn timed_out_member_loses_the_match() {
    let (_server, addr) = spawn_server(fast_config());
    let (mut a, mut b, _) = common::ready_pair(addr).await;

    // b keeps answering, a stays silent
    let deadline = Instant::now() + Duration::from_secs(2);
    let over = loop {
        assert!(Instant::now() < deadline, "no GameOver after timeout");
        match b.read(Duration::from_millis(100)).await {
            Read::Message(m) if m.kind() == MessageKind::ServerPing => {
                b.send(&Message::client_pong()).await
            }
            Read::Message(m) if m.kind() == MessageKind::GameOver => break m,
            Read::Message(_) | Read::Timeout => {}
            Read::Closed => panic!("responsive player was dropped"),
        }
    };
    let info = over.read::<tetris_versus::types::GameOverInfo>().unwrap();
    assert_eq!((info.winner_id, info.loser_id), (10_001, 10_000));
    assert!(a.wait_closed(Duration::from_secs(1)).await);
}
