mod common;

use std::time::Duration;

use common::{ready_pair, spawn_server, test_config, WireClient};
use tetris_versus::protocol::{Message, MessageKind};
use tetris_versus::types::GameOverInfo;

#[tokio::test]
async fn survivor_wins_exactly_once_when_opponent_drops() {
    let (_server, addr) = spawn_server(test_config());
    let (a, mut b, _) = ready_pair(addr).await;

    drop(a);

    let messages = b.drain_for(Duration::from_millis(500)).await;
    let overs: Vec<GameOverInfo> = messages
        .iter()
        .filter(|m| m.kind() == MessageKind::GameOver)
        .map(|m| m.read::<GameOverInfo>().unwrap())
        .collect();
    assert_eq!(
        overs,
        vec![GameOverInfo {
            winner_id: 10_001,
            loser_id: 10_000
        }]
    );

    let left = messages
        .iter()
        .find(|m| m.kind() == MessageKind::RoomPlayerLeft)
        .expect("RoomPlayerLeft");
    assert_eq!(left.read::<u32>().unwrap(), 10_000);
}

#[tokio::test]
async fn drop_after_game_over_does_not_arbitrate_again() {
    let (_server, addr) = spawn_server(test_config());
    let (mut a, mut b, _) = ready_pair(addr).await;

    b.send(&Message::player_dead(10_001)).await;
    a.expect(MessageKind::GameOver).await;
    b.expect(MessageKind::GameOver).await;

    // the match already released the room, so the drop is not news to b
    drop(a);
    assert!(b.drain_for(Duration::from_millis(300)).await.is_empty());
}

#[tokio::test]
async fn unregister_concedes_and_closes_after_flush() {
    let (_server, addr) = spawn_server(test_config());
    let (mut a, mut b, _) = ready_pair(addr).await;

    a.send(&Message::unregister(10_000)).await;

    // the leaver still gets the verdict before its connection closes
    let over = a.expect(MessageKind::GameOver).await;
    assert_eq!(over.read::<GameOverInfo>().unwrap().loser_id, 10_000);
    assert!(a.wait_closed(Duration::from_secs(1)).await);

    b.expect(MessageKind::GameOver).await;
    b.expect(MessageKind::RoomPlayerLeft).await;
}

#[tokio::test]
async fn waiting_room_empties_and_can_form_again() {
    let (_server, addr) = spawn_server(test_config());
    let mut a = WireClient::connect(addr).await;
    a.register(0).await;
    a.join().await;
    drop(a);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut b = WireClient::connect(addr).await;
    assert_eq!(b.register(0).await, 10_001);
    let roster = b.join().await;
    assert_eq!(roster.len(), 1, "stale member left in room: {roster:?}");

    let mut c = WireClient::connect(addr).await;
    c.register(0).await;
    c.join().await;
    c.expect(MessageKind::SendBagSeed).await;
    c.expect(MessageKind::AllPlayersReady).await;
}
