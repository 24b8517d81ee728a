use std::time::Duration;

use tokio::runtime::Handle;
use tokio_test::io::Builder;

use tetris_versus::net::{inbox, Connection, ConnectionState, Inbox, NetEvent};
use tetris_versus::protocol::{encode, Message, MessageKind, HEADER_LEN, MAX_PAYLOAD_LEN};
use tetris_versus::types::{MinoState, PieceKind, Rotation};

async fn next_event(inbox: &mut Inbox) -> NetEvent {
    tokio::time::timeout(Duration::from_secs(1), inbox.recv())
        .await
        .expect("no event within a second")
        .expect("inbox closed")
}

fn header(kind: u32, len: u32) -> Vec<u8> {
    let mut out = kind.to_le_bytes().to_vec();
    out.extend_from_slice(&len.to_le_bytes());
    out
}

#[tokio::test]
async fn frames_split_across_reads_are_reassembled() {
    let piece = Message::cur_mino(MinoState::new(PieceKind::S, 1, 5, Rotation::South));
    let mut wire = encode(&Message::accepted());
    wire.extend(encode(&piece));

    // header split, payload split across a frame boundary
    let stream = Builder::new()
        .read(&wire[..3])
        .read(&wire[3..HEADER_LEN + 2])
        .read(&wire[HEADER_LEN + 2..])
        .build();

    let (events, mut inbox) = inbox::channel(Handle::current());
    let conn = Connection::spawn(&Handle::current(), 7, stream, None, events);

    match next_event(&mut inbox).await {
        NetEvent::Message { id, message } => {
            assert_eq!(id, 7);
            assert_eq!(message.kind(), MessageKind::Accepted);
        }
        other => panic!("unexpected {other:?}"),
    }
    match next_event(&mut inbox).await {
        NetEvent::Message { message, .. } => assert_eq!(message, piece),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        next_event(&mut inbox).await,
        NetEvent::Disconnected { id: 7 }
    ));
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn writes_keep_send_order_and_shutdown_flushes() {
    let first = Message::player_dead(10_000);
    let second = Message::unregister(10_000);
    let stream = Builder::new()
        .write(&encode(&first))
        .write(&encode(&second))
        .build();

    let (events, mut inbox) = inbox::channel(Handle::current());
    let conn = Connection::spawn(&Handle::current(), 1, stream, None, events);
    conn.send(&first);
    conn.send(&second);
    let shutdown = conn.shutdown();

    // dropped: the connection is already closing
    conn.send(&Message::client_ping());

    shutdown.finished().await.unwrap();
    assert!(matches!(
        next_event(&mut inbox).await,
        NetEvent::Disconnected { id: 1 }
    ));
}

#[tokio::test]
async fn oversized_frame_closes_without_delivering() {
    let stream = Builder::new()
        .read(&header(0, MAX_PAYLOAD_LEN as u32 + 1))
        .build();

    let (events, mut inbox) = inbox::channel(Handle::current());
    let _conn = Connection::spawn(&Handle::current(), 3, stream, None, events);

    assert!(matches!(
        next_event(&mut inbox).await,
        NetEvent::Disconnected { id: 3 }
    ));
}

#[tokio::test]
async fn unknown_kind_closes_the_connection() {
    let stream = Builder::new().read(&header(999, 0)).build();

    let (events, mut inbox) = inbox::channel(Handle::current());
    let _conn = Connection::spawn(&Handle::current(), 4, stream, None, events);

    assert!(matches!(
        next_event(&mut inbox).await,
        NetEvent::Disconnected { id: 4 }
    ));
}

#[tokio::test]
async fn accepted_connection_announces_itself_first() {
    let stream = Builder::new().read(&encode(&Message::client_ping())).build();

    let (events, mut inbox) = inbox::channel(Handle::current());
    let _conn = Connection::accept(
        &Handle::current(),
        9,
        stream,
        None,
        events,
        Duration::from_secs(1),
    );

    assert!(matches!(next_event(&mut inbox).await, NetEvent::Connected(c) if c.id() == 9));
    assert!(matches!(
        next_event(&mut inbox).await,
        NetEvent::Message { id: 9, .. }
    ));
    assert!(matches!(
        next_event(&mut inbox).await,
        NetEvent::Disconnected { id: 9 }
    ));
}

#[tokio::test]
async fn disconnect_is_idempotent_and_reported_once() {
    let (ours, _theirs) = tokio::io::duplex(1024);
    let (events, mut inbox) = inbox::channel(Handle::current());
    let conn = Connection::spawn(&Handle::current(), 5, ours, None, events);
    assert!(conn.is_open());

    conn.disconnect();
    conn.disconnect();
    assert_eq!(conn.state(), ConnectionState::Closed);
    conn.send(&Message::client_ping());

    assert!(matches!(
        next_event(&mut inbox).await,
        NetEvent::Disconnected { id: 5 }
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(inbox.pop_nonblocking().is_none());

    assert!(conn.shutdown().finished().await.is_err());
}
