use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tetris_versus::protocol::{decode, encode, encode_into, FrameDecoder, Message};
use tetris_versus::types::{BoardSnapshot, MinoState, PieceKind, Rotation};

fn full_board() -> BoardSnapshot {
    let mut board = BoardSnapshot::default();
    for y in 3..23 {
        for x in 0..10 {
            if (x + y) % 3 != 0 {
                board.set(x, y, 1 + ((x * y) % 7) as i32);
            }
        }
    }
    board
}

fn bench_encode_board(c: &mut Criterion) {
    let msg = Message::board(&full_board());
    let mut out = Vec::with_capacity(1024);

    c.bench_function("encode_board", |b| {
        b.iter(|| {
            out.clear();
            encode_into(black_box(&msg), &mut out);
        })
    });
}

fn bench_decode_board(c: &mut Criterion) {
    let bytes = encode(&Message::board(&full_board()));

    c.bench_function("decode_board", |b| {
        b.iter(|| {
            let msg = decode(black_box(&bytes)).unwrap();
            msg.read::<BoardSnapshot>().unwrap()
        })
    });
}

fn bench_stream_reassembly(c: &mut Criterion) {
    // a typical frame of traffic: piece then board
    let mut wire = Vec::new();
    encode_into(
        &Message::cur_mino(MinoState::new(PieceKind::T, 4, 1, Rotation::North)),
        &mut wire,
    );
    encode_into(&Message::board(&full_board()), &mut wire);

    c.bench_function("reassemble_64b_chunks", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::new();
            let mut count = 0;
            for chunk in wire.chunks(64) {
                decoder.extend(chunk);
                while let Some(msg) = decoder.next_message().unwrap() {
                    black_box(&msg);
                    count += 1;
                }
            }
            count
        })
    });
}

criterion_group!(
    benches,
    bench_encode_board,
    bench_decode_board,
    bench_stream_reassembly
);
criterion_main!(benches);
