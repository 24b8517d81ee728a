//! Bag module - seeded 7-bag piece generation
//!
//! Each bag holds one of each piece (I, O, T, L, J, S, Z), shuffled. Pieces are
//! drawn until the bag runs out, then a fresh bag is shuffled.
//!
//! In a versus match both peers seed their bag with the `SendBagSeed` value the
//! server broadcast, so they draw identical sequences.

use std::collections::VecDeque;

use crate::types::{PieceKind, PIECE_KIND_COUNT, PREVIEW_COUNT};

/// 64-bit LCG (Knuth's MMIX constants).
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next 32 random bits (high half of the state; low bits of an LCG are weak).
    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }

    /// Random value in `[0, max)`
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// 7-bag piece generator
#[derive(Debug, Clone)]
pub struct BagRandomizer {
    queue: VecDeque<PieceKind>,
    rng: SeededRng,
    seed: u64,
}

impl BagRandomizer {
    pub fn new(seed: u64) -> Self {
        Self {
            queue: VecDeque::with_capacity(PIECE_KIND_COUNT * 2),
            rng: SeededRng::new(seed),
            seed,
        }
    }

    /// Restart the sequence from `seed`, discarding anything queued.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SeededRng::new(seed);
        self.seed = seed;
        self.queue.clear();
    }

    fn refill(&mut self) {
        let mut bag = PieceKind::ALL;
        self.rng.shuffle(&mut bag);
        self.queue.extend(bag);
    }

    /// Draw the next piece, refilling the bag when empty.
    pub fn next_piece(&mut self) -> PieceKind {
        if self.queue.is_empty() {
            self.refill();
        }
        // refill() always pushes PIECE_KIND_COUNT pieces
        self.queue.pop_front().unwrap_or(PieceKind::I)
    }

    /// Look `i` pieces ahead without consuming. Later bags are shuffled on
    /// demand, which does not change what [`next_piece`](Self::next_piece)
    /// returns.
    pub fn peek(&mut self, i: usize) -> PieceKind {
        while self.queue.len() <= i {
            self.refill();
        }
        self.queue[i]
    }

    /// The next [`PREVIEW_COUNT`] pieces, for the preview sync message.
    pub fn preview(&mut self) -> [PieceKind; PREVIEW_COUNT] {
        let mut out = [PieceKind::I; PREVIEW_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.peek(i);
        }
        out
    }

    /// Seed this sequence started from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Pieces currently buffered
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_is_deterministic() {
        let mut a = SeededRng::new(12345);
        let mut b = SeededRng::new(12345);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn every_bag_holds_each_piece_once() {
        let mut bag = BagRandomizer::new(0xDEAD_BEEF);
        for _ in 0..4 {
            let mut drawn: Vec<PieceKind> = (0..7).map(|_| bag.next_piece()).collect();
            drawn.sort_by_key(|k| k.to_wire());
            assert_eq!(drawn, PieceKind::ALL.to_vec());
        }
    }

    #[test]
    fn peek_matches_later_draws() {
        let mut bag = BagRandomizer::new(7);
        let ahead: Vec<PieceKind> = (0..10).map(|i| bag.peek(i)).collect();
        let drawn: Vec<PieceKind> = (0..10).map(|_| bag.next_piece()).collect();
        assert_eq!(ahead, drawn);
    }

    #[test]
    fn preview_does_not_consume() {
        let mut bag = BagRandomizer::new(99);
        let preview = bag.preview();
        assert_eq!(bag.next_piece(), preview[0]);
        assert_eq!(bag.next_piece(), preview[1]);
    }

    #[test]
    fn reseed_restarts_sequence() {
        let mut bag = BagRandomizer::new(42);
        let first: Vec<PieceKind> = (0..14).map(|_| bag.next_piece()).collect();
        bag.reseed(42);
        assert_eq!(bag.queued(), 0);
        let again: Vec<PieceKind> = (0..14).map(|_| bag.next_piece()).collect();
        assert_eq!(first, again);
        assert_eq!(bag.seed(), 42);
    }
}
