//! The single versus room.
//!
//! # Phases
//!
//! | Phase | Members | Meaning |
//! |-------|---------|---------|
//! | `Empty` | 0 | nobody waiting |
//! | `WaitingForSecond` | 1 | first joiner waiting |
//! | `Ready` | 2 | seed sent, match running, relay active |
//!
//! A decided match releases the room at once: [`Room::conclude`] drops both
//! members and returns to `Empty`, so the next pair can form while the old
//! players are still connected.
//!
//! The room is pure state. The server decides what to send from the
//! outcomes returned here.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use arrayvec::ArrayVec;
use rand::rngs::OsRng;
use rand::RngCore;

use tetris_versus_types::{PlayerId, ROOM_CAPACITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomPhase {
    #[default]
    Empty,
    WaitingForSecond,
    Ready,
}

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Became a member. `existing` is the member that was already waiting;
    /// `seed` is set when this join made the room `Ready`.
    Joined {
        existing: Option<PlayerId>,
        seed: Option<u64>,
    },
    AlreadyMember,
    /// Match already running; never promoted.
    NotAdmitted,
}

/// Result of a member leaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub remaining: Option<PlayerId>,
    pub phase_before: RoomPhase,
}

#[derive(Debug, Default)]
pub struct Room {
    members: ArrayVec<PlayerId, ROOM_CAPACITY>,
    phase: RoomPhase,
    seed: Option<u64>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    pub fn is_member(&self, id: PlayerId) -> bool {
        self.members.contains(&id)
    }

    /// The member that is not `id`.
    pub fn other(&self, id: PlayerId) -> Option<PlayerId> {
        self.members.iter().copied().find(|&m| m != id)
    }

    /// Seed of the current match, once `Ready`.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Admit `id` if there is room. `make_seed` runs at most once, on the
    /// transition to `Ready`.
    pub fn join(&mut self, id: PlayerId, make_seed: impl FnOnce() -> u64) -> JoinOutcome {
        if self.is_member(id) {
            return JoinOutcome::AlreadyMember;
        }
        if !matches!(self.phase, RoomPhase::Empty | RoomPhase::WaitingForSecond) {
            return JoinOutcome::NotAdmitted;
        }
        let existing = self.members.first().copied();
        if self.members.try_push(id).is_err() {
            return JoinOutcome::NotAdmitted;
        }

        let seed = if self.members.is_full() {
            let seed = make_seed();
            self.seed = Some(seed);
            self.phase = RoomPhase::Ready;
            Some(seed)
        } else {
            self.phase = RoomPhase::WaitingForSecond;
            None
        };
        JoinOutcome::Joined { existing, seed }
    }

    /// Remove `id`. Returns `None` if it was not a member.
    pub fn leave(&mut self, id: PlayerId) -> Option<LeaveOutcome> {
        let pos = self.members.iter().position(|&m| m == id)?;
        let phase_before = self.phase;
        self.members.remove(pos);

        let remaining = self.members.first().copied();
        match remaining {
            None => self.reset(),
            Some(_) => self.phase = RoomPhase::WaitingForSecond,
        }
        Some(LeaveOutcome {
            remaining,
            phase_before,
        })
    }

    /// End a `Ready` match: both members are released and the room is
    /// `Empty` again. Returns the released members, or `None` if no match was
    /// running.
    pub fn conclude(&mut self) -> Option<ArrayVec<PlayerId, ROOM_CAPACITY>> {
        if self.phase != RoomPhase::Ready {
            return None;
        }
        let released = std::mem::take(&mut self.members);
        self.reset();
        Some(released)
    }

    fn reset(&mut self) {
        self.members.clear();
        self.phase = RoomPhase::Empty;
        self.seed = None;
    }
}

/// Fresh 64-bit bag seed: OS randomness mixed with a hash of the monotonic
/// clock, the wall clock's nanoseconds and the current thread's id.
///
/// `Instant` exposes no raw tick count, so it enters through the hasher.
pub fn generate_seed() -> u64 {
    let os = (u64::from(OsRng.next_u32()) << 32) | u64::from(OsRng.next_u32());
    let wall = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut hasher = DefaultHasher::new();
    Instant::now().hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);
    os ^ wall ^ hasher.finish()
}
