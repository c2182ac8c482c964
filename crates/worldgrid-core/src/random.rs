//! Replica-synchronized random decisions.
//!
//! Every replica seeds the stream identically and issues draws in the same
//! order relative to all other state changes of a tick, so the n-th draw yields
//! the same value everywhere. The draw key (site and entity) never influences
//! the value. It is recorded so that when two replicas' histories diverge the
//! first mismatching draw can be attributed to a call site and an entity.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use tracing::trace;

pub type EntityId = u32;

/// Static label naming the code path that issues a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DrawSite(&'static str);

impl DrawSite {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for DrawSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomDecisionKey {
    pub site: DrawSite,
    pub entity: EntityId,
    /// Exclusive upper bound of the drawn value. Must be positive.
    pub bound: u32,
}

impl RandomDecisionKey {
    pub const fn new(site: DrawSite, entity: EntityId, bound: u32) -> Self {
        Self {
            site,
            entity,
            bound,
        }
    }
}

/// Anything that can answer a keyed draw with a value in `[0, key.bound)`.
pub trait DecisionSource {
    fn draw(&mut self, key: RandomDecisionKey) -> u32;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    /// 1-based position of the draw in the stream.
    pub ordinal: u64,
    pub tick: u64,
    pub site: Cow<'static, str>,
    pub entity: EntityId,
    pub bound: u32,
    pub value: u32,
}

/// Everything needed to resume a stream bit-identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomSnapshot {
    pub seed: u64,
    pub draws: u64,
    pub tick: u64,
    pub checksum: u64,
}

pub(crate) fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

#[derive(Clone, Debug)]
pub struct DeterministicRandom {
    seed: u64,
    rng: ChaCha12Rng,
    draws: u64,
    tick: u64,
    checksum: u64,
    history: VecDeque<DrawRecord>,
    history_capacity: usize,
}

impl DeterministicRandom {
    pub const DEFAULT_HISTORY_CAPACITY: usize = 1024;

    pub fn new(seed: u64) -> Self {
        Self::with_history_capacity(seed, Self::DEFAULT_HISTORY_CAPACITY)
    }

    /// A capacity of 0 disables the draw history.
    pub fn with_history_capacity(seed: u64, history_capacity: usize) -> Self {
        Self {
            seed,
            rng: ChaCha12Rng::seed_from_u64(seed),
            draws: 0,
            tick: 0,
            checksum: mix64(seed),
            history: VecDeque::with_capacity(history_capacity.min(4096)),
            history_capacity,
        }
    }

    /// Resumes the stream captured by [`DeterministicRandom::snapshot`]. The
    /// draw history is not part of the snapshot and starts empty.
    pub fn restore(snapshot: &RandomSnapshot, history_capacity: usize) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(snapshot.seed);
        // Each draw consumes exactly one 32-bit word.
        rng.set_word_pos(snapshot.draws as u128);
        Self {
            seed: snapshot.seed,
            rng,
            draws: snapshot.draws,
            tick: snapshot.tick,
            checksum: snapshot.checksum,
            history: VecDeque::with_capacity(history_capacity.min(4096)),
            history_capacity,
        }
    }

    pub fn snapshot(&self) -> RandomSnapshot {
        RandomSnapshot {
            seed: self.seed,
            draws: self.draws,
            tick: self.tick,
            checksum: self.checksum,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of draws issued so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Running digest of every value drawn, in order. Replicas compare it per
    /// tick to detect divergence early.
    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    /// Tags subsequent draw records with `tick`.
    pub fn begin_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn draw(&mut self, key: RandomDecisionKey) -> u32 {
        assert!(
            key.bound > 0,
            "random bound must be positive (site {}, entity {})",
            key.site,
            key.entity
        );
        // Multiply-shift keeps the mapping independent of any sampling code
        // that could change between library versions.
        let value = ((self.rng.next_u32() as u64 * key.bound as u64) >> 32) as u32;
        self.draws += 1;
        self.checksum = mix64(self.checksum ^ self.draws.rotate_left(32) ^ value as u64);
        trace!(
            ordinal = self.draws,
            tick = self.tick,
            site = %key.site,
            entity = key.entity,
            bound = key.bound,
            value,
            "random draw"
        );
        if self.history_capacity > 0 {
            if self.history.len() == self.history_capacity {
                self.history.pop_front();
            }
            self.history.push_back(DrawRecord {
                ordinal: self.draws,
                tick: self.tick,
                site: Cow::Borrowed(key.site.name()),
                entity: key.entity,
                bound: key.bound,
                value,
            });
        }
        value
    }

    /// Most recent draws, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &DrawRecord> {
        self.history.iter()
    }

    /// Serializes the draw history so it can be shipped alongside a desync report.
    pub fn history_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.history)
    }
}

impl DecisionSource for DeterministicRandom {
    fn draw(&mut self, key: RandomDecisionKey) -> u32 {
        DeterministicRandom::draw(self, key)
    }
}

/// Ordinal of the first draw recorded by both histories whose records differ.
/// Draws present in only one of them are ignored.
pub fn first_divergence<'a>(
    ours: impl IntoIterator<Item = &'a DrawRecord>,
    theirs: impl IntoIterator<Item = &'a DrawRecord>,
) -> Option<u64> {
    let mut theirs = theirs.into_iter().peekable();
    for record in ours {
        while theirs.next_if(|t| t.ordinal < record.ordinal).is_some() {}
        match theirs.peek() {
            Some(t) if t.ordinal == record.ordinal => {
                if *t != record {
                    return Some(record.ordinal);
                }
                theirs.next();
            }
            Some(_) => continue,
            None => break,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE_A: DrawSite = DrawSite::new("test.a");
    const SITE_B: DrawSite = DrawSite::new("test.b");

    fn key(site: DrawSite, entity: EntityId, bound: u32) -> RandomDecisionKey {
        RandomDecisionKey::new(site, entity, bound)
    }

    #[test]
    fn identical_call_sequences_give_identical_values() {
        let mut a = DeterministicRandom::new(12345);
        let mut b = DeterministicRandom::new(12345);
        for i in 0..1000u32 {
            let k = key(SITE_A, i % 7, 1 + i % 13);
            assert_eq!(a.draw(k), b.draw(k));
        }
        assert_eq!(a.checksum(), b.checksum());
        assert_eq!(a.draws(), 1000);
    }

    #[test]
    fn keys_do_not_change_values() {
        let mut a = DeterministicRandom::new(99);
        let mut b = DeterministicRandom::new(99);
        for i in 0..200 {
            assert_eq!(
                a.draw(key(SITE_A, 1, 10)),
                b.draw(key(SITE_B, 1000 + i, 10))
            );
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = DeterministicRandom::new(1);
        let mut b = DeterministicRandom::new(2);
        let va: Vec<u32> = (0..32).map(|_| a.draw(key(SITE_A, 0, 1 << 20))).collect();
        let vb: Vec<u32> = (0..32).map(|_| b.draw(key(SITE_A, 0, 1 << 20))).collect();
        assert_ne!(va, vb);
        assert_ne!(a.checksum(), b.checksum());
    }

    #[test]
    fn draws_stay_below_bound_and_cover_it() {
        let mut rng = DeterministicRandom::with_history_capacity(42, 0);
        let mut seen = [0usize; 5];
        for _ in 0..5000 {
            let v = rng.draw(key(SITE_A, 0, 5));
            assert!(v < 5);
            seen[v as usize] += 1;
        }
        assert!(seen.iter().all(|&n| (800..1200).contains(&n)), "{seen:?}");
        assert_eq!(rng.draw(key(SITE_A, 0, 1)), 0);
    }

    #[test]
    #[should_panic(expected = "bound must be positive")]
    fn zero_bound_panics() {
        DeterministicRandom::new(0).draw(key(SITE_A, 3, 0));
    }

    #[test]
    fn restore_continues_the_same_stream() {
        let mut original = DeterministicRandom::new(777);
        original.begin_tick(4);
        for _ in 0..37 {
            original.draw(key(SITE_A, 0, 1000));
        }
        let snapshot = original.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: RandomSnapshot = serde_json::from_str(&json).unwrap();
        let mut resumed = DeterministicRandom::restore(&decoded, 16);
        assert_eq!(resumed.tick(), 4);
        for _ in 0..100 {
            let k = key(SITE_B, 5, 1 << 30);
            assert_eq!(original.draw(k), resumed.draw(k));
        }
        assert_eq!(original.checksum(), resumed.checksum());
    }

    #[test]
    fn history_is_bounded_and_tagged() {
        let mut rng = DeterministicRandom::with_history_capacity(5, 3);
        rng.begin_tick(9);
        for entity in 0..5 {
            rng.draw(key(SITE_B, entity, 8));
        }
        let records: Vec<&DrawRecord> = rng.history().collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].ordinal, 3);
        assert_eq!(records[2].entity, 4);
        assert!(records.iter().all(|r| r.tick == 9 && r.site == "test.b"));

        let json = rng.history_json().unwrap();
        let decoded: Vec<DrawRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(&decoded[1], records[1]);
    }

    #[test]
    fn first_divergence_locates_mismatched_draw() {
        let mut ours = DeterministicRandom::new(21);
        let mut theirs = DeterministicRandom::new(21);
        for i in 0..10 {
            ours.draw(key(SITE_A, i, 6));
            // Replica drew for a different entity at ordinal 7.
            let entity = if i == 6 { 99 } else { i };
            theirs.draw(key(SITE_A, entity, 6));
        }
        assert_eq!(first_divergence(ours.history(), theirs.history()), Some(7));

        let mut clean = DeterministicRandom::new(21);
        for i in 0..10 {
            clean.draw(key(SITE_A, i, 6));
        }
        assert_eq!(first_divergence(ours.history(), clean.history()), None);
    }

    #[test]
    fn first_divergence_aligns_offset_histories() {
        let mut long = DeterministicRandom::with_history_capacity(3, 100);
        let mut short = DeterministicRandom::with_history_capacity(3, 4);
        for i in 0..12 {
            long.draw(key(SITE_A, i, 50));
            short.draw(key(SITE_A, if i == 10 { 7 } else { i }, 50));
        }
        assert_eq!(first_divergence(long.history(), short.history()), Some(11));
        assert_eq!(first_divergence(short.history(), long.history()), Some(11));
    }
}
