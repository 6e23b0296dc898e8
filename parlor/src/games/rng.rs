//! Seedable outcome randomness.
//!
//! Every draw in the game modules goes through [`OutcomeRng`], so an outcome
//! is a pure function of the seed. Rooms default to a wall-clock seed; an
//! admin-set per-room override produces forced/test outcomes.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::time::{SystemTime, UNIX_EPOCH};

/// RNG handed to a game's `draw` function
pub struct OutcomeRng {
    inner: StdRng,
}

impl OutcomeRng {
    /// Deterministic rng from an explicit seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Rng seeded from the wall clock (the per-round default)
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::seeded(nanos)
    }

    /// Rng for a room: the admin seed override when set, the clock otherwise
    pub fn for_room(seed_override: Option<i64>) -> Self {
        match seed_override {
            Some(seed) => Self::seeded(seed as u64),
            None => Self::from_clock(),
        }
    }

    /// Uniform value in `0..upper`
    pub fn below(&mut self, upper: u32) -> u32 {
        self.inner.random_range(0..upper)
    }

    /// One die roll, 1..=6
    pub fn die(&mut self) -> u8 {
        self.inner.random_range(1..=6)
    }

    /// A freshly shuffled 52-card deck. Cards are 0..52; rank is `card % 13`
    /// (0 = ace .. 12 = king).
    pub fn shuffled_deck(&mut self) -> Vec<u8> {
        let mut deck: Vec<u8> = (0..52).collect();
        deck.shuffle(&mut self.inner);
        deck
    }

    /// `count` distinct values from `1..=domain`, ascending
    pub fn distinct(&mut self, domain: u8, count: u8) -> Vec<u8> {
        let count = count.min(domain);
        let mut picked: Vec<u8> =
            rand::seq::index::sample(&mut self.inner, domain as usize, count as usize)
                .into_iter()
                .map(|i| i as u8 + 1)
                .collect();
        picked.sort_unstable();
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = OutcomeRng::seeded(7);
        let mut b = OutcomeRng::seeded(7);
        for _ in 0..100 {
            assert_eq!(a.die(), b.die());
        }
    }

    #[test]
    fn test_die_in_range() {
        let mut rng = OutcomeRng::seeded(1);
        for _ in 0..1000 {
            let d = rng.die();
            assert!((1..=6).contains(&d));
        }
    }

    #[test]
    fn test_shuffled_deck_is_permutation() {
        let mut rng = OutcomeRng::seeded(3);
        let mut deck = rng.shuffled_deck();
        assert_eq!(deck.len(), 52);
        deck.sort_unstable();
        assert_eq!(deck, (0..52).collect::<Vec<u8>>());
    }

    #[test]
    fn test_distinct_values_are_distinct_and_in_domain() {
        let mut rng = OutcomeRng::seeded(9);
        let picked = rng.distinct(80, 20);
        assert_eq!(picked.len(), 20);
        for window in picked.windows(2) {
            assert!(window[0] < window[1], "must be strictly ascending");
        }
        assert!(picked.iter().all(|&n| (1..=80).contains(&n)));
    }
}
