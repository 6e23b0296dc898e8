//! Lotto: a keno-style draw of distinct numbers and single-number bets.
//!
//! The draw takes `count` distinct numbers from `1..=domain` (no
//! replacement). A number-pick bet pays a rules-configured multiple of the
//! stake when its number is among the drawn set.

use super::{BetSelection, Outcome, PayoutRule, rng::OutcomeRng};

/// Draw `count` distinct numbers from `1..=domain`, ascending
pub fn draw(rng: &mut OutcomeRng, domain: u8, count: u8) -> Vec<u8> {
    rng.distinct(domain, count)
}

/// Lotto payout table
#[derive(Debug, Clone, Copy)]
pub struct LottoTable {
    /// Numbers run 1..=domain
    pub domain: u8,
    /// Total credit on a hit, in basis points of the stake
    pub hit_bps: i64,
}

impl PayoutRule for LottoTable {
    fn allows(&self, selection: &BetSelection) -> bool {
        match selection {
            BetSelection::Pick(n) => *n >= 1 && *n <= self.domain,
            _ => false,
        }
    }

    fn evaluate(&self, selection: &BetSelection, amount: i64, outcome: &Outcome) -> i64 {
        let Outcome::Lotto { numbers } = outcome else {
            return 0;
        };
        match selection {
            BetSelection::Pick(n) if numbers.contains(n) => {
                amount.saturating_mul(self.hit_bps) / 10_000
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LottoTable {
        LottoTable {
            domain: 80,
            hit_bps: 30_000,
        }
    }

    #[test]
    fn test_draw_distinct_in_domain() {
        let mut rng = OutcomeRng::seeded(21);
        for _ in 0..50 {
            let numbers = draw(&mut rng, 80, 20);
            assert_eq!(numbers.len(), 20);
            for w in numbers.windows(2) {
                assert!(w[0] < w[1]);
            }
            assert!(numbers.iter().all(|&n| (1..=80).contains(&n)));
        }
    }

    #[test]
    fn test_hit_pays_configured_multiple() {
        let o = Outcome::Lotto {
            numbers: vec![3, 17, 42],
        };
        assert_eq!(table().evaluate(&BetSelection::Pick(17), 100, &o), 300);
        assert_eq!(table().evaluate(&BetSelection::Pick(18), 100, &o), 0);
    }

    #[test]
    fn test_fractional_multiple_floors() {
        let half = LottoTable {
            domain: 80,
            hit_bps: 25_000, // 2.5x
        };
        let o = Outcome::Lotto { numbers: vec![7] };
        // 3 * 25000 / 10000 = 7.5 -> 7
        assert_eq!(half.evaluate(&BetSelection::Pick(7), 3, &o), 7);
    }

    #[test]
    fn test_allows_bounds() {
        let t = table();
        assert!(t.allows(&BetSelection::Pick(1)));
        assert!(t.allows(&BetSelection::Pick(80)));
        assert!(!t.allows(&BetSelection::Pick(0)));
        assert!(!t.allows(&BetSelection::Pick(81)));
        assert!(!t.allows(&BetSelection::Tie));
    }
}
