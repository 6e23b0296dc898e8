//! European roulette: a single pocket draw and the outside/inside bet table.
//!
//! Payouts (total credit on stake): straight 35:1, dozen/column 2:1, the
//! even-money outside bets 1:1. Zero loses every outside bet.

use super::{BetSelection, Outcome, PayoutRule, rng::OutcomeRng};

/// Red pockets of the European wheel
const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Whether a pocket is red
pub fn is_red(pocket: u8) -> bool {
    RED_NUMBERS.contains(&pocket)
}

/// Spin: one uniform pocket in 0..=36
pub fn draw(rng: &mut OutcomeRng) -> u8 {
    rng.below(37) as u8
}

/// Roulette payout table
#[derive(Debug, Clone, Copy)]
pub struct RouletteTable;

impl PayoutRule for RouletteTable {
    fn allows(&self, selection: &BetSelection) -> bool {
        match selection {
            BetSelection::Straight(n) => *n <= 36,
            BetSelection::Dozen(n) | BetSelection::Column(n) => (1..=3).contains(n),
            BetSelection::Red
            | BetSelection::Black
            | BetSelection::Odd
            | BetSelection::Even
            | BetSelection::Low
            | BetSelection::High => true,
            _ => false,
        }
    }

    fn evaluate(&self, selection: &BetSelection, amount: i64, outcome: &Outcome) -> i64 {
        let Outcome::Roulette { pocket } = outcome else {
            return 0;
        };
        let pocket = *pocket;

        let wins = match selection {
            BetSelection::Straight(n) => pocket == *n,
            BetSelection::Red => pocket != 0 && is_red(pocket),
            BetSelection::Black => pocket != 0 && !is_red(pocket),
            BetSelection::Odd => pocket != 0 && pocket % 2 == 1,
            BetSelection::Even => pocket != 0 && pocket % 2 == 0,
            BetSelection::Low => (1..=18).contains(&pocket),
            BetSelection::High => (19..=36).contains(&pocket),
            BetSelection::Dozen(d) => pocket != 0 && (pocket - 1) / 12 + 1 == *d,
            BetSelection::Column(c) => pocket != 0 && (pocket - 1) % 3 + 1 == *c,
            _ => false,
        };
        if !wins {
            return 0;
        }

        let multiple = match selection {
            BetSelection::Straight(_) => 36,
            BetSelection::Dozen(_) | BetSelection::Column(_) => 3,
            _ => 2,
        };
        amount.saturating_mul(multiple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pocket(n: u8) -> Outcome {
        Outcome::Roulette { pocket: n }
    }

    #[test]
    fn test_draw_in_range() {
        let mut rng = OutcomeRng::seeded(11);
        for _ in 0..1000 {
            assert!(draw(&mut rng) <= 36);
        }
    }

    #[test]
    fn test_straight_up() {
        let t = RouletteTable;
        assert_eq!(t.evaluate(&BetSelection::Straight(17), 10, &pocket(17)), 360);
        assert_eq!(t.evaluate(&BetSelection::Straight(17), 10, &pocket(18)), 0);
        assert_eq!(t.evaluate(&BetSelection::Straight(0), 10, &pocket(0)), 360);
    }

    #[test]
    fn test_even_money_bets() {
        let t = RouletteTable;
        assert_eq!(t.evaluate(&BetSelection::Red, 10, &pocket(32)), 20);
        assert_eq!(t.evaluate(&BetSelection::Black, 10, &pocket(32)), 0);
        assert_eq!(t.evaluate(&BetSelection::Black, 10, &pocket(26)), 20);
        assert_eq!(t.evaluate(&BetSelection::Odd, 10, &pocket(7)), 20);
        assert_eq!(t.evaluate(&BetSelection::Even, 10, &pocket(8)), 20);
        assert_eq!(t.evaluate(&BetSelection::Low, 10, &pocket(18)), 20);
        assert_eq!(t.evaluate(&BetSelection::High, 10, &pocket(19)), 20);
    }

    #[test]
    fn test_zero_loses_outside_bets() {
        let t = RouletteTable;
        for sel in [
            BetSelection::Red,
            BetSelection::Black,
            BetSelection::Odd,
            BetSelection::Even,
            BetSelection::Low,
            BetSelection::High,
            BetSelection::Dozen(1),
            BetSelection::Column(1),
        ] {
            assert_eq!(t.evaluate(&sel, 10, &pocket(0)), 0, "{sel:?} must lose on 0");
        }
    }

    #[test]
    fn test_dozens_and_columns() {
        let t = RouletteTable;
        assert_eq!(t.evaluate(&BetSelection::Dozen(1), 10, &pocket(12)), 30);
        assert_eq!(t.evaluate(&BetSelection::Dozen(2), 10, &pocket(13)), 30);
        assert_eq!(t.evaluate(&BetSelection::Dozen(3), 10, &pocket(36)), 30);
        // Column 1 holds 1, 4, 7, ...; column 3 holds 3, 6, 9, ...
        assert_eq!(t.evaluate(&BetSelection::Column(1), 10, &pocket(4)), 30);
        assert_eq!(t.evaluate(&BetSelection::Column(3), 10, &pocket(9)), 30);
        assert_eq!(t.evaluate(&BetSelection::Column(2), 10, &pocket(9)), 0);
    }

    #[test]
    fn test_allows_bounds() {
        let t = RouletteTable;
        assert!(t.allows(&BetSelection::Straight(36)));
        assert!(!t.allows(&BetSelection::Straight(37)));
        assert!(!t.allows(&BetSelection::Dozen(0)));
        assert!(!t.allows(&BetSelection::Dozen(4)));
        assert!(!t.allows(&BetSelection::Player));
    }
}
