//! Sic bo: three dice and the classic bet table.
//!
//! Payouts (total credit on stake): Big/Small/Odd/Even 1:1: all four lose
//! when the dice come up as any triple; specific triple 150:1; any triple
//! 24:1; specific double 8:1; total-of-N per the odds table; single-die
//! 1:1 / 2:1 / 3:1 by how many dice show the number.

use super::{BetSelection, Outcome, PayoutRule, rng::OutcomeRng};

/// Winnings multiple for a total-of-N bet
fn total_odds(total: u8) -> i64 {
    match total {
        4 | 17 => 50,
        5 | 16 => 18,
        6 | 15 => 14,
        7 | 14 => 12,
        8 | 13 => 8,
        9 | 12 => 6,
        10 | 11 => 6,
        _ => 0,
    }
}

/// Whether all three dice match
fn is_triple(dice: &[u8; 3]) -> bool {
    dice[0] == dice[1] && dice[1] == dice[2]
}

/// How many dice show `number`
fn count_number(dice: &[u8; 3], number: u8) -> i64 {
    dice.iter().filter(|&&d| d == number).count() as i64
}

/// Roll three dice
pub fn draw(rng: &mut OutcomeRng) -> [u8; 3] {
    [rng.die(), rng.die(), rng.die()]
}

/// Sic bo payout table
#[derive(Debug, Clone, Copy)]
pub struct SicBoTable;

impl PayoutRule for SicBoTable {
    fn allows(&self, selection: &BetSelection) -> bool {
        match selection {
            BetSelection::Big
            | BetSelection::Small
            | BetSelection::Odd
            | BetSelection::Even
            | BetSelection::AnyTriple => true,
            BetSelection::Triple(n)
            | BetSelection::Double(n)
            | BetSelection::SingleDie(n) => (1..=6).contains(n),
            BetSelection::Total(n) => (4..=17).contains(n),
            _ => false,
        }
    }

    fn evaluate(&self, selection: &BetSelection, amount: i64, outcome: &Outcome) -> i64 {
        let Outcome::SicBo { dice } = outcome else {
            return 0;
        };
        let total: u8 = dice.iter().sum();
        let triple = is_triple(dice);

        match selection {
            BetSelection::Small => {
                if !triple && (4..=10).contains(&total) {
                    amount.saturating_mul(2)
                } else {
                    0
                }
            }
            BetSelection::Big => {
                if !triple && (11..=17).contains(&total) {
                    amount.saturating_mul(2)
                } else {
                    0
                }
            }
            BetSelection::Odd => {
                if !triple && total % 2 == 1 {
                    amount.saturating_mul(2)
                } else {
                    0
                }
            }
            BetSelection::Even => {
                if !triple && total % 2 == 0 {
                    amount.saturating_mul(2)
                } else {
                    0
                }
            }
            BetSelection::Triple(n) => {
                if triple && dice[0] == *n {
                    amount.saturating_mul(151)
                } else {
                    0
                }
            }
            BetSelection::AnyTriple => {
                if triple {
                    amount.saturating_mul(25)
                } else {
                    0
                }
            }
            BetSelection::Double(n) => {
                if count_number(dice, *n) >= 2 {
                    amount.saturating_mul(9)
                } else {
                    0
                }
            }
            BetSelection::Total(n) => {
                if total == *n {
                    amount.saturating_mul(total_odds(*n) + 1)
                } else {
                    0
                }
            }
            BetSelection::SingleDie(n) => match count_number(dice, *n) {
                1 => amount.saturating_mul(2),
                2 => amount.saturating_mul(3),
                3 => amount.saturating_mul(4),
                _ => 0,
            },
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dice(d: [u8; 3]) -> Outcome {
        Outcome::SicBo { dice: d }
    }

    #[test]
    fn test_draw_in_range() {
        let mut rng = OutcomeRng::seeded(5);
        for _ in 0..500 {
            let d = draw(&mut rng);
            assert!(d.iter().all(|&x| (1..=6).contains(&x)));
        }
    }

    #[test]
    fn test_big_small() {
        let t = SicBoTable;
        assert_eq!(t.evaluate(&BetSelection::Small, 10, &dice([1, 2, 3])), 20);
        assert_eq!(t.evaluate(&BetSelection::Small, 10, &dice([5, 6, 6])), 0);
        assert_eq!(t.evaluate(&BetSelection::Big, 10, &dice([5, 6, 6])), 20);
        assert_eq!(t.evaluate(&BetSelection::Big, 10, &dice([1, 2, 3])), 0);
    }

    #[test]
    fn test_triple_kills_line_bets() {
        let t = SicBoTable;
        // 2+2+2 = 6 would be Small and Even, but the triple kills both.
        let o = dice([2, 2, 2]);
        assert_eq!(t.evaluate(&BetSelection::Small, 10, &o), 0);
        assert_eq!(t.evaluate(&BetSelection::Even, 10, &o), 0);
        // 5+5+5 = 15 would be Big and Odd.
        let o = dice([5, 5, 5]);
        assert_eq!(t.evaluate(&BetSelection::Big, 10, &o), 0);
        assert_eq!(t.evaluate(&BetSelection::Odd, 10, &o), 0);
    }

    #[test]
    fn test_triples() {
        let t = SicBoTable;
        let o = dice([4, 4, 4]);
        assert_eq!(t.evaluate(&BetSelection::Triple(4), 10, &o), 1510);
        assert_eq!(t.evaluate(&BetSelection::Triple(5), 10, &o), 0);
        assert_eq!(t.evaluate(&BetSelection::AnyTriple, 10, &o), 250);
        assert_eq!(t.evaluate(&BetSelection::AnyTriple, 10, &dice([4, 4, 5])), 0);
    }

    #[test]
    fn test_double_and_single() {
        let t = SicBoTable;
        assert_eq!(t.evaluate(&BetSelection::Double(4), 10, &dice([4, 4, 1])), 90);
        assert_eq!(t.evaluate(&BetSelection::Double(4), 10, &dice([4, 4, 4])), 90);
        assert_eq!(t.evaluate(&BetSelection::Double(4), 10, &dice([4, 2, 1])), 0);
        assert_eq!(t.evaluate(&BetSelection::SingleDie(4), 10, &dice([4, 2, 1])), 20);
        assert_eq!(t.evaluate(&BetSelection::SingleDie(4), 10, &dice([4, 4, 1])), 30);
        assert_eq!(t.evaluate(&BetSelection::SingleDie(4), 10, &dice([4, 4, 4])), 40);
        assert_eq!(t.evaluate(&BetSelection::SingleDie(4), 10, &dice([1, 2, 3])), 0);
    }

    #[test]
    fn test_total_bets() {
        let t = SicBoTable;
        assert_eq!(t.evaluate(&BetSelection::Total(4), 10, &dice([1, 1, 2])), 510);
        assert_eq!(t.evaluate(&BetSelection::Total(10), 10, &dice([2, 3, 5])), 70);
        assert_eq!(t.evaluate(&BetSelection::Total(10), 10, &dice([2, 3, 6])), 0);
    }

    #[test]
    fn test_allows_bounds() {
        let t = SicBoTable;
        assert!(t.allows(&BetSelection::Total(4)));
        assert!(!t.allows(&BetSelection::Total(3)));
        assert!(!t.allows(&BetSelection::Total(18)));
        assert!(!t.allows(&BetSelection::Triple(0)));
        assert!(!t.allows(&BetSelection::Triple(7)));
        assert!(!t.allows(&BetSelection::Banker));
    }
}
