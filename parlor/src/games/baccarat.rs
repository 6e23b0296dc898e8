//! Baccarat: the full deal (including the third-card rule) and payout table.
//!
//! The third-card rule is the most error-prone piece of game logic in the
//! whole system, so it is written as explicit lookup tables rather than
//! nested conditionals: one row per banker two-card total, one column per
//! player third-card value. Both hands' totals are mod-10.
//!
//! Payouts (total credit on stake):
//! - Player 1:1, push on tie
//! - Banker 1:1 minus commission (floor), push on tie; or the super-six
//!   variant: even money, half winnings on a winning banker six
//! - Tie 8:1
//! - PlayerPair / BankerPair 11:1, judged on the first two cards only and
//!   independent of the main result

use serde::{Deserialize, Serialize};

use super::{BetSelection, Outcome, PayoutRule, rng::OutcomeRng};

/// Player third-card rule, indexed by the player's two-card total:
/// draw on 0-5, stand on 6-7. Totals 8-9 are naturals and never reach this.
const PLAYER_DRAWS_ON: [bool; 10] = [
    true, true, true, true, true, true, false, false, false, false,
];

/// Banker rule when the player stood (no third card): draw on 0-5.
const BANKER_DRAWS_NO_THIRD: [bool; 10] = [
    true, true, true, true, true, true, false, false, false, false,
];

/// Banker rule when the player drew, indexed `[banker_total][third_card_value]`.
/// Rows cover banker totals 0-6; the banker stands outright on 7+.
const BANKER_DRAWS: [[bool; 10]; 7] = [
    // player third card value:
    //  0      1      2      3      4      5      6      7      8      9
    [true, true, true, true, true, true, true, true, true, true], // banker 0
    [true, true, true, true, true, true, true, true, true, true], // banker 1
    [true, true, true, true, true, true, true, true, true, true], // banker 2
    [true, true, true, true, true, true, true, true, false, true], // banker 3
    [false, false, true, true, true, true, true, true, false, false], // banker 4
    [false, false, false, false, true, true, true, true, false, false], // banker 5
    [false, false, false, false, false, false, true, true, false, false], // banker 6
];

/// Baccarat value of a card (0..52): ace is 1, 2-9 face value, tens and
/// court cards are 0.
pub fn card_value(card: u8) -> u8 {
    let rank = (card % 13) + 1;
    match rank {
        1 => 1,
        2..=9 => rank,
        _ => 0,
    }
}

/// Hand total, mod 10
pub fn hand_total(cards: &[u8]) -> u8 {
    cards.iter().map(|&c| card_value(c)).sum::<u8>() % 10
}

/// Whether the first two cards share a rank
fn is_pair(cards: &[u8]) -> bool {
    cards.len() >= 2 && cards[0] % 13 == cards[1] % 13
}

/// Player third-card decision
pub fn player_draws(player_total: u8) -> bool {
    PLAYER_DRAWS_ON[player_total as usize]
}

/// Banker third-card decision, given the banker's two-card total and the
/// value of the player's third card (if the player drew one)
pub fn banker_draws(banker_total: u8, player_third_value: Option<u8>) -> bool {
    if banker_total >= 7 {
        return false;
    }
    match player_third_value {
        None => BANKER_DRAWS_NO_THIRD[banker_total as usize],
        Some(v) => BANKER_DRAWS[banker_total as usize][v as usize],
    }
}

/// The dealt hands of one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaccaratOutcome {
    pub player_cards: Vec<u8>,
    pub banker_cards: Vec<u8>,
}

impl BaccaratOutcome {
    pub fn player_total(&self) -> u8 {
        hand_total(&self.player_cards)
    }

    pub fn banker_total(&self) -> u8 {
        hand_total(&self.banker_cards)
    }

    pub fn player_pair(&self) -> bool {
        is_pair(&self.player_cards)
    }

    pub fn banker_pair(&self) -> bool {
        is_pair(&self.banker_cards)
    }
}

/// Deal one round: two cards each in player-banker alternation, natural
/// check, then the third-card tables.
pub fn draw(rng: &mut OutcomeRng) -> BaccaratOutcome {
    let mut deck = rng.shuffled_deck();
    let mut next = || deck.pop().unwrap_or(0);

    let p1 = next();
    let b1 = next();
    let p2 = next();
    let b2 = next();

    let mut player_cards = vec![p1, p2];
    let mut banker_cards = vec![b1, b2];

    let player_total = hand_total(&player_cards);
    let banker_total = hand_total(&banker_cards);

    // A natural 8 or 9 on either side ends the deal immediately.
    let natural = player_total >= 8 || banker_total >= 8;

    if !natural {
        let mut player_third_value = None;

        if player_draws(player_total) {
            let card = next();
            player_third_value = Some(card_value(card));
            player_cards.push(card);
        }

        if banker_draws(banker_total, player_third_value) {
            banker_cards.push(next());
        }
    }

    BaccaratOutcome {
        player_cards,
        banker_cards,
    }
}

/// Baccarat payout table
#[derive(Debug, Clone)]
pub struct BaccaratTable {
    /// Banker-win commission in basis points (classic tables use 500)
    pub commission_bps: i64,
    /// Reduced-commission variant: banker win pays even money except a
    /// winning banker total of exactly six, which pays half
    pub super_six: bool,
}

impl PayoutRule for BaccaratTable {
    fn allows(&self, selection: &BetSelection) -> bool {
        matches!(
            selection,
            BetSelection::Player
                | BetSelection::Banker
                | BetSelection::Tie
                | BetSelection::PlayerPair
                | BetSelection::BankerPair
        )
    }

    fn evaluate(&self, selection: &BetSelection, amount: i64, outcome: &Outcome) -> i64 {
        let Outcome::Baccarat(hands) = outcome else {
            return 0;
        };
        let player = hands.player_total();
        let banker = hands.banker_total();

        match selection {
            BetSelection::Player => {
                if player > banker {
                    amount.saturating_mul(2)
                } else if player == banker {
                    amount // push
                } else {
                    0
                }
            }
            BetSelection::Banker => {
                if banker > player {
                    if self.super_six {
                        if banker == 6 {
                            amount.saturating_add(amount / 2)
                        } else {
                            amount.saturating_mul(2)
                        }
                    } else {
                        let winnings =
                            amount.saturating_mul(10_000 - self.commission_bps) / 10_000;
                        amount.saturating_add(winnings)
                    }
                } else if player == banker {
                    amount // push
                } else {
                    0
                }
            }
            BetSelection::Tie => {
                if player == banker {
                    amount.saturating_mul(9)
                } else {
                    0
                }
            }
            BetSelection::PlayerPair => {
                if hands.player_pair() {
                    amount.saturating_mul(12)
                } else {
                    0
                }
            }
            BetSelection::BankerPair => {
                if hands.banker_pair() {
                    amount.saturating_mul(12)
                } else {
                    0
                }
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(player_cards: Vec<u8>, banker_cards: Vec<u8>) -> Outcome {
        Outcome::Baccarat(BaccaratOutcome {
            player_cards,
            banker_cards,
        })
    }

    fn standard() -> BaccaratTable {
        BaccaratTable {
            commission_bps: 500,
            super_six: false,
        }
    }

    #[test]
    fn test_card_value() {
        assert_eq!(card_value(0), 1); // ace
        assert_eq!(card_value(13), 1); // ace, next suit
        assert_eq!(card_value(1), 2);
        assert_eq!(card_value(8), 9);
        assert_eq!(card_value(9), 0); // ten
        assert_eq!(card_value(12), 0); // king
    }

    #[test]
    fn test_hand_total_mod_ten() {
        assert_eq!(hand_total(&[6, 7]), 5); // 7 + 8 = 15 -> 5
        assert_eq!(hand_total(&[0, 2]), 4); // ace + 3
        assert_eq!(hand_total(&[12, 11]), 0); // king + queen
    }

    #[test]
    fn test_player_draw_rule() {
        for total in 0..=5 {
            assert!(player_draws(total), "player must draw on {total}");
        }
        assert!(!player_draws(6));
        assert!(!player_draws(7));
    }

    #[test]
    fn test_banker_rule_when_player_stands() {
        for total in 0..=5 {
            assert!(banker_draws(total, None), "banker must draw on {total}");
        }
        assert!(!banker_draws(6, None));
        assert!(!banker_draws(7, None));
    }

    #[test]
    fn test_banker_rule_full_table() {
        // Banker 0-2 draws against everything.
        for total in 0..=2 {
            for third in 0..=9 {
                assert!(banker_draws(total, Some(third)));
            }
        }
        // Banker 3 stands only against an 8.
        for third in 0..=9 {
            assert_eq!(banker_draws(3, Some(third)), third != 8);
        }
        // Banker 4 draws against 2-7.
        for third in 0..=9 {
            assert_eq!(banker_draws(4, Some(third)), (2..=7).contains(&third));
        }
        // Banker 5 draws against 4-7.
        for third in 0..=9 {
            assert_eq!(banker_draws(5, Some(third)), (4..=7).contains(&third));
        }
        // Banker 6 draws against 6-7 only.
        for third in 0..=9 {
            assert_eq!(banker_draws(6, Some(third)), third == 6 || third == 7);
        }
        // Banker 7+ always stands.
        for total in 7..=9 {
            for third in 0..=9 {
                assert!(!banker_draws(total, Some(third)));
            }
        }
    }

    #[test]
    fn test_draw_hand_sizes() {
        for seed in 0..200 {
            let hands = draw(&mut OutcomeRng::seeded(seed));
            assert!((2..=3).contains(&hands.player_cards.len()));
            assert!((2..=3).contains(&hands.banker_cards.len()));
        }
    }

    #[test]
    fn test_natural_stops_the_deal() {
        // Force: player 4+5=9 natural, banker 2+2=4; nobody draws a third.
        for seed in 0..500 {
            let hands = draw(&mut OutcomeRng::seeded(seed));
            let p2 = hand_total(&hands.player_cards[..2]);
            let b2 = hand_total(&hands.banker_cards[..2]);
            if p2 >= 8 || b2 >= 8 {
                assert_eq!(hands.player_cards.len(), 2);
                assert_eq!(hands.banker_cards.len(), 2);
            }
        }
    }

    #[test]
    fn test_player_win_pays_even_money() {
        // Player 4+5=9 vs banker 2+2=4 (cards: 3 and 4 -> values 4, 5; 1 -> 2)
        let o = outcome(vec![3, 4], vec![1, 1 + 13]);
        assert_eq!(standard().evaluate(&BetSelection::Player, 100, &o), 200);
        assert_eq!(standard().evaluate(&BetSelection::Banker, 100, &o), 0);
    }

    #[test]
    fn test_tie_pushes_main_bets() {
        // Both sides total 6: player 2+4, banker ace+5.
        let o = outcome(vec![1, 3], vec![0, 4]);
        assert_eq!(standard().evaluate(&BetSelection::Player, 100, &o), 100);
        assert_eq!(standard().evaluate(&BetSelection::Banker, 100, &o), 100);
        assert_eq!(standard().evaluate(&BetSelection::Tie, 100, &o), 900);
    }

    #[test]
    fn test_banker_commission_floor() {
        // Banker 9 vs player 4; 5% commission on 100 -> winnings 95.
        let o = outcome(vec![1, 1 + 13], vec![3, 4]);
        assert_eq!(standard().evaluate(&BetSelection::Banker, 100, &o), 195);
        // Floor, not round: 3 * 9500 / 10000 = 2 (2.85 truncated).
        assert_eq!(standard().evaluate(&BetSelection::Banker, 3, &o), 5);
    }

    #[test]
    fn test_super_six_halves_banker_six() {
        let table = BaccaratTable {
            commission_bps: 500,
            super_six: true,
        };
        // Banker 6 (2+4) beats player 5 (2+3).
        let six = outcome(vec![1, 2], vec![1 + 13, 3]);
        assert_eq!(table.evaluate(&BetSelection::Banker, 100, &six), 150);
        // Banker 9 beats player 4: full even money, no commission.
        let nine = outcome(vec![1, 1 + 13], vec![3, 4]);
        assert_eq!(table.evaluate(&BetSelection::Banker, 100, &nine), 200);
    }

    #[test]
    fn test_pair_bets_are_independent_of_result() {
        // Player holds a pair of threes (card 2 in two suits) but loses 6 to 9.
        let o = outcome(vec![2, 2 + 13], vec![3, 4]);
        assert_eq!(standard().evaluate(&BetSelection::PlayerPair, 50, &o), 600);
        assert_eq!(standard().evaluate(&BetSelection::Player, 50, &o), 0);
        assert_eq!(standard().evaluate(&BetSelection::BankerPair, 50, &o), 0);
    }

    #[test]
    fn test_pair_judged_on_first_two_cards_only() {
        // Third card matching the first does not make a pair.
        let o = outcome(vec![2, 5, 2 + 13], vec![3, 4]);
        assert_eq!(standard().evaluate(&BetSelection::PlayerPair, 50, &o), 0);
    }
}
