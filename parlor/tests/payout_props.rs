//! Property tests for the payout tables: rounding discipline and the
//! mutual-exclusion structure of each game's bet space.

use parlor::games::{
    BetSelection, GameKind, Outcome, PayoutRule, PayoutRules, SettlementTable,
    baccarat::BaccaratOutcome,
};
use proptest::prelude::*;

fn baccarat_table(super_six: bool) -> SettlementTable {
    SettlementTable::for_room(
        GameKind::Baccarat,
        &PayoutRules {
            super_six,
            ..Default::default()
        },
    )
}

proptest! {
    /// Floor division: a banker-win credit never exceeds the exact rational
    /// commission value, and is within one unit below it.
    #[test]
    fn banker_commission_floors(amount in 1i64..1_000_000_000) {
        // Banker 9 beats player 4.
        let outcome = Outcome::Baccarat(BaccaratOutcome {
            player_cards: vec![1, 1 + 13],
            banker_cards: vec![3, 4],
        });
        let credit = baccarat_table(false).evaluate(&BetSelection::Banker, amount, &outcome);
        let winnings = credit - amount;

        // winnings = floor(amount * 9500 / 10000)
        prop_assert!(winnings as i128 * 10_000 <= amount as i128 * 9_500);
        prop_assert!((winnings as i128 + 1) * 10_000 > amount as i128 * 9_500);
    }

    /// A tie pushes both main bets at exactly the stake, never more or less.
    #[test]
    fn tie_pushes_exactly_the_stake(amount in 1i64..1_000_000_000, super_six in any::<bool>()) {
        let outcome = Outcome::Baccarat(BaccaratOutcome {
            player_cards: vec![1, 3],  // 2 + 4 = 6
            banker_cards: vec![0, 4],  // 1 + 5 = 6
        });
        let table = baccarat_table(super_six);
        prop_assert_eq!(table.evaluate(&BetSelection::Player, amount, &outcome), amount);
        prop_assert_eq!(table.evaluate(&BetSelection::Banker, amount, &outcome), amount);
    }

    /// Player and Banker can never both profit on the same outcome.
    #[test]
    fn main_bets_never_both_win(
        p1 in 0u8..52, p2 in 0u8..52, b1 in 0u8..52, b2 in 0u8..52,
    ) {
        let outcome = Outcome::Baccarat(BaccaratOutcome {
            player_cards: vec![p1, p2],
            banker_cards: vec![b1, b2],
        });
        let table = baccarat_table(false);
        let player = table.evaluate(&BetSelection::Player, 100, &outcome);
        let banker = table.evaluate(&BetSelection::Banker, 100, &outcome);
        prop_assert!(!(player > 100 && banker > 100));
    }

    /// Exactly one of red/black/zero applies to every pocket.
    #[test]
    fn roulette_color_partition(pocket in 0u8..=36) {
        let table = SettlementTable::for_room(GameKind::Roulette, &PayoutRules::default());
        let outcome = Outcome::Roulette { pocket };
        let red = table.evaluate(&BetSelection::Red, 10, &outcome) > 0;
        let black = table.evaluate(&BetSelection::Black, 10, &outcome) > 0;
        if pocket == 0 {
            prop_assert!(!red && !black);
        } else {
            prop_assert!(red != black);
        }
    }

    /// Straight-up covers the wheel: exactly one straight bet wins per spin,
    /// and it pays 35:1 plus the stake.
    #[test]
    fn roulette_straight_up(pocket in 0u8..=36, amount in 1i64..1_000_000) {
        let table = SettlementTable::for_room(GameKind::Roulette, &PayoutRules::default());
        let outcome = Outcome::Roulette { pocket };
        let mut winners = 0;
        for n in 0..=36 {
            let credit = table.evaluate(&BetSelection::Straight(n), amount, &outcome);
            if credit > 0 {
                prop_assert_eq!(credit, amount * 36);
                winners += 1;
            }
        }
        prop_assert_eq!(winners, 1);
    }

    /// Big/Small and Odd/Even are mutually exclusive, and a triple kills all
    /// four line bets.
    #[test]
    fn sic_bo_line_bet_structure(d1 in 1u8..=6, d2 in 1u8..=6, d3 in 1u8..=6) {
        let table = SettlementTable::for_room(GameKind::SicBo, &PayoutRules::default());
        let outcome = Outcome::SicBo { dice: [d1, d2, d3] };
        let big = table.evaluate(&BetSelection::Big, 10, &outcome) > 0;
        let small = table.evaluate(&BetSelection::Small, 10, &outcome) > 0;
        let odd = table.evaluate(&BetSelection::Odd, 10, &outcome) > 0;
        let even = table.evaluate(&BetSelection::Even, 10, &outcome) > 0;

        prop_assert!(!(big && small));
        prop_assert!(!(odd && even));
        if d1 == d2 && d2 == d3 {
            prop_assert!(!big && !small && !odd && !even);
        } else {
            prop_assert!(big || small);
            prop_assert!(odd || even);
        }
    }

    /// Lotto credits floor against the configured basis points.
    #[test]
    fn lotto_hit_floors(amount in 1i64..1_000_000_000, hit_bps in 1i64..100_000) {
        let rules = PayoutRules { lotto_hit_bps: hit_bps, ..Default::default() };
        let table = SettlementTable::for_room(GameKind::Lotto, &rules);
        let outcome = Outcome::Lotto { numbers: vec![7] };
        let credit = table.evaluate(&BetSelection::Pick(7), amount, &outcome);

        prop_assert!(credit as i128 * 10_000 <= amount as i128 * hit_bps as i128);
        prop_assert!((credit as i128 + 1) * 10_000 > amount as i128 * hit_bps as i128);
    }
}
