//! Betting odds and payouts

use crate::VoteKey;

/// Margin added to every outcome's share of the pool
pub const HOUSE_MARGIN: f64 = 0.05;
/// Floor for decimal odds, even a certain outcome pays something
pub const MIN_ODDS: f64 = 1.01;
/// Smallest accepted stake, in coins
pub const MIN_BET: u64 = 1;

const TEAM_FIXED_ODDS: f64 = 2.0;
const DRAW_FIXED_ODDS: f64 = 3.0;

/// Decimal odds per outcome from the amounts staked on each.
///
/// Each outcome pays `1 / (share + HOUSE_MARGIN)`, floored at [`MIN_ODDS`] and
/// rounded to cents. Returns `None` while nothing has been staked.
pub fn compute_dynamic_odds(pools: &[u64]) -> Option<Vec<f64>> {
    let total: u64 = pools.iter().fold(0u64, |acc, p| acc.saturating_add(*p));
    if total == 0 {
        return None;
    }

    Some(
        pools
            .iter()
            .map(|pool| {
                let share = *pool as f64 / total as f64;
                round_cents(MIN_ODDS.max(1.0 / (share + HOUSE_MARGIN)))
            })
            .collect(),
    )
}

/// Odds used before any money is in the pool
pub fn fixed_odds(prediction: &VoteKey) -> f64 {
    match prediction {
        VoteKey::Draw => DRAW_FIXED_ODDS,
        _ => TEAM_FIXED_ODDS,
    }
}

/// Coins paid back on a winning bet, rounded down
pub fn potential_winnings(amount: u64, odds: f64) -> u64 {
    if !odds.is_finite() || odds <= 0.0 {
        return 0;
    }
    (amount as f64 * odds).floor() as u64
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
