// Objective scorer: one scalar utility per player per mode.
//
// Cash favors the floor and punishes dispersion; GPP blends ceiling,
// projection and a log-scaled leverage term whose weight depends on the
// strategy. A seeded multiplicative jitter diversifies multi-lineup batches.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::filter::Candidate;
use crate::player::PlayerRecord;
use crate::settings::{GppStrategy, Mode, OptimizationSettings, MAX_RANDOMNESS};

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

const CASH_FLOOR_WEIGHT: f64 = 0.6;
const CASH_PROJECTION_WEIGHT: f64 = 0.3;
const CASH_CEILING_WEIGHT: f64 = 0.1;
/// Fraction of the blended score removed per unit of volatility.
const CASH_VOLATILITY_PENALTY: f64 = 0.25;
/// Volatility beyond this adds no further penalty.
const CASH_VOLATILITY_CAP: f64 = 1.5;
/// Points removed per percentage point of bust probability.
const CASH_BUST_PENALTY: f64 = 0.05;
/// Multiplier for players in likely blowouts when blowouts are avoided.
const BLOWOUT_MULTIPLIER: f64 = 0.90;

/// Per-strategy weights: (ceiling, projection, leverage term, ownership penalty).
fn gpp_weights(strategy: GppStrategy) -> (f64, f64, f64, f64) {
    match strategy {
        GppStrategy::MaxLeverage => (0.5, 0.2, 1.5, 0.0),
        GppStrategy::Balanced => (0.5, 0.5, 0.75, 0.0),
        GppStrategy::Contrarian => (0.5, 0.3, 1.0, 0.2),
    }
}

/// Leverage compressed to the scale of fantasy points: `10 * ln(1 + L / 100)`.
pub fn leverage_term(player: &PlayerRecord) -> f64 {
    10.0 * (1.0 + player.leverage_score().max(0.0) / 100.0).ln()
}

/// Whether the player's game spread exceeds the blowout threshold.
pub fn is_blowout_risk(player: &PlayerRecord, threshold: f64) -> bool {
    player.game_spread.is_some_and(|s| s.abs() > threshold)
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Deterministic utility of one player under the settings' mode.
pub fn base_utility(player: &PlayerRecord, settings: &OptimizationSettings) -> f64 {
    match settings.mode {
        Mode::Cash => {
            let blended = CASH_FLOOR_WEIGHT * player.floor
                + CASH_PROJECTION_WEIGHT * player.projected_points
                + CASH_CEILING_WEIGHT * player.ceiling;
            let volatility = player.volatility.clamp(0.0, CASH_VOLATILITY_CAP);
            let mut utility = blended * (1.0 - CASH_VOLATILITY_PENALTY * volatility)
                - CASH_BUST_PENALTY * player.bust_probability;
            if settings.cash.avoid_blowouts
                && is_blowout_risk(player, settings.cash.blowout_spread)
            {
                utility *= BLOWOUT_MULTIPLIER;
            }
            utility
        }
        Mode::Gpp => {
            let (w_ceiling, w_projection, w_leverage, w_ownership) =
                gpp_weights(settings.gpp.strategy);
            w_ceiling * player.ceiling + w_projection * player.projected_points
                + w_leverage * leverage_term(player)
                - w_ownership * player.ownership
        }
    }
}

/// Base utilities for every candidate, in candidate order.
pub fn base_utilities(candidates: &[Candidate<'_>], settings: &OptimizationSettings) -> Vec<f64> {
    candidates
        .iter()
        .map(|c| base_utility(c.player, settings))
        .collect()
}

/// Jittered utilities for one construction attempt.
///
/// Each utility is scaled by `1 + u` with `u` drawn uniformly from
/// `[-r, r]`, `r = randomness / 100`, one draw per candidate in order.
pub fn jittered_utilities(base: &[f64], randomness: f64, seed: u64) -> Vec<f64> {
    let r = randomness.clamp(0.0, MAX_RANDOMNESS) / 100.0;
    if r <= 0.0 {
        return base.to_vec();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    base.iter()
        .map(|u| u * (1.0 + rng.gen_range(-r..=r)))
        .collect()
}

/// Jitter percentage in force for an attempt.
///
/// GPP uses its configured randomness. Retries of a lineup (attempt > 0) in
/// either mode use at least 5% per attempt so a rejected lineup is not rebuilt
/// identically, capped at the GPP maximum.
pub fn attempt_randomness(settings: &OptimizationSettings, attempt: usize) -> f64 {
    let configured = match settings.mode {
        Mode::Cash => 0.0,
        Mode::Gpp => settings.gpp.randomness,
    };
    let retry_floor = 5.0 * attempt as f64;
    configured.max(retry_floor).min(MAX_RANDOMNESS)
}

/// Seed for one (lineup key, attempt) pair, independent of scheduling.
pub fn attempt_seed(seed: u64, key: usize, attempt: usize) -> u64 {
    let mixed = splitmix64(seed ^ splitmix64(key as u64));
    splitmix64(mixed ^ (attempt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
