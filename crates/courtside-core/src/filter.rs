// Pool filter: hard screens that turn the slate into the candidate set.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::error::EngineError;
use crate::lineup::match_slots;
use crate::player::PlayerRecord;
use crate::settings::{ExposureTier, Mode, OptimizationSettings};
use crate::slot::{SlotKind, SlotSet, LINEUP_SIZE};

/// A player that survived filtering, with the derived views the search needs.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub player: &'a PlayerRecord,
    pub slots: SlotSet,
    pub game: String,
    pub locked: bool,
    /// Counts toward the per-lineup chalk cap (GPP only).
    pub chalk: bool,
    pub tier: ExposureTier,
}

/// Why a player was removed from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    Injured,
    Excluded,
    BelowMinFloor,
    AboveMaxVolatility,
    AboveMaxBust,
    BelowMinMinutes,
    BelowMinLeverage,
    BelowMinBoom,
    BelowMinCeiling,
    BelowMinRestDays,
    BelowMinUsage,
    BelowMinProjection,
    NoEligibleSlot,
}

/// Decide whether one player stays in the pool.
///
/// Exclusion is checked before anything else and applies even to locked
/// players; every other screen is skipped for a locked player.
pub fn screen(
    player: &PlayerRecord,
    settings: &OptimizationSettings,
    locked: bool,
) -> Option<DropReason> {
    if settings.excluded.iter().any(|id| *id == player.id) {
        return Some(DropReason::Excluded);
    }
    if player.eligible_slots().is_empty() {
        return Some(DropReason::NoEligibleSlot);
    }
    if locked {
        return None;
    }
    if player.injury_status.is_designated() {
        return Some(DropReason::Injured);
    }

    match settings.mode {
        Mode::Cash => {
            let cash = &settings.cash;
            if below(player.floor, cash.min_floor) {
                return Some(DropReason::BelowMinFloor);
            }
            if above(player.volatility, cash.max_volatility) {
                return Some(DropReason::AboveMaxVolatility);
            }
            if above(player.bust_probability, cash.max_bust_probability) {
                return Some(DropReason::AboveMaxBust);
            }
            if below(player.projected_minutes, cash.min_projected_minutes) {
                return Some(DropReason::BelowMinMinutes);
            }
        }
        Mode::Gpp => {
            let gpp = &settings.gpp;
            if below(player.leverage_score(), gpp.min_leverage) {
                return Some(DropReason::BelowMinLeverage);
            }
            if below(player.boom_probability, gpp.min_boom_probability) {
                return Some(DropReason::BelowMinBoom);
            }
            if below(player.ceiling, gpp.min_ceiling) {
                return Some(DropReason::BelowMinCeiling);
            }
        }
    }

    let adv = &settings.advanced;
    if let Some(min_rest) = adv.min_rest_days {
        if player.rest_days < min_rest {
            return Some(DropReason::BelowMinRestDays);
        }
    }
    if below(player.usage_rate, adv.min_usage) {
        return Some(DropReason::BelowMinUsage);
    }
    if below(player.projected_points, adv.min_projection) {
        return Some(DropReason::BelowMinProjection);
    }
    None
}

fn below(value: f64, min: Option<f64>) -> bool {
    min.is_some_and(|m| value < m)
}

fn above(value: f64, max: Option<f64>) -> bool {
    max.is_some_and(|m| value > m)
}

/// Apply every screen and check the survivors can still fill a lineup.
///
/// Candidates keep the input order of `players`.
pub fn filter_pool<'a>(
    players: &'a [PlayerRecord],
    settings: &OptimizationSettings,
) -> Result<Vec<Candidate<'a>>, EngineError> {
    let locked: HashSet<&str> = settings.locked.iter().map(String::as_str).collect();
    let mut dropped: BTreeMap<DropReason, usize> = BTreeMap::new();
    let mut candidates = Vec::new();

    for player in players {
        let is_locked = locked.contains(player.id.as_str());
        if let Some(reason) = screen(player, settings, is_locked) {
            *dropped.entry(reason).or_default() += 1;
            continue;
        }
        let chalk =
            settings.mode == Mode::Gpp && player.ownership >= settings.gpp.chalk_threshold;
        candidates.push(Candidate {
            player,
            slots: player.eligible_slots(),
            game: player.game_key(),
            locked: is_locked,
            chalk,
            tier: settings.exposure.tier_for(player.ownership),
        });
    }

    debug!(
        "pool filter kept {} of {} players, dropped {:?}",
        candidates.len(),
        players.len(),
        dropped
    );

    check_coverage(&candidates)?;
    Ok(candidates)
}

/// Fail with `EmptyPool` when the candidates cannot fill all eight slots.
fn check_coverage(candidates: &[Candidate<'_>]) -> Result<(), EngineError> {
    for slot in SlotKind::ALL {
        if !candidates.iter().any(|c| c.slots.contains(slot)) {
            return Err(EngineError::empty_pool(format!(
                "no eligible {} after filters",
                slot.label()
            )));
        }
    }
    if candidates.len() < LINEUP_SIZE {
        return Err(EngineError::empty_pool(format!(
            "only {} eligible players after filters, a lineup needs {LINEUP_SIZE}",
            candidates.len()
        )));
    }
    let eligibility: Vec<SlotSet> = candidates.iter().map(|c| c.slots).collect();
    let matching = match_slots(&eligibility, &SlotKind::ALL);
    if !matching.all_slots_filled() {
        let open: Vec<&str> = matching
            .open_slots()
            .iter()
            .map(|s| s.display_str())
            .collect();
        return Err(EngineError::empty_pool(format!(
            "eligible players cannot cover slots {} at the same time",
            open.join(", ")
        )));
    }
    Ok(())
}
