// Optimization entry point and the multi-lineup orchestrator.
//
// Lineups are built in rounds. Every lineup of a round is constructed against
// the same exposure snapshot (optionally on the rayon pool), then the round is
// committed in lineup order against the live tracker. Rejected lineups retry
// with a fresh seed. Seeds depend only on (seed, lineup key, attempt), so the
// serial and parallel schedules produce identical batches.

mod construct;
mod context;
mod exposure;
mod refine;

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analytics::{exposure_report, lineup_totals, ExposureEntry};
use crate::error::{EngineError, PartialFailure};
use crate::filter::filter_pool;
use crate::lineup::{Lineup, LineupSlot};
use crate::player::PlayerRecord;
use crate::scoring::{attempt_randomness, attempt_seed, base_utilities, jittered_utilities};
use crate::settings::{Mode, OptimizationSettings};
use crate::slot::{SlotKind, LINEUP_SIZE};

use self::construct::{construct, preflight_locks, rank_candidates};
use self::context::{roster_key, SearchContext};
use self::exposure::enforce_min_exposure;
use self::refine::refine;

pub use self::exposure::{ExposureGap, ExposureTracker};

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// One optimization call: a slate and the settings to optimize it under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub slate_id: String,
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    pub settings: OptimizationSettings,
}

/// Lineups produced for a request, with batch analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    pub slate_id: String,
    pub mode: Mode,
    /// Lineups in the order they were accepted.
    pub lineups: Vec<Lineup>,
    pub exposure: Vec<ExposureEntry>,
    /// Set when fewer lineups than requested could be built.
    pub partial: Option<PartialFailure>,
    /// Players left below the minimum exposure, if one was requested.
    pub exposure_gaps: Vec<ExposureGap>,
}

/// Run an optimization request.
pub fn optimize(request: &OptimizationRequest) -> Result<OptimizationResponse, EngineError> {
    optimize_pool(&request.slate_id, &request.players, &request.settings)
}

/// Build up to `settings.num_lineups` distinct lineups from `players`.
///
/// Fails before any search on bad settings, when filtering leaves too few
/// players, or when not a single lineup can be built. A batch that stops
/// short returns what it has with `partial` set.
pub fn optimize_pool(
    slate_id: &str,
    players: &[PlayerRecord],
    settings: &OptimizationSettings,
) -> Result<OptimizationResponse, EngineError> {
    settings.validate()?;
    check_players(players, settings)?;

    info!(
        "optimizing slate {}: {:?} mode, {} lineups from {} players",
        slate_id,
        settings.mode,
        settings.num_lineups,
        players.len()
    );

    let candidates = filter_pool(players, settings)?;
    let ctx = SearchContext::new(&candidates, settings);
    preflight_locks(&ctx)?;
    let base = base_utilities(&candidates, settings);

    let batch = run_batch(&ctx, &base, settings);
    if batch.lineups.is_empty() {
        let reason = batch
            .first_failure
            .unwrap_or_else(|| "search budget exhausted".to_string());
        warn!("slate {}: no feasible lineup: {}", slate_id, reason);
        return Err(EngineError::infeasible(reason));
    }

    let mut tracker = batch.tracker;
    let mut built = batch.lineups;
    let exposure_gaps = enforce_min_exposure(
        &ctx,
        &base,
        &settings.exposure,
        settings.num_lineups,
        &mut tracker,
        &mut built,
    );

    let lineups: Vec<Lineup> = built
        .iter()
        .map(|members| package_lineup(&ctx, &base, members))
        .collect();
    let exposure = exposure_report(&lineups, &settings.exposure);

    let partial = (lineups.len() < settings.num_lineups).then(|| PartialFailure {
        requested: settings.num_lineups,
        produced: lineups.len(),
        reasons: batch.reasons,
    });
    if let Some(notice) = &partial {
        warn!("slate {}: {}", slate_id, notice);
    }
    if !exposure_gaps.is_empty() {
        warn!(
            "slate {}: {} players below minimum exposure",
            slate_id,
            exposure_gaps.len()
        );
    }
    info!(
        "slate {}: built {} of {} lineups",
        slate_id,
        lineups.len(),
        settings.num_lineups
    );

    Ok(OptimizationResponse {
        slate_id: slate_id.to_string(),
        mode: settings.mode,
        lineups,
        exposure,
        partial,
        exposure_gaps,
    })
}

/// Reject player lists the engine cannot reason about.
fn check_players(players: &[PlayerRecord], settings: &OptimizationSettings) -> Result<(), EngineError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for player in players {
        if !seen.insert(player.id.as_str()) {
            return Err(EngineError::validation(
                "players",
                format!("duplicate player id {}", player.id),
            ));
        }
        if let Some(issue) = player.check().into_iter().next() {
            return Err(EngineError::validation("players", issue.to_string()));
        }
    }
    for id in &settings.locked {
        let Some(player) = players.iter().find(|p| p.id == *id) else {
            return Err(EngineError::validation(
                "locked",
                format!("player {id} is not in the pool"),
            ));
        };
        if player.eligible_slots().is_empty() {
            return Err(EngineError::validation(
                "locked",
                format!("player {id} has no recognized position"),
            ));
        }
    }
    Ok(())
}

fn package_lineup(
    ctx: &SearchContext<'_>,
    utilities: &[f64],
    members: &[usize; LINEUP_SIZE],
) -> Lineup {
    let players: Vec<&PlayerRecord> = members.iter().map(|&m| ctx.candidates[m].player).collect();
    let utility = members.iter().map(|&m| utilities[m]).sum();
    let totals = lineup_totals(&players, ctx.salary_cap, utility);
    Lineup {
        slots: SlotKind::ALL
            .into_iter()
            .zip(players)
            .map(|(slot, player)| LineupSlot {
                slot,
                player: player.clone(),
            })
            .collect(),
        totals,
    }
}

// ---------------------------------------------------------------------------
// Batch orchestration
// ---------------------------------------------------------------------------

/// A lineup still waiting to be accepted.
#[derive(Debug, Clone, Copy)]
struct Pending {
    key: usize,
    attempt: usize,
}

struct BatchOutcome {
    lineups: Vec<[usize; LINEUP_SIZE]>,
    tracker: ExposureTracker,
    reasons: Vec<String>,
    first_failure: Option<String>,
}

fn run_batch(ctx: &SearchContext<'_>, base: &[f64], settings: &OptimizationSettings) -> BatchOutcome {
    let target = settings.num_lineups;
    let width = settings.budget.round_width.max(1);
    let mut tracker = ExposureTracker::new(ctx.candidates.len());
    let mut lineups: Vec<[usize; LINEUP_SIZE]> = Vec::new();
    let mut seen: HashSet<[usize; LINEUP_SIZE]> = HashSet::new();
    let mut pending: Vec<Pending> = Vec::new();
    let mut next_key = 0usize;
    let mut reasons = Vec::new();
    let mut first_failure = None;

    'rounds: while lineups.len() < target {
        while pending.len() < width.min(target - lineups.len()) {
            pending.push(Pending {
                key: next_key,
                attempt: 0,
            });
            next_key += 1;
        }

        let allowed = tracker.allowed(ctx.candidates, &settings.exposure, target);
        let round = std::mem::take(&mut pending);
        let build = |p: &Pending| build_lineup(ctx, base, &allowed, settings, p.key, p.attempt);
        let results: Vec<Result<[usize; LINEUP_SIZE], EngineError>> = if settings.parallel {
            round.par_iter().map(build).collect()
        } else {
            round.iter().map(build).collect()
        };

        for (mut p, result) in round.into_iter().zip(results) {
            let rejection = match result {
                Ok(members) => {
                    let key = roster_key(&members);
                    if seen.contains(&key) {
                        "duplicate of an accepted lineup".to_string()
                    } else if !tracker.admits(ctx.candidates, &settings.exposure, target, &members) {
                        "exposure caps filled during the round".to_string()
                    } else {
                        tracker.record(&members);
                        seen.insert(key);
                        lineups.push(members);
                        debug!(
                            "accepted lineup {} (key {}, attempt {})",
                            lineups.len(),
                            p.key,
                            p.attempt
                        );
                        continue;
                    }
                }
                Err(EngineError::Infeasible { reason }) => {
                    first_failure.get_or_insert_with(|| reason.clone());
                    reason
                }
                Err(other) => other.to_string(),
            };

            p.attempt += 1;
            if p.attempt >= settings.budget.attempts_per_lineup {
                reasons.push(format!(
                    "lineup {} not built after {} attempts: {}",
                    lineups.len() + 1,
                    p.attempt,
                    rejection
                ));
                break 'rounds;
            }
            pending.push(p);
        }
    }

    BatchOutcome {
        lineups,
        tracker,
        reasons,
        first_failure,
    }
}

/// Construct and refine one lineup for a (key, attempt) pair.
fn build_lineup(
    ctx: &SearchContext<'_>,
    base: &[f64],
    allowed: &[bool],
    settings: &OptimizationSettings,
    key: usize,
    attempt: usize,
) -> Result<[usize; LINEUP_SIZE], EngineError> {
    let seed = attempt_seed(settings.seed, key, attempt);
    let utilities = jittered_utilities(base, attempt_randomness(settings, attempt), seed);
    let ranked = rank_candidates(ctx, &utilities);
    let members = construct(ctx, allowed, &ranked, settings.budget.max_backtracks)?;
    Ok(refine(
        ctx,
        &utilities,
        allowed,
        &ranked,
        members,
        settings.budget.max_refine_attempts,
    ))
}
