// Exposure bookkeeping across a batch, and the minimum-exposure pass.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::context::{roster_key, SearchContext};
use crate::filter::Candidate;
use crate::settings::ExposureSettings;
use crate::slot::LINEUP_SIZE;

/// Appearance counts for the lineups accepted so far, indexed like the
/// candidate pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposureTracker {
    counts: Vec<usize>,
    lineups: usize,
}

impl ExposureTracker {
    pub fn new(pool_size: usize) -> Self {
        ExposureTracker {
            counts: vec![0; pool_size],
            lineups: 0,
        }
    }

    /// Count one accepted lineup.
    pub fn record(&mut self, members: &[usize]) {
        for &m in members {
            self.counts[m] += 1;
        }
        self.lineups += 1;
    }

    /// Move one appearance from `outgoing` to `incoming`.
    pub fn swap(&mut self, outgoing: usize, incoming: usize) {
        self.counts[outgoing] = self.counts[outgoing].saturating_sub(1);
        self.counts[incoming] += 1;
    }

    pub fn count(&self, candidate: usize) -> usize {
        self.counts[candidate]
    }

    pub fn lineups(&self) -> usize {
        self.lineups
    }

    /// Which candidates may still enter a lineup. Locked players are exempt
    /// from tier caps.
    pub(crate) fn allowed(
        &self,
        candidates: &[Candidate<'_>],
        exposure: &ExposureSettings,
        num_lineups: usize,
    ) -> Vec<bool> {
        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| c.locked || self.counts[i] < exposure.max_appearances(c.tier, num_lineups))
            .collect()
    }

    /// Whether accepting `members` keeps every capped player within its cap.
    pub(crate) fn admits(
        &self,
        candidates: &[Candidate<'_>],
        exposure: &ExposureSettings,
        num_lineups: usize,
        members: &[usize],
    ) -> bool {
        members.iter().all(|&m| {
            let c = &candidates[m];
            c.locked || self.counts[m] < exposure.max_appearances(c.tier, num_lineups)
        })
    }
}

/// A player left short of the minimum exposure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureGap {
    pub player_id: String,
    pub name: String,
    /// Appearances the minimum exposure asked for.
    pub target: usize,
    pub achieved: usize,
}

/// Raise under-exposed players toward the minimum by substitution.
///
/// For each candidate below target, in pool order, the cheapest (least
/// utility lost) legal swap into a lineup that lacks it is applied, as long
/// as the player removed stays at or above target and the incoming player's
/// cap allows another appearance. Players that cannot reach the target are
/// returned as gaps.
pub(crate) fn enforce_min_exposure(
    ctx: &SearchContext<'_>,
    utilities: &[f64],
    exposure: &ExposureSettings,
    num_lineups: usize,
    tracker: &mut ExposureTracker,
    lineups: &mut [[usize; LINEUP_SIZE]],
) -> Vec<ExposureGap> {
    let Some(target) = exposure.min_appearances(lineups.len()) else {
        return Vec::new();
    };
    if target == 0 {
        return Vec::new();
    }

    let mut gaps = Vec::new();
    for player in 0..ctx.candidates.len() {
        let candidate = &ctx.candidates[player];
        let cap = if candidate.locked {
            num_lineups
        } else {
            exposure.max_appearances(candidate.tier, num_lineups)
        };
        while tracker.count(player) < target && tracker.count(player) < cap {
            let Some(swap) = best_substitution(ctx, utilities, tracker, lineups, player, target)
            else {
                break;
            };
            debug!(
                "min exposure: {} replaces {} in lineup {}",
                candidate.player.id,
                ctx.candidates[swap.outgoing].player.id,
                swap.lineup + 1
            );
            lineups[swap.lineup] = swap.arranged;
            tracker.swap(swap.outgoing, player);
        }
        if tracker.count(player) < target {
            gaps.push(ExposureGap {
                player_id: candidate.player.id.clone(),
                name: candidate.player.name.clone(),
                target,
                achieved: tracker.count(player),
            });
        }
    }
    gaps
}

struct Substitution {
    lineup: usize,
    outgoing: usize,
    arranged: [usize; LINEUP_SIZE],
}

fn best_substitution(
    ctx: &SearchContext<'_>,
    utilities: &[f64],
    tracker: &ExposureTracker,
    lineups: &[[usize; LINEUP_SIZE]],
    player: usize,
    target: usize,
) -> Option<Substitution> {
    let mut best: Option<(f64, Substitution)> = None;
    for (index, lineup) in lineups.iter().enumerate() {
        if lineup.contains(&player) {
            continue;
        }
        for position in 0..LINEUP_SIZE {
            let outgoing = lineup[position];
            if ctx.candidates[outgoing].locked || tracker.count(outgoing) <= target {
                continue;
            }
            let mut trial = *lineup;
            trial[position] = player;
            let Some(arranged) = ctx.check_members(&trial) else {
                continue;
            };
            let key = roster_key(&arranged);
            if lineups
                .iter()
                .enumerate()
                .any(|(other, l)| other != index && roster_key(l) == key)
            {
                continue;
            }
            let loss = utilities[outgoing] - utilities[player];
            if best.as_ref().map_or(true, |(l, _)| loss < *l) {
                best = Some((
                    loss,
                    Substitution {
                        lineup: index,
                        outgoing,
                        arranged,
                    },
                ));
            }
        }
    }
    best.map(|(_, swap)| swap)
}
