// Local refinement: single-player swaps that raise lineup utility.

use super::context::SearchContext;
use crate::slot::LINEUP_SIZE;

/// Improve a constructed lineup by first-improvement swaps.
///
/// Each non-locked member may be replaced by an unused, allowed candidate of
/// strictly higher utility when the result still satisfies every hard
/// constraint. Passes repeat until one accepts no swap or `max_attempts`
/// rejected trials have been spent. Never returns a worse lineup.
pub(crate) fn refine(
    ctx: &SearchContext<'_>,
    utilities: &[f64],
    allowed: &[bool],
    ranked: &[usize],
    start: [usize; LINEUP_SIZE],
    max_attempts: usize,
) -> [usize; LINEUP_SIZE] {
    let mut current = start;
    let mut rejected = 0usize;
    while let Some(next) = improve_once(
        ctx,
        utilities,
        allowed,
        ranked,
        &current,
        &mut rejected,
        max_attempts,
    ) {
        current = next;
    }
    current
}

fn improve_once(
    ctx: &SearchContext<'_>,
    utilities: &[f64],
    allowed: &[bool],
    ranked: &[usize],
    current: &[usize; LINEUP_SIZE],
    rejected: &mut usize,
    max_attempts: usize,
) -> Option<[usize; LINEUP_SIZE]> {
    for position in 0..LINEUP_SIZE {
        let outgoing = current[position];
        if ctx.candidates[outgoing].locked {
            continue;
        }
        for &incoming in ranked {
            // Ranked by utility, so nothing further down can improve.
            if utilities[incoming] <= utilities[outgoing] {
                break;
            }
            if current.contains(&incoming) || !allowed[incoming] {
                continue;
            }
            if *rejected >= max_attempts {
                return None;
            }
            let mut trial = *current;
            trial[position] = incoming;
            if let Some(arranged) = ctx.check_members(&trial) {
                return Some(arranged);
            }
            *rejected += 1;
        }
    }
    None
}
