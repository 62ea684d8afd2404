// Lineup constructor: lock placement followed by a bounded depth-first fill.
//
// The open slot with the fewest feasible options is filled first, trying
// candidates in utility order. Each option is checked against the team cap,
// the chalk cap, and optimistic salary and diversity bounds for the slots
// still open, so dead branches are cut before they are entered.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::trace;

use super::context::SearchContext;
use crate::error::EngineError;
use crate::lineup::match_slots;
use crate::slot::{SlotKind, SlotSet, LINEUP_SIZE};

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Candidate indices in search order: utility descending, then projection
/// descending, then salary ascending, then pool order.
pub(crate) fn rank_candidates(ctx: &SearchContext<'_>, utilities: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ctx.candidates.len()).collect();
    order.sort_by(|&a, &b| compare_rank(ctx, utilities, a, b));
    order
}

fn compare_rank(ctx: &SearchContext<'_>, utilities: &[f64], a: usize, b: usize) -> Ordering {
    let (pa, pb) = (ctx.candidates[a].player, ctx.candidates[b].player);
    utilities[b]
        .total_cmp(&utilities[a])
        .then_with(|| pb.projected_points.total_cmp(&pa.projected_points))
        .then_with(|| pa.salary.cmp(&pb.salary))
        .then_with(|| a.cmp(&b))
}

// ---------------------------------------------------------------------------
// Partial lineup state
// ---------------------------------------------------------------------------

/// A lineup under construction with running totals for cheap checks.
#[derive(Debug, Clone)]
pub(crate) struct PartialLineup {
    pub slots: [Option<usize>; LINEUP_SIZE],
    pub used: Vec<bool>,
    pub filled: usize,
    pub salary: u64,
    pub team_counts: Vec<usize>,
    pub game_counts: Vec<usize>,
    pub teams_used: usize,
    pub games_used: usize,
    pub chalk: usize,
}

impl PartialLineup {
    pub fn new(ctx: &SearchContext<'_>) -> Self {
        PartialLineup {
            slots: [None; LINEUP_SIZE],
            used: vec![false; ctx.candidates.len()],
            filled: 0,
            salary: 0,
            team_counts: vec![0; ctx.team_count],
            game_counts: vec![0; ctx.game_count],
            teams_used: 0,
            games_used: 0,
            chalk: 0,
        }
    }

    pub fn place(&mut self, ctx: &SearchContext<'_>, slot: SlotKind, cand: usize) {
        self.slots[slot.index()] = Some(cand);
        self.used[cand] = true;
        self.filled += 1;
        self.salary += u64::from(ctx.candidates[cand].player.salary);

        let team = ctx.team_of[cand];
        self.team_counts[team] += 1;
        if self.team_counts[team] == 1 {
            self.teams_used += 1;
        }
        let game = ctx.game_of[cand];
        self.game_counts[game] += 1;
        if self.game_counts[game] == 1 {
            self.games_used += 1;
        }
        if ctx.candidates[cand].chalk {
            self.chalk += 1;
        }
    }

    pub fn remove(&mut self, ctx: &SearchContext<'_>, slot: SlotKind) {
        let Some(cand) = self.slots[slot.index()].take() else {
            return;
        };
        self.used[cand] = false;
        self.filled -= 1;
        self.salary -= u64::from(ctx.candidates[cand].player.salary);

        let team = ctx.team_of[cand];
        self.team_counts[team] -= 1;
        if self.team_counts[team] == 0 {
            self.teams_used -= 1;
        }
        let game = ctx.game_of[cand];
        self.game_counts[game] -= 1;
        if self.game_counts[game] == 0 {
            self.games_used -= 1;
        }
        if ctx.candidates[cand].chalk {
            self.chalk -= 1;
        }
    }

    /// The filled lineup by slot, once every slot holds a player.
    pub fn members(&self) -> Option<[usize; LINEUP_SIZE]> {
        let mut out = [0usize; LINEUP_SIZE];
        for (i, slot) in self.slots.iter().enumerate() {
            out[i] = (*slot)?;
        }
        Some(out)
    }
}

// ---------------------------------------------------------------------------
// Locks
// ---------------------------------------------------------------------------

/// Reject lock sets that can never appear together in a legal lineup.
pub(crate) fn preflight_locks(ctx: &SearchContext<'_>) -> Result<(), EngineError> {
    if ctx.locked.is_empty() {
        return Ok(());
    }
    let eligibility: Vec<SlotSet> = ctx.locked.iter().map(|&i| ctx.candidates[i].slots).collect();
    if !match_slots(&eligibility, &SlotKind::ALL).all_members_placed() {
        return Err(lock_conflict(ctx, &ctx.locked));
    }

    let locked_salary = ctx.salary_of(&ctx.locked);
    let open = LINEUP_SIZE - ctx.locked.len();
    let cheapest_fill: u64 = ctx
        .by_salary
        .iter()
        .filter(|i| !ctx.candidates[**i].locked)
        .take(open)
        .map(|&i| u64::from(ctx.candidates[i].player.salary))
        .sum();
    if locked_salary + cheapest_fill > u64::from(ctx.salary_cap) {
        return Err(EngineError::infeasible(format!(
            "locked players cost ${locked_salary} and the cheapest {open} others cost \
             ${cheapest_fill}, over the ${} cap",
            ctx.salary_cap
        )));
    }

    let mut per_team: BTreeMap<&str, usize> = BTreeMap::new();
    for &i in &ctx.locked {
        *per_team.entry(ctx.candidates[i].player.team.as_str()).or_default() += 1;
    }
    if let Some((team, count)) = per_team
        .iter()
        .find(|(_, count)| **count > ctx.diversity.max_per_team)
    {
        return Err(EngineError::infeasible(format!(
            "{count} locked players are on {team}, above the limit of {} per team",
            ctx.diversity.max_per_team
        )));
    }

    if let Some(limit) = ctx.chalk_limit {
        let chalk = ctx.locked.iter().filter(|&&i| ctx.candidates[i].chalk).count();
        if chalk > limit {
            return Err(EngineError::infeasible(format!(
                "{chalk} locked players are chalk, above the limit of {limit} per lineup"
            )));
        }
    }

    if ctx.locked.len() == LINEUP_SIZE {
        check_full_lock(ctx, locked_salary, per_team.len())?;
    }
    Ok(())
}

/// Locks that fill every slot leave nothing for the search to adjust, so the
/// salary floor and diversity minimums are checked on them directly.
fn check_full_lock(
    ctx: &SearchContext<'_>,
    locked_salary: u64,
    teams: usize,
) -> Result<(), EngineError> {
    if locked_salary < u64::from(ctx.min_salary) {
        return Err(EngineError::infeasible(format!(
            "all {LINEUP_SIZE} slots are locked at ${locked_salary}, under the ${} salary floor",
            ctx.min_salary
        )));
    }
    if teams < ctx.diversity.min_teams {
        return Err(EngineError::infeasible(format!(
            "all {LINEUP_SIZE} slots are locked to {teams} teams, below the minimum of {}",
            ctx.diversity.min_teams
        )));
    }
    let mut games: Vec<usize> = ctx.locked.iter().map(|&i| ctx.game_of[i]).collect();
    games.sort_unstable();
    games.dedup();
    if games.len() < ctx.diversity.min_games {
        return Err(EngineError::infeasible(format!(
            "all {LINEUP_SIZE} slots are locked to {} games, below the minimum of {}",
            games.len(),
            ctx.diversity.min_games
        )));
    }
    Ok(())
}

fn lock_conflict(ctx: &SearchContext<'_>, locks: &[usize]) -> EngineError {
    let ids: Vec<&str> = locks
        .iter()
        .map(|&i| ctx.candidates[i].player.id.as_str())
        .collect();
    let slots: SlotSet = locks
        .iter()
        .flat_map(|&i| ctx.candidates[i].slots.iter().collect::<Vec<_>>())
        .collect();
    let names: Vec<&str> = slots.iter().map(|s| s.display_str()).collect();
    EngineError::infeasible(format!(
        "locked players {} cannot all be placed: only {} slots ({}) accept them",
        ids.join(", "),
        slots.len(),
        names.join(", ")
    ))
}

/// Put every lock into a slot, leaving the scarcest slots for them.
///
/// Locks with the fewest eligible slots go first, and among their eligible
/// slots the one with the fewest other eligible candidates is preferred.
fn place_locks(
    ctx: &SearchContext<'_>,
    allowed: &[bool],
    state: &mut PartialLineup,
) -> Result<(), EngineError> {
    if ctx.locked.is_empty() {
        return Ok(());
    }
    let mut locks = ctx.locked.clone();
    locks.sort_by_key(|&i| ctx.candidates[i].slots.len());

    let mut preference = SlotKind::ALL;
    preference.sort_by_key(|&slot| {
        ctx.candidates
            .iter()
            .enumerate()
            .filter(|(i, c)| allowed[*i] && !c.locked && c.slots.contains(slot))
            .count()
    });

    let eligibility: Vec<SlotSet> = locks.iter().map(|&i| ctx.candidates[i].slots).collect();
    let matching = match_slots(&eligibility, &preference);
    if !matching.all_members_placed() {
        return Err(lock_conflict(ctx, &locks));
    }
    for (member, &cand) in locks.iter().enumerate() {
        if let Some(slot) = matching.member_slot[member] {
            state.place(ctx, slot, cand);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Why an option was refused at some node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Block {
    ExposureCap,
    SalaryCap,
    MinSalary,
    TeamLimit,
    ChalkLimit,
    Diversity,
    PoolExhausted,
}

impl Block {
    fn describe(&self) -> &'static str {
        match self {
            Block::ExposureCap => "every eligible player has reached their exposure cap",
            Block::SalaryCap => "remaining players do not fit under the salary cap",
            Block::MinSalary => "remaining players cannot reach the salary floor",
            Block::TeamLimit => "eligible players are on teams already at the per-team limit",
            Block::ChalkLimit => "eligible players are chalk and the chalk limit is reached",
            Block::Diversity => "too few teams or games remain to meet diversity minimums",
            Block::PoolExhausted => "not enough unused players remain",
        }
    }
}

/// Salary sums of the cheapest and richest unused, allowed candidates,
/// used as optimistic bounds on the slots still open after the next pick.
struct SalaryBounds {
    remaining: usize,
    cheapest: Vec<(usize, u64)>,
    richest: Vec<(usize, u64)>,
}

impl SalaryBounds {
    fn compute(
        ctx: &SearchContext<'_>,
        allowed: &[bool],
        state: &PartialLineup,
        remaining: usize,
    ) -> Self {
        let free = |i: &&usize| !state.used[**i] && allowed[**i];
        let salary = |i: &usize| (*i, u64::from(ctx.candidates[*i].player.salary));
        // One extra so the bound holds after excluding the candidate itself.
        let cheapest = ctx
            .by_salary
            .iter()
            .filter(free)
            .take(remaining + 1)
            .map(salary)
            .collect();
        let richest = ctx
            .by_salary
            .iter()
            .rev()
            .filter(free)
            .take(remaining + 1)
            .map(salary)
            .collect();
        SalaryBounds {
            remaining,
            cheapest,
            richest,
        }
    }

    fn sum_without(list: &[(usize, u64)], skip: usize, count: usize) -> Option<u64> {
        let picked: Vec<u64> = list
            .iter()
            .filter(|(i, _)| *i != skip)
            .take(count)
            .map(|(_, s)| *s)
            .collect();
        (picked.len() == count).then(|| picked.iter().sum())
    }

    fn cheapest_without(&self, cand: usize) -> Option<u64> {
        Self::sum_without(&self.cheapest, cand, self.remaining)
    }

    fn richest_without(&self, cand: usize) -> Option<u64> {
        Self::sum_without(&self.richest, cand, self.remaining)
    }
}

struct Search<'c, 'a> {
    ctx: &'c SearchContext<'a>,
    allowed: &'c [bool],
    ranked: &'c [usize],
    backtracks: usize,
    max_backtracks: usize,
    exhausted: bool,
    blocked: BTreeMap<Block, usize>,
}

impl Search<'_, '_> {
    fn fill(&mut self, state: &mut PartialLineup) -> bool {
        if state.filled == LINEUP_SIZE {
            return true;
        }
        let bounds = SalaryBounds::compute(
            self.ctx,
            self.allowed,
            state,
            LINEUP_SIZE - state.filled - 1,
        );

        let mut choice: Option<(SlotKind, Vec<usize>)> = None;
        for slot in SlotKind::ALL {
            if state.slots[slot.index()].is_some() {
                continue;
            }
            let options = self.options(state, slot, &bounds);
            let dead = options.is_empty();
            if choice.as_ref().map_or(true, |(_, best)| options.len() < best.len()) {
                choice = Some((slot, options));
            }
            if dead {
                break;
            }
        }
        let Some((slot, options)) = choice else {
            return false;
        };
        if options.is_empty() {
            self.record_blocks(state, slot, &bounds);
            return false;
        }

        for cand in options {
            state.place(self.ctx, slot, cand);
            if self.fill(state) {
                return true;
            }
            state.remove(self.ctx, slot);
            if self.exhausted {
                return false;
            }
            self.backtracks += 1;
            if self.backtracks >= self.max_backtracks {
                self.exhausted = true;
                return false;
            }
        }
        false
    }

    /// Feasible candidates for `slot`, in rank order.
    fn options(&self, state: &PartialLineup, slot: SlotKind, bounds: &SalaryBounds) -> Vec<usize> {
        self.ranked
            .iter()
            .copied()
            .filter(|&c| !state.used[c] && self.ctx.candidates[c].slots.contains(slot))
            .filter(|&c| self.blocker(state, c, bounds).is_none())
            .collect()
    }

    fn blocker(&self, state: &PartialLineup, cand: usize, bounds: &SalaryBounds) -> Option<Block> {
        let ctx = self.ctx;
        let candidate = &ctx.candidates[cand];
        if !self.allowed[cand] {
            return Some(Block::ExposureCap);
        }
        let team = ctx.team_of[cand];
        if state.team_counts[team] >= ctx.diversity.max_per_team {
            return Some(Block::TeamLimit);
        }
        if candidate.chalk && ctx.chalk_limit.is_some_and(|limit| state.chalk >= limit) {
            return Some(Block::ChalkLimit);
        }

        let salary = state.salary + u64::from(candidate.player.salary);
        let Some(cheapest) = bounds.cheapest_without(cand) else {
            return Some(Block::PoolExhausted);
        };
        if salary + cheapest > u64::from(ctx.salary_cap) {
            return Some(Block::SalaryCap);
        }
        let richest = bounds.richest_without(cand).unwrap_or(cheapest);
        if salary + richest < u64::from(ctx.min_salary) {
            return Some(Block::MinSalary);
        }

        let teams = state.teams_used + usize::from(state.team_counts[team] == 0);
        let games = state.games_used + usize::from(state.game_counts[ctx.game_of[cand]] == 0);
        if teams + bounds.remaining < ctx.diversity.min_teams
            || games + bounds.remaining < ctx.diversity.min_games
        {
            return Some(Block::Diversity);
        }
        None
    }

    fn record_blocks(&mut self, state: &PartialLineup, slot: SlotKind, bounds: &SalaryBounds) {
        let mut any = false;
        for &c in self.ranked {
            if state.used[c] || !self.ctx.candidates[c].slots.contains(slot) {
                continue;
            }
            if let Some(block) = self.blocker(state, c, bounds) {
                *self.blocked.entry(block).or_default() += 1;
                any = true;
            }
        }
        if !any {
            *self.blocked.entry(Block::PoolExhausted).or_default() += 1;
        }
    }

    fn failure_reason(&self) -> String {
        let common = self
            .blocked
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(block, _)| block.describe());
        match (common, self.exhausted) {
            (Some(reason), true) => {
                format!("search budget of {} backtracks exhausted; {reason}", self.max_backtracks)
            }
            (Some(reason), false) => reason.to_string(),
            (None, true) => format!("search budget of {} backtracks exhausted", self.max_backtracks),
            (None, false) => Block::PoolExhausted.describe().to_string(),
        }
    }
}

/// Build one lineup from the allowed candidates, trying them in `ranked` order.
///
/// Returns candidate indices arranged by slot.
pub(crate) fn construct(
    ctx: &SearchContext<'_>,
    allowed: &[bool],
    ranked: &[usize],
    max_backtracks: usize,
) -> Result<[usize; LINEUP_SIZE], EngineError> {
    let mut state = PartialLineup::new(ctx);
    place_locks(ctx, allowed, &mut state)?;

    let mut search = Search {
        ctx,
        allowed,
        ranked,
        backtracks: 0,
        max_backtracks,
        exhausted: false,
        blocked: BTreeMap::new(),
    };
    if search.fill(&mut state) {
        if let Some(members) = state.members() {
            // Locked slots are never screened by the fill itself.
            if ctx.check_members(&members).is_none() {
                return Err(EngineError::infeasible(
                    "locked players leave no lineup that meets every constraint",
                ));
            }
            trace!("constructed lineup after {} backtracks", search.backtracks);
            return Ok(members);
        }
    }
    Err(EngineError::infeasible(search.failure_reason()))
}
