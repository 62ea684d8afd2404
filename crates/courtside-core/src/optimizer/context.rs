// Search context shared by construction, refinement and the exposure pass.

use std::collections::HashMap;

use crate::filter::Candidate;
use crate::lineup::assign_slots;
use crate::settings::{DiversityRules, OptimizationSettings};
use crate::slot::{SlotSet, LINEUP_SIZE};

/// Read-only view of the candidate pool with teams and games interned to
/// dense indices. Built once per request and shared by every attempt.
pub(crate) struct SearchContext<'a> {
    pub candidates: &'a [Candidate<'a>],
    pub team_of: Vec<usize>,
    pub game_of: Vec<usize>,
    pub team_count: usize,
    pub game_count: usize,
    /// Candidate indices by ascending salary, ties in pool order.
    pub by_salary: Vec<usize>,
    /// Candidate indices of locked players, in pool order.
    pub locked: Vec<usize>,
    pub salary_cap: u32,
    pub min_salary: u32,
    pub diversity: DiversityRules,
    pub chalk_limit: Option<usize>,
}

impl<'a> SearchContext<'a> {
    pub fn new(candidates: &'a [Candidate<'a>], settings: &OptimizationSettings) -> Self {
        let mut teams: HashMap<&str, usize> = HashMap::new();
        let mut games: HashMap<&str, usize> = HashMap::new();
        let mut team_of = Vec::with_capacity(candidates.len());
        let mut game_of = Vec::with_capacity(candidates.len());
        for c in candidates {
            let next_team = teams.len();
            team_of.push(*teams.entry(c.player.team.as_str()).or_insert(next_team));
            let next_game = games.len();
            game_of.push(*games.entry(c.game.as_str()).or_insert(next_game));
        }

        let mut by_salary: Vec<usize> = (0..candidates.len()).collect();
        by_salary.sort_by_key(|&i| candidates[i].player.salary);

        let locked = (0..candidates.len())
            .filter(|&i| candidates[i].locked)
            .collect();

        SearchContext {
            candidates,
            team_of,
            game_of,
            team_count: teams.len(),
            game_count: games.len(),
            by_salary,
            locked,
            salary_cap: settings.salary_cap,
            min_salary: settings.min_salary,
            diversity: settings.diversity.clone(),
            chalk_limit: settings.chalk_limit(),
        }
    }

    pub fn salary_of(&self, members: &[usize]) -> u64 {
        members
            .iter()
            .map(|&m| u64::from(self.candidates[m].player.salary))
            .sum()
    }

    /// Check a complete set of eight candidates against every hard
    /// constraint and, if it passes, return it arranged by slot.
    pub fn check_members(&self, members: &[usize]) -> Option<[usize; LINEUP_SIZE]> {
        if members.len() != LINEUP_SIZE {
            return None;
        }
        for (i, a) in members.iter().enumerate() {
            if members[i + 1..].contains(a) {
                return None;
            }
        }
        if !self.locked.iter().all(|l| members.contains(l)) {
            return None;
        }

        let salary = self.salary_of(members);
        if salary > u64::from(self.salary_cap) || salary < u64::from(self.min_salary) {
            return None;
        }

        for &m in members {
            let team = self.team_of[m];
            let same_team = members.iter().filter(|&&x| self.team_of[x] == team).count();
            if same_team > self.diversity.max_per_team {
                return None;
            }
        }
        if distinct(members.iter().map(|&m| self.team_of[m])) < self.diversity.min_teams {
            return None;
        }
        if distinct(members.iter().map(|&m| self.game_of[m])) < self.diversity.min_games {
            return None;
        }
        if let Some(limit) = self.chalk_limit {
            if members.iter().filter(|&&m| self.candidates[m].chalk).count() > limit {
                return None;
            }
        }

        let eligibility: Vec<SlotSet> = members.iter().map(|&m| self.candidates[m].slots).collect();
        let by_slot = assign_slots(&eligibility)?;
        let mut arranged = [0usize; LINEUP_SIZE];
        for (slot, member) in by_slot.iter().enumerate() {
            arranged[slot] = members[*member];
        }
        Some(arranged)
    }
}

/// Number of distinct values in a short sequence.
fn distinct(values: impl Iterator<Item = usize>) -> usize {
    let mut seen: Vec<usize> = values.collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// Order-independent identity of a lineup's player set.
pub(crate) fn roster_key(members: &[usize; LINEUP_SIZE]) -> [usize; LINEUP_SIZE] {
    let mut key = *members;
    key.sort_unstable();
    key
}
