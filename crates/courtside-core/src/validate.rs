// Standalone lineup validation. No search: every rule is checked and every
// violation reported.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::lineup::{match_slots, Lineup};
use crate::player::PlayerRecord;
use crate::settings::{DiversityRules, OptimizationSettings, SALARY_CAP};
use crate::slot::{SlotKind, SlotSet, LINEUP_SIZE};

/// Rules a fixed lineup is checked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    pub salary_cap: u32,
    pub min_salary: u32,
    #[serde(default)]
    pub locked: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
    /// Team and game limits, checked only when present.
    #[serde(default)]
    pub diversity: Option<DiversityRules>,
}

impl ValidationRules {
    /// Cap and salary floor only, with the standard cap.
    pub fn new(min_salary: u32) -> Self {
        ValidationRules {
            salary_cap: SALARY_CAP,
            min_salary,
            locked: Vec::new(),
            excluded: Vec::new(),
            diversity: None,
        }
    }

    /// The full rule set an optimization under `settings` enforces.
    pub fn from_settings(settings: &OptimizationSettings) -> Self {
        ValidationRules {
            salary_cap: settings.salary_cap,
            min_salary: settings.min_salary,
            locked: settings.locked.clone(),
            excluded: settings.excluded.clone(),
            diversity: Some(settings.diversity.clone()),
        }
    }
}

/// One broken rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    WrongSlotCount { expected: usize, found: usize },
    DuplicatePlayer { player_id: String },
    SalaryUnder { total: u32, min: u32 },
    SalaryOver { total: u32, cap: u32 },
    /// The player cannot play the slot they were put in.
    SlotMismatch { player_id: String, slot: SlotKind },
    DuplicateSlot { slot: SlotKind },
    /// No assignment of these players fills every slot.
    UnfillableSlots { slots: Vec<SlotKind> },
    MissingLock { player_id: String },
    ExcludedPresent { player_id: String },
    TeamLimit { team: String, count: usize, max: usize },
    TooFewTeams { found: usize, min: usize },
    TooFewGames { found: usize, min: usize },
}

/// Outcome of a validation: passed exactly when there are no violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    fn from_violations(violations: Vec<Violation>) -> Self {
        ValidationReport {
            passed: violations.is_empty(),
            violations,
        }
    }
}

/// Validate a set of players with no slots given. Slots are resolved by
/// matching; the set fails if no assignment fills all eight.
pub fn validate_players(players: &[PlayerRecord], rules: &ValidationRules) -> ValidationReport {
    let mut violations = Vec::new();
    let sized = check_size_and_salary(players.iter(), rules, &mut violations);
    if sized {
        let eligibility: Vec<SlotSet> = players.iter().map(PlayerRecord::eligible_slots).collect();
        let matching = match_slots(&eligibility, &SlotKind::ALL);
        if !matching.all_slots_filled() {
            violations.push(Violation::UnfillableSlots {
                slots: matching.open_slots(),
            });
        }
    }
    check_membership(players.iter(), rules, &mut violations);
    ValidationReport::from_violations(violations)
}

/// Validate a lineup as given, slots included.
pub fn validate_lineup(lineup: &Lineup, rules: &ValidationRules) -> ValidationReport {
    let mut violations = Vec::new();
    let sized = check_size_and_salary(lineup.players(), rules, &mut violations);
    if sized {
        let mut seen_slots = BTreeSet::new();
        for entry in &lineup.slots {
            if !seen_slots.insert(entry.slot.index()) {
                violations.push(Violation::DuplicateSlot { slot: entry.slot });
            }
            if !entry.player.eligible_slots().contains(entry.slot) {
                violations.push(Violation::SlotMismatch {
                    player_id: entry.player.id.clone(),
                    slot: entry.slot,
                });
            }
        }
    }
    check_membership(lineup.players(), rules, &mut violations);
    ValidationReport::from_violations(violations)
}

/// Count and salary checks. Returns whether the player count is right, since
/// slot checks are meaningless otherwise.
fn check_size_and_salary<'p>(
    players: impl Iterator<Item = &'p PlayerRecord>,
    rules: &ValidationRules,
    violations: &mut Vec<Violation>,
) -> bool {
    let players: Vec<&PlayerRecord> = players.collect();
    let mut seen = BTreeSet::new();
    for p in &players {
        if !seen.insert(p.id.as_str()) {
            violations.push(Violation::DuplicatePlayer {
                player_id: p.id.clone(),
            });
        }
    }
    if players.len() != LINEUP_SIZE {
        violations.push(Violation::WrongSlotCount {
            expected: LINEUP_SIZE,
            found: players.len(),
        });
        return false;
    }

    let total = players
        .iter()
        .fold(0u32, |acc, p| acc.saturating_add(p.salary));
    if total < rules.min_salary {
        violations.push(Violation::SalaryUnder {
            total,
            min: rules.min_salary,
        });
    }
    if total > rules.salary_cap {
        violations.push(Violation::SalaryOver {
            total,
            cap: rules.salary_cap,
        });
    }
    true
}

fn check_membership<'p>(
    players: impl Iterator<Item = &'p PlayerRecord>,
    rules: &ValidationRules,
    violations: &mut Vec<Violation>,
) {
    let players: Vec<&PlayerRecord> = players.collect();
    for id in &rules.locked {
        if !players.iter().any(|p| p.id == *id) {
            violations.push(Violation::MissingLock {
                player_id: id.clone(),
            });
        }
    }
    for id in &rules.excluded {
        if players.iter().any(|p| p.id == *id) {
            violations.push(Violation::ExcludedPresent {
                player_id: id.clone(),
            });
        }
    }

    let Some(diversity) = &rules.diversity else {
        return;
    };
    let mut per_team: BTreeMap<&str, usize> = BTreeMap::new();
    let mut games = BTreeSet::new();
    for p in &players {
        *per_team.entry(p.team.as_str()).or_default() += 1;
        games.insert(p.game_key());
    }
    for (team, count) in &per_team {
        if *count > diversity.max_per_team {
            violations.push(Violation::TeamLimit {
                team: team.to_string(),
                count: *count,
                max: diversity.max_per_team,
            });
        }
    }
    if per_team.len() < diversity.min_teams {
        violations.push(Violation::TooFewTeams {
            found: per_team.len(),
            min: diversity.min_teams,
        });
    }
    if games.len() < diversity.min_games {
        violations.push(Violation::TooFewGames {
            found: games.len(),
            min: diversity.min_games,
        });
    }
}
