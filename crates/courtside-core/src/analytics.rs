// Lineup and batch analytics: totals, averages and the exposure report.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::lineup::{Lineup, LineupTotals};
use crate::player::PlayerRecord;
use crate::settings::{ExposureSettings, ExposureTier};

/// Aggregate statistics for a set of players.
///
/// `total_utility` is supplied by the caller since it depends on the mode.
pub fn lineup_totals(players: &[&PlayerRecord], salary_cap: u32, total_utility: f64) -> LineupTotals {
    if players.is_empty() {
        return LineupTotals {
            remaining_salary: salary_cap,
            total_utility,
            ..LineupTotals::default()
        };
    }
    let count = players.len() as f64;
    let total_salary: u32 = players.iter().map(|p| p.salary).sum();
    let sum = |f: fn(&PlayerRecord) -> f64| players.iter().map(|p| f(p)).sum::<f64>();

    LineupTotals {
        total_salary,
        remaining_salary: salary_cap.saturating_sub(total_salary),
        projected_points: sum(|p| p.projected_points),
        total_floor: sum(|p| p.floor),
        total_ceiling: sum(|p| p.ceiling),
        avg_ownership: sum(|p| p.ownership) / count,
        total_leverage: sum(PlayerRecord::leverage_score),
        avg_volatility: sum(|p| p.volatility) / count,
        avg_boom_probability: sum(|p| p.boom_probability) / count,
        total_utility,
    }
}

/// One player's footprint across a batch of lineups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureEntry {
    pub player_id: String,
    pub name: String,
    pub team: String,
    /// Lineups the player appears in.
    pub count: usize,
    /// `count` as a percentage of the batch.
    pub exposure_pct: f64,
    pub tier: ExposureTier,
    pub ownership: f64,
    pub leverage_score: f64,
}

/// Per-player exposure across `lineups`, most used first.
///
/// Ties are broken by ownership (descending) and then player id.
pub fn exposure_report(lineups: &[Lineup], exposure: &ExposureSettings) -> Vec<ExposureEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<ExposureEntry> = Vec::new();

    for player in lineups.iter().flat_map(Lineup::players) {
        match index.get(player.id.as_str()) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(player.id.as_str(), entries.len());
                entries.push(ExposureEntry {
                    player_id: player.id.clone(),
                    name: player.name.clone(),
                    team: player.team.clone(),
                    count: 1,
                    exposure_pct: 0.0,
                    tier: exposure.tier_for(player.ownership),
                    ownership: player.ownership,
                    leverage_score: player.leverage_score(),
                });
            }
        }
    }

    let batch = lineups.len().max(1) as f64;
    for entry in &mut entries {
        entry.exposure_pct = 100.0 * entry.count as f64 / batch;
    }
    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.ownership.total_cmp(&a.ownership))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::player;
    use crate::lineup::LineupSlot;
    use crate::slot::SlotKind;

    fn lineup(players: Vec<PlayerRecord>) -> Lineup {
        let refs: Vec<&PlayerRecord> = players.iter().collect();
        let totals = lineup_totals(&refs, 50_000, 0.0);
        Lineup {
            slots: players
                .into_iter()
                .zip(SlotKind::ALL)
                .map(|(player, slot)| LineupSlot { slot, player })
                .collect(),
            totals,
        }
    }

    #[test]
    fn totals_sum_and_average() {
        let a = player("a", "BOS", "NYK", "PG", 6000, 30.0);
        let mut b = player("b", "NYK", "BOS", "C", 4000, 20.0);
        b.ownership = 30.0;
        let totals = lineup_totals(&[&a, &b], 50_000, 12.5);
        assert_eq!(totals.total_salary, 10_000);
        assert_eq!(totals.remaining_salary, 40_000);
        assert!((totals.projected_points - 50.0).abs() < 1e-9);
        assert!((totals.total_floor - 40.0).abs() < 1e-9);
        assert!((totals.avg_ownership - 20.0).abs() < 1e-9);
        assert!((totals.total_leverage - (a.leverage_score() + b.leverage_score())).abs() < 1e-9);
        assert_eq!(totals.total_utility, 12.5);
    }

    #[test]
    fn empty_totals_leave_cap_untouched() {
        let totals = lineup_totals(&[], 50_000, 0.0);
        assert_eq!(totals.remaining_salary, 50_000);
        assert_eq!(totals.avg_ownership, 0.0);
    }

    #[test]
    fn report_orders_by_count_then_ownership() {
        let mut chalky = player("chalky", "BOS", "NYK", "PG", 6000, 30.0);
        chalky.ownership = 40.0;
        let steady = player("steady", "BOS", "NYK", "SG", 5000, 25.0);
        let mut sneaky = player("sneaky", "NYK", "BOS", "SF", 5000, 25.0);
        sneaky.ownership = 3.0;

        let lineups = vec![
            lineup(vec![steady.clone(), chalky.clone()]),
            lineup(vec![steady.clone(), sneaky.clone()]),
        ];
        let report = exposure_report(&lineups, &ExposureSettings::default());
        let ids: Vec<&str> = report.iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(ids, vec!["steady", "chalky", "sneaky"]);
        assert_eq!(report[0].count, 2);
        assert!((report[0].exposure_pct - 100.0).abs() < 1e-9);
        assert_eq!(report[1].tier, ExposureTier::Chalk);
        assert_eq!(report[2].tier, ExposureTier::Leverage);
    }
}
