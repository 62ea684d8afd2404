// Shared builders for unit tests.

use crate::player::{InjuryStatus, PlayerRecord};
use crate::settings::{Mode, OptimizationSettings};

/// A healthy player with distribution fields derived from the projection.
pub(crate) fn player(
    id: &str,
    team: &str,
    opponent: &str,
    positions: &str,
    salary: u32,
    projected: f64,
) -> PlayerRecord {
    PlayerRecord {
        id: id.to_string(),
        name: format!("Player {id}"),
        team: team.to_string(),
        opponent: opponent.to_string(),
        positions: vec![positions.to_string()],
        salary,
        projected_points: projected,
        floor: projected * 0.8,
        ceiling: projected * 1.25,
        volatility: 0.3,
        boom_probability: 20.0,
        bust_probability: 20.0,
        ownership: 10.0,
        usage_rate: 22.0,
        rest_days: 1,
        projected_minutes: 30.0,
        injury_status: InjuryStatus::Healthy,
        game_spread: Some(4.0),
    }
}

const MATCHUPS: [(&str, &str); 3] = [("BOS", "NYK"), ("LAL", "GSW"), ("MIA", "DEN")];
const POSITIONS: [&str; 5] = ["PG", "SG", "SF", "PF", "C"];

/// Thirty players: six teams in three games, one player per position per team.
pub(crate) fn slate() -> Vec<PlayerRecord> {
    let mut players = Vec::new();
    for (g, (home, away)) in MATCHUPS.iter().enumerate() {
        for (side, (team, opp)) in [(home, away), (away, home)].into_iter().enumerate() {
            let t = g * 2 + side;
            for (p, pos) in POSITIONS.iter().enumerate() {
                let salary = 3500 + 100 * ((t * 17 + p * 29) % 70) as u32;
                let projected = salary as f64 / 200.0 + ((t + 2 * p) % 5) as f64;
                let mut record = player(
                    &format!("{}-{}", team, pos),
                    team,
                    opp,
                    pos,
                    salary,
                    projected,
                );
                record.volatility = 0.2 + 0.1 * ((t + p) % 5) as f64;
                record.boom_probability = 10.0 + 5.0 * ((t * 3 + p) % 7) as f64;
                record.bust_probability = 10.0 + 4.0 * ((t + p * 3) % 6) as f64;
                record.ownership = 2.0 + 4.5 * ((t * 7 + p * 5) % 10) as f64;
                players.push(record);
            }
        }
    }
    players
}

/// Settings with a floor low enough for the fixture slate.
pub(crate) fn settings(mode: Mode, num_lineups: usize) -> OptimizationSettings {
    let mut settings = OptimizationSettings::for_mode(mode);
    settings.num_lineups = num_lineups;
    settings.min_salary = 40_000;
    settings
}
