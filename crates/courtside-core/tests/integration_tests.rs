// Integration tests for the lineup engine.
//
// These exercise the public API end to end: filtering, construction,
// refinement, batch orchestration, exposure control and validation, checked
// against the properties every produced lineup must hold.

use std::collections::{BTreeMap, BTreeSet};

use courtside_core::settings::ExposureTier;
use courtside_core::{
    optimize, optimize_pool, validate_lineup, validate_players, EngineError, GppStrategy,
    InjuryStatus, Lineup, Mode, OptimizationRequest, OptimizationResponse, OptimizationSettings,
    PlayerRecord, ValidationRules, LINEUP_SIZE,
};
use proptest::prelude::*;

// ===========================================================================
// Test helpers
// ===========================================================================

const TEAMS: [(&str, &str); 8] = [
    ("BOS", "NYK"),
    ("NYK", "BOS"),
    ("LAL", "GSW"),
    ("GSW", "LAL"),
    ("MIA", "DEN"),
    ("DEN", "MIA"),
    ("PHX", "DAL"),
    ("DAL", "PHX"),
];

const POSITIONS: [&str; 5] = ["PG", "SG", "SF", "PF", "C"];

fn record(id: &str, team: &str, opponent: &str, positions: &str, salary: u32, projected: f64) -> PlayerRecord {
    PlayerRecord {
        id: id.to_string(),
        name: format!("Player {id}"),
        team: team.to_string(),
        opponent: opponent.to_string(),
        positions: vec![positions.to_string()],
        salary,
        projected_points: projected,
        floor: projected * 0.8,
        ceiling: projected * 1.3,
        volatility: 0.3,
        boom_probability: 20.0,
        bust_probability: 15.0,
        ownership: 12.0,
        usage_rate: 22.0,
        rest_days: 1,
        projected_minutes: 30.0,
        injury_status: InjuryStatus::Healthy,
        game_spread: Some(5.0),
    }
}

/// Eighty players: eight teams in four games, two per position per team,
/// with salaries, projections and ownership spread by a fixed formula.
fn big_slate() -> Vec<PlayerRecord> {
    let mut players = Vec::new();
    for (t, (team, opp)) in TEAMS.iter().enumerate() {
        for (p, pos) in POSITIONS.iter().enumerate() {
            for depth in 0..2 {
                let k = t * 10 + p * 2 + depth;
                let salary = 3500 + 100 * ((k * 37) % 70) as u32;
                let projected = salary as f64 / 210.0 + ((k * 7) % 6) as f64;
                let mut r = record(&format!("{team}-{pos}{depth}"), team, opp, pos, salary, projected);
                r.ownership = 1.0 + ((k * 13) % 40) as f64;
                r.boom_probability = 8.0 + ((k * 11) % 30) as f64;
                r.volatility = 0.15 + 0.05 * ((k * 3) % 10) as f64;
                players.push(r);
            }
        }
    }
    players
}

/// Ten players on four teams whose every eight-player subset fits in
/// $45,000..=$50,000.
fn ten_player_slate() -> Vec<PlayerRecord> {
    vec![
        record("a", "BOS", "NYK", "PG", 6200, 32.0),
        record("b", "BOS", "NYK", "SG", 5900, 29.0),
        record("c", "BOS", "NYK", "SF", 6100, 30.0),
        record("d", "NYK", "BOS", "PF", 5600, 27.0),
        record("e", "NYK", "BOS", "C", 6300, 33.0),
        record("f", "LAL", "GSW", "PG", 5400, 26.0),
        record("g", "LAL", "GSW", "SF", 5700, 28.0),
        record("h", "LAL", "GSW", "C", 5500, 27.5),
        record("i", "GSW", "LAL", "SG", 5800, 28.5),
        record("j", "GSW", "LAL", "PF", 6000, 30.5),
    ]
}

fn gpp_settings(num_lineups: usize) -> OptimizationSettings {
    let mut settings = OptimizationSettings::for_mode(Mode::Gpp);
    settings.num_lineups = num_lineups;
    settings.min_salary = 45_000;
    settings.seed = 17;
    settings
}

/// Every hard constraint a produced lineup must satisfy.
fn assert_lineup_legal(lineup: &Lineup, settings: &OptimizationSettings) {
    assert_eq!(lineup.slots.len(), LINEUP_SIZE);

    let ids: BTreeSet<&str> = lineup.players().map(|p| p.id.as_str()).collect();
    assert_eq!(ids.len(), LINEUP_SIZE, "repeated player in {ids:?}");
    for entry in &lineup.slots {
        assert!(
            entry.player.eligible_slots().contains(entry.slot),
            "{} cannot play {:?}",
            entry.player.id,
            entry.slot
        );
    }

    let salary: u32 = lineup.players().map(|p| p.salary).sum();
    assert_eq!(salary, lineup.totals.total_salary);
    assert!(salary >= settings.min_salary && salary <= settings.salary_cap);

    for id in &settings.locked {
        assert!(ids.contains(id.as_str()), "lock {id} missing");
    }
    for id in &settings.excluded {
        assert!(!ids.contains(id.as_str()), "excluded {id} present");
    }

    let mut teams: BTreeMap<&str, usize> = BTreeMap::new();
    let mut games = BTreeSet::new();
    for p in lineup.players() {
        *teams.entry(p.team.as_str()).or_default() += 1;
        games.insert(p.game_key());
    }
    assert!(teams.values().all(|&n| n <= settings.diversity.max_per_team));
    assert!(teams.len() >= settings.diversity.min_teams);
    assert!(games.len() >= settings.diversity.min_games);

    let report = validate_lineup(lineup, &ValidationRules::from_settings(settings));
    assert!(report.passed, "{:?}", report.violations);
}

fn assert_exposure_within_caps(response: &OptimizationResponse, settings: &OptimizationSettings) {
    let n = settings.num_lineups;
    for entry in &response.exposure {
        if settings.locked.contains(&entry.player_id) {
            continue;
        }
        let max = settings.exposure.max_appearances(entry.tier, n);
        assert!(
            entry.count <= max,
            "{} appears {} times, cap {}",
            entry.player_id,
            entry.count,
            max
        );
    }
}

// ===========================================================================
// Single lineups
// ===========================================================================

#[test]
fn scenario_a_ten_player_cash_pool_yields_one_lineup() {
    let mut settings = OptimizationSettings::for_mode(Mode::Cash);
    settings.min_salary = 45_000;
    let players = ten_player_slate();

    let response = optimize_pool("scenario-a", &players, &settings).unwrap();
    assert_eq!(response.lineups.len(), 1);
    assert!(response.partial.is_none());
    assert_lineup_legal(&response.lineups[0], &settings);
}

#[test]
fn scenario_a_reports_salary_infeasibility() {
    let mut settings = OptimizationSettings::for_mode(Mode::Cash);
    settings.salary_cap = 40_000;
    settings.min_salary = 30_000;

    let err = optimize_pool("scenario-a", &ten_player_slate(), &settings).unwrap_err();
    match err {
        EngineError::Infeasible { reason } => assert!(reason.contains("salary cap"), "{reason}"),
        other => panic!("expected infeasible, got {other:?}"),
    }
}

#[test]
fn scenario_b_conflicting_center_locks_are_infeasible() {
    let mut players = big_slate();
    // A third pure center on another team so the locks only conflict on slots.
    players.push(record("extra-C", "PHX", "DAL", "C", 4000, 20.0));
    let mut settings = gpp_settings(1);
    settings.locked = vec!["BOS-C0".into(), "LAL-C0".into(), "extra-C".into()];

    let err = optimize_pool("scenario-b", &players, &settings).unwrap_err();
    match err {
        EngineError::Infeasible { reason } => {
            assert!(reason.contains("BOS-C0"), "{reason}");
            assert!(reason.contains("C, UTIL"), "{reason}");
        }
        other => panic!("expected infeasible, got {other:?}"),
    }
}

#[test]
fn two_center_locks_share_center_and_util() {
    let mut settings = gpp_settings(1);
    settings.locked = vec!["BOS-C0".into(), "LAL-C0".into()];
    let response = optimize_pool("two-centers", &big_slate(), &settings).unwrap();
    let lineup = &response.lineups[0];
    assert_lineup_legal(lineup, &settings);
}

const LOCKED_POSITIONS: [&str; 10] = ["PG", "SG", "SF", "PF", "C", "PG", "SF", "C", "PF", "SG"];

/// Ten players split between two teams by `team_for(index)`, all at `salary`,
/// with the first eight locked.
fn fully_locked(
    salary: u32,
    team_for: impl Fn(usize) -> (&'static str, &'static str),
) -> (Vec<PlayerRecord>, OptimizationSettings) {
    let players: Vec<PlayerRecord> = LOCKED_POSITIONS
        .iter()
        .enumerate()
        .map(|(i, pos)| {
            let (team, opp) = team_for(i);
            record(&format!("L{i}"), team, opp, pos, salary, 25.0)
        })
        .collect();
    let mut settings = OptimizationSettings::for_mode(Mode::Cash);
    settings.min_salary = 45_000;
    settings.diversity.max_per_team = LINEUP_SIZE;
    settings.locked = players[..LINEUP_SIZE].iter().map(|p| p.id.clone()).collect();
    (players, settings)
}

fn infeasible_reason(players: &[PlayerRecord], settings: &OptimizationSettings) -> String {
    match optimize_pool("locked", players, settings) {
        Err(EngineError::Infeasible { reason }) => reason,
        other => panic!("expected infeasible, got {other:?}"),
    }
}

#[test]
fn fully_locked_lineup_under_salary_floor_is_infeasible() {
    let (players, settings) = fully_locked(4000, |_| ("BOS", "NYK"));
    let reason = infeasible_reason(&players, &settings);
    assert!(reason.contains("salary floor"), "{reason}");
}

#[test]
fn fully_locked_lineup_on_one_team_is_infeasible() {
    let (players, settings) = fully_locked(6000, |_| ("BOS", "NYK"));
    let reason = infeasible_reason(&players, &settings);
    assert!(reason.contains("1 teams"), "{reason}");
}

#[test]
fn fully_locked_lineup_in_one_game_is_infeasible() {
    let (players, settings) =
        fully_locked(6000, |i| if i % 2 == 0 { ("BOS", "NYK") } else { ("NYK", "BOS") });
    let reason = infeasible_reason(&players, &settings);
    assert!(reason.contains("1 games"), "{reason}");
}

#[test]
fn fully_locked_lineup_meeting_every_rule_is_returned() {
    let (players, settings) =
        fully_locked(6000, |i| if i % 2 == 0 { ("BOS", "NYK") } else { ("LAL", "GSW") });
    let response = optimize_pool("locked", &players, &settings).unwrap();
    let lineup = &response.lineups[0];
    assert_lineup_legal(lineup, &settings);
    for id in &settings.locked {
        assert!(lineup.contains(id), "missing lock {id}");
    }
}

#[test]
fn scenario_d_lock_and_exclude_same_player_fails_validation() {
    let mut settings = gpp_settings(3);
    settings.locked = vec!["BOS-PG0".into()];
    settings.excluded = vec!["BOS-PG0".into()];
    let err = optimize_pool("scenario-d", &big_slate(), &settings).unwrap_err();
    assert!(matches!(err, EngineError::Validation { .. }), "{err:?}");
}

#[test]
fn injured_slate_leaves_an_empty_pool() {
    let mut players = big_slate();
    for p in players.iter_mut() {
        p.injury_status = InjuryStatus::Out;
    }
    // A lock survives its injury, but one player cannot fill a lineup.
    let mut settings = gpp_settings(1);
    settings.locked = vec!["BOS-PG0".into()];
    let err = optimize_pool("injuries", &players, &settings).unwrap_err();
    assert!(matches!(err, EngineError::EmptyPool { .. }), "{err:?}");
}

#[test]
fn locks_and_excludes_hold_across_a_batch() {
    let mut settings = gpp_settings(6);
    settings.locked = vec!["MIA-SF1".into()];
    settings.excluded = vec!["BOS-PG0".into(), "DEN-C1".into()];
    let response = optimize_pool("locks", &big_slate(), &settings).unwrap();
    assert!(!response.lineups.is_empty());
    for lineup in &response.lineups {
        assert_lineup_legal(lineup, &settings);
    }
}

// ===========================================================================
// Batches and exposure
// ===========================================================================

#[test]
fn scenario_c_chalk_cap_limits_appearances() {
    let mut settings = gpp_settings(20);
    settings.exposure.chalk_cap = 0.3;
    let players = big_slate();

    let response = optimize_pool("scenario-c", &players, &settings).unwrap();
    assert!(!response.lineups.is_empty());
    for lineup in &response.lineups {
        assert_lineup_legal(lineup, &settings);
    }
    for entry in &response.exposure {
        if entry.tier == ExposureTier::Chalk {
            assert!(entry.count <= 6, "{} in {} lineups", entry.player_id, entry.count);
        }
    }
    assert_exposure_within_caps(&response, &settings);
}

#[test]
fn batch_lineups_are_distinct() {
    let settings = gpp_settings(12);
    let response = optimize_pool("distinct", &big_slate(), &settings).unwrap();
    let rosters: BTreeSet<Vec<String>> = response
        .lineups
        .iter()
        .map(|l| {
            let mut ids: Vec<String> = l.players().map(|p| p.id.clone()).collect();
            ids.sort();
            ids
        })
        .collect();
    assert_eq!(rosters.len(), response.lineups.len());
}

#[test]
fn every_strategy_builds_legal_lineups() {
    for strategy in [GppStrategy::MaxLeverage, GppStrategy::Balanced, GppStrategy::Contrarian] {
        let mut settings = gpp_settings(4);
        settings.gpp.strategy = strategy;
        let response = optimize_pool("strategies", &big_slate(), &settings).unwrap();
        for lineup in &response.lineups {
            assert_lineup_legal(lineup, &settings);
        }
        assert_exposure_within_caps(&response, &settings);
    }
}

#[test]
fn minimum_exposure_reports_unreachable_players() {
    let mut settings = gpp_settings(4);
    settings.exposure.min_exposure = Some(0.25);
    let response = optimize_pool("min-exposure", &big_slate(), &settings).unwrap();
    // Four lineups hold at most 32 appearances; 80 players cannot all reach one.
    assert!(!response.exposure_gaps.is_empty());
    for gap in &response.exposure_gaps {
        assert_eq!(gap.target, 1);
        assert_eq!(gap.achieved, 0);
    }
    for lineup in &response.lineups {
        assert_lineup_legal(lineup, &settings);
    }
}

#[test]
fn impossible_batch_returns_partial_notice() {
    // Ten players make exactly C(10, 8) = 45 rosters but caps of one
    // appearance per player allow only one lineup.
    let mut settings = OptimizationSettings::for_mode(Mode::Gpp);
    settings.min_salary = 45_000;
    settings.num_lineups = 3;
    settings.gpp.max_chalk_players = None;
    settings.exposure.chalk_cap = 0.1;
    settings.exposure.mid_cap = 0.1;
    settings.exposure.leverage_cap = 0.1;
    settings.budget.attempts_per_lineup = 3;

    let response = optimize_pool("partial", &ten_player_slate(), &settings).unwrap();
    assert_eq!(response.lineups.len(), 1);
    let notice = response.partial.expect("partial notice");
    assert_eq!(notice.requested, 3);
    assert_eq!(notice.produced, 1);
    assert!(!notice.reasons.is_empty());
}

// ===========================================================================
// Determinism
// ===========================================================================

#[test]
fn repeated_runs_are_byte_identical() {
    let request = OptimizationRequest {
        slate_id: "determinism".into(),
        players: big_slate(),
        settings: gpp_settings(8),
    };
    let a = serde_json::to_string(&optimize(&request).unwrap()).unwrap();
    let b = serde_json::to_string(&optimize(&request).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn serial_and_parallel_runs_match() {
    let mut serial = gpp_settings(10);
    serial.parallel = false;
    let mut parallel = serial.clone();
    parallel.parallel = true;

    let players = big_slate();
    let a = serde_json::to_string(&optimize_pool("p", &players, &serial).unwrap()).unwrap();
    let b = serde_json::to_string(&optimize_pool("p", &players, &parallel).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn different_seeds_change_gpp_batches() {
    let players = big_slate();
    let mut first = gpp_settings(6);
    first.gpp.randomness = 25.0;
    let mut second = first.clone();
    second.seed = first.seed + 1;

    let a = optimize_pool("seeds", &players, &first).unwrap();
    let b = optimize_pool("seeds", &players, &second).unwrap();
    assert_ne!(a.lineups, b.lineups);
}

// ===========================================================================
// Validate
// ===========================================================================

#[test]
fn validate_agrees_with_optimizer_output() {
    let settings = gpp_settings(3);
    let response = optimize_pool("validate", &big_slate(), &settings).unwrap();
    let rules = ValidationRules::from_settings(&settings);
    for lineup in &response.lineups {
        let players: Vec<PlayerRecord> = lineup.players().cloned().collect();
        let first = validate_players(&players, &rules);
        let second = validate_players(&players, &rules);
        assert!(first.passed, "{:?}", first.violations);
        assert_eq!(first, second);
    }
}

// ===========================================================================
// Properties over generated pools
// ===========================================================================

const TAGS: [&str; 8] = ["PG", "SG", "SF", "PF", "C", "PG/SG", "SF/PF", "PF/C"];

fn generated_player() -> impl Strategy<Value = (usize, usize, u32, f64, f64, f64)> {
    (
        0..TEAMS.len(),
        0..TAGS.len(),
        30u32..=110,
        10.0f64..50.0,
        0.0f64..60.0,
        0.0f64..50.0,
    )
}

fn build_pool(specs: &[(usize, usize, u32, f64, f64, f64)]) -> Vec<PlayerRecord> {
    specs
        .iter()
        .enumerate()
        .map(|(i, &(team, tag, salary, projected, ownership, boom))| {
            let (t, o) = TEAMS[team];
            let mut r = record(&format!("p{i}"), t, o, TAGS[tag], salary * 100, projected);
            r.ownership = ownership;
            r.boom_probability = boom;
            r
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn produced_lineups_always_hold_constraints(
        specs in prop::collection::vec(generated_player(), 12..48),
        gpp in any::<bool>(),
        num_lineups in 1usize..5,
        seed in any::<u64>(),
    ) {
        let players = build_pool(&specs);
        let mut settings = OptimizationSettings::for_mode(if gpp { Mode::Gpp } else { Mode::Cash });
        settings.num_lineups = num_lineups;
        settings.min_salary = 30_000;
        settings.seed = seed;
        settings.budget.max_backtracks = 500;

        match optimize_pool("generated", &players, &settings) {
            Ok(response) => {
                prop_assert!(!response.lineups.is_empty());
                prop_assert!(response.lineups.len() <= num_lineups);
                for lineup in &response.lineups {
                    assert_lineup_legal(lineup, &settings);
                }
                assert_exposure_within_caps(&response, &settings);
            }
            Err(EngineError::EmptyPool { .. }) | Err(EngineError::Infeasible { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }
}
