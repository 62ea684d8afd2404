// End-to-end tests: CSV pool + TOML config through the engine.

use std::fs;
use std::path::PathBuf;

use courtside_cli::config::load_config_from;
use courtside_cli::pool::{CsvPlayerSource, PlayerSource};
use courtside_core::{
    optimize, validate_lineup, validate_players, InjuryStatus, Mode, OptimizationRequest,
    OptimizationSettings, PlayerRecord, ValidationRules, LINEUP_SIZE,
};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/slate.csv")
}

fn load_fixture() -> Vec<PlayerRecord> {
    CsvPlayerSource::new(fixture_path())
        .load_players()
        .expect("fixture slate should load")
}

fn request(players: Vec<PlayerRecord>, settings: OptimizationSettings) -> OptimizationRequest {
    OptimizationRequest {
        slate_id: "fixture".to_string(),
        players,
        settings,
    }
}

// ===========================================================================
// Pool loading
// ===========================================================================

#[test]
fn fixture_skips_bad_rows_and_duplicates() {
    let players = load_fixture();
    // 30 slate players plus one injured guard; the malformed row and the
    // duplicate center are dropped.
    assert_eq!(players.len(), 31);

    let mia_c = players.iter().find(|p| p.id == "MIA-C").unwrap();
    assert_ne!(mia_c.name, "Duplicate Center");

    let injured = players.iter().find(|p| p.id == "BOS-G2").unwrap();
    assert_eq!(injured.injury_status, InjuryStatus::Out);
    assert_eq!(injured.positions, vec!["PG", "SG"]);
    assert!(players.iter().all(|p| p.id != "NYK-X"));
}

// ===========================================================================
// Optimization
// ===========================================================================

#[test]
fn cash_lineup_from_csv_pool() {
    let players = load_fixture();
    let mut settings = OptimizationSettings::for_mode(Mode::Cash);
    settings.min_salary = 40_000;

    let response = optimize(&request(players, settings.clone())).unwrap();
    assert_eq!(response.lineups.len(), 1);
    assert!(response.partial.is_none());

    let lineup = &response.lineups[0];
    assert_eq!(lineup.slots.len(), LINEUP_SIZE);
    assert!(lineup.totals.total_salary <= 50_000);
    assert!(!lineup.contains("BOS-G2"), "injured player must be screened out");

    let report = validate_lineup(lineup, &ValidationRules::from_settings(&settings));
    assert!(report.passed, "{:?}", report.violations);
}

#[test]
fn gpp_batch_from_csv_pool_is_distinct() {
    let players = load_fixture();
    let mut settings = OptimizationSettings::for_mode(Mode::Gpp);
    settings.num_lineups = 5;
    settings.min_salary = 42_000;
    settings.seed = 9;

    let response = optimize(&request(players, settings)).unwrap();
    assert!(!response.lineups.is_empty());

    let mut keys: Vec<Vec<String>> = response
        .lineups
        .iter()
        .map(|l| {
            let mut ids: Vec<String> = l.players().map(|p| p.id.clone()).collect();
            ids.sort();
            ids
        })
        .collect();
    let produced = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), produced, "lineups must be pairwise distinct");

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"slate_id\":\"fixture\""));
}

#[test]
fn validate_fixed_lineup_from_csv_pool() {
    let players = load_fixture();
    let ids = [
        "BOS-PG", "BOS-SG", "BOS-PF", "BOS-C", "NYK-SF", "DEN-PG", "DEN-SF", "DEN-PF",
    ];
    let lineup: Vec<PlayerRecord> = ids
        .iter()
        .map(|id| players.iter().find(|p| p.id == *id).unwrap().clone())
        .collect();

    let rules = ValidationRules::new(40_000);
    let report = validate_players(&lineup, &rules);
    assert!(report.passed, "{:?}", report.violations);

    let strict = ValidationRules::new(45_000);
    assert!(!validate_players(&lineup, &strict).passed);
}

// ===========================================================================
// Config + pool
// ===========================================================================

#[test]
fn config_file_drives_the_run() {
    let tmp = std::env::temp_dir().join("courtside_pipeline_config");
    let _ = fs::remove_dir_all(&tmp);
    fs::create_dir_all(tmp.join("config")).unwrap();
    let toml = format!(
        r#"
[slate]
id = "fixture-main"
date = "2026-10-19"
pool = "{}"

[optimizer]
mode = "cash"
num_lineups = 1
min_salary = 40000
locked = ["MIA-C"]
excluded = ["DEN-C"]
"#,
        fixture_path().display()
    );
    fs::write(tmp.join("config/courtside.toml"), toml).unwrap();

    let config = load_config_from(&tmp).unwrap();
    assert_eq!(config.pool_path(&tmp), fixture_path());

    let players = CsvPlayerSource::new(config.pool_path(&tmp))
        .load_players()
        .unwrap();
    let response = optimize(&OptimizationRequest {
        slate_id: config.slate.id.clone(),
        players,
        settings: config.optimizer.clone(),
    })
    .unwrap();

    assert_eq!(response.slate_id, "fixture-main");
    let lineup = &response.lineups[0];
    assert!(lineup.contains("MIA-C"));
    assert!(!lineup.contains("DEN-C"));

    let _ = fs::remove_dir_all(&tmp);
}
