// Player pool loading.
//
// Reads one slate's players from a CSV file. Column names follow the player
// record fields; common short forms (opp, pos, fpts, own, ...) are accepted
// as aliases. Malformed rows are skipped with a warning rather than failing
// the whole slate.

use courtside_core::{InjuryStatus, PlayerRecord};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("no usable players in {path}")]
    Empty { path: String },
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Anything that can supply the player records for a slate.
pub trait PlayerSource {
    fn load_players(&self) -> Result<Vec<PlayerRecord>, PoolError>;
}

/// Players read from a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvPlayerSource {
    path: PathBuf,
}

impl CsvPlayerSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvPlayerSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlayerSource for CsvPlayerSource {
    fn load_players(&self) -> Result<Vec<PlayerRecord>, PoolError> {
        let path_str = self.path.display().to_string();
        let file = std::fs::File::open(&self.path).map_err(|e| PoolError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        let players = load_players_from_reader(file).map_err(|e| PoolError::Csv {
            path: path_str.clone(),
            source: e,
        })?;
        if players.is_empty() {
            return Err(PoolError::Empty { path: path_str });
        }
        info!("loaded {} players from {}", players.len(), path_str);
        Ok(players)
    }
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    #[serde(alias = "player_id")]
    id: String,
    name: String,
    team: String,
    #[serde(alias = "opp")]
    opponent: String,
    /// Slash- or comma-joined tags, e.g. "PG/SG".
    #[serde(alias = "pos", alias = "position")]
    positions: String,
    salary: u32,
    #[serde(alias = "fpts", alias = "projection")]
    projected_points: f64,
    floor: f64,
    ceiling: f64,
    #[serde(default)]
    volatility: f64,
    #[serde(alias = "boom", default)]
    boom_probability: f64,
    #[serde(alias = "bust", default)]
    bust_probability: f64,
    #[serde(alias = "own")]
    ownership: f64,
    #[serde(alias = "usage", default)]
    usage_rate: f64,
    #[serde(default)]
    rest_days: u32,
    #[serde(alias = "minutes", default)]
    projected_minutes: f64,
    #[serde(alias = "injury", default)]
    injury_status: String,
    #[serde(alias = "spread", default)]
    game_spread: Option<f64>,
}

impl RawPlayerRow {
    fn into_record(self) -> PlayerRecord {
        PlayerRecord {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            team: self.team.trim().to_uppercase(),
            opponent: self.opponent.trim().to_uppercase(),
            positions: self
                .positions
                .split(['/', ','])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            salary: self.salary,
            projected_points: self.projected_points,
            floor: self.floor,
            ceiling: self.ceiling,
            volatility: self.volatility,
            boom_probability: self.boom_probability,
            bust_probability: self.bust_probability,
            ownership: self.ownership,
            usage_rate: self.usage_rate,
            rest_days: self.rest_days,
            projected_minutes: self.projected_minutes,
            injury_status: InjuryStatus::from_str_status(self.injury_status.trim()),
            game_spread: self.game_spread,
        }
    }
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut players = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for result in reader.deserialize::<RawPlayerRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };
        let record = raw.into_record();

        if record.id.is_empty() {
            warn!("skipping player '{}': empty id", record.name);
            continue;
        }
        let issues = record.check();
        if let Some(issue) = issues.first() {
            warn!("skipping player '{}': {}", record.name, issue);
            continue;
        }
        if record.eligible_slots().is_empty() {
            warn!(
                "player '{}' has no recognized position in {:?}; kept but unplaceable",
                record.name, record.positions
            );
        }
        if !seen.insert(record.id.clone()) {
            warn!("duplicate player id '{}', keeping the first row", record.id);
            continue;
        }
        players.push(record);
    }
    Ok(players)
}
