// Optimization settings: structured, typed, validated once at the boundary.

use std::collections::HashSet;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EngineError;
use crate::slot::LINEUP_SIZE;

/// Fixed salary cap for a classic basketball slate.
pub const SALARY_CAP: u32 = 50_000;

/// Upper bound on lineups per request.
pub const MAX_LINEUPS: usize = 150;

/// Upper bound on the GPP randomness percentage.
pub const MAX_RANDOMNESS: f64 = 30.0;

// ---------------------------------------------------------------------------
// Modes and strategies
// ---------------------------------------------------------------------------

/// Contest type the lineups are built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Head-to-head and double-ups: favor floor and safety.
    #[default]
    Cash,
    /// Tournaments: favor ceiling and low ownership.
    Gpp,
}

/// GPP weighting variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GppStrategy {
    MaxLeverage,
    #[default]
    Balanced,
    Contrarian,
}

// ---------------------------------------------------------------------------
// Threshold groups
// ---------------------------------------------------------------------------

/// Cash-mode screens and scoring switches. `None` disables a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashSettings {
    pub min_floor: Option<f64>,
    pub max_volatility: Option<f64>,
    pub max_bust_probability: Option<f64>,
    pub min_projected_minutes: Option<f64>,
    /// Penalize players in games expected to be lopsided.
    pub avoid_blowouts: bool,
    /// Absolute spread above which a game counts as a blowout risk.
    pub blowout_spread: f64,
}

impl Default for CashSettings {
    fn default() -> Self {
        CashSettings {
            min_floor: None,
            max_volatility: None,
            max_bust_probability: None,
            min_projected_minutes: None,
            avoid_blowouts: true,
            blowout_spread: 12.0,
        }
    }
}

/// GPP-mode screens, weighting strategy, jitter and chalk control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GppSettings {
    pub strategy: GppStrategy,
    pub min_leverage: Option<f64>,
    pub min_boom_probability: Option<f64>,
    pub min_ceiling: Option<f64>,
    /// Percentage (0..=30) of multiplicative jitter applied per attempt.
    pub randomness: f64,
    /// Ownership at or above which a player is chalk.
    pub chalk_threshold: f64,
    /// Hard cap on chalk players per lineup.
    pub max_chalk_players: Option<usize>,
}

impl Default for GppSettings {
    fn default() -> Self {
        GppSettings {
            strategy: GppStrategy::Balanced,
            min_leverage: None,
            min_boom_probability: None,
            min_ceiling: None,
            randomness: 10.0,
            chalk_threshold: 25.0,
            max_chalk_players: Some(3),
        }
    }
}

/// Screens applied in both modes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedFilters {
    pub min_rest_days: Option<u32>,
    pub min_usage: Option<f64>,
    pub min_projection: Option<f64>,
}

// ---------------------------------------------------------------------------
// Exposure tiers
// ---------------------------------------------------------------------------

/// Ownership tier used for exposure caps and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureTier {
    Chalk,
    Mid,
    Leverage,
}

/// Tier boundaries and per-tier caps on the fraction of lineups a player
/// may appear in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureSettings {
    /// Ownership at or above which a player is in the chalk tier.
    pub chalk_ownership: f64,
    /// Ownership below which a player is in the leverage tier.
    pub leverage_ownership: f64,
    pub chalk_cap: f64,
    pub mid_cap: f64,
    pub leverage_cap: f64,
    /// Fraction of lineups every eligible player should reach, if set.
    pub min_exposure: Option<f64>,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        ExposureSettings {
            chalk_ownership: 25.0,
            leverage_ownership: 10.0,
            chalk_cap: 1.0,
            mid_cap: 1.0,
            leverage_cap: 1.0,
            min_exposure: None,
        }
    }
}

/// Slack applied when turning a fractional cap into a lineup count.
const CAP_EPSILON: f64 = 1e-9;

impl ExposureSettings {
    pub fn tier_for(&self, ownership: f64) -> ExposureTier {
        if ownership >= self.chalk_ownership {
            ExposureTier::Chalk
        } else if ownership < self.leverage_ownership {
            ExposureTier::Leverage
        } else {
            ExposureTier::Mid
        }
    }

    pub fn cap_for(&self, tier: ExposureTier) -> f64 {
        match tier {
            ExposureTier::Chalk => self.chalk_cap,
            ExposureTier::Mid => self.mid_cap,
            ExposureTier::Leverage => self.leverage_cap,
        }
    }

    /// Most lineups out of `num_lineups` a player of `tier` may appear in.
    ///
    /// `floor(cap * N)`, but never below one: a single appearance is always
    /// allowed, which is the rounding tolerance for small batches.
    pub fn max_appearances(&self, tier: ExposureTier, num_lineups: usize) -> usize {
        let raw = (self.cap_for(tier) * num_lineups as f64 + CAP_EPSILON).floor() as usize;
        raw.clamp(1, num_lineups.max(1))
    }

    /// Lineups out of `num_lineups` each player should reach, if a minimum is set.
    pub fn min_appearances(&self, num_lineups: usize) -> Option<usize> {
        self.min_exposure
            .filter(|m| *m > 0.0)
            .map(|m| (m * num_lineups as f64 - CAP_EPSILON).ceil().max(0.0) as usize)
    }
}

// ---------------------------------------------------------------------------
// Diversity and search budgets
// ---------------------------------------------------------------------------

/// Team and game concentration limits for a single lineup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityRules {
    pub max_per_team: usize,
    pub min_teams: usize,
    pub min_games: usize,
}

impl Default for DiversityRules {
    fn default() -> Self {
        DiversityRules {
            max_per_team: 4,
            min_teams: 2,
            min_games: 2,
        }
    }
}

/// Fixed budgets bounding every search so no request stalls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    /// Assignments undone before one construction attempt gives up.
    pub max_backtracks: usize,
    /// Rejected swap trials before the refiner stops.
    pub max_refine_attempts: usize,
    /// Construction attempts per lineup before the batch stops.
    pub attempts_per_lineup: usize,
    /// Lineups constructed against one exposure snapshot before committing.
    pub round_width: usize,
}

impl Default for SearchBudget {
    fn default() -> Self {
        SearchBudget {
            max_backtracks: 5_000,
            max_refine_attempts: 400,
            attempts_per_lineup: 12,
            round_width: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level settings
// ---------------------------------------------------------------------------

/// Everything one optimization request is parameterized by.
///
/// Deserializing reads `mode` first and fills every key the input leaves out
/// from `for_mode(mode)`, merging nested tables key by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, remote = "Self")]
pub struct OptimizationSettings {
    pub mode: Mode,
    pub num_lineups: usize,
    pub salary_cap: u32,
    pub min_salary: u32,
    /// Player ids forced into every lineup.
    pub locked: Vec<String>,
    /// Player ids kept out of every lineup. Wins over a lock.
    pub excluded: Vec<String>,
    pub cash: CashSettings,
    pub gpp: GppSettings,
    pub advanced: AdvancedFilters,
    pub exposure: ExposureSettings,
    pub diversity: DiversityRules,
    /// Seed for all jitter; identical inputs and seed give identical output.
    pub seed: u64,
    pub budget: SearchBudget,
    /// Construct lineups of a round on the rayon pool.
    pub parallel: bool,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        OptimizationSettings::for_mode(Mode::Cash)
    }
}

impl Serialize for OptimizationSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OptimizationSettings::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for OptimizationSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        OptimizationSettings::from_value(value).map_err(de::Error::custom)
    }
}

impl OptimizationSettings {
    /// Defaults for a contest mode.
    ///
    /// Cash spends close to the cap and leaves exposure uncapped; GPP leaves
    /// more room, jitters utilities and caps exposure by ownership tier.
    pub fn for_mode(mode: Mode) -> Self {
        let (min_salary, exposure, gpp) = match mode {
            Mode::Cash => (
                48_000,
                ExposureSettings::default(),
                GppSettings {
                    randomness: 0.0,
                    max_chalk_players: None,
                    ..GppSettings::default()
                },
            ),
            Mode::Gpp => (
                47_000,
                ExposureSettings {
                    chalk_cap: 0.5,
                    mid_cap: 0.6,
                    leverage_cap: 0.8,
                    ..ExposureSettings::default()
                },
                GppSettings::default(),
            ),
        };
        OptimizationSettings {
            mode,
            num_lineups: 1,
            salary_cap: SALARY_CAP,
            min_salary,
            locked: Vec::new(),
            excluded: Vec::new(),
            cash: CashSettings::default(),
            gpp,
            advanced: AdvancedFilters::default(),
            exposure,
            diversity: DiversityRules::default(),
            seed: 0,
            budget: SearchBudget::default(),
            parallel: false,
        }
    }

    /// Settings from a partial document: defaults for its `mode` (cash when
    /// absent), overridden by every key it sets.
    ///
    /// An unreadable mode is reported against `mode`; any other shape error
    /// against `settings`.
    pub fn from_value(value: serde_json::Value) -> Result<Self, EngineError> {
        let mode = match value.get("mode") {
            Some(mode) => {
                Mode::deserialize(mode).map_err(|e| EngineError::validation("mode", e.to_string()))?
            }
            None => Mode::default(),
        };
        let mut merged = serde_json::to_value(OptimizationSettings::for_mode(mode))
            .map_err(|e| EngineError::validation("settings", e.to_string()))?;
        merge(&mut merged, value);
        OptimizationSettings::deserialize(merged)
            .map_err(|e| EngineError::validation("settings", e.to_string()))
    }

    /// Chalk cap in force for this mode (GPP only).
    pub fn chalk_limit(&self) -> Option<usize> {
        match self.mode {
            Mode::Cash => None,
            Mode::Gpp => self.gpp.max_chalk_players,
        }
    }

    /// Reject malformed or contradictory settings before any search.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.num_lineups == 0 {
            return Err(EngineError::validation("num_lineups", "must be at least 1"));
        }
        if self.num_lineups > MAX_LINEUPS {
            return Err(EngineError::validation(
                "num_lineups",
                format!("must be at most {MAX_LINEUPS}, got {}", self.num_lineups),
            ));
        }
        if self.salary_cap == 0 {
            return Err(EngineError::validation("salary_cap", "must be greater than 0"));
        }
        if self.min_salary > self.salary_cap {
            return Err(EngineError::validation(
                "min_salary",
                format!(
                    "{} exceeds salary_cap {}",
                    self.min_salary, self.salary_cap
                ),
            ));
        }

        let mut seen = HashSet::new();
        for id in &self.locked {
            if !seen.insert(id.as_str()) {
                return Err(EngineError::validation(
                    "locked",
                    format!("player {id} is listed more than once"),
                ));
            }
        }
        if self.locked.len() > LINEUP_SIZE {
            return Err(EngineError::validation(
                "locked",
                format!(
                    "{} players locked but a lineup holds {LINEUP_SIZE}",
                    self.locked.len()
                ),
            ));
        }
        if let Some(id) = self.locked.iter().find(|id| self.excluded.contains(id)) {
            return Err(EngineError::validation(
                "locked",
                format!("player {id} is both locked and excluded"),
            ));
        }

        let r = self.gpp.randomness;
        if !(0.0..=MAX_RANDOMNESS).contains(&r) {
            return Err(EngineError::validation(
                "gpp.randomness",
                format!("must be within 0..={MAX_RANDOMNESS}, got {r}"),
            ));
        }
        if !(0.0..=100.0).contains(&self.gpp.chalk_threshold) {
            return Err(EngineError::validation(
                "gpp.chalk_threshold",
                format!("must be within 0..=100, got {}", self.gpp.chalk_threshold),
            ));
        }
        if !self.cash.blowout_spread.is_finite() || self.cash.blowout_spread < 0.0 {
            return Err(EngineError::validation(
                "cash.blowout_spread",
                format!("must be a non-negative number, got {}", self.cash.blowout_spread),
            ));
        }

        let thresholds: [(&str, Option<f64>); 9] = [
            ("cash.min_floor", self.cash.min_floor),
            ("cash.max_volatility", self.cash.max_volatility),
            ("cash.max_bust_probability", self.cash.max_bust_probability),
            ("cash.min_projected_minutes", self.cash.min_projected_minutes),
            ("gpp.min_leverage", self.gpp.min_leverage),
            ("gpp.min_boom_probability", self.gpp.min_boom_probability),
            ("gpp.min_ceiling", self.gpp.min_ceiling),
            ("advanced.min_usage", self.advanced.min_usage),
            ("advanced.min_projection", self.advanced.min_projection),
        ];
        for (field, value) in thresholds {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(EngineError::validation(field, "must be finite"));
                }
            }
        }

        let exp = &self.exposure;
        for (field, cap) in [
            ("exposure.chalk_cap", exp.chalk_cap),
            ("exposure.mid_cap", exp.mid_cap),
            ("exposure.leverage_cap", exp.leverage_cap),
        ] {
            if !(cap > 0.0 && cap <= 1.0) {
                return Err(EngineError::validation(
                    field,
                    format!("must be within (0, 1], got {cap}"),
                ));
            }
        }
        if let Some(min) = exp.min_exposure {
            if !(0.0..=1.0).contains(&min) {
                return Err(EngineError::validation(
                    "exposure.min_exposure",
                    format!("must be within 0..=1, got {min}"),
                ));
            }
        }
        if !(0.0..=100.0).contains(&exp.leverage_ownership)
            || !(0.0..=100.0).contains(&exp.chalk_ownership)
        {
            return Err(EngineError::validation(
                "exposure.chalk_ownership",
                "tier boundaries must be within 0..=100",
            ));
        }
        if exp.leverage_ownership > exp.chalk_ownership {
            return Err(EngineError::validation(
                "exposure.leverage_ownership",
                format!(
                    "{} is above chalk_ownership {}",
                    exp.leverage_ownership, exp.chalk_ownership
                ),
            ));
        }

        let div = &self.diversity;
        if div.max_per_team == 0 || div.max_per_team > LINEUP_SIZE {
            return Err(EngineError::validation(
                "diversity.max_per_team",
                format!("must be within 1..={LINEUP_SIZE}, got {}", div.max_per_team),
            ));
        }
        if div.min_teams > LINEUP_SIZE {
            return Err(EngineError::validation(
                "diversity.min_teams",
                format!("must be at most {LINEUP_SIZE}, got {}", div.min_teams),
            ));
        }
        if div.min_games > LINEUP_SIZE {
            return Err(EngineError::validation(
                "diversity.min_games",
                format!("must be at most {LINEUP_SIZE}, got {}", div.min_games),
            ));
        }

        let budget = &self.budget;
        for (field, value) in [
            ("budget.max_backtracks", budget.max_backtracks),
            ("budget.attempts_per_lineup", budget.attempts_per_lineup),
            ("budget.round_width", budget.round_width),
        ] {
            if value == 0 {
                return Err(EngineError::validation(field, "must be at least 1"));
            }
        }

        Ok(())
    }
}

/// Overlay `overlay` onto `base`, recursing into objects present in both.
fn merge(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}
