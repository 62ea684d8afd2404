// Per-slate player records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::slot::{eligible_slots, SlotSet};

// ---------------------------------------------------------------------------
// Injury status
// ---------------------------------------------------------------------------

/// Injury designation attached to a player for the slate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjuryStatus {
    #[default]
    Healthy,
    Probable,
    Questionable,
    Doubtful,
    Out,
}

impl InjuryStatus {
    /// Parse a feed status string. Blank and unknown strings read as healthy.
    pub fn from_str_status(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "P" | "PROB" | "PROBABLE" => InjuryStatus::Probable,
            "Q" | "GTD" | "QUES" | "QUESTIONABLE" | "DAY-TO-DAY" | "DTD" => {
                InjuryStatus::Questionable
            }
            "D" | "DOUBT" | "DOUBTFUL" => InjuryStatus::Doubtful,
            "O" | "OUT" | "INJ" | "IR" => InjuryStatus::Out,
            _ => InjuryStatus::Healthy,
        }
    }

    /// Whether this is an active designation that removes the player from the
    /// pool unless locked. Probable players are expected to play.
    pub fn is_designated(&self) -> bool {
        matches!(
            self,
            InjuryStatus::Questionable | InjuryStatus::Doubtful | InjuryStatus::Out
        )
    }
}

// ---------------------------------------------------------------------------
// Player record
// ---------------------------------------------------------------------------

/// Immutable snapshot of one player on one slate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Slate-unique player identifier.
    pub id: String,
    pub name: String,
    pub team: String,
    pub opponent: String,
    /// Raw position tags as published ("PG", "SG/SF", ...).
    pub positions: Vec<String>,
    pub salary: u32,
    /// Mean fantasy-point expectation.
    pub projected_points: f64,
    /// 25th-percentile outcome.
    pub floor: f64,
    /// 75th-percentile outcome.
    pub ceiling: f64,
    /// Normalized dispersion, usually 0..1.
    pub volatility: f64,
    /// Probability (0..100) of clearing a high-score threshold.
    pub boom_probability: f64,
    /// Probability (0..100) of falling under a low-score threshold.
    pub bust_probability: f64,
    /// Projected percentage (0..100) of contest lineups rostering this player.
    pub ownership: f64,
    pub usage_rate: f64,
    pub rest_days: u32,
    #[serde(default)]
    pub projected_minutes: f64,
    #[serde(default)]
    pub injury_status: InjuryStatus,
    /// Absolute point spread of the player's game, when known.
    #[serde(default)]
    pub game_spread: Option<f64>,
}

impl PlayerRecord {
    /// Boom probability relative to ownership:
    /// `boom_probability * 100 / (ownership + 1)`.
    pub fn leverage_score(&self) -> f64 {
        self.boom_probability * 100.0 / (self.ownership + 1.0)
    }

    /// Slots this player may occupy.
    pub fn eligible_slots(&self) -> SlotSet {
        eligible_slots(&self.positions)
    }

    /// Key identifying the player's game, independent of home/away order.
    pub fn game_key(&self) -> String {
        let (a, b) = if self.team <= self.opponent {
            (&self.team, &self.opponent)
        } else {
            (&self.opponent, &self.team)
        };
        format!("{a}@{b}")
    }

    /// Check the record invariants, returning every violation found.
    pub fn check(&self) -> Vec<RecordIssue> {
        let mut issues = Vec::new();
        if self.salary == 0 {
            issues.push(RecordIssue::new(&self.id, "salary", "must be greater than 0"));
        }
        let numeric = [
            ("projected_points", self.projected_points),
            ("floor", self.floor),
            ("ceiling", self.ceiling),
            ("volatility", self.volatility),
            ("boom_probability", self.boom_probability),
            ("bust_probability", self.bust_probability),
            ("ownership", self.ownership),
            ("usage_rate", self.usage_rate),
        ];
        for (field, value) in numeric {
            if !value.is_finite() {
                issues.push(RecordIssue::new(&self.id, field, "must be finite"));
            }
        }
        for (field, value) in [
            ("ownership", self.ownership),
            ("boom_probability", self.boom_probability),
            ("bust_probability", self.bust_probability),
        ] {
            if value.is_finite() && !(0.0..=100.0).contains(&value) {
                issues.push(RecordIssue::new(
                    &self.id,
                    field,
                    &format!("must be within 0..=100, got {value}"),
                ));
            }
        }
        if self.floor > self.projected_points || self.projected_points > self.ceiling {
            issues.push(RecordIssue::new(
                &self.id,
                "projected_points",
                &format!(
                    "expected floor <= projection <= ceiling, got {} / {} / {}",
                    self.floor, self.projected_points, self.ceiling
                ),
            ));
        }
        issues
    }
}

/// One broken invariant on a player record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordIssue {
    pub player_id: String,
    pub field: String,
    pub message: String,
}

impl RecordIssue {
    fn new(player_id: &str, field: &str, message: &str) -> Self {
        RecordIssue {
            player_id: player_id.to_string(),
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}: `{}` {}", self.player_id, self.field, self.message)
    }
}
