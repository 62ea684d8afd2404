// Lineup optimization engine for salary-capped fantasy basketball.
//
// Pure computation: a slate of player records and a settings record go in,
// lineups and batch analytics come out. Loading slates and presenting results
// belong to the caller.

pub mod analytics;
pub mod error;
pub mod filter;
pub mod lineup;
pub mod optimizer;
pub mod player;
pub mod scoring;
pub mod settings;
pub mod slot;
pub mod validate;

#[cfg(test)]
mod fixtures;

pub use analytics::{exposure_report, lineup_totals, ExposureEntry};
pub use error::{EngineError, PartialFailure};
pub use lineup::{Lineup, LineupSlot, LineupTotals};
pub use optimizer::{
    optimize, optimize_pool, ExposureGap, ExposureTracker, OptimizationRequest,
    OptimizationResponse,
};
pub use player::{InjuryStatus, PlayerRecord, RecordIssue};
pub use settings::{GppStrategy, Mode, OptimizationSettings};
pub use slot::{SlotKind, LINEUP_SIZE};
pub use validate::{validate_lineup, validate_players, ValidationReport, ValidationRules, Violation};
