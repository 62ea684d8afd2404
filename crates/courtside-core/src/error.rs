// Engine error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failures the engine reports to its caller. None of them are fatal to the
/// process; the caller decides whether to retry with relaxed settings.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineError {
    /// Malformed or contradictory settings, rejected before any search.
    #[error("invalid setting `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Filtering left too few players to fill a lineup.
    #[error("not enough eligible players: {reason}")]
    EmptyPool { reason: String },

    /// No lineup satisfying every hard constraint could be built.
    #[error("no feasible lineup: {reason}")]
    Infeasible { reason: String },
}

impl EngineError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn empty_pool(reason: impl Into<String>) -> Self {
        EngineError::EmptyPool {
            reason: reason.into(),
        }
    }

    pub(crate) fn infeasible(reason: impl Into<String>) -> Self {
        EngineError::Infeasible {
            reason: reason.into(),
        }
    }
}

/// Notice attached to a response that holds fewer lineups than requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialFailure {
    pub requested: usize,
    pub produced: usize,
    pub reasons: Vec<String>,
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "produced {} of {} requested lineups",
            self.produced, self.requested
        )?;
        if !self.reasons.is_empty() {
            write!(f, ": {}", self.reasons.join("; "))?;
        }
        Ok(())
    }
}
