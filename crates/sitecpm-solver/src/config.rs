//! Scheduler configuration
//!
//! All fields have defaults, so an empty TOML document is a valid config.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest ready set the optimizer will ever enumerate exhaustively
pub const EXHAUSTIVE_CEILING: usize = 9;

/// Top-level configuration for [`crate::SiteScheduler`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Reject dependencies on unknown activity ids instead of dropping them
    pub strict_references: bool,
    pub optimizer: OptimizerConfig,
    pub advisory: AdvisoryConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            strict_references: true,
            optimizer: OptimizerConfig::default(),
            advisory: AdvisoryConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn lenient() -> Self {
        Self {
            strict_references: false,
            ..Self::default()
        }
    }
}

/// Sequence optimizer limits
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Ready-set size above which heuristic sequencing is used
    pub max_exhaustive: usize,
    /// Evaluate permutations on the rayon pool
    pub parallel: bool,
    /// Wall-clock budget for exhaustive enumeration
    pub time_budget_ms: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_exhaustive: 8,
            parallel: true,
            time_budget_ms: None,
        }
    }
}

impl OptimizerConfig {
    /// `max_exhaustive` capped at [`EXHAUSTIVE_CEILING`]
    pub fn exhaustive_limit(&self) -> usize {
        self.max_exhaustive.min(EXHAUSTIVE_CEILING)
    }
}

/// Thresholds for per-activity advisories
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub max_site_manpower: u32,
    pub high_cost_threshold: Decimal,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            max_site_manpower: 1000,
            high_cost_threshold: Decimal::from(1_000_000),
        }
    }
}
