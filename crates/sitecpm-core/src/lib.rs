//! # sitecpm-core
//!
//! Core domain model and traits for the sitecpm construction sequencing engine.
//!
//! This crate provides:
//! - Domain types: `Activity`, `CostRates`, `CrewSplit`, `EquipmentMode`
//! - Runtime inputs: `CompletionLedger`, `Overrides`
//! - Result types: `ScheduleResult`, `SequenceOption`, `ScoreBreakdown`
//! - Diagnostics, error types and the `Scheduler` trait
//!
//! ## Example
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use sitecpm_core::{Activity, EquipmentMode};
//!
//! let excavation = Activity::new("A1")
//!     .name("Excavation")
//!     .duration(3)
//!     .start_day(1)
//!     .manpower(10)
//!     .manpower_cost(Decimal::from(5000));
//! let footing = Activity::new("A2")
//!     .name("Footing")
//!     .duration(2)
//!     .start_day(4)
//!     .depends_on("A1");
//!
//! assert_eq!(footing.dependencies, vec!["A1".to_string()]);
//! assert_eq!(excavation.rates.equipment_per_day(EquipmentMode::None), Decimal::ZERO);
//! ```

pub mod diagnostics;
pub mod ledger;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use diagnostics::{CollectingEmitter, Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity};
pub use ledger::{CompletionLedger, LedgerStore, MemoryLedgerStore, ToggleOutcome};

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for an activity
pub type ActivityId = String;

/// 1-based simulated project day
pub type Day = i64;

// ============================================================================
// Equipment
// ============================================================================

/// How an activity's equipment is sourced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentMode {
    Rented,
    #[default]
    Owned,
    #[serde(alias = "no_equipment")]
    None,
}

impl EquipmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentMode::Rented => "rented",
            EquipmentMode::Owned => "owned",
            EquipmentMode::None => "none",
        }
    }
}

impl std::fmt::Display for EquipmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EquipmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rented" => Ok(EquipmentMode::Rented),
            "owned" => Ok(EquipmentMode::Owned),
            "none" | "no_equipment" => Ok(EquipmentMode::None),
            other => Err(format!(
                "unknown equipment mode '{}' (expected rented, owned or none)",
                other
            )),
        }
    }
}

// ============================================================================
// Cost Rates
// ============================================================================

/// Daily cost rates of an activity
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRates {
    /// Full-crew manpower cost per day
    #[serde(rename = "manpower_cost_per_day")]
    pub manpower_per_day: Decimal,
    #[serde(rename = "rented_equipment_cost_per_day")]
    pub rented_equipment_per_day: Decimal,
    /// Operation and maintenance cost of owned equipment
    #[serde(
        rename = "owned_equipment_cost_per_day",
        alias = "owned_equipment_om_cost_per_day"
    )]
    pub owned_equipment_per_day: Decimal,
    #[serde(rename = "no_equipment_cost_per_day")]
    pub no_equipment_per_day: Decimal,
    #[serde(rename = "site_overhead_cost_per_day")]
    pub site_overhead_per_day: Decimal,
}

impl CostRates {
    /// Daily equipment cost for the given sourcing mode
    pub fn equipment_per_day(&self, mode: EquipmentMode) -> Decimal {
        match mode {
            EquipmentMode::Rented => self.rented_equipment_per_day,
            EquipmentMode::Owned => self.owned_equipment_per_day,
            EquipmentMode::None => self.no_equipment_per_day,
        }
    }

    /// Name of the first negative rate, if any
    pub fn first_negative(&self) -> Option<&'static str> {
        [
            ("manpower_cost_per_day", self.manpower_per_day),
            ("rented_equipment_cost_per_day", self.rented_equipment_per_day),
            ("owned_equipment_cost_per_day", self.owned_equipment_per_day),
            ("no_equipment_cost_per_day", self.no_equipment_per_day),
            ("site_overhead_cost_per_day", self.site_overhead_per_day),
        ]
        .into_iter()
        .find(|(_, rate)| rate.is_sign_negative() && !rate.is_zero())
        .map(|(name, _)| name)
    }
}

// ============================================================================
// Crew
// ============================================================================

/// Skill class of a crew member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewClass {
    Skilled,
    SemiSkilled,
    Unskilled,
}

impl CrewClass {
    pub const ALL: [CrewClass; 3] = [CrewClass::Skilled, CrewClass::SemiSkilled, CrewClass::Unskilled];
}

/// Head count and per-worker daily rate of one crew class
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewShare {
    pub count: u32,
    pub rate_per_day: Decimal,
}

impl CrewShare {
    pub fn new(count: u32, rate_per_day: impl Into<Decimal>) -> Self {
        Self {
            count,
            rate_per_day: rate_per_day.into(),
        }
    }
}

/// Planned manpower split into skill classes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewSplit {
    pub skilled: CrewShare,
    pub semi_skilled: CrewShare,
    pub unskilled: CrewShare,
}

impl CrewSplit {
    pub fn share(&self, class: CrewClass) -> &CrewShare {
        match class {
            CrewClass::Skilled => &self.skilled,
            CrewClass::SemiSkilled => &self.semi_skilled,
            CrewClass::Unskilled => &self.unskilled,
        }
    }

    pub fn headcount(&self) -> u32 {
        CrewClass::ALL.iter().map(|c| self.share(*c).count).sum()
    }

    /// Daily cost of the full planned crew
    pub fn daily_cost(&self) -> Decimal {
        self.cost_for(&self.planned_counts())
    }

    /// Daily cost of a crew of the given size, at this split's rates
    pub fn cost_for(&self, counts: &CrewCounts) -> Decimal {
        CrewClass::ALL
            .iter()
            .map(|c| self.share(*c).rate_per_day * Decimal::from(counts.get(*c)))
            .sum()
    }

    pub fn planned_counts(&self) -> CrewCounts {
        CrewCounts {
            skilled: self.skilled.count,
            semi_skilled: self.semi_skilled.count,
            unskilled: self.unskilled.count,
        }
    }
}

/// Head counts per crew class
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewCounts {
    pub skilled: u32,
    pub semi_skilled: u32,
    pub unskilled: u32,
}

impl CrewCounts {
    pub fn get(&self, class: CrewClass) -> u32 {
        match class {
            CrewClass::Skilled => self.skilled,
            CrewClass::SemiSkilled => self.semi_skilled,
            CrewClass::Unskilled => self.unskilled,
        }
    }

    pub fn get_mut(&mut self, class: CrewClass) -> &mut u32 {
        match class {
            CrewClass::Skilled => &mut self.skilled,
            CrewClass::SemiSkilled => &mut self.semi_skilled,
            CrewClass::Unskilled => &mut self.unskilled,
        }
    }

    pub fn total(&self) -> u32 {
        self.skilled + self.semi_skilled + self.unskilled
    }
}

// ============================================================================
// Activity
// ============================================================================

/// One schedulable unit of site work
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier
    pub id: ActivityId,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Duration in days (must be >= 1)
    pub duration: i64,
    /// Planned start day (1-based)
    pub start_day: Day,
    /// Predecessor activity ids
    #[serde(default, alias = "dependency_ids")]
    pub dependencies: Vec<ActivityId>,
    /// Planned crew size (ignored when `crew` is set)
    #[serde(default)]
    pub planned_manpower: u32,
    /// Optional skill split of the planned crew
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew: Option<CrewSplit>,
    #[serde(flatten)]
    pub rates: CostRates,
}

impl Activity {
    /// Create a one-day activity starting on day 1
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            duration: 1,
            start_day: 1,
            dependencies: Vec::new(),
            planned_manpower: 0,
            crew: None,
            rates: CostRates::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn duration(mut self, days: i64) -> Self {
        self.duration = days;
        self
    }

    pub fn start_day(mut self, day: Day) -> Self {
        self.start_day = day;
        self
    }

    pub fn depends_on(mut self, predecessor: impl Into<String>) -> Self {
        self.dependencies.push(predecessor.into());
        self
    }

    pub fn manpower(mut self, count: u32) -> Self {
        self.planned_manpower = count;
        self
    }

    pub fn crew(mut self, crew: CrewSplit) -> Self {
        self.crew = Some(crew);
        self
    }

    pub fn manpower_cost(mut self, per_day: impl Into<Decimal>) -> Self {
        self.rates.manpower_per_day = per_day.into();
        self
    }

    /// Set rented, owned and no-equipment daily costs
    pub fn equipment_costs(
        mut self,
        rented: impl Into<Decimal>,
        owned: impl Into<Decimal>,
        none: impl Into<Decimal>,
    ) -> Self {
        self.rates.rented_equipment_per_day = rented.into();
        self.rates.owned_equipment_per_day = owned.into();
        self.rates.no_equipment_per_day = none.into();
        self
    }

    pub fn site_overhead(mut self, per_day: impl Into<Decimal>) -> Self {
        self.rates.site_overhead_per_day = per_day.into();
        self
    }

    /// Planned head count, taken from the crew split when present
    pub fn planned_headcount(&self) -> u32 {
        self.crew
            .as_ref()
            .map(|c| c.headcount())
            .unwrap_or(self.planned_manpower)
    }

    /// Full-crew manpower cost per day
    pub fn manpower_cost_per_day(&self) -> Decimal {
        self.crew
            .as_ref()
            .map(|c| c.daily_cost())
            .unwrap_or(self.rates.manpower_per_day)
    }

    /// Planned (start, finish) days, inclusive
    pub fn planned_window(&self) -> (Day, Day) {
        (self.start_day, self.start_day + self.duration - 1)
    }

    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }
}

// ============================================================================
// Runtime Inputs
// ============================================================================

/// Caller-supplied runtime values for one activity
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityOverride {
    /// Workers deployed elsewhere (deducted from planned manpower)
    pub idle_manpower: Option<u32>,
    /// Per-class idle counts for activities with a crew split
    pub idle_crew: Option<CrewCounts>,
    /// Material availability in percent (0-100)
    pub material_percent: Option<f64>,
    pub equipment: Option<EquipmentMode>,
}

/// Per-request overrides keyed by activity id
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub activities: BTreeMap<ActivityId, ActivityOverride>,
    /// Activities whose completion state is toggled on the current day
    pub completion_toggles: Vec<ActivityId>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&ActivityOverride> {
        self.activities.get(id)
    }

    pub fn idle_manpower(mut self, id: impl Into<String>, idle: u32) -> Self {
        self.activities.entry(id.into()).or_default().idle_manpower = Some(idle);
        self
    }

    pub fn idle_crew(mut self, id: impl Into<String>, idle: CrewCounts) -> Self {
        self.activities.entry(id.into()).or_default().idle_crew = Some(idle);
        self
    }

    pub fn material_percent(mut self, id: impl Into<String>, percent: f64) -> Self {
        self.activities.entry(id.into()).or_default().material_percent = Some(percent);
        self
    }

    pub fn equipment(mut self, id: impl Into<String>, mode: EquipmentMode) -> Self {
        self.activities.entry(id.into()).or_default().equipment = Some(mode);
        self
    }

    pub fn toggle_completion(mut self, id: impl Into<String>) -> Self {
        self.completion_toggles.push(id.into());
        self
    }
}

/// Resolved runtime attributes of an activity for one request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiteConditions {
    /// Workers on site after idle deduction
    pub available_manpower: u32,
    /// Per-class availability (crew-split activities only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_crew: Option<CrewCounts>,
    /// Material availability ratio in [0, 1]
    pub material: f64,
    pub equipment: EquipmentMode,
}

impl SiteConditions {
    /// Full crew, full material, owned equipment
    pub fn planned(activity: &Activity) -> Self {
        Self {
            available_manpower: activity.planned_headcount(),
            available_crew: activity.crew.as_ref().map(|c| c.planned_counts()),
            material: 1.0,
            equipment: EquipmentMode::default(),
        }
    }
}

// ============================================================================
// Derived Annotations
// ============================================================================

/// CPM timing of an activity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub early_start: Day,
    pub early_finish: Day,
    pub late_start: Day,
    pub late_finish: Day,
    pub total_float: i64,
    pub free_float: i64,
    /// total_float == 0
    pub is_critical: bool,
    /// Adjacent to, or sharing a neighbour with, a critical activity
    pub is_near_critical: bool,
}

/// Share of site overhead carried in an activity's delay cost
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverheadShare {
    Full,
    Half,
    #[default]
    None,
}

/// Per-day delay cost exposure of an activity on the current day
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayExposure {
    /// Adjusted manpower cost plus selected equipment cost
    pub base_per_day: Decimal,
    /// Base plus the applicable overhead share
    pub total_per_day: Decimal,
    pub overhead: OverheadShare,
    /// Days past planned start
    pub delay_days: i64,
    /// Delay days not absorbed by free float
    pub chargeable_days: i64,
    pub within_free_float: bool,
}

impl DelayExposure {
    /// Cost accrued by the chargeable delay at the current rate
    pub fn accrued(&self) -> Decimal {
        self.total_per_day * Decimal::from(self.chargeable_days)
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Fixed weights of the composite priority score
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub delay: f64,
    pub equipment: f64,
    pub manpower: f64,
    pub material: f64,
    pub critical_path: f64,
}

impl ScoreWeights {
    pub const STANDARD: ScoreWeights = ScoreWeights {
        delay: 35.0,
        equipment: 25.0,
        manpower: 15.0,
        material: 10.0,
        critical_path: 15.0,
    };

    pub fn total(&self) -> f64 {
        self.delay + self.equipment + self.manpower + self.material + self.critical_path
    }
}

/// Component scores of one activity, rounded to two decimals
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: f64,
    pub delay: f64,
    pub equipment: f64,
    pub manpower: f64,
    pub material: f64,
    pub critical_path: f64,
}

// ============================================================================
// Sequencing
// ============================================================================

/// One activity at a position of a candidate sequence
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequencedActivity {
    pub id: ActivityId,
    pub position: usize,
    /// Delay cost charged at this position
    pub delay_cost: Decimal,
    pub score: ScoreBreakdown,
}

/// One ordering of the ready set
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceOption {
    pub sequence: Vec<ActivityId>,
    pub total_delay_cost: Decimal,
    pub activities: Vec<SequencedActivity>,
    pub is_best: bool,
}

/// How the sequence options were produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Every permutation evaluated
    #[default]
    Exhaustive,
    /// One option per leading activity; an approximation of full enumeration
    Heuristic,
}

/// Best ordering of the ready set and all evaluated options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequencePlan {
    pub best: Vec<ActivityId>,
    pub min_cost: Decimal,
    pub options: Vec<SequenceOption>,
    pub search: SearchMode,
}

impl SequencePlan {
    pub fn best_option(&self) -> Option<&SequenceOption> {
        self.options.iter().find(|o| o.is_best)
    }

    pub fn first(&self) -> Option<&ActivityId> {
        self.best.first()
    }
}

// ============================================================================
// Schedule (Result)
// ============================================================================

/// Completion status relative to the current day
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    #[default]
    Pending,
    CompletedToday,
    Completed,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Pending => "Pending",
            ActivityStatus::CompletedToday => "Completed Today",
            ActivityStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory note attached to a ready activity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub message: String,
    pub is_critical: bool,
    pub recommendation: String,
}

/// A ready activity with its priority score
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedActivity {
    pub id: ActivityId,
    pub name: String,
    pub score: ScoreBreakdown,
    pub timing: Timing,
    pub exposure: DelayExposure,
    pub conditions: SiteConditions,
    /// Leads the best sequence
    pub is_first_in_sequence: bool,
    /// Delay cost per day this activity is exposed to in the best sequence
    pub delay_cost_per_day: Decimal,
    /// Other members of this activity's parallel group
    pub parallel_group: Vec<ActivityId>,
    pub advisories: Vec<Advisory>,
}

/// Planned versus actual figures of one activity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub id: ActivityId,
    pub name: String,
    pub status: ActivityStatus,
    pub actual_completion_day: Option<Day>,
    pub planned_finish_day: Day,
    pub delay_days: i64,
    pub equipment: EquipmentMode,
    pub per_day_cost: Decimal,
    pub planned_cost: Decimal,
    pub actual_cost: Decimal,
    pub delay_cost: Decimal,
    pub total_float: i64,
    pub free_float: i64,
    pub remaining_free_float: i64,
    pub within_free_float: bool,
}

/// One activity's contribution to a project day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayCostDetail {
    pub id: ActivityId,
    pub name: String,
    pub planned: Decimal,
    pub actual: Decimal,
    pub overrun: Decimal,
    pub status: ActivityStatus,
}

/// Planned, actual and overrun spend on one project day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayCost {
    pub day: Day,
    pub planned: Decimal,
    pub actual: Decimal,
    pub overrun: Decimal,
    pub details: Vec<DayCostDetail>,
}

/// An activity removed from ranking, with the reason
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub activity: ActivityId,
    pub reason: String,
}

/// The result of one scheduling request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub current_day: Day,
    /// Maximum early finish over all activities
    pub project_duration: i64,
    /// Zero-float chains, each from a start activity to a terminal one
    pub critical_paths: Vec<Vec<ActivityId>>,
    /// Ready activities, highest score first
    pub ranked: Vec<RankedActivity>,
    pub sequence: SequencePlan,
    pub parallel_groups: Vec<Vec<ActivityId>>,
    pub summary: Vec<ActivitySummary>,
    pub daywise_costs: Vec<DayCost>,
    pub exclusions: Vec<Exclusion>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScheduleResult {
    pub fn ranked_ids(&self) -> Vec<&str> {
        self.ranked.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn summary_for(&self, id: &str) -> Option<&ActivitySummary> {
        self.summary.iter().find(|s| s.id == id)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Core scheduling abstraction
pub trait Scheduler: Send + Sync {
    /// Run one scheduling request for the given simulated day.
    ///
    /// Completion toggles in `overrides` are applied to `ledger` before any
    /// computation.
    fn run(
        &self,
        activities: &[Activity],
        ledger: &mut CompletionLedger,
        current_day: Day,
        overrides: &Overrides,
    ) -> Result<ScheduleResult, ScheduleError>;

    /// Check activities for configuration errors without scheduling.
    /// Non-fatal findings are returned as diagnostics.
    fn validate(&self, activities: &[Activity]) -> Result<Vec<Diagnostic>, ScheduleError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Malformed activity data, detected at load time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("activity #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate activity id '{id}'")]
    DuplicateActivity { id: ActivityId },

    #[error("activity '{activity}' depends on '{missing}' which doesn't exist")]
    MissingDependency {
        activity: ActivityId,
        missing: ActivityId,
    },

    #[error("cyclic dependency involving activities: {}", .activities.join(", "))]
    CyclicDependency { activities: Vec<ActivityId> },

    #[error("activity '{activity}' has invalid duration {duration} (must be >= 1)")]
    InvalidDuration { activity: ActivityId, duration: i64 },

    #[error("activity '{activity}' has invalid start day {start_day} (days start at 1)")]
    InvalidStartDay { activity: ActivityId, start_day: Day },
}

impl ConfigError {
    /// The activity the error is reported against
    pub fn activity(&self) -> Option<&str> {
        match self {
            ConfigError::EmptyId { .. } => None,
            ConfigError::DuplicateActivity { id } => Some(id.as_str()),
            ConfigError::MissingDependency { activity, .. }
            | ConfigError::InvalidDuration { activity, .. }
            | ConfigError::InvalidStartDay { activity, .. } => Some(activity.as_str()),
            ConfigError::CyclicDependency { activities } => activities.first().map(|s| s.as_str()),
        }
    }

    /// Report this error as a fatal E001 diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::new(DiagnosticCode::E001InvalidActivityData, self.to_string());
        let diagnostic = match self.activity() {
            Some(id) => diagnostic.for_activity(id),
            None => diagnostic,
        };
        match self {
            ConfigError::MissingDependency { .. } => {
                diagnostic.with_hint("fix the dependency id, or schedule with strict_references = false")
            }
            ConfigError::CyclicDependency { .. } => {
                diagnostic.with_hint("remove one dependency from the cycle")
            }
            _ => diagnostic,
        }
    }
}

/// Scheduling error
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid activity configuration: {}", join_errors(.0))]
    Config(Vec<ConfigError>),

    #[error("Activity not found: {0}")]
    UnknownActivity(ActivityId),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScheduleError {
    pub fn config_errors(&self) -> &[ConfigError] {
        match self {
            ScheduleError::Config(errors) => errors,
            _ => &[],
        }
    }
}

impl From<ConfigError> for ScheduleError {
    fn from(err: ConfigError) -> Self {
        ScheduleError::Config(vec![err])
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Completion ledger persistence error
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),
}

// ============================================================================
// Tests
// ============================================================================
