//! # sitecpm-solver
//!
//! Sequencing solver for construction activities.
//!
//! This crate provides:
//! - Activity graph construction and validation (arena + index)
//! - Forward/backward pass CPM with total and free float
//! - Critical path enumeration
//! - Delay-cost exposure with free-float absorption
//! - Readiness against a completion ledger
//! - Ready-set sequencing and weighted priority scoring
//!
//! ## Example
//!
//! ```rust
//! use sitecpm_core::{Activity, CompletionLedger, Overrides, Scheduler};
//! use sitecpm_solver::SiteScheduler;
//!
//! let activities = vec![
//!     Activity::new("A").start_day(1).duration(2),
//!     Activity::new("B").start_day(3).duration(3).depends_on("A"),
//! ];
//! let mut ledger = CompletionLedger::new();
//!
//! let result = SiteScheduler::new()
//!     .run(&activities, &mut ledger, 1, &Overrides::new())
//!     .unwrap();
//! assert_eq!(result.project_duration, 5);
//! assert_eq!(result.ranked_ids(), vec!["A"]);
//! ```

pub mod conditions;
pub mod config;
pub mod cost;
pub mod cpm;
pub mod dag;
pub mod readiness;
pub mod scoring;
pub mod sequence;
pub mod summary;

pub use config::{AdvisoryConfig, OptimizerConfig, SchedulerConfig};
pub use cpm::{CpmEngine, CpmSchedule};
pub use dag::ActivityGraph;
pub use sequence::{SequenceItem, SequenceOptimizer};

use rust_decimal::Decimal;
use sitecpm_core::{
    Activity, CompletionLedger, Day, Diagnostic, Overrides, RankedActivity, ScheduleError, ScheduleResult,
    Scheduler, ToggleOutcome,
};
use tracing::{debug, info};

use crate::conditions::{find_exclusions, resolve_conditions};
use crate::cost::DelayCostModel;
use crate::readiness::ready_activities;
use crate::scoring::{parallel_groups, scoring_contexts, ScoringContext, ScoringEngine};

/// The scheduling pipeline: CPM, delay cost, readiness, sequencing, scoring
#[derive(Debug, Clone, Default)]
pub struct SiteScheduler {
    config: SchedulerConfig,
}

impl SiteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Apply completion toggles for known activities
    fn apply_toggles(graph: &ActivityGraph<'_>, ledger: &mut CompletionLedger, overrides: &Overrides, day: Day) {
        for id in &overrides.completion_toggles {
            if graph.index_of(id).is_none() {
                continue;
            }
            let outcome = ledger.toggle(id, day);
            if outcome != ToggleOutcome::Unchanged {
                debug!(activity = %id, ?outcome, day, "completion toggled");
            }
        }
    }
}

impl Scheduler for SiteScheduler {
    fn run(
        &self,
        activities: &[Activity],
        ledger: &mut CompletionLedger,
        current_day: Day,
        overrides: &Overrides,
    ) -> Result<ScheduleResult, ScheduleError> {
        let graph = ActivityGraph::build(activities, self.config.strict_references)?;
        Self::apply_toggles(&graph, ledger, overrides, current_day);
        let ledger: &CompletionLedger = ledger;

        let mut diagnostics = graph.dangling_diagnostics();

        // CPM
        let cpm = CpmEngine::new().compute(&graph);
        diagnostics.extend(cpm.diagnostics.iter().cloned());

        // Conditions and exclusions
        let (conditions, override_diagnostics) = resolve_conditions(&graph, overrides);
        diagnostics.extend(override_diagnostics);
        let (excluded, exclusions, exclusion_diagnostics) = find_exclusions(&graph);
        diagnostics.extend(exclusion_diagnostics);

        // Delay cost
        let exposures = DelayCostModel::new().annotate(&graph, &cpm, &conditions, current_day);

        // Readiness
        let ready = ready_activities(&graph, ledger, current_day, &excluded);
        let groups = parallel_groups(&graph, &ready);
        debug!(ready = ready.len(), groups = groups.len(), current_day, "ready set resolved");

        // Scoring and sequencing
        let scorer = ScoringEngine::new();
        let contexts = scoring_contexts(&ready, &groups, &cpm, &exposures);
        let items: Vec<SequenceItem> = ready
            .iter()
            .zip(&contexts)
            .map(|(&i, context)| {
                let (activity, timing) = (graph.activity(i), cpm.timing(i));
                let lead = ScoringContext {
                    waive_delay: true,
                    ..*context
                };
                SequenceItem {
                    id: activity.id.clone(),
                    charge: exposures[i].accrued(),
                    score: scorer.score(activity, timing, &exposures[i], &conditions[i], context),
                    lead_score: scorer.score(activity, timing, &exposures[i], &conditions[i], &lead),
                }
            })
            .collect();

        let (sequence, sequence_diagnostics) =
            SequenceOptimizer::new(self.config.optimizer.clone()).best_sequence(&items);
        diagnostics.extend(sequence_diagnostics);

        let first = sequence.first().cloned();
        let mut ranked: Vec<RankedActivity> = ready
            .iter()
            .zip(&items)
            .map(|(&i, item)| {
                let activity = graph.activity(i);
                let exposure = exposures[i];
                let is_first = first.as_deref() == Some(activity.id.as_str());
                let delay_cost_per_day = if is_first || exposure.chargeable_days == 0 {
                    Decimal::ZERO
                } else {
                    exposure.total_per_day
                };
                let parallel_group = groups
                    .iter()
                    .find(|g| g.contains(&i))
                    .map(|g| {
                        g.iter()
                            .filter(|&&m| m != i)
                            .map(|&m| graph.activity(m).id.clone())
                            .collect()
                    })
                    .unwrap_or_default();

                RankedActivity {
                    id: activity.id.clone(),
                    name: activity.name.clone(),
                    score: item.score,
                    timing: *cpm.timing(i),
                    exposure,
                    conditions: conditions[i].clone(),
                    is_first_in_sequence: is_first,
                    delay_cost_per_day,
                    parallel_group,
                    advisories: summary::advisories(activity, current_day, &self.config.advisory),
                }
            })
            .collect();
        // Stable: equal totals keep ready order
        ranked.sort_by(|a, b| b.score.total.total_cmp(&a.score.total));

        // Reporting
        let summary = summary::summarize(&graph, &cpm, &conditions, ledger, current_day);
        let daywise_costs = summary::daywise_costs(&graph, &summary, cpm.project_duration, ledger, current_day);

        info!(
            current_day,
            project_duration = cpm.project_duration,
            ready = ranked.len(),
            diagnostics = diagnostics.len(),
            "schedule computed"
        );

        Ok(ScheduleResult {
            current_day,
            project_duration: cpm.project_duration,
            critical_paths: cpm.critical_path_ids(&graph),
            ranked,
            sequence,
            parallel_groups: groups
                .iter()
                .map(|g| g.iter().map(|&m| graph.activity(m).id.clone()).collect())
                .collect(),
            summary,
            daywise_costs,
            exclusions,
            diagnostics,
        })
    }

    fn validate(&self, activities: &[Activity]) -> Result<Vec<Diagnostic>, ScheduleError> {
        let graph = ActivityGraph::build(activities, self.config.strict_references)?;
        let mut diagnostics = graph.dangling_diagnostics();
        diagnostics.extend(CpmEngine::new().compute(&graph).diagnostics);
        diagnostics.extend(find_exclusions(&graph).2);
        Ok(diagnostics)
    }
}
