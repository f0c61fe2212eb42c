//! Weighted priority scoring of ready activities
//!
//! Five components with fixed weights (delay 35, equipment 25, manpower 15,
//! material 10, critical path 15). Each component is rounded to two
//! decimals; the total is the rounded sum of the unrounded components.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sitecpm_core::{
    Activity, CrewClass, DelayExposure, EquipmentMode, ScoreBreakdown, ScoreWeights, SiteConditions, Timing,
};

use crate::cost::manpower_ratio;
use crate::cpm::CpmSchedule;
use crate::dag::{ActivityGraph, NodeIndex};

/// Split of the manpower weight across skilled, semi-skilled and unskilled
const CREW_WEIGHTS: [(CrewClass, f64); 3] = [
    (CrewClass::Skilled, 7.0),
    (CrewClass::SemiSkilled, 5.0),
    (CrewClass::Unskilled, 3.0),
];

/// Critical-path score for an activity linked to the critical path
const NEAR_CRITICAL_SCORE: f64 = 10.0;

/// What the scorer needs to know about an activity's surroundings
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoringContext {
    /// Largest per-day delay cost in the contention group
    pub group_max_cost: Decimal,
    /// Member of a parallel group whose members are all critical
    pub group_all_critical: bool,
    /// Linked to a critical activity by an edge or a common predecessor
    pub critical_neighbour: bool,
    /// The activity leads the sequence and carries no delay score
    pub waive_delay: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    weights: ScoreWeights,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::STANDARD,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn ratio(num: Decimal, den: Decimal) -> f64 {
    if den.is_zero() {
        return 0.0;
    }
    (num / den).to_f64().unwrap_or(0.0)
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(
        &self,
        activity: &Activity,
        timing: &Timing,
        exposure: &DelayExposure,
        conditions: &SiteConditions,
        context: &ScoringContext,
    ) -> ScoreBreakdown {
        let w = &self.weights;

        let delay = if context.waive_delay || exposure.within_free_float || context.group_max_cost <= Decimal::ZERO {
            0.0
        } else {
            w.delay * ratio(exposure.total_per_day, context.group_max_cost)
        };

        let rates = &activity.rates;
        let equipment = match conditions.equipment {
            EquipmentMode::Rented => w.equipment,
            EquipmentMode::Owned => w.equipment * ratio(rates.owned_equipment_per_day, rates.rented_equipment_per_day),
            EquipmentMode::None => 0.0,
        };

        let manpower = match (activity.crew.as_ref(), conditions.available_crew.as_ref()) {
            (Some(crew), Some(available)) => CREW_WEIGHTS
                .iter()
                .map(|&(class, weight)| {
                    let planned = crew.share(class).count;
                    let sub_ratio = if planned == 0 {
                        1.0
                    } else {
                        manpower_ratio(available.get(class), planned)
                    };
                    weight * sub_ratio
                })
                .sum(),
            _ => w.manpower * manpower_ratio(conditions.available_manpower, activity.planned_headcount()),
        };

        let material = w.material * conditions.material;

        let critical_path = if timing.is_critical || context.group_all_critical {
            w.critical_path
        } else if context.critical_neighbour {
            NEAR_CRITICAL_SCORE
        } else {
            0.0
        };

        ScoreBreakdown {
            total: round2(delay + equipment + manpower + material + critical_path),
            delay: round2(delay),
            equipment: round2(equipment),
            manpower: round2(manpower),
            material: round2(material),
            critical_path: round2(critical_path),
        }
    }
}

/// Ready activities sharing an identical, non-empty dependency set, in
/// first-appearance order; only groups of two or more
pub fn parallel_groups(graph: &ActivityGraph<'_>, ready: &[NodeIndex]) -> Vec<Vec<NodeIndex>> {
    let mut groups: Vec<(Vec<&str>, Vec<NodeIndex>)> = Vec::new();
    for &i in ready {
        let key = graph.dependency_key(i);
        if key.is_empty() {
            continue;
        }
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(i),
            None => groups.push((key, vec![i])),
        }
    }
    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(_, members)| members)
        .collect()
}

/// Contexts for each ready activity, in `ready` order
pub fn scoring_contexts(
    ready: &[NodeIndex],
    groups: &[Vec<NodeIndex>],
    cpm: &CpmSchedule,
    exposures: &[DelayExposure],
) -> Vec<ScoringContext> {
    let max_cost = |members: &[NodeIndex]| {
        members
            .iter()
            .filter(|&&m| !exposures[m].within_free_float)
            .map(|&m| exposures[m].total_per_day)
            .max()
            .unwrap_or(Decimal::ZERO)
    };
    let ungrouped_max = max_cost(ready);

    ready
        .iter()
        .map(|&i| match groups.iter().find(|g| g.contains(&i)) {
            Some(group) => ScoringContext {
                group_max_cost: max_cost(group.as_slice()),
                group_all_critical: group.iter().all(|&m| cpm.is_critical(m)),
                critical_neighbour: cpm.is_critical_neighbour(i),
                waive_delay: false,
            },
            None => ScoringContext {
                group_max_cost: ungrouped_max,
                group_all_critical: false,
                critical_neighbour: cpm.is_critical_neighbour(i),
                waive_delay: false,
            },
        })
        .collect()
}
