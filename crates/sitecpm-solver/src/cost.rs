//! Delay-cost model
//!
//! Per-day cost exposure of each activity on the current day, conditioned
//! on CPM criticality and free-float consumption.

use rust_decimal::Decimal;
use sitecpm_core::{Activity, Day, DelayExposure, OverheadShare, SiteConditions, Timing};

use crate::cpm::CpmSchedule;
use crate::dag::ActivityGraph;

/// Available over planned head count in [0, 1]; 0 when nobody is planned
pub fn manpower_ratio(available: u32, planned: u32) -> f64 {
    if planned == 0 {
        return 0.0;
    }
    (f64::from(available) / f64::from(planned)).clamp(0.0, 1.0)
}

/// Manpower cost per day for the crew actually on site
pub fn adjusted_manpower_cost(activity: &Activity, conditions: &SiteConditions) -> Decimal {
    if let (Some(crew), Some(available)) = (activity.crew.as_ref(), conditions.available_crew.as_ref()) {
        return crew.cost_for(available);
    }
    let planned = activity.planned_headcount();
    if planned == 0 {
        return Decimal::ZERO;
    }
    let available = conditions.available_manpower.min(planned);
    activity.manpower_cost_per_day() * Decimal::from(available) / Decimal::from(planned)
}

/// Adjusted manpower plus the selected equipment mode's cost
pub fn daily_cost(activity: &Activity, conditions: &SiteConditions) -> Decimal {
    adjusted_manpower_cost(activity, conditions) + activity.rates.equipment_per_day(conditions.equipment)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DelayCostModel;

impl DelayCostModel {
    pub fn new() -> Self {
        Self
    }

    /// Exposure of one activity on `current_day`
    pub fn exposure(
        &self,
        activity: &Activity,
        timing: &Timing,
        conditions: &SiteConditions,
        current_day: Day,
    ) -> DelayExposure {
        let base_per_day = daily_cost(activity, conditions);
        let delay_days = (current_day - activity.start_day).max(0);
        let free_float = timing.free_float;
        let within_free_float = free_float > 0 && delay_days <= free_float;

        let overhead = if within_free_float {
            OverheadShare::None
        } else if timing.is_critical {
            OverheadShare::Full
        } else if timing.is_near_critical && delay_days > 0 {
            OverheadShare::Half
        } else {
            OverheadShare::None
        };

        let overhead_cost = match overhead {
            OverheadShare::Full => activity.rates.site_overhead_per_day,
            OverheadShare::Half => activity.rates.site_overhead_per_day / Decimal::TWO,
            OverheadShare::None => Decimal::ZERO,
        };

        let chargeable_days = if within_free_float {
            0
        } else {
            (delay_days - free_float).max(0)
        };

        DelayExposure {
            base_per_day,
            total_per_day: base_per_day + overhead_cost,
            overhead,
            delay_days,
            chargeable_days,
            within_free_float,
        }
    }

    /// Exposure of every activity, indexed like the graph
    pub fn annotate(
        &self,
        graph: &ActivityGraph<'_>,
        cpm: &CpmSchedule,
        conditions: &[SiteConditions],
        current_day: Day,
    ) -> Vec<DelayExposure> {
        graph
            .activities()
            .iter()
            .enumerate()
            .map(|(i, activity)| self.exposure(activity, cpm.timing(i), &conditions[i], current_day))
            .collect()
    }
}
