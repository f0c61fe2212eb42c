//! Planned-versus-actual reporting: status, cost summary, day-wise cost
//! curve and advisories

use rust_decimal::Decimal;
use sitecpm_core::{
    Activity, ActivityStatus, ActivitySummary, Advisory, CompletionLedger, Day, DayCost, DayCostDetail,
    SiteConditions,
};

use crate::config::AdvisoryConfig;
use crate::cost::daily_cost;
use crate::cpm::CpmSchedule;
use crate::dag::{ActivityGraph, NodeIndex};

/// Completion status of an activity on `current_day`
pub fn status(ledger: &CompletionLedger, id: &str, current_day: Day) -> ActivityStatus {
    match ledger.completion_day(id) {
        Some(day) if current_day > day => ActivityStatus::Completed,
        Some(day) if current_day == day => ActivityStatus::CompletedToday,
        _ => ActivityStatus::Pending,
    }
}

/// Finish day implied by the predecessors' completion days where recorded,
/// otherwise by their planned windows; never before the planned start
pub fn planned_finish_day(graph: &ActivityGraph<'_>, i: NodeIndex, ledger: &CompletionLedger) -> Day {
    let activity = graph.activity(i);
    let earliest_start = graph
        .predecessors(i)
        .iter()
        .map(|&p| {
            let dep = graph.activity(p);
            ledger.completion_day(&dep.id).unwrap_or_else(|| dep.planned_window().1)
        })
        .max()
        .map_or(activity.start_day, |latest| (latest + 1).max(activity.start_day));
    earliest_start + activity.duration - 1
}

/// Per-activity planned versus actual cost figures
pub fn summarize(
    graph: &ActivityGraph<'_>,
    cpm: &CpmSchedule,
    conditions: &[SiteConditions],
    ledger: &CompletionLedger,
    current_day: Day,
) -> Vec<ActivitySummary> {
    graph
        .activities()
        .iter()
        .enumerate()
        .map(|(i, activity)| {
            let timing = cpm.timing(i);
            let per_day_cost = daily_cost(activity, &conditions[i]);
            let planned_cost = per_day_cost * Decimal::from(activity.duration);
            let planned_finish_day = planned_finish_day(graph, i, ledger);
            let actual_completion_day = ledger.completion_day(&activity.id);
            let free_float = timing.free_float;

            let mut summary = ActivitySummary {
                id: activity.id.clone(),
                name: activity.name.clone(),
                status: status(ledger, &activity.id, current_day),
                actual_completion_day,
                planned_finish_day,
                delay_days: 0,
                equipment: conditions[i].equipment,
                per_day_cost,
                planned_cost,
                actual_cost: planned_cost,
                delay_cost: Decimal::ZERO,
                total_float: timing.total_float,
                free_float,
                remaining_free_float: free_float,
                within_free_float: false,
            };

            if let Some(actual) = actual_completion_day {
                let delay_days = (actual - planned_finish_day).max(0);
                summary.delay_days = delay_days;
                if delay_days > 0 {
                    summary.remaining_free_float = (free_float - delay_days).max(0);
                }

                if free_float > 0 && delay_days <= free_float {
                    summary.within_free_float = true;
                } else {
                    let effective = (delay_days - free_float).max(0);
                    summary.actual_cost = per_day_cost * Decimal::from(activity.duration + effective);
                    summary.delay_cost = summary.actual_cost - planned_cost;
                }
            }

            summary
        })
        .collect()
}

/// Planned, actual and overrun spend for each day from 1 to the horizon.
///
/// The planned window of an activity ignores the ledger; the actual window
/// ends on the recorded completion day. The horizon is the project duration,
/// extended to the latest completion on or before `current_day`.
pub fn daywise_costs(
    graph: &ActivityGraph<'_>,
    summary: &[ActivitySummary],
    project_duration: i64,
    ledger: &CompletionLedger,
    current_day: Day,
) -> Vec<DayCost> {
    let empty = CompletionLedger::new();
    let windows: Vec<((Day, Day), Option<(Day, Day)>)> = graph
        .activities()
        .iter()
        .enumerate()
        .map(|(i, activity)| {
            let finish = planned_finish_day(graph, i, &empty);
            let planned = (finish - activity.duration + 1, finish);
            let actual = summary[i]
                .actual_completion_day
                .map(|day| (day - activity.duration + 1, day));
            (planned, actual)
        })
        .collect();

    let latest = graph
        .activities()
        .iter()
        .filter_map(|a| ledger.completion_day(&a.id))
        .filter(|&day| day <= current_day)
        .max()
        .unwrap_or(0);
    let horizon = project_duration.max(latest);

    (1..=horizon)
        .map(|day| {
            let details: Vec<DayCostDetail> = summary
                .iter()
                .zip(&windows)
                .map(|(s, &((p_start, p_finish), actual))| {
                    let in_planned = (p_start..=p_finish).contains(&day);
                    let in_actual = actual.is_some_and(|(a_start, a_finish)| (a_start..=a_finish).contains(&day));
                    let cost_if = |on: bool| if on { s.per_day_cost } else { Decimal::ZERO };
                    DayCostDetail {
                        id: s.id.clone(),
                        name: s.name.clone(),
                        planned: cost_if(in_planned),
                        actual: cost_if(in_actual),
                        overrun: cost_if(in_actual && day > p_finish),
                        status: s.status,
                    }
                })
                .collect();

            DayCost {
                day,
                planned: details.iter().map(|d| d.planned).sum(),
                actual: details.iter().map(|d| d.actual).sum(),
                overrun: details.iter().map(|d| d.overrun).sum(),
                details,
            }
        })
        .collect()
}

/// Site-level warnings for one activity
pub fn advisories(activity: &Activity, current_day: Day, config: &AdvisoryConfig) -> Vec<Advisory> {
    let mut notes = Vec::new();

    let headcount = activity.planned_headcount();
    if headcount > config.max_site_manpower {
        notes.push(Advisory {
            message: format!(
                "Manpower shortage: {} workers needed",
                headcount - config.max_site_manpower
            ),
            is_critical: true,
            recommendation: "Consider hiring additional workers or rescheduling the activity".into(),
        });
    }

    if current_day < activity.start_day {
        notes.push(Advisory {
            message: format!("Activity cannot start before day {}", activity.start_day),
            is_critical: true,
            recommendation: format!("Wait until day {} to start this activity", activity.start_day),
        });
    }

    let total_cost = Decimal::from(activity.duration)
        * (activity.manpower_cost_per_day() + activity.rates.rented_equipment_per_day);
    if total_cost > config.high_cost_threshold {
        notes.push(Advisory {
            message: format!("High cost activity: {}", total_cost),
            is_critical: false,
            recommendation: "Consider breaking down into smaller activities or optimizing resources".into(),
        });
    }

    notes
}
