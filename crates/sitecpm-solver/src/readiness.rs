//! Readiness resolver
//!
//! An activity is ready on `current_day` when it is not completed by then,
//! its planned start day has arrived and every resolved predecessor was
//! completed on an earlier day.

use sitecpm_core::{CompletionLedger, Day};

use crate::dag::{ActivityGraph, NodeIndex};

/// True if activity `i` may start on `current_day`
pub fn is_ready(graph: &ActivityGraph<'_>, ledger: &CompletionLedger, i: NodeIndex, current_day: Day) -> bool {
    let activity = graph.activity(i);
    if ledger.is_completed_by(&activity.id, current_day) || current_day < activity.start_day {
        return false;
    }

    let mut latest: Option<Day> = None;
    for &p in graph.predecessors(i) {
        match ledger.completion_day(&graph.activity(p).id) {
            Some(day) => latest = Some(latest.map_or(day, |l| l.max(day))),
            None => return false,
        }
    }
    latest.map_or(true, |day| current_day > day)
}

/// Ready activities in activity order, skipping `excluded` ones
pub fn ready_activities(
    graph: &ActivityGraph<'_>,
    ledger: &CompletionLedger,
    current_day: Day,
    excluded: &[bool],
) -> Vec<NodeIndex> {
    (0..graph.len())
        .filter(|&i| !excluded.get(i).copied().unwrap_or(false))
        .filter(|&i| is_ready(graph, ledger, i, current_day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecpm_core::Activity;

    fn activities() -> Vec<Activity> {
        vec![
            Activity::new("A").start_day(1).duration(2),
            Activity::new("B").start_day(3).duration(3).depends_on("A"),
            Activity::new("C").start_day(4),
            Activity::new("D").start_day(1).depends_on("A").depends_on("C"),
        ]
    }

    fn ids(graph: &ActivityGraph<'_>, ready: &[NodeIndex]) -> Vec<String> {
        ready.iter().map(|&i| graph.activity(i).id.clone()).collect()
    }

    #[test]
    fn root_activity_waits_for_start_day() {
        let acts = activities();
        let graph = ActivityGraph::build(&acts, true).unwrap();
        let ledger = CompletionLedger::new();
        let none = vec![false; acts.len()];

        assert_eq!(ids(&graph, &ready_activities(&graph, &ledger, 1, &none)), vec!["A"]);
        assert_eq!(ids(&graph, &ready_activities(&graph, &ledger, 4, &none)), vec!["A", "C"]);
    }

    #[test]
    fn successor_is_ready_the_day_after_completion() {
        let acts = activities();
        let graph = ActivityGraph::build(&acts, true).unwrap();
        let mut ledger = CompletionLedger::new();
        ledger.record("A", 3);

        assert!(!is_ready(&graph, &ledger, 1, 3));
        assert!(is_ready(&graph, &ledger, 1, 4));
    }

    #[test]
    fn all_dependencies_must_be_recorded() {
        let acts = activities();
        let graph = ActivityGraph::build(&acts, true).unwrap();
        let mut ledger = CompletionLedger::new();
        ledger.record("A", 2);

        assert!(!is_ready(&graph, &ledger, 3, 10));
        ledger.record("C", 5);
        assert!(!is_ready(&graph, &ledger, 3, 5));
        assert!(is_ready(&graph, &ledger, 3, 6));
    }

    #[test]
    fn completed_activity_is_not_ready() {
        let acts = activities();
        let graph = ActivityGraph::build(&acts, true).unwrap();
        let mut ledger = CompletionLedger::new();
        ledger.record("A", 2);

        assert!(is_ready(&graph, &ledger, 0, 1));
        assert!(!is_ready(&graph, &ledger, 0, 2));
    }

    #[test]
    fn excluded_activities_are_skipped() {
        let acts = activities();
        let graph = ActivityGraph::build(&acts, true).unwrap();
        let ready = ready_activities(&graph, &CompletionLedger::new(), 5, &[true, false, false, false]);
        assert_eq!(ids(&graph, &ready), vec!["C"]);
    }

    #[test]
    fn readiness_is_monotonic_while_incomplete() {
        let acts = activities();
        let graph = ActivityGraph::build(&acts, true).unwrap();
        let mut ledger = CompletionLedger::new();
        ledger.record("A", 2);
        ledger.record("C", 4);

        let first = (1..20).find(|&day| is_ready(&graph, &ledger, 3, day)).unwrap();
        assert!((first..40).all(|day| is_ready(&graph, &ledger, 3, day)));
    }
}
