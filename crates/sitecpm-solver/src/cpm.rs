//! Critical Path Method over an activity graph
//!
//! Day-numbered CPM: activities occupy whole days, so an activity that
//! starts on day `es` with duration `d` finishes on day `es + d - 1` and its
//! successors start no earlier than the following day.
//!
//! # Algorithm
//!
//! 1. Topological sort (done in dag.rs)
//! 2. Forward pass: ES = max(EF of predecessors) + 1, floored at the planned start day
//! 3. Backward pass: LF = min(LS of successors) - 1, or the project duration
//! 4. Float: total = LS - ES, free = min(ES of successors) - EF - 1 (both >= 0)
//! 5. Critical paths: zero-float chains from start activities to terminal ones

use sitecpm_core::{ActivityId, Diagnostic, DiagnosticCode, Timing};
use tracing::{debug, warn};

use crate::dag::{ActivityGraph, NodeIndex};

/// CPM annotations for every activity of a graph
#[derive(Debug, Clone, Default)]
pub struct CpmSchedule {
    /// Timing per activity, indexed like the graph
    pub timings: Vec<Timing>,
    /// Zero-float chains as node indices
    pub critical_paths: Vec<Vec<NodeIndex>>,
    /// Shares an edge or a predecessor with a critical activity
    pub critical_neighbours: Vec<bool>,
    /// Maximum early finish (0 for an empty graph)
    pub project_duration: i64,
    pub diagnostics: Vec<Diagnostic>,
}

impl CpmSchedule {
    pub fn timing(&self, i: NodeIndex) -> &Timing {
        &self.timings[i]
    }

    pub fn is_critical(&self, i: NodeIndex) -> bool {
        self.timings[i].is_critical
    }

    /// Not critical, but linked to a critical activity by an edge or a
    /// common predecessor
    pub fn is_critical_neighbour(&self, i: NodeIndex) -> bool {
        self.critical_neighbours[i]
    }

    /// Critical paths as activity ids
    pub fn critical_path_ids(&self, graph: &ActivityGraph<'_>) -> Vec<Vec<ActivityId>> {
        self.critical_paths
            .iter()
            .map(|path| path.iter().map(|&i| graph.activity(i).id.clone()).collect())
            .collect()
    }

    /// Summed duration of a path's activities
    pub fn path_duration(graph: &ActivityGraph<'_>, path: &[NodeIndex]) -> i64 {
        path.iter().map(|&i| graph.activity(i).duration).sum()
    }
}

/// CPM engine operating on a validated graph
#[derive(Debug, Default, Clone, Copy)]
pub struct CpmEngine;

impl CpmEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute early/late times, floats and critical paths
    pub fn compute(&self, graph: &ActivityGraph<'_>) -> CpmSchedule {
        if graph.is_empty() {
            return CpmSchedule::default();
        }

        let n = graph.len();
        let mut es = vec![0i64; n];
        let mut ef = vec![0i64; n];
        let mut ls = vec![0i64; n];
        let mut lf = vec![0i64; n];

        // ════════════════════════════════════════════════════════════════════
        // FORWARD PASS
        // ════════════════════════════════════════════════════════════════════

        for &i in graph.topo_order() {
            let activity = graph.activity(i);
            let early_start = graph
                .predecessors(i)
                .iter()
                .map(|&p| ef[p] + 1)
                .max()
                .map_or(activity.start_day, |after_preds| after_preds.max(activity.start_day));

            es[i] = early_start;
            ef[i] = early_start + activity.duration - 1;
        }

        let project_duration = ef.iter().copied().max().unwrap_or(0);
        debug!(activities = n, project_duration, "forward pass complete");

        // ════════════════════════════════════════════════════════════════════
        // BACKWARD PASS
        // ════════════════════════════════════════════════════════════════════

        for &i in graph.topo_order().iter().rev() {
            let late_finish = graph
                .successors(i)
                .iter()
                .map(|&s| ls[s] - 1)
                .min()
                .unwrap_or(project_duration);

            lf[i] = late_finish;
            ls[i] = late_finish - graph.activity(i).duration + 1;
        }

        // ════════════════════════════════════════════════════════════════════
        // FLOAT
        // ════════════════════════════════════════════════════════════════════

        let mut timings: Vec<Timing> = (0..n)
            .map(|i| {
                // Negative float means an inconsistent graph; clamp it
                let total_float = (ls[i] - es[i]).max(0);
                let free_float = graph
                    .successors(i)
                    .iter()
                    .map(|&s| es[s])
                    .min()
                    .map_or(project_duration - ef[i], |min_succ_es| min_succ_es - ef[i] - 1)
                    .clamp(0, total_float);

                Timing {
                    early_start: es[i],
                    early_finish: ef[i],
                    late_start: ls[i],
                    late_finish: lf[i],
                    total_float,
                    free_float,
                    is_critical: total_float == 0,
                    is_near_critical: false,
                }
            })
            .collect();

        let mut critical_neighbours = vec![false; n];
        for i in 0..n {
            if timings[i].is_critical {
                continue;
            }
            timings[i].is_near_critical = (0..n).any(|c| timings[c].is_critical && graph.are_adjacent(i, c));
            critical_neighbours[i] =
                timings[i].is_near_critical && (0..n).any(|c| timings[c].is_critical && graph.are_linked(i, c));
        }

        // ════════════════════════════════════════════════════════════════════
        // CRITICAL PATHS
        // ════════════════════════════════════════════════════════════════════

        let critical_paths = find_critical_paths(graph, &timings);
        let mut diagnostics = Vec::new();

        let durations: Vec<i64> = critical_paths
            .iter()
            .map(|path| CpmSchedule::path_duration(graph, path))
            .collect();
        if durations.windows(2).any(|w| w[0] != w[1]) {
            warn!(?durations, "critical paths have different durations");
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::W001CriticalPathMismatch,
                    "critical paths have different total durations",
                )
                .with_note(format!("path durations: {:?}", durations))
                .with_note(format!("project duration: {}", project_duration)),
            );
        }

        let mut on_path = vec![false; n];
        for &i in critical_paths.iter().flatten() {
            on_path[i] = true;
        }
        for i in (0..n).filter(|&i| timings[i].is_critical && !on_path[i]) {
            let id = &graph.activity(i).id;
            warn!(activity = %id, "critical activity is on no critical path");
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::W004CriticalActivityOffPath,
                    format!("activity '{}' has zero float but is on no reported critical path", id),
                )
                .for_activity(id.clone())
                .with_note("its zero-float chain does not start at an activity without dependencies")
                .with_hint("check whether its planned start day holds back the project"),
            );
        }

        debug!(paths = critical_paths.len(), "critical paths extracted");

        CpmSchedule {
            timings,
            critical_paths,
            critical_neighbours,
            project_duration,
            diagnostics,
        }
    }
}

/// Enumerate every zero-float chain from a zero-float start (no
/// predecessors) to a zero-float terminal (no successors)
fn find_critical_paths(graph: &ActivityGraph<'_>, timings: &[Timing]) -> Vec<Vec<NodeIndex>> {
    fn walk(
        graph: &ActivityGraph<'_>,
        timings: &[Timing],
        node: NodeIndex,
        path: &mut Vec<NodeIndex>,
        paths: &mut Vec<Vec<NodeIndex>>,
    ) {
        path.push(node);
        let successors = graph.successors(node);
        if successors.is_empty() {
            paths.push(path.clone());
        } else {
            for &next in successors {
                if timings[next].is_critical {
                    walk(graph, timings, next, path, paths);
                }
            }
        }
        path.pop();
    }

    let mut paths = Vec::new();
    let mut path = Vec::new();
    for start in 0..graph.len() {
        if graph.predecessors(start).is_empty() && timings[start].is_critical {
            walk(graph, timings, start, &mut path, &mut paths);
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecpm_core::Activity;

    fn make_activities(specs: &[(&str, i64, i64, &[&str])]) -> Vec<Activity> {
        specs
            .iter()
            .map(|(id, start, dur, deps)| {
                let mut act = Activity::new(*id).start_day(*start).duration(*dur);
                for dep in *deps {
                    act = act.depends_on(*dep);
                }
                act
            })
            .collect()
    }

    fn schedule(activities: &[Activity]) -> (ActivityGraph<'_>, CpmSchedule) {
        let graph = ActivityGraph::build(activities, true).unwrap();
        let cpm = CpmEngine::new().compute(&graph);
        (graph, cpm)
    }

    #[test]
    fn two_activity_chain() {
        // A(start 1, 2d) -> B(start 3, 3d)
        let activities = make_activities(&[("A", 1, 2, &[]), ("B", 3, 3, &["A"])]);
        let (_, cpm) = schedule(&activities);

        let a = cpm.timing(0);
        assert_eq!((a.early_start, a.early_finish), (1, 2));
        let b = cpm.timing(1);
        assert_eq!((b.early_start, b.early_finish), (3, 5));
        assert_eq!(cpm.project_duration, 5);
        assert!(a.is_critical);
        assert!(b.is_critical);
        assert_eq!(cpm.critical_paths, vec![vec![0, 1]]);
    }

    #[test]
    fn planned_start_floors_early_start() {
        // B could start on day 3 but is planned for day 6
        let activities = make_activities(&[("A", 1, 2, &[]), ("B", 6, 1, &["A"])]);
        let (_, cpm) = schedule(&activities);

        assert_eq!(cpm.timing(1).early_start, 6);
        assert_eq!(cpm.project_duration, 6);
        // A may slip until day 5 without moving B
        assert_eq!(cpm.timing(0).total_float, 3);
        assert_eq!(cpm.timing(0).free_float, 3);

        // B is critical but its chain starts at a floated root
        assert!(cpm.is_critical(1));
        assert!(cpm.critical_paths.is_empty());
        assert_eq!(cpm.diagnostics.len(), 1);
        assert_eq!(cpm.diagnostics[0].code, DiagnosticCode::W004CriticalActivityOffPath);
        assert_eq!(cpm.diagnostics[0].activity.as_deref(), Some("B"));
    }

    #[test]
    fn parallel_branch_has_float() {
        // A(5) ---> C(2)
        // B(3) -----+
        let activities = make_activities(&[("A", 1, 5, &[]), ("B", 1, 3, &[]), ("C", 1, 2, &["A", "B"])]);
        let (graph, cpm) = schedule(&activities);

        assert_eq!(cpm.project_duration, 7);
        assert!(cpm.is_critical(0));
        assert!(!cpm.is_critical(1));
        assert_eq!(cpm.timing(1).total_float, 2);
        assert_eq!(cpm.timing(1).late_start, 3);
        assert_eq!(cpm.timing(1).free_float, 2);
        assert_eq!(cpm.timing(0).free_float, 0);
        assert_eq!(cpm.critical_path_ids(&graph), vec![vec!["A".to_string(), "C".to_string()]]);
    }

    #[test]
    fn near_critical_marks_neighbours_of_critical_activities() {
        // A(4) -> C(1); B(1) -> C; D(1) unrelated with float
        let activities = make_activities(&[
            ("A", 1, 4, &[]),
            ("B", 1, 1, &[]),
            ("C", 1, 1, &["A", "B"]),
            ("D", 1, 1, &[]),
        ]);
        let (_, cpm) = schedule(&activities);

        assert!(cpm.timing(1).is_near_critical);
        assert!(!cpm.timing(3).is_near_critical);
        // Critical activities are never flagged near-critical
        assert!(!cpm.timing(0).is_near_critical);
        // B feeds C directly
        assert!(cpm.is_critical_neighbour(1));
    }

    #[test]
    fn shared_successor_is_near_critical_but_not_a_neighbour() {
        // A(3) -> E(2) critical; A -> D; B -> D
        let activities = make_activities(&[
            ("A", 1, 3, &[]),
            ("B", 1, 1, &[]),
            ("D", 1, 1, &["A", "B"]),
            ("E", 1, 2, &["A"]),
        ]);
        let (_, cpm) = schedule(&activities);

        assert!(cpm.is_critical(0));
        assert!(cpm.is_critical(3));
        assert!(cpm.timing(1).is_near_critical);
        assert!(!cpm.is_critical_neighbour(1));
        // D hangs off critical A
        assert!(cpm.is_critical_neighbour(2));
    }

    #[test]
    fn multiple_critical_paths_are_enumerated() {
        //      B(3)
        // A(1)      D(1)
        //      C(3)
        let activities = make_activities(&[
            ("A", 1, 1, &[]),
            ("B", 1, 3, &["A"]),
            ("C", 1, 3, &["A"]),
            ("D", 1, 1, &["B", "C"]),
        ]);
        let (graph, cpm) = schedule(&activities);

        let ids = cpm.critical_path_ids(&graph);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], vec!["A", "B", "D"]);
        assert_eq!(ids[1], vec!["A", "C", "D"]);
        assert!(cpm.diagnostics.is_empty());
    }

    #[test]
    fn differing_path_durations_emit_warning() {
        // X starts late (day 4) and is critical alone; A->B is critical too
        let activities = make_activities(&[("A", 1, 2, &[]), ("B", 1, 3, &["A"]), ("X", 4, 2, &[])]);
        let (_, cpm) = schedule(&activities);

        assert_eq!(cpm.project_duration, 5);
        assert_eq!(cpm.critical_paths.len(), 2);
        assert_eq!(cpm.diagnostics.len(), 1);
        assert_eq!(cpm.diagnostics[0].code, DiagnosticCode::W001CriticalPathMismatch);
    }

    #[test]
    fn empty_graph_has_zero_duration() {
        let activities: Vec<Activity> = vec![];
        let (_, cpm) = schedule(&activities);
        assert_eq!(cpm.project_duration, 0);
        assert!(cpm.critical_paths.is_empty());
        assert!(cpm.timings.is_empty());
    }

    #[test]
    fn free_float_of_terminal_is_gap_to_project_end() {
        let activities = make_activities(&[("A", 1, 6, &[]), ("B", 1, 2, &[])]);
        let (_, cpm) = schedule(&activities);
        assert_eq!(cpm.timing(1).free_float, 4);
        assert_eq!(cpm.timing(1).total_float, 4);
    }

    #[test]
    fn float_invariants_hold_on_mixed_network() {
        let activities = make_activities(&[
            ("start", 1, 1, &[]),
            ("a", 2, 5, &["start"]),
            ("b", 2, 8, &["start"]),
            ("c", 1, 3, &["a"]),
            ("d", 12, 4, &["b"]),
            ("e", 1, 6, &["c", "d"]),
            ("f", 1, 2, &["a"]),
            ("end", 1, 1, &["e", "f"]),
        ]);
        let (graph, cpm) = schedule(&activities);

        for (i, t) in cpm.timings.iter().enumerate() {
            let dur = graph.activity(i).duration;
            assert_eq!(t.early_finish - t.early_start + 1, dur);
            assert_eq!(t.late_finish - t.late_start + 1, dur);
            assert!(t.total_float >= 0);
            assert!(t.free_float <= t.total_float);
        }
        for path in &cpm.critical_paths {
            let last = *path.last().unwrap();
            assert_eq!(cpm.timing(last).early_finish, cpm.project_duration);
        }
    }
}
