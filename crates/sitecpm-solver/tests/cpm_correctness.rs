//! CPM Correctness Test Suite
//!
//! Invariants that must hold for every valid activity network:
//! 1. Root activities start on their planned start day
//! 2. Finish - start + 1 = duration, early and late
//! 3. Float is non-negative and free float never exceeds total float
//! 4. Every critical path ends on the project finish day

use sitecpm_core::{Activity, CompletionLedger, ConfigError, Overrides, Scheduler};
use sitecpm_solver::{ActivityGraph, CpmEngine, CpmSchedule, SchedulerConfig, SiteScheduler};

fn compute(activities: &[Activity]) -> (ActivityGraph<'_>, CpmSchedule) {
    let graph = ActivityGraph::build(activities, true).expect("valid network");
    let cpm = CpmEngine::new().compute(&graph);
    (graph, cpm)
}

/// Residential block: excavation through handover
fn building() -> Vec<Activity> {
    vec![
        Activity::new("A1").name("Site clearing").start_day(1).duration(2),
        Activity::new("A2").name("Excavation").start_day(3).duration(4).depends_on("A1"),
        Activity::new("A3").name("Rebar fabrication").start_day(3).duration(3).depends_on("A1"),
        Activity::new("A4")
            .name("Footing concrete")
            .start_day(7)
            .duration(2)
            .depends_on("A2")
            .depends_on("A3"),
        Activity::new("A5").name("Plinth beam").start_day(9).duration(3).depends_on("A4"),
        Activity::new("A6").name("Site office").start_day(2).duration(2),
        Activity::new("A7")
            .name("Columns")
            .start_day(12)
            .duration(5)
            .depends_on("A5")
            .depends_on("A6"),
        Activity::new("A8").name("Drainage").start_day(10).duration(2).depends_on("A4"),
    ]
}

// ============================================================================
// INVARIANT 1: Roots start on their planned start day
// ============================================================================

#[test]
fn roots_start_on_planned_day() {
    let activities = building();
    let (graph, cpm) = compute(&activities);

    for (i, activity) in activities.iter().enumerate() {
        if graph.predecessors(i).is_empty() {
            assert_eq!(cpm.timing(i).early_start, activity.start_day, "{}", activity.id);
        }
    }
}

// ============================================================================
// INVARIANT 2: Windows match durations
// ============================================================================

#[test]
fn windows_match_durations() {
    let activities = building();
    let (_, cpm) = compute(&activities);

    for (activity, t) in activities.iter().zip(&cpm.timings) {
        assert_eq!(t.early_finish - t.early_start + 1, activity.duration, "{}", activity.id);
        assert_eq!(t.late_finish - t.late_start + 1, activity.duration, "{}", activity.id);
    }
}

#[test]
fn successors_start_after_predecessors_finish() {
    let activities = building();
    let (graph, cpm) = compute(&activities);

    for i in 0..graph.len() {
        for &p in graph.predecessors(i) {
            assert!(cpm.timing(i).early_start > cpm.timing(p).early_finish);
            assert!(cpm.timing(p).late_finish < cpm.timing(i).late_start);
        }
    }
}

// ============================================================================
// INVARIANT 3: Float bounds
// ============================================================================

#[test]
fn float_is_bounded() {
    let activities = building();
    let (_, cpm) = compute(&activities);

    for (activity, t) in activities.iter().zip(&cpm.timings) {
        assert!(t.total_float >= 0, "{} has negative total float", activity.id);
        assert!(t.free_float >= 0, "{} has negative free float", activity.id);
        assert!(
            t.free_float <= t.total_float,
            "{}: free float {} exceeds total float {}",
            activity.id,
            t.free_float,
            t.total_float
        );
        assert_eq!(t.is_critical, t.total_float == 0);
    }
}

#[test]
fn expected_floats_on_building_network() {
    let activities = building();
    let (graph, cpm) = compute(&activities);
    let timing = |id: &str| *cpm.timing(graph.index_of(id).unwrap());

    assert_eq!(cpm.project_duration, 16);
    // Rebar finishes day 5, footing waits for excavation until day 7
    assert_eq!(timing("A3").free_float, 1);
    assert_eq!(timing("A3").total_float, 1);
    // Site office can slip until the columns start on day 12
    assert_eq!(timing("A6").total_float, 8);
    // Drainage: done on day 11, project ends on day 16
    assert_eq!(timing("A8").free_float, 5);
    assert!(timing("A4").is_critical);
}

// ============================================================================
// INVARIANT 4: Critical paths
// ============================================================================

#[test]
fn critical_paths_end_on_project_finish() {
    let activities = building();
    let (graph, cpm) = compute(&activities);

    assert!(!cpm.critical_paths.is_empty());
    for path in &cpm.critical_paths {
        let last = *path.last().unwrap();
        assert_eq!(cpm.timing(last).early_finish, cpm.project_duration);
        assert!(graph.successors(last).is_empty());
        assert!(graph.predecessors(path[0]).is_empty());
        assert!(path.iter().all(|&i| cpm.is_critical(i)));
    }

    assert_eq!(
        cpm.critical_path_ids(&graph),
        vec![vec!["A1", "A2", "A4", "A5", "A7"]]
    );
}

#[test]
fn two_activity_example() {
    let activities = vec![
        Activity::new("A").start_day(1).duration(2),
        Activity::new("B").start_day(3).duration(3).depends_on("A"),
    ];
    let result = SiteScheduler::new()
        .run(&activities, &mut CompletionLedger::new(), 1, &Overrides::new())
        .expect("should schedule");

    assert_eq!(result.project_duration, 5);
    assert_eq!(result.critical_paths, vec![vec!["A".to_string(), "B".to_string()]]);
    let a = &result.ranked[0];
    assert_eq!((a.timing.early_start, a.timing.early_finish), (1, 2));
    assert!(a.timing.is_critical);
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn cycle_is_fatal_with_no_partial_result() {
    let activities = vec![
        Activity::new("A").depends_on("C"),
        Activity::new("B").depends_on("A"),
        Activity::new("C").depends_on("B"),
    ];
    let err = SiteScheduler::new()
        .run(&activities, &mut CompletionLedger::new(), 1, &Overrides::new())
        .unwrap_err();

    assert!(matches!(err.config_errors(), [ConfigError::CyclicDependency { .. }]));
    assert!(err.to_string().contains("cyclic dependency"));
}

#[test]
fn lenient_mode_schedules_around_missing_dependency() {
    let activities = vec![
        Activity::new("A").start_day(1).duration(3),
        Activity::new("B").start_day(1).duration(2).depends_on("ghost"),
    ];
    let scheduler = SiteScheduler::with_config(SchedulerConfig::lenient());
    let result = scheduler
        .run(&activities, &mut CompletionLedger::new(), 1, &Overrides::new())
        .expect("lenient mode schedules");

    assert_eq!(result.project_duration, 3);
    assert_eq!(result.ranked.len(), 2);
    assert!(result.has_warnings());
    assert_eq!(result.diagnostics[0].code.as_str(), "C001");
}

#[test]
fn empty_network_has_zero_duration() {
    let result = SiteScheduler::new()
        .run(&[], &mut CompletionLedger::new(), 1, &Overrides::new())
        .expect("empty input schedules");

    assert_eq!(result.project_duration, 0);
    assert!(result.critical_paths.is_empty());
    assert!(result.ranked.is_empty());
    assert!(result.sequence.options.is_empty());
    assert!(result.daywise_costs.is_empty());
}
