//! Resolution of caller overrides into per-activity site conditions
//!
//! Out-of-range overrides are clamped and flagged, never propagated.

use sitecpm_core::{
    Activity, ActivityOverride, CrewClass, CrewCounts, Diagnostic, DiagnosticCode, Exclusion, Overrides,
    SiteConditions,
};
use tracing::debug;

use crate::dag::ActivityGraph;

/// Order in which a flat idle count is taken out of a crew split
const IDLE_DEDUCTION_ORDER: [CrewClass; 3] = [CrewClass::Unskilled, CrewClass::SemiSkilled, CrewClass::Skilled];

/// Site conditions for every activity of the graph, indexed like it
pub fn resolve_conditions(graph: &ActivityGraph<'_>, overrides: &Overrides) -> (Vec<SiteConditions>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    for id in overrides.activities.keys() {
        if graph.index_of(id).is_none() {
            diagnostics.push(unknown_target(id, "override"));
        }
    }
    for id in &overrides.completion_toggles {
        if graph.index_of(id).is_none() {
            diagnostics.push(unknown_target(id, "completion toggle"));
        }
    }

    let conditions = graph
        .activities()
        .iter()
        .map(|activity| match overrides.get(&activity.id) {
            Some(ov) => apply_override(activity, ov, &mut diagnostics),
            None => SiteConditions::planned(activity),
        })
        .collect();

    (conditions, diagnostics)
}

fn unknown_target(id: &str, what: &str) -> Diagnostic {
    Diagnostic::new(
        DiagnosticCode::O003UnknownOverrideTarget,
        format!("{} names unknown activity '{}'", what, id),
    )
    .with_note("the entry is ignored")
}

fn apply_override(activity: &Activity, ov: &ActivityOverride, diagnostics: &mut Vec<Diagnostic>) -> SiteConditions {
    let mut conditions = SiteConditions::planned(activity);

    match activity.crew.as_ref() {
        Some(crew) => {
            let mut available = crew.planned_counts();
            let mut clamped = false;

            if let Some(idle) = ov.idle_crew {
                for class in CrewClass::ALL {
                    let have = available.get_mut(class);
                    let want = idle.get(class);
                    if want > *have {
                        clamped = true;
                    }
                    *have -= want.min(*have);
                }
            }
            if let Some(idle) = ov.idle_manpower {
                let remaining = deduct_idle(&mut available, idle);
                if remaining > 0 {
                    clamped = true;
                }
            }
            if clamped {
                diagnostics.push(idle_clamped(activity, crew.headcount()));
            }

            conditions.available_manpower = available.total();
            conditions.available_crew = Some(available);
        }
        None => {
            if let Some(idle) = ov.idle_manpower {
                let planned = activity.planned_manpower;
                if idle > planned {
                    diagnostics.push(idle_clamped(activity, planned));
                }
                conditions.available_manpower = planned - idle.min(planned);
            }
        }
    }

    if let Some(percent) = ov.material_percent {
        conditions.material = if percent.is_nan() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::O002MaterialClamped,
                    format!("material availability for '{}' is not a number", activity.id),
                )
                .for_activity(activity.id.clone())
                .with_note("treated as 100%"),
            );
            1.0
        } else {
            if !(0.0..=100.0).contains(&percent) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::O002MaterialClamped,
                        format!(
                            "material availability {}% for '{}' is outside 0-100",
                            percent, activity.id
                        ),
                    )
                    .for_activity(activity.id.clone())
                    .with_note(format!("clamped to {}%", percent.clamp(0.0, 100.0))),
                );
            }
            percent.clamp(0.0, 100.0) / 100.0
        };
    }

    if let Some(mode) = ov.equipment {
        conditions.equipment = mode;
    }

    debug!(
        activity = %activity.id,
        available = conditions.available_manpower,
        material = conditions.material,
        equipment = %conditions.equipment,
        "override applied"
    );
    conditions
}

/// Take `idle` workers out of `counts`, cheapest class first. Returns the
/// part of `idle` that could not be deducted.
fn deduct_idle(counts: &mut CrewCounts, mut idle: u32) -> u32 {
    for class in IDLE_DEDUCTION_ORDER {
        let have = counts.get_mut(class);
        let take = idle.min(*have);
        *have -= take;
        idle -= take;
    }
    idle
}

fn idle_clamped(activity: &Activity, planned: u32) -> Diagnostic {
    Diagnostic::new(
        DiagnosticCode::O001IdleManpowerClamped,
        format!("idle manpower for '{}' exceeds planned manpower", activity.id),
    )
    .for_activity(activity.id.clone())
    .with_note(format!("clamped to the planned crew of {}", planned))
}

/// Why an activity cannot be costed, if it cannot
pub fn exclusion_reason(activity: &Activity) -> Option<String> {
    if let Some(rate) = activity.rates.first_negative() {
        return Some(format!("negative {}", rate));
    }
    if activity.planned_headcount() == 0 && activity.manpower_cost_per_day() > rust_decimal::Decimal::ZERO {
        return Some(format!(
            "no planned manpower but a manpower cost of {} per day",
            activity.manpower_cost_per_day()
        ));
    }
    None
}

/// Exclusions and their X001 diagnostics
pub fn find_exclusions(graph: &ActivityGraph<'_>) -> (Vec<bool>, Vec<Exclusion>, Vec<Diagnostic>) {
    let mut excluded = vec![false; graph.len()];
    let mut exclusions = Vec::new();
    let mut diagnostics = Vec::new();

    for (i, activity) in graph.activities().iter().enumerate() {
        if let Some(reason) = exclusion_reason(activity) {
            excluded[i] = true;
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::X001ActivityExcluded,
                    format!("activity '{}' excluded from ranking: {}", activity.id, reason),
                )
                .for_activity(activity.id.clone())
                .with_hint("fix the activity's cost data to include it in sequencing"),
            );
            exclusions.push(Exclusion {
                activity: activity.id.clone(),
                reason,
            });
        }
    }

    (excluded, exclusions, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sitecpm_core::{CrewShare, CrewSplit, EquipmentMode};

    fn crew_activity() -> Activity {
        Activity::new("C").crew(CrewSplit {
            skilled: CrewShare::new(2, dec!(900)),
            semi_skilled: CrewShare::new(3, dec!(600)),
            unskilled: CrewShare::new(4, dec!(400)),
        })
    }

    fn resolve(activities: &[Activity], overrides: &Overrides) -> (Vec<SiteConditions>, Vec<Diagnostic>) {
        let graph = ActivityGraph::build(activities, true).unwrap();
        resolve_conditions(&graph, overrides)
    }

    #[test]
    fn no_override_means_planned_conditions() {
        let activities = vec![Activity::new("A").manpower(10)];
        let (conditions, diags) = resolve(&activities, &Overrides::new());

        assert_eq!(conditions[0].available_manpower, 10);
        assert_eq!(conditions[0].material, 1.0);
        assert_eq!(conditions[0].equipment, EquipmentMode::Owned);
        assert!(diags.is_empty());
    }

    #[test]
    fn idle_manpower_is_deducted_and_clamped() {
        let activities = vec![Activity::new("A").manpower(10), Activity::new("B").manpower(4)];
        let overrides = Overrides::new().idle_manpower("A", 3).idle_manpower("B", 9);
        let (conditions, diags) = resolve(&activities, &overrides);

        assert_eq!(conditions[0].available_manpower, 7);
        assert_eq!(conditions[1].available_manpower, 0);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::O001IdleManpowerClamped);
        assert_eq!(diags[0].activity.as_deref(), Some("B"));
    }

    #[test]
    fn flat_idle_count_drains_unskilled_first() {
        let activities = vec![crew_activity()];
        let overrides = Overrides::new().idle_manpower("C", 5);
        let (conditions, diags) = resolve(&activities, &overrides);

        let crew = conditions[0].available_crew.unwrap();
        assert_eq!((crew.skilled, crew.semi_skilled, crew.unskilled), (2, 2, 0));
        assert_eq!(conditions[0].available_manpower, 4);
        assert!(diags.is_empty());
    }

    #[test]
    fn per_class_idle_is_clamped_per_class() {
        let activities = vec![crew_activity()];
        let idle = CrewCounts {
            skilled: 5,
            semi_skilled: 1,
            unskilled: 0,
        };
        let (conditions, diags) = resolve(&activities, &Overrides::new().idle_crew("C", idle));

        let crew = conditions[0].available_crew.unwrap();
        assert_eq!((crew.skilled, crew.semi_skilled, crew.unskilled), (0, 2, 4));
        assert_eq!(diags[0].code, DiagnosticCode::O001IdleManpowerClamped);
    }

    #[test]
    fn material_percent_is_clamped_and_scaled() {
        let activities = vec![Activity::new("A"), Activity::new("B"), Activity::new("C")];
        let overrides = Overrides::new()
            .material_percent("A", 40.0)
            .material_percent("B", 140.0)
            .material_percent("C", f64::NAN);
        let (conditions, diags) = resolve(&activities, &overrides);

        assert_eq!(conditions[0].material, 0.4);
        assert_eq!(conditions[1].material, 1.0);
        assert_eq!(conditions[2].material, 1.0);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.code == DiagnosticCode::O002MaterialClamped));
        let flagged: Vec<_> = diags.iter().map(|d| d.activity.as_deref()).collect();
        assert_eq!(flagged, vec![Some("B"), Some("C")]);
    }

    #[test]
    fn unknown_override_targets_are_flagged() {
        let activities = vec![Activity::new("A")];
        let overrides = Overrides::new()
            .equipment("Z", EquipmentMode::Rented)
            .toggle_completion("Y");
        let (_, diags) = resolve(&activities, &overrides);

        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.code == DiagnosticCode::O003UnknownOverrideTarget));
    }

    #[test]
    fn equipment_override_is_applied() {
        let activities = vec![Activity::new("A")];
        let (conditions, _) = resolve(&activities, &Overrides::new().equipment("A", EquipmentMode::None));
        assert_eq!(conditions[0].equipment, EquipmentMode::None);
    }

    #[test]
    fn exclusions_cover_negative_rates_and_unstaffed_cost() {
        let activities = vec![
            Activity::new("ok").manpower(2).manpower_cost(dec!(100)),
            Activity::new("neg").manpower(2).equipment_costs(dec!(-1), dec!(0), dec!(0)),
            Activity::new("nobody").manpower_cost(dec!(100)),
        ];
        let graph = ActivityGraph::build(&activities, true).unwrap();
        let (excluded, exclusions, diags) = find_exclusions(&graph);

        assert_eq!(excluded, vec![false, true, true]);
        assert_eq!(exclusions[0].reason, "negative rented_equipment_cost_per_day");
        assert_eq!(exclusions[1].activity, "nobody");
        assert_eq!(diags.len(), 2);
    }
}
