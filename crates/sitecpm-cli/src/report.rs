//! Plain-text schedule report

use std::fmt::Write;

use rust_decimal::Decimal;
use sitecpm_core::{ScheduleResult, SearchMode};

fn money(value: Decimal) -> String {
    value.round_dp(2).normalize().to_string()
}

/// Render a schedule result as a text report
pub fn render_text(result: &ScheduleResult, daywise: bool) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_report(&mut out, result, daywise);
    out
}

fn write_report(out: &mut String, result: &ScheduleResult, daywise: bool) -> std::fmt::Result {
    writeln!(out, "Day {} | project duration: {} days", result.current_day, result.project_duration)?;

    if result.critical_paths.is_empty() {
        writeln!(out, "Critical path: none")?;
    }
    for path in &result.critical_paths {
        writeln!(out, "Critical path: {}", path.join(" -> "))?;
    }

    writeln!(out)?;
    if result.ranked.is_empty() {
        writeln!(out, "No activities are ready on day {}", result.current_day)?;
    } else {
        writeln!(out, "Ready activities")?;
        writeln!(
            out,
            "  {:<3} {:<10} {:<24} {:>7} {:>6} {:>6} {:>6} {:>6} {:>6} {:>12}",
            "#", "ID", "Name", "Score", "Delay", "Equip", "Crew", "Matl", "Crit", "Delay/day"
        )?;
        for (rank, activity) in result.ranked.iter().enumerate() {
            let s = &activity.score;
            writeln!(
                out,
                "  {:<3} {:<10} {:<24} {:>7.2} {:>6.2} {:>6.2} {:>6.2} {:>6.2} {:>6.2} {:>12}{}",
                rank + 1,
                activity.id,
                activity.name,
                s.total,
                s.delay,
                s.equipment,
                s.manpower,
                s.material,
                s.critical_path,
                money(activity.delay_cost_per_day),
                if activity.is_first_in_sequence { "  (start first)" } else { "" }
            )?;
            for advisory in &activity.advisories {
                writeln!(out, "        ! {} ({})", advisory.message, advisory.recommendation)?;
            }
        }

        let plan = &result.sequence;
        let mode = match plan.search {
            SearchMode::Exhaustive => format!("{} orderings evaluated", plan.options.len()),
            SearchMode::Heuristic => format!("heuristic, {} orderings evaluated", plan.options.len()),
        };
        writeln!(out)?;
        writeln!(
            out,
            "Best sequence: {} (delay cost {}; {})",
            plan.best.join(" -> "),
            money(plan.min_cost),
            mode
        )?;
    }

    for group in &result.parallel_groups {
        writeln!(out, "Parallel group: {}", group.join(", "))?;
    }

    if !result.exclusions.is_empty() {
        writeln!(out)?;
        writeln!(out, "Excluded from ranking")?;
        for exclusion in &result.exclusions {
            writeln!(out, "  {}: {}", exclusion.activity, exclusion.reason)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Activity summary")?;
    writeln!(
        out,
        "  {:<10} {:<16} {:>7} {:>7} {:>6} {:>12} {:>12} {:>12} {:>4} {:>4}",
        "ID", "Status", "Plan", "Actual", "Delay", "Planned", "Actual", "Delay cost", "TF", "FF"
    )?;
    for s in &result.summary {
        writeln!(
            out,
            "  {:<10} {:<16} {:>7} {:>7} {:>6} {:>12} {:>12} {:>12} {:>4} {:>4}",
            s.id,
            s.status.as_str(),
            s.planned_finish_day,
            s.actual_completion_day.map_or_else(|| "-".to_string(), |d| d.to_string()),
            s.delay_days,
            money(s.planned_cost),
            money(s.actual_cost),
            money(s.delay_cost),
            s.total_float,
            s.free_float
        )?;
    }

    if daywise {
        writeln!(out)?;
        writeln!(out, "Day-wise cost")?;
        writeln!(out, "  {:>4} {:>12} {:>12} {:>12}", "Day", "Planned", "Actual", "Overrun")?;
        for day in &result.daywise_costs {
            writeln!(
                out,
                "  {:>4} {:>12} {:>12} {:>12}",
                day.day,
                money(day.planned),
                money(day.actual),
                money(day.overrun)
            )?;
        }
    }

    Ok(())
}
