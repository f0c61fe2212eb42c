//! Sequence optimizer for the ready set
//!
//! The first activity of an ordering starts immediately and is charged
//! nothing; every later activity is charged its accrued delay cost. The
//! ordering with the smallest total is best, ties going to the ordering
//! enumerated first.
//!
//! # Modes
//!
//! - **Exhaustive**: every permutation, in lexicographic order of ready-set
//!   positions, evaluated in chunks (on the rayon pool with the `parallel`
//!   feature).
//! - **Heuristic**: one ordering per leading activity, the rest sorted by
//!   descending charge. Used above the exhaustive cap or when the time
//!   budget runs out.

use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rust_decimal::Decimal;
use sitecpm_core::{
    ActivityId, Diagnostic, DiagnosticCode, ScoreBreakdown, SearchMode, SequenceOption, SequencePlan,
    SequencedActivity,
};
use tracing::{debug, warn};

use crate::config::OptimizerConfig;

/// Permutations evaluated between time-budget checks
const CHUNK_SIZE: usize = 5040;

/// One ready activity as seen by the optimizer
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceItem {
    pub id: ActivityId,
    /// Delay cost charged when the activity is not first
    pub charge: Decimal,
    /// Score when the activity is not first
    pub score: ScoreBreakdown,
    /// Score when the activity leads the sequence
    pub lead_score: ScoreBreakdown,
}

/// Lexicographic permutations of `0..n`, starting with the identity
#[derive(Debug, Clone)]
pub struct Permutations {
    current: Vec<usize>,
    started: bool,
    done: bool,
}

impl Permutations {
    pub fn new(n: usize) -> Self {
        Self {
            current: (0..n).collect(),
            started: false,
            done: false,
        }
    }
}

impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.current.clone());
        }

        let n = self.current.len();
        let Some(pivot) = (0..n.saturating_sub(1))
            .rev()
            .find(|&i| self.current[i] < self.current[i + 1])
        else {
            self.done = true;
            return None;
        };
        let successor = (pivot + 1..n).rev().find(|&j| self.current[j] > self.current[pivot])?;
        self.current.swap(pivot, successor);
        self.current[pivot + 1..].reverse();
        Some(self.current.clone())
    }
}

fn factorial(n: usize) -> u64 {
    (1..=n as u64).product()
}

/// Total delay cost of an ordering
fn ordering_cost(items: &[SequenceItem], order: &[usize]) -> Decimal {
    order.iter().skip(1).map(|&i| items[i].charge).sum()
}

#[derive(Debug, Default, Clone)]
pub struct SequenceOptimizer {
    config: OptimizerConfig,
}

impl SequenceOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Best ordering of `items`, every evaluated option, and any diagnostics
    pub fn best_sequence(&self, items: &[SequenceItem]) -> (SequencePlan, Vec<Diagnostic>) {
        let n = items.len();
        if n == 0 {
            return (SequencePlan::default(), Vec::new());
        }

        let limit = self.config.exhaustive_limit();
        let mut diagnostics = Vec::new();

        if n > limit {
            warn!(ready = n, limit, "ready set above exhaustive cap, using heuristic sequencing");
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::W002SequenceCapExceeded,
                    format!(
                        "{} ready activities exceed the exhaustive sequencing limit of {}",
                        n, limit
                    ),
                )
                .with_hint("raise optimizer.max_exhaustive to enumerate every ordering"),
            );
            let plan = self.heuristic(items);
            diagnostics.push(heuristic_summary(n, plan.options.len()));
            return (plan, diagnostics);
        }

        match self.exhaustive(items) {
            Some(plan) => (plan, diagnostics),
            None => {
                let budget = self.config.time_budget_ms.unwrap_or_default();
                warn!(ready = n, budget_ms = budget, "optimizer time budget exhausted");
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::W003OptimizerTimeBudget,
                        format!("sequence enumeration exceeded the {} ms time budget", budget),
                    )
                    .with_note("heuristic sequencing was used instead"),
                );
                let plan = self.heuristic(items);
                diagnostics.push(heuristic_summary(n, plan.options.len()));
                (plan, diagnostics)
            }
        }
    }

    /// Every permutation; `None` if the time budget ran out
    fn exhaustive(&self, items: &[SequenceItem]) -> Option<SequencePlan> {
        let started = Instant::now();
        let budget = self.config.time_budget_ms.map(Duration::from_millis);
        let total = factorial(items.len());
        debug!(ready = items.len(), permutations = total, "exhaustive sequencing");

        let mut permutations = Permutations::new(items.len());
        let mut evaluated: Vec<(Vec<usize>, Decimal)> = Vec::with_capacity(total as usize);

        loop {
            let chunk: Vec<Vec<usize>> = permutations.by_ref().take(CHUNK_SIZE).collect();
            if chunk.is_empty() {
                break;
            }
            let costs = self.evaluate(items, &chunk);
            evaluated.extend(chunk.into_iter().zip(costs));

            if let Some(budget) = budget {
                if (evaluated.len() as u64) < total && started.elapsed() > budget {
                    return None;
                }
            }
        }

        Some(build_plan(items, evaluated, SearchMode::Exhaustive))
    }

    fn evaluate(&self, items: &[SequenceItem], chunk: &[Vec<usize>]) -> Vec<Decimal> {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            return chunk.par_iter().map(|order| ordering_cost(items, order)).collect();
        }
        chunk.iter().map(|order| ordering_cost(items, order)).collect()
    }

    /// One ordering per leading activity, the rest by descending charge
    fn heuristic(&self, items: &[SequenceItem]) -> SequencePlan {
        let mut by_charge: Vec<usize> = (0..items.len()).collect();
        by_charge.sort_by(|&a, &b| items[b].charge.cmp(&items[a].charge));

        let evaluated = (0..items.len())
            .map(|lead| {
                let mut order = Vec::with_capacity(items.len());
                order.push(lead);
                order.extend(by_charge.iter().copied().filter(|&i| i != lead));
                let cost = ordering_cost(items, &order);
                (order, cost)
            })
            .collect();

        build_plan(items, evaluated, SearchMode::Heuristic)
    }
}

fn heuristic_summary(ready: usize, options: usize) -> Diagnostic {
    Diagnostic::new(
        DiagnosticCode::I001HeuristicSequencing,
        format!(
            "heuristic sequencing evaluated {} orderings of {} ready activities",
            options, ready
        ),
    )
    .with_note("the result approximates full enumeration")
}

/// Mark the minimum `(cost, enumeration index)` best and materialize options
fn build_plan(items: &[SequenceItem], evaluated: Vec<(Vec<usize>, Decimal)>, search: SearchMode) -> SequencePlan {
    let best_index = evaluated
        .iter()
        .enumerate()
        .min_by(|(ia, (_, ca)), (ib, (_, cb))| ca.cmp(cb).then(ia.cmp(ib)))
        .map(|(i, _)| i);

    let options: Vec<SequenceOption> = evaluated
        .into_iter()
        .enumerate()
        .map(|(k, (order, total))| {
            let activities = order
                .iter()
                .enumerate()
                .map(|(position, &i)| {
                    let item = &items[i];
                    SequencedActivity {
                        id: item.id.clone(),
                        position,
                        delay_cost: if position == 0 { Decimal::ZERO } else { item.charge },
                        score: if position == 0 { item.lead_score } else { item.score },
                    }
                })
                .collect();
            SequenceOption {
                sequence: order.iter().map(|&i| items[i].id.clone()).collect(),
                total_delay_cost: total,
                activities,
                is_best: Some(k) == best_index,
            }
        })
        .collect();

    let (best, min_cost) = best_index
        .and_then(|k| options.get(k))
        .map(|o| (o.sequence.clone(), o.total_delay_cost))
        .unwrap_or_default();

    debug!(options = options.len(), %min_cost, "sequencing complete");

    SequencePlan {
        best,
        min_cost,
        options,
        search,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn items(charges: &[Decimal]) -> Vec<SequenceItem> {
        charges
            .iter()
            .enumerate()
            .map(|(i, &charge)| SequenceItem {
                id: format!("A{}", i + 1),
                charge,
                score: ScoreBreakdown::default(),
                lead_score: ScoreBreakdown::default(),
            })
            .collect()
    }

    fn serial() -> OptimizerConfig {
        OptimizerConfig {
            parallel: false,
            ..OptimizerConfig::default()
        }
    }

    #[test]
    fn permutations_are_lexicographic() {
        let all: Vec<Vec<usize>> = Permutations::new(3).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0],
            ]
        );
        assert_eq!(Permutations::new(5).count(), 120);
        assert_eq!(Permutations::new(1).count(), 1);
    }

    #[test]
    fn costliest_activity_goes_first() {
        let items = items(&[dec!(10), dec!(100), dec!(50)]);
        let (plan, diags) = SequenceOptimizer::new(serial()).best_sequence(&items);

        assert_eq!(plan.first().map(String::as_str), Some("A2"));
        assert_eq!(plan.min_cost, dec!(60));
        assert_eq!(plan.options.len(), 6);
        assert_eq!(plan.search, SearchMode::Exhaustive);
        assert!(diags.is_empty());
    }

    #[test]
    fn exactly_one_best_option_with_minimum_cost() {
        let items = items(&[dec!(5), dec!(5), dec!(5), dec!(1)]);
        let (plan, _) = SequenceOptimizer::new(serial()).best_sequence(&items);

        let best: Vec<&SequenceOption> = plan.options.iter().filter(|o| o.is_best).collect();
        assert_eq!(best.len(), 1);
        assert!(plan.options.iter().all(|o| best[0].total_delay_cost <= o.total_delay_cost));
        // Ties resolve to the first permutation with the minimum
        assert_eq!(best[0].sequence, vec!["A1", "A2", "A3", "A4"]);
    }

    #[test]
    fn first_position_is_free() {
        let items = items(&[dec!(30), dec!(20)]);
        let (plan, _) = SequenceOptimizer::new(serial()).best_sequence(&items);
        let best = plan.best_option().unwrap();

        assert_eq!(best.activities[0].delay_cost, Decimal::ZERO);
        assert_eq!(best.activities[1].delay_cost, dec!(20));
        assert_eq!(best.total_delay_cost, dec!(20));
    }

    #[test]
    fn lead_activity_uses_lead_score() {
        let mut items = items(&[dec!(30), dec!(20)]);
        items[0].lead_score.delay = 0.0;
        items[0].score.delay = 35.0;
        let (plan, _) = SequenceOptimizer::new(serial()).best_sequence(&items);
        let best = plan.best_option().unwrap();

        assert_eq!(best.activities[0].id, "A1");
        assert_eq!(best.activities[0].score.delay, 0.0);
    }

    #[test]
    fn empty_ready_set_yields_empty_plan() {
        let (plan, diags) = SequenceOptimizer::default().best_sequence(&[]);
        assert!(plan.options.is_empty());
        assert!(plan.best.is_empty());
        assert_eq!(plan.min_cost, Decimal::ZERO);
        assert!(diags.is_empty());
    }

    #[test]
    fn heuristic_above_cap() {
        let config = OptimizerConfig {
            max_exhaustive: 3,
            parallel: false,
            time_budget_ms: None,
        };
        let items = items(&[dec!(1), dec!(4), dec!(2), dec!(8)]);
        let (plan, diags) = SequenceOptimizer::new(config).best_sequence(&items);

        assert_eq!(plan.search, SearchMode::Heuristic);
        assert_eq!(plan.options.len(), 4);
        assert_eq!(plan.best, vec!["A4", "A2", "A3", "A1"]);
        assert_eq!(plan.min_cost, dec!(7));
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::W002SequenceCapExceeded));
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::I001HeuristicSequencing));
    }

    #[test]
    fn heuristic_matches_exhaustive_minimum() {
        let charges = [dec!(12), dec!(3), dec!(7), dec!(7), dec!(0)];
        let items = items(&charges);
        let (exact, _) = SequenceOptimizer::new(serial()).best_sequence(&items);
        let capped = OptimizerConfig {
            max_exhaustive: 2,
            ..serial()
        };
        let (approx, _) = SequenceOptimizer::new(capped).best_sequence(&items);

        assert_eq!(exact.min_cost, approx.min_cost);
        assert_eq!(exact.first(), approx.first());
    }

    #[test]
    fn zero_time_budget_falls_back_to_heuristic() {
        let config = OptimizerConfig {
            max_exhaustive: 8,
            parallel: false,
            time_budget_ms: Some(0),
        };
        let charges: Vec<Decimal> = (1..=8).map(Decimal::from).collect();
        let (plan, diags) = SequenceOptimizer::new(config).best_sequence(&items(&charges));

        assert_eq!(plan.search, SearchMode::Heuristic);
        assert_eq!(plan.first().map(String::as_str), Some("A8"));
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::W003OptimizerTimeBudget));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_and_serial_agree() {
        let charges = [dec!(4), dec!(9), dec!(9), dec!(1), dec!(6), dec!(2)];
        let items = items(&charges);
        let (a, _) = SequenceOptimizer::new(serial()).best_sequence(&items);
        let (b, _) = SequenceOptimizer::new(OptimizerConfig::default()).best_sequence(&items);
        assert_eq!(a, b);
    }
}
