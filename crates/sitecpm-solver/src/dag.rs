//! Activity store: dependency graph construction and validation
//!
//! Activities are kept in the caller's slice (the arena) and every
//! relationship is an index into it. Nothing holds a copy of, or a
//! back-reference to, a sibling activity.

use std::collections::{HashMap, HashSet, VecDeque};

use sitecpm_core::{Activity, ActivityId, ConfigError, Diagnostic, DiagnosticCode, ScheduleError};

/// Index of an activity in the store
pub type NodeIndex = usize;

/// A validated, acyclic dependency graph over a slice of activities
#[derive(Debug)]
pub struct ActivityGraph<'a> {
    activities: &'a [Activity],
    index: HashMap<&'a str, NodeIndex>,
    predecessors: Vec<Vec<NodeIndex>>,
    successors: Vec<Vec<NodeIndex>>,
    topo_order: Vec<NodeIndex>,
    /// Dependency ids that reference no activity (lenient mode only)
    dangling: Vec<(NodeIndex, ActivityId)>,
}

impl<'a> ActivityGraph<'a> {
    /// Build the graph, rejecting duplicate ids, bad durations or start days,
    /// and cycles.
    ///
    /// With `strict_references`, a dependency on an unknown id is a
    /// configuration error. Otherwise the dependency is dropped and reported
    /// through [`ActivityGraph::dangling_diagnostics`].
    pub fn build(activities: &'a [Activity], strict_references: bool) -> Result<Self, ScheduleError> {
        let mut errors = Vec::new();
        let mut index: HashMap<&'a str, NodeIndex> = HashMap::with_capacity(activities.len());

        for (i, activity) in activities.iter().enumerate() {
            if activity.id.trim().is_empty() {
                errors.push(ConfigError::EmptyId { index: i });
                continue;
            }
            if index.insert(activity.id.as_str(), i).is_some() {
                errors.push(ConfigError::DuplicateActivity {
                    id: activity.id.clone(),
                });
            }
            if activity.duration < 1 {
                errors.push(ConfigError::InvalidDuration {
                    activity: activity.id.clone(),
                    duration: activity.duration,
                });
            }
            if activity.start_day < 1 {
                errors.push(ConfigError::InvalidStartDay {
                    activity: activity.id.clone(),
                    start_day: activity.start_day,
                });
            }
        }

        let mut predecessors: Vec<Vec<NodeIndex>> = vec![Vec::new(); activities.len()];
        let mut successors: Vec<Vec<NodeIndex>> = vec![Vec::new(); activities.len()];
        let mut dangling = Vec::new();

        for (i, activity) in activities.iter().enumerate() {
            let mut seen = HashSet::new();
            for dep in &activity.dependencies {
                let dep = dep.trim();
                if !seen.insert(dep) {
                    continue;
                }
                match index.get(dep) {
                    Some(&p) => {
                        predecessors[i].push(p);
                        successors[p].push(i);
                    }
                    None if strict_references => errors.push(ConfigError::MissingDependency {
                        activity: activity.id.clone(),
                        missing: dep.to_string(),
                    }),
                    None => dangling.push((i, dep.to_string())),
                }
            }
        }

        if !errors.is_empty() {
            return Err(ScheduleError::Config(errors));
        }

        let topo_order = topological_sort(activities, &successors)?;

        Ok(Self {
            activities,
            index,
            predecessors,
            successors,
            topo_order,
            dangling,
        })
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn activities(&self) -> &'a [Activity] {
        self.activities
    }

    pub fn activity(&self, i: NodeIndex) -> &'a Activity {
        &self.activities[i]
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Resolved predecessors, in declaration order
    pub fn predecessors(&self, i: NodeIndex) -> &[NodeIndex] {
        &self.predecessors[i]
    }

    /// Successors, in activity order
    pub fn successors(&self, i: NodeIndex) -> &[NodeIndex] {
        &self.successors[i]
    }

    pub fn topo_order(&self) -> &[NodeIndex] {
        &self.topo_order
    }

    /// Sorted, resolved dependency ids; equal keys mean equal dependency sets
    pub fn dependency_key(&self, i: NodeIndex) -> Vec<&'a str> {
        let mut key: Vec<&'a str> = self.predecessors[i]
            .iter()
            .map(|&p| self.activities[p].id.as_str())
            .collect();
        key.sort_unstable();
        key
    }

    /// True when `a` and `b` are linked by an edge or share a predecessor
    pub fn are_linked(&self, a: NodeIndex, b: NodeIndex) -> bool {
        if a == b {
            return false;
        }
        let direct = self.predecessors[a].contains(&b) || self.successors[a].contains(&b);
        direct
            || self.predecessors[a]
                .iter()
                .any(|p| self.predecessors[b].contains(p))
    }

    /// True when `a` and `b` are linked, or share a successor
    pub fn are_adjacent(&self, a: NodeIndex, b: NodeIndex) -> bool {
        if a == b {
            return false;
        }
        self.are_linked(a, b)
            || self.successors[a]
                .iter()
                .any(|s| self.successors[b].contains(s))
    }

    /// C001 warnings for dependencies dropped in lenient mode
    pub fn dangling_diagnostics(&self) -> Vec<Diagnostic> {
        self.dangling
            .iter()
            .map(|(i, missing)| {
                let id = &self.activities[*i].id;
                Diagnostic::new(
                    DiagnosticCode::C001MissingDependency,
                    format!("activity '{}' depends on '{}' which doesn't exist", id, missing),
                )
                .for_activity(id.clone())
                .with_note("the dependency is ignored for scheduling")
            })
            .collect()
    }
}

/// Kahn's algorithm, seeded and drained in activity order so the result is
/// deterministic
fn topological_sort(
    activities: &[Activity],
    successors: &[Vec<NodeIndex>],
) -> Result<Vec<NodeIndex>, ConfigError> {
    let mut in_degree = vec![0usize; activities.len()];
    for edges in successors {
        for &to in edges {
            in_degree[to] += 1;
        }
    }

    let mut queue: VecDeque<NodeIndex> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &deg)| deg == 0)
        .map(|(i, _)| i)
        .collect();

    let mut result = Vec::with_capacity(activities.len());

    while let Some(i) = queue.pop_front() {
        result.push(i);
        for &to in &successors[i] {
            in_degree[to] -= 1;
            if in_degree[to] == 0 {
                queue.push_back(to);
            }
        }
    }

    if result.len() != activities.len() {
        let remaining = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg > 0)
            .map(|(i, _)| activities[i].id.clone())
            .collect();
        return Err(ConfigError::CyclicDependency {
            activities: remaining,
        });
    }

    Ok(result)
}
