//! Clustering engine.
//!
//! # Algorithm
//!
//! 1. Gather the requested people into blocks (pre-cluster value, or alone)
//!    and let every constraint tally its per-block values.
//! 2. Place blocks one at a time, largest first (ties in first-seen order):
//!    - one binary variable per cluster every constraint admits, at most one
//!      chosen
//!    - coefficient: `block size × assignment_weight`, plus each constraint's
//!      score against the totals placed so far, minus a small spread term
//!      favoring emptier and lower-numbered clusters
//!    - a block whose model selects nothing stays unplaced
//! 3. Repeat up to `max_attempts` times, stopping once everyone is placed,
//!    and keep the attempt that placed the most people.
//! 4. Write each placed person's cluster number (0-based) into the named
//!    property.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use super::{BlockKey, ClusterConstraint};
use crate::config::ClusterConfig;
use crate::error::{AssignmentError, AssignmentResult};
use crate::ilp::{Bound, IlpSolver, MicroLpSolver, Model};
use crate::models::{Competition, ExtensionValue, Person, PersonId};
use crate::timing::Timings;
use crate::validation::validate_cluster_request;
use crate::warning::{Warning, WarningKind, Warnings};

/// Upper bound of the spread term; below any meaningful score difference.
const SPREAD_WEIGHT: f64 = 1e-2;

/// Pre-cluster key: people returning the same truthy value share a block.
pub type PreClusterFn = Arc<dyn Fn(&Person) -> Option<ExtensionValue> + Send + Sync>;

/// Pre-clusters by a custom property.
pub fn pre_cluster_by_property(name: impl Into<String>) -> PreClusterFn {
    let name = name.into();
    Arc::new(move |p: &Person| p.property(&name).cloned())
}

/// Input for one clustering run.
pub struct ClusterRequest {
    /// Property receiving each person's cluster number.
    pub name: String,
    /// Number of clusters.
    pub cluster_count: usize,
    /// People to cluster.
    pub people: Vec<PersonId>,
    /// Optional pre-cluster key.
    pub pre_cluster: Option<PreClusterFn>,
    /// Balance and limit constraints.
    pub constraints: Vec<Box<dyn ClusterConstraint>>,
}

impl ClusterRequest {
    /// Creates a request without constraints.
    pub fn new(
        name: impl Into<String>,
        cluster_count: usize,
        people: impl IntoIterator<Item = PersonId>,
    ) -> Self {
        Self {
            name: name.into(),
            cluster_count,
            people: people.into_iter().collect(),
            pre_cluster: None,
            constraints: Vec::new(),
        }
    }

    /// Keeps people sharing a key together.
    pub fn with_pre_cluster(mut self, key: PreClusterFn) -> Self {
        self.pre_cluster = Some(key);
        self
    }

    /// Adds a constraint.
    pub fn with_constraint(mut self, constraint: impl ClusterConstraint + 'static) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }
}

/// One cluster of the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    /// Cluster number (0-based).
    pub cluster: usize,
    /// Members, by id.
    pub people: Vec<PersonId>,
    /// Total of each constraint's value, by constraint name.
    pub totals: BTreeMap<String, f64>,
}

/// Result of a clustering run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOutcome {
    /// Every cluster, in number order.
    pub clusters: Vec<ClusterSummary>,
    /// Whether everyone was placed.
    pub solved: bool,
    /// Attempts made.
    pub attempts: usize,
    /// People placed.
    pub assigned: usize,
    /// People requested.
    pub total: usize,
    /// Summed objective of the kept attempt's solves.
    pub objective: f64,
    /// Models solved by the kept attempt.
    pub solves: usize,
    /// Variables over the kept attempt's models.
    pub variables: usize,
    /// Constraints over the kept attempt's models.
    pub constraints: usize,
    /// Non-fatal conditions.
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Placement {
    block: usize,
    cluster: usize,
}

#[derive(Debug)]
struct Block {
    key: BlockKey,
    people: Vec<PersonId>,
}

#[derive(Debug, Default)]
struct Attempt {
    placements: Vec<Placement>,
    assigned: usize,
    objective: f64,
    solves: usize,
    variables: usize,
    constraints: usize,
}

/// Partitions people into clusters.
#[derive(Debug)]
pub struct Clusterer {
    config: ClusterConfig,
    solver: Box<dyn IlpSolver>,
}

impl Default for Clusterer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clusterer {
    /// Creates an engine with default tuning and the bundled solver.
    pub fn new() -> Self {
        Self {
            config: ClusterConfig::default(),
            solver: Box::new(MicroLpSolver),
        }
    }

    /// Sets the tuning.
    pub fn with_config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the solver backend.
    pub fn with_solver(mut self, solver: impl IlpSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Clusters the requested people and records the result on them.
    ///
    /// # Errors
    /// Unknown person, malformed request, or a solver backend failure.
    pub fn cluster(
        &self,
        competition: &mut Competition,
        mut request: ClusterRequest,
        timings: &mut Timings,
    ) -> AssignmentResult<ClusterOutcome> {
        let total_token = timings.start("clustering");
        validate_cluster_request(&request.name, request.cluster_count)
            .map_err(AssignmentError::InvalidInput)?;

        let blocks = load_blocks(competition, &mut request)?;
        let total: usize = blocks.iter().map(|b| b.people.len()).sum();
        tracing::info!(
            name = %request.name,
            clusters = request.cluster_count,
            people = total,
            blocks = blocks.len(),
            "Clustering"
        );

        let mut order: Vec<usize> = (0..blocks.len()).collect();
        order.sort_by_key(|&b| Reverse(blocks[b].people.len()));

        let max_attempts = self.config.max_attempts.max(1);
        let mut best = self.place(&request, &blocks, &order, total, timings)?;
        let mut attempts = 1;
        tracing::debug!(attempt = 0, assigned = best.assigned, total, "Clustering attempt");
        while best.assigned < total && attempts < max_attempts {
            let retry = self.place(&request, &blocks, &order, total, timings)?;
            tracing::debug!(attempt = attempts, assigned = retry.assigned, total, "Clustering attempt");
            attempts += 1;
            if retry.assigned > best.assigned {
                best = retry;
            }
        }

        let mut warnings = Warnings::default();
        let mut outcome = ClusterOutcome {
            clusters: (0..request.cluster_count)
                .map(|cluster| ClusterSummary {
                    cluster,
                    people: Vec::new(),
                    totals: request
                        .constraints
                        .iter()
                        .map(|c| (c.name().to_string(), 0.0))
                        .collect(),
                })
                .collect(),
            attempts,
            total,
            ..ClusterOutcome::default()
        };

        for placement in &best.placements {
            let block = &blocks[placement.block];
            let summary = &mut outcome.clusters[placement.cluster];
            summary.people.extend(block.people.iter().copied());
            for constraint in &request.constraints {
                if let Some(t) = summary.totals.get_mut(constraint.name()) {
                    *t += constraint.tally().block_value(&block.key);
                }
            }
            for &id in &block.people {
                if let Some(person) = competition.person_mut(id) {
                    person.set_property(&request.name, (placement.cluster as f64).into());
                }
            }
        }
        for summary in &mut outcome.clusters {
            summary.people.sort();
        }
        if best.assigned < total {
            warnings.push(Warning::new(
                WarningKind::Infeasible,
                request.name.clone(),
                format!(
                    "{} of {total} people could not be clustered for '{}' after {attempts} attempts",
                    total - best.assigned,
                    request.name
                ),
            ));
        }
        outcome.solved = best.assigned == total;
        outcome.assigned = best.assigned;
        outcome.objective = best.objective;
        outcome.solves = best.solves;
        outcome.variables = best.variables;
        outcome.constraints = best.constraints;

        outcome.warnings = warnings.into_vec();
        tracing::info!(
            solved = outcome.solved,
            attempts,
            assigned = outcome.assigned,
            total,
            "Clustering finished"
        );
        timings.finish(total_token);
        Ok(outcome)
    }

    /// Places every block in `order` against running totals.
    fn place(
        &self,
        request: &ClusterRequest,
        blocks: &[Block],
        order: &[usize],
        population: usize,
        timings: &mut Timings,
    ) -> AssignmentResult<Attempt> {
        let clusters = request.cluster_count;
        let mut members = vec![0usize; clusters];
        let mut totals = vec![vec![0.0; clusters]; request.constraints.len()];
        let mut attempt = Attempt::default();

        for &b in order {
            let block = &blocks[b];
            let model = self.build_model(request, b, block, &members, &totals, population);
            if model.variable_count() == 0 {
                tracing::debug!(block = %block.key, "No cluster admits block");
                continue;
            }
            attempt.solves += 1;
            attempt.variables += model.variable_count();
            attempt.constraints += model.constraint_count();

            let token = timings.start("clustering.solve");
            let solved = model.solve(self.solver.as_ref());
            timings.finish(token);

            let solution = match solved {
                Ok(solution) => solution,
                Err(e) if e.is_infeasible() => {
                    tracing::debug!(block = %block.key, "Block placement infeasible");
                    continue;
                }
                Err(e) => return Err(AssignmentError::Solver(e)),
            };
            attempt.objective += solution.objective;
            for placement in solution.selected {
                members[placement.cluster] += block.people.len();
                for (constraint, t) in request.constraints.iter().zip(totals.iter_mut()) {
                    t[placement.cluster] += constraint.tally().block_value(&block.key);
                }
                attempt.assigned += block.people.len();
                attempt.placements.push(placement);
            }
        }
        Ok(attempt)
    }

    fn build_model(
        &self,
        request: &ClusterRequest,
        index: usize,
        block: &Block,
        members: &[usize],
        totals: &[Vec<f64>],
        population: usize,
    ) -> Model<Placement> {
        let clusters = request.cluster_count;
        let weight = block.people.len() as f64 * self.config.assignment_weight;
        let mut model: Model<Placement> = Model::new("clustering");
        let mut vars = Vec::with_capacity(clusters);

        for cluster in 0..clusters {
            let admitted = request
                .constraints
                .iter()
                .zip(totals)
                .all(|(c, t)| c.admits(t, cluster, &block.key));
            if !admitted {
                continue;
            }
            let score: f64 = request
                .constraints
                .iter()
                .zip(totals)
                .map(|(c, t)| c.score(t, cluster, &block.key))
                .sum();
            let spread = SPREAD_WEIGHT * (members[cluster] as f64 + cluster as f64 / clusters as f64)
                / (population as f64 + 1.0);
            let var = model.add_binary_var(Placement {
                block: index,
                cluster,
            });
            model.set_objective_coefficient(var, weight + score - spread);
            vars.push(var);
        }
        if !vars.is_empty() {
            model.add_sum_constraint(vars, Bound::AtMost(1.0));
        }
        model
    }
}

/// Builds blocks in first-seen order and loads every constraint.
fn load_blocks(competition: &Competition, request: &mut ClusterRequest) -> AssignmentResult<Vec<Block>> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut by_key: HashMap<BlockKey, usize> = HashMap::new();
    let mut seen = HashSet::new();

    for &id in &request.people {
        if !seen.insert(id) {
            continue;
        }
        let person = competition
            .person(id)
            .ok_or(AssignmentError::UnknownPerson(id))?;
        let key = match request.pre_cluster.as_ref().and_then(|f| f(person)) {
            Some(value) if value.is_truthy() => BlockKey::Cluster(value.key_string()),
            _ => BlockKey::Person(id),
        };
        for constraint in &mut request.constraints {
            constraint.load_person(person, &key);
        }
        let index = *by_key.entry(key.clone()).or_insert_with(|| {
            blocks.push(Block {
                key,
                people: Vec::new(),
            });
            blocks.len() - 1
        });
        blocks[index].people.push(id);
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{BalanceConstraint, LimitConstraint};
    use crate::filter::property_key;

    fn people(n: u32) -> Competition {
        (1..=n).fold(Competition::new("Clusters"), |c, id| {
            c.with_person(Person::new(id, format!("Person {id}")))
        })
    }

    fn ids(n: u32) -> Vec<PersonId> {
        (1..=n).map(PersonId).collect()
    }

    fn run(competition: &mut Competition, request: ClusterRequest) -> ClusterOutcome {
        Clusterer::new()
            .cluster(competition, request, &mut Timings::new())
            .unwrap()
    }

    fn cluster_of(competition: &Competition, id: u32, name: &str) -> Option<f64> {
        competition
            .person(PersonId(id))
            .and_then(|p| p.property(name))
            .and_then(|v| v.as_f64())
    }

    #[test]
    fn test_even_split_with_limit() {
        let mut c = people(9);
        let outcome = run(
            &mut c,
            ClusterRequest::new("lunch", 3, ids(9)).with_constraint(LimitConstraint::count("size", 3.0)),
        );
        assert!(outcome.solved);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.assigned, 9);
        assert!(outcome.warnings.is_empty());
        for summary in &outcome.clusters {
            assert_eq!(summary.people.len(), 3);
            assert!((summary.totals["size"] - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_writes_cluster_property() {
        let mut c = people(4);
        let outcome = run(&mut c, ClusterRequest::new("shift", 2, ids(4)));
        assert!(outcome.solved);
        for summary in &outcome.clusters {
            for id in &summary.people {
                assert_eq!(cluster_of(&c, id.0, "shift"), Some(summary.cluster as f64));
            }
        }
        assert!((1..=4).all(|id| cluster_of(&c, id, "shift").is_some()));
    }

    #[test]
    fn test_pre_clusters_stay_together() {
        let teams = ["a", "a", "b", "b", "c", "c", ""];
        let mut c = Competition::new("Teams");
        for (i, team) in teams.iter().enumerate() {
            let id = i as u32 + 1;
            c = c.with_person(Person::new(id, format!("Person {id}")).with_property("team", *team));
        }

        let outcome = run(
            &mut c,
            ClusterRequest::new("color", 3, ids(7))
                .with_pre_cluster(pre_cluster_by_property("team"))
                .with_constraint(LimitConstraint::count("size", 2.0)),
        );
        assert!(outcome.solved, "{:?}", outcome.warnings);
        for pair in [(1, 2), (3, 4), (5, 6)] {
            assert_eq!(cluster_of(&c, pair.0, "color"), cluster_of(&c, pair.1, "color"));
        }
        // the three teams need three different clusters to reach the minimum
        let team_clusters: HashSet<u64> = [1, 3, 5]
            .iter()
            .filter_map(|&id| cluster_of(&c, id, "color"))
            .map(|v| v as u64)
            .collect();
        assert_eq!(team_clusters.len(), 3);
    }

    #[test]
    fn test_balance_spreads_property() {
        let mut c = Competition::new("Balance");
        for id in 1..=6 {
            c = c.with_person(Person::new(id, format!("Person {id}")).with_property("experienced", id <= 4));
        }
        let outcome = run(
            &mut c,
            ClusterRequest::new("team", 2, ids(6))
                .with_constraint(BalanceConstraint::new("experienced", property_key("experienced"), 10.0))
                .with_constraint(LimitConstraint::count("size", 3.0)),
        );
        assert!(outcome.solved);
        for summary in &outcome.clusters {
            assert!((summary.totals["experienced"] - 2.0).abs() < 1e-9);
            assert_eq!(summary.people.len(), 3);
        }
    }

    #[test]
    fn test_balance_steers_placement() {
        // experienced people have odd ids, so alternating placement would stack them
        let build = || {
            (1..=8).fold(Competition::new("Balance"), |c, id| {
                c.with_person(Person::new(id, format!("Person {id}")).with_property("experienced", id % 2 == 1))
            })
        };

        let mut plain = build();
        let outcome = run(&mut plain, ClusterRequest::new("team", 2, ids(8)));
        assert!(outcome.solved);
        assert!([1, 3, 5, 7].iter().all(|&id| cluster_of(&plain, id, "team") == Some(0.0)));

        let mut c = build();
        let outcome = run(
            &mut c,
            ClusterRequest::new("team", 2, ids(8))
                .with_constraint(BalanceConstraint::new("experienced", property_key("experienced"), 1000.0)),
        );
        assert!(outcome.solved);
        assert_eq!(outcome.solves, 8);
        for summary in &outcome.clusters {
            assert!((summary.totals["experienced"] - 2.0).abs() < 1e-9, "{summary:?}");
            assert_eq!(summary.people.len(), 4);
        }
    }

    #[test]
    fn test_unreachable_minimum_still_places_everyone() {
        let mut c = people(4);
        let outcome = run(
            &mut c,
            ClusterRequest::new("lunch", 2, ids(4)).with_constraint(LimitConstraint::count("size", 3.0)),
        );
        assert!(outcome.solved);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.assigned, 4);
        assert!(outcome.clusters.iter().all(|s| s.people.len() == 2));
    }

    #[test]
    fn test_max_caps_clusters() {
        let mut c = people(5);
        let outcome = run(
            &mut c,
            ClusterRequest::new("lunch", 2, ids(5))
                .with_constraint(LimitConstraint::count("size", 0.0).with_max(2.0)),
        );
        assert!(!outcome.solved);
        assert_eq!(outcome.attempts, 10);
        assert_eq!(outcome.assigned, 4);
        assert!(outcome.clusters.iter().all(|s| s.people.len() == 2));
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::Infeasible);
        assert_eq!(cluster_of(&c, 5, "lunch"), None);
    }

    #[test]
    fn test_penalty_outweighs_small_assignment_weight() {
        let mut c = people(4);
        let outcome = Clusterer::new()
            .with_config(ClusterConfig::default().with_assignment_weight(50.0))
            .cluster(
                &mut c,
                ClusterRequest::new("lunch", 2, ids(4)).with_constraint(LimitConstraint::count("size", 3.0)),
                &mut Timings::new(),
            )
            .unwrap();
        assert!(!outcome.solved);
        assert_eq!(outcome.assigned, 0);
        assert_eq!(outcome.solves, 4);
        assert!((1..=4).all(|id| cluster_of(&c, id, "lunch").is_none()));
    }

    #[test]
    fn test_block_over_ceiling_stays_unplaced() {
        let mut c = Competition::new("One block");
        for id in 1..=4 {
            c = c.with_person(Person::new(id, format!("Person {id}")).with_property("team", "x"));
        }
        let outcome = Clusterer::new()
            .with_config(ClusterConfig::default().with_max_attempts(1))
            .cluster(
                &mut c,
                ClusterRequest::new("lunch", 2, ids(4))
                    .with_pre_cluster(pre_cluster_by_property("team"))
                    .with_constraint(LimitConstraint::count("size", 0.0).with_max(3.0)),
                &mut Timings::new(),
            )
            .unwrap();
        assert!(!outcome.solved);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.solves, 0);
        assert_eq!(outcome.warnings[0].kind, WarningKind::Infeasible);
        assert!((1..=4).all(|id| cluster_of(&c, id, "lunch").is_none()));
    }

    #[test]
    fn test_deterministic() {
        let request = || {
            ClusterRequest::new("lunch", 3, ids(10)).with_constraint(LimitConstraint::count("size", 3.0))
        };
        let mut a = people(10);
        let mut b = people(10);
        let first = run(&mut a, request());
        let second = run(&mut b, request());
        assert_eq!(first.clusters, second.clusters);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_invalid_requests() {
        let mut c = people(2);
        let err = Clusterer::new()
            .cluster(&mut c, ClusterRequest::new("lunch", 0, ids(2)), &mut Timings::new())
            .unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidInput(_)));

        let err = Clusterer::new()
            .cluster(&mut c, ClusterRequest::new("lunch", 2, [PersonId(9)]), &mut Timings::new())
            .unwrap_err();
        assert!(matches!(err, AssignmentError::UnknownPerson(PersonId(9))));
    }
}
