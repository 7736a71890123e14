//! Randomized cross-check of the engine against exhaustive search.
//!
//! Each iteration generates a small random graph and query from a seeded
//! ChaCha PRNG, answers the query with the [`Engine`] and with a brute-force
//! enumeration of every simple path, and records a failure when the two
//! disagree on the node sequence or the score.
//!
//! Reproducibility: the same `random_seed` generates the same graphs and
//! queries, so a failing seed can be replayed exactly.
//!
//! Attribute values are drawn from small sets of exactly representable
//! numbers (integers, dyadic reliabilities) so that both sides compute
//! bit-identical scores.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use routegraph_core::{CoreError, EdgeAttrs, EdgeId, NodeId, Snapshot, SnapshotBuilder};

use crate::constraints::Constraints;
use crate::engine::{Engine, SearchConfig};
use crate::error::QueryError;
use crate::objective::Objective;
use crate::route::{Path, Route, RouteQuery};

/// Configuration for a verification run.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Number of random graph/query pairs to check.
    pub iterations: u32,
    /// Seed for the PRNG.
    pub random_seed: u64,
    /// Graphs have between 1 and `max_nodes` nodes.
    pub max_nodes: usize,
    /// Engine settings under test. Bucketed resolutions may legitimately
    /// miss constrained routes, so exact is the usual choice.
    pub search: SearchConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        VerifyConfig {
            iterations: 100,
            random_seed: 0,
            max_nodes: 6,
            search: SearchConfig::exact(),
        }
    }
}

/// Outcome of a verification run.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    pub total_run: u32,
    pub passed: u32,
    pub failures: Vec<VerifyFailure>,
    /// The seed used, for replay.
    pub random_seed: u64,
}

impl VerifyResult {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One disagreement, with everything needed to reproduce it.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyFailure {
    pub iteration: u32,
    pub graph: RandomGraph,
    pub query: RouteQuery,
    pub expected: Option<Route>,
    /// Engine result, or its error message.
    pub actual: Result<Option<Route>, String>,
}

/// A generated graph in edge-list form.
#[derive(Debug, Clone, Serialize)]
pub struct RandomGraph {
    pub node_count: usize,
    pub directed: bool,
    pub unavailable: Vec<NodeId>,
    pub edges: Vec<(NodeId, NodeId, EdgeAttrs)>,
}

impl RandomGraph {
    pub fn snapshot(&self) -> Result<Snapshot, CoreError> {
        let mut builder = SnapshotBuilder::new(self.node_count)?;
        for (i, &(u, v, attrs)) in self.edges.iter().enumerate() {
            builder.push_link(u, v, EdgeId(i as u32), attrs, self.directed)?;
        }
        for &node in &self.unavailable {
            builder.set_available(node, false)?;
        }
        Ok(builder.build())
    }
}

/// Generates a random graph with small, exactly representable attributes.
///
/// About a third of node pairs are linked and some links get a parallel
/// twin, so ties and parallel-edge handling come up often.
pub fn generate_graph(rng: &mut ChaCha8Rng, max_nodes: usize) -> RandomGraph {
    let node_count = rng.gen_range(1..=max_nodes.max(1));
    let directed = rng.gen_bool(0.5);
    let mut edges = Vec::new();
    for u in 0..node_count as u32 {
        let start = if directed { 0 } else { u };
        for v in start..node_count as u32 {
            if u == v || !rng.gen_ratio(1, 3) {
                continue;
            }
            let copies = if rng.gen_ratio(1, 6) { 2 } else { 1 };
            for _ in 0..copies {
                edges.push((NodeId(u), NodeId(v), generate_attrs(rng)));
            }
        }
    }
    let unavailable = (0..node_count as u32)
        .filter(|_| rng.gen_ratio(1, 10))
        .map(NodeId)
        .collect();
    RandomGraph {
        node_count,
        directed,
        unavailable,
        edges,
    }
}

fn generate_attrs(rng: &mut ChaCha8Rng) -> EdgeAttrs {
    const RELIABILITIES: [f64; 4] = [1.0, 0.75, 0.5, 0.25];
    let mut attrs = EdgeAttrs::new(f64::from(rng.gen_range(0u8..=6)))
        .with_reliability(RELIABILITIES[rng.gen_range(0..RELIABILITIES.len())])
        .with_toll(f64::from(rng.gen_range(0u8..=3)));
    if rng.gen_ratio(3, 4) {
        attrs = attrs.with_capacity(f64::from(rng.gen_range(1u8..=5) * 10));
    }
    attrs
}

/// Generates a query with each constraint present about a third of the
/// time.
pub fn generate_query(rng: &mut ChaCha8Rng, node_count: usize) -> RouteQuery {
    let node = |rng: &mut ChaCha8Rng| NodeId(rng.gen_range(0..node_count as u32));
    let source = node(rng);
    let destination = node(rng);
    let objective = match rng.gen_range(0..3) {
        0 => Objective::Weight,
        1 => Objective::Capacity,
        _ => Objective::Reliability,
    };
    let mut constraints = Constraints::none();
    if rng.gen_ratio(1, 3) {
        constraints.max_weight = Some(f64::from(rng.gen_range(0u8..=12)));
    }
    if rng.gen_ratio(1, 4) {
        constraints.min_capacity = Some(f64::from(rng.gen_range(1u8..=4) * 10));
    }
    if rng.gen_ratio(1, 3) {
        constraints.max_toll = Some(f64::from(rng.gen_range(0u8..=5)));
    }
    if rng.gen_ratio(1, 4) {
        constraints.min_reliability = Some([0.25, 0.5, 0.75][rng.gen_range(0..3)]);
    }
    if rng.gen_ratio(1, 4) {
        constraints.max_hops = Some(rng.gen_range(1..=4));
    }
    RouteQuery {
        source,
        destination,
        objective,
        constraints,
    }
}

/// Best route by exhaustive enumeration of simple paths.
pub fn brute_force(snapshot: &Snapshot, query: &RouteQuery) -> Option<Route> {
    if query.source == query.destination {
        return Some(Route::trivial(query.source, query.objective));
    }
    if !snapshot.is_available(query.source) {
        return None;
    }
    let mut best: Option<Route> = None;
    let mut path = Path {
        nodes: vec![query.source],
        edges: Vec::new(),
    };
    enumerate(snapshot, query, &mut path, &mut best);
    best
}

fn enumerate(snapshot: &Snapshot, query: &RouteQuery, path: &mut Path, best: &mut Option<Route>) {
    let Some(&at) = path.nodes.last() else {
        return;
    };
    if at == query.destination {
        let route = Route::from_path(path.clone(), query.objective);
        if query.constraints.admits(&route)
            && best
                .as_ref()
                .map_or(true, |b| route.preference_cmp(b).is_lt())
        {
            *best = Some(route);
        }
        return;
    }
    for edge in snapshot.out_edges(at) {
        if path.nodes.contains(&edge.to)
            || !snapshot.is_available(edge.to)
            || !query
                .constraints
                .admits_capacity(edge.attrs.capacity_or_unlimited())
        {
            continue;
        }
        path.nodes.push(edge.to);
        path.edges.push(edge.attrs);
        enumerate(snapshot, query, path, best);
        path.nodes.pop();
        path.edges.pop();
    }
}

fn agrees(expected: &Option<Route>, actual: &Option<Route>) -> bool {
    match (expected, actual) {
        (None, None) => true,
        (Some(e), Some(a)) => e.nodes == a.nodes && e.score == a.score,
        _ => false,
    }
}

/// Runs `config.iterations` random cross-checks.
pub fn run_verification(config: &VerifyConfig) -> Result<VerifyResult, QueryError> {
    config.search.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.random_seed);
    let engine = Engine::with_config(config.search);
    let mut passed = 0;
    let mut failures = Vec::new();

    for iteration in 0..config.iterations {
        let graph = generate_graph(&mut rng, config.max_nodes);
        let query = generate_query(&mut rng, graph.node_count);
        let snapshot = graph.snapshot()?;

        let expected = brute_force(&snapshot, &query);
        let actual = engine.route(&snapshot, &query);
        let ok = matches!(&actual, Ok(route) if agrees(&expected, route));
        if ok {
            passed += 1;
        } else {
            tracing::debug!(iteration, ?query, "engine disagrees with exhaustive search");
            failures.push(VerifyFailure {
                iteration,
                graph,
                query,
                expected,
                actual: actual.map_err(|e| e.to_string()),
            });
        }
    }

    Ok(VerifyResult {
        total_run: config.iterations,
        passed,
        failures,
        random_seed: config.random_seed,
    })
}
