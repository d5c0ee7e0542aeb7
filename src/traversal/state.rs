use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, VecDeque};

use crate::cache::NeighborCache;
use crate::graph::{add_edge, edge_count, Adjacency};

/// Complete working state of one neighborhood traversal.
///
/// Owned by a single collector. Invariant: every id that appears in
/// `adjacency`, as a key or as a neighbor, is also in `visited`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalState {
    pub seed_ids: BTreeSet<String>,
    /// Radius this traversal was started with; a checkpoint only resumes under the same bound.
    pub max_depth: usize,
    pub visited: BTreeSet<String>,
    /// Pending `(node, depth)` pairs in BFS order.
    pub frontier: VecDeque<(String, usize)>,
    pub adjacency: Adjacency,
    pub cache: NeighborCache,
    /// Nodes whose neighbors have been expanded.
    pub processed_count: usize,
    /// When this state was last checkpointed.
    pub saved_at: Option<DateTime<Utc>>,
}

impl TraversalState {
    /// Fresh state: every seed visited, queued at depth 0, with an empty adjacency entry.
    pub fn new(seed_ids: &BTreeSet<String>, max_depth: usize) -> Self {
        let mut state = Self {
            seed_ids: seed_ids.clone(),
            max_depth,
            visited: BTreeSet::new(),
            frontier: VecDeque::new(),
            adjacency: Adjacency::new(),
            cache: NeighborCache::new(),
            processed_count: 0,
            saved_at: None,
        };
        for seed in seed_ids {
            state.visited.insert(seed.clone());
            state.frontier.push_back((seed.clone(), 0));
            state.adjacency.entry(seed.clone()).or_default();
        }
        state
    }

    /// Record an undirected edge between two visited nodes.
    pub fn link(&mut self, a: &str, b: &str) {
        add_edge(&mut self.adjacency, a, b);
    }

    /// Number of undirected edges collected so far.
    pub fn edge_count(&self) -> usize {
        edge_count(&self.adjacency)
    }

    /// Check the visited/adjacency invariant.
    pub fn is_consistent(&self) -> bool {
        self.adjacency.iter().all(|(node, neighbors)| {
            self.visited.contains(node) && neighbors.iter().all(|n| self.visited.contains(n))
        })
    }
}
