//! Leaf pruning of a collected neighborhood down to seed-connecting structure.
//!
//! A non-seed node with degree <= 1 cannot lie on a path between two other
//! nodes. Removing all such nodes in batches until nothing qualifies leaves the
//! union of paths between seeds (not a minimum Steiner tree; redundant
//! alternate paths survive).

use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};

use super::Adjacency;

/// Upper bound on pruning passes.
pub const DEFAULT_MAX_PASSES: usize = 100;

/// Result of `filter_paths`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOutcome {
    pub filtered: Adjacency,
    pub pruned_node_count: usize,
    pub pruned_edge_count: usize,
    /// Passes that removed at least one node.
    pub passes: usize,
}

/// Count undirected edges, each unordered pair once.
pub fn edge_count(adjacency: &Adjacency) -> usize {
    let mut pairs: HashSet<(&str, &str)> = HashSet::new();
    for (node, neighbors) in adjacency {
        for neighbor in neighbors {
            let pair = if node.as_str() <= neighbor.as_str() {
                (node.as_str(), neighbor.as_str())
            } else {
                (neighbor.as_str(), node.as_str())
            };
            pairs.insert(pair);
        }
    }
    pairs.len()
}

/// Iteratively remove non-seed nodes of degree <= 1.
///
/// Each pass marks every qualifying node against the degrees at the start of
/// the pass, then removes them all at once. Stops at a fixed point or after
/// `max_passes` passes.
pub fn filter_paths(
    adjacency: &Adjacency,
    seeds: &BTreeSet<String>,
    max_passes: usize,
) -> FilterOutcome {
    let mut filtered = adjacency.clone();
    let mut passes = 0;

    while passes < max_passes {
        let marked: Vec<String> = filtered
            .iter()
            .filter(|(node, neighbors)| !seeds.contains(*node) && neighbors.len() <= 1)
            .map(|(node, _)| node.clone())
            .collect();

        if marked.is_empty() {
            break;
        }
        passes += 1;

        for node in &marked {
            if let Some(neighbors) = filtered.remove(node) {
                for neighbor in neighbors {
                    if let Some(back) = filtered.get_mut(&neighbor) {
                        back.remove(node);
                    }
                }
            }
        }
        log::debug!("Prune pass {}: removed {} nodes", passes, marked.len());
    }

    if passes == max_passes {
        log::warn!("Pruning stopped at the {} pass cap", max_passes);
    }

    let pruned_node_count = adjacency.len() - filtered.len();
    let pruned_edge_count = edge_count(adjacency).saturating_sub(edge_count(&filtered));

    FilterOutcome {
        filtered,
        pruned_node_count,
        pruned_edge_count,
        passes,
    }
}

/// Seed membership of each connected component of `adjacency`.
///
/// Returns one sorted group of seed ids per component that contains at least
/// one seed present in the map. Seeds absent from the map are skipped.
pub fn seed_components(adjacency: &Adjacency, seeds: &BTreeSet<String>) -> Vec<Vec<String>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut groups = Vec::new();

    for seed in seeds {
        if visited.contains(seed.as_str()) || !adjacency.contains_key(seed) {
            continue;
        }

        let mut group = Vec::new();
        let mut queue = VecDeque::new();
        visited.insert(seed.as_str());
        queue.push_back(seed.as_str());

        while let Some(node) = queue.pop_front() {
            if seeds.contains(node) {
                group.push(node.to_string());
            }
            if let Some(neighbors) = adjacency.get(node) {
                for neighbor in neighbors {
                    if adjacency.contains_key(neighbor) && visited.insert(neighbor.as_str()) {
                        queue.push_back(neighbor.as_str());
                    }
                }
            }
        }

        group.sort();
        groups.push(group);
    }

    groups
}

/// Number of components that join more than one seed.
pub fn connected_components(adjacency: &Adjacency, seeds: &BTreeSet<String>) -> usize {
    seed_components(adjacency, seeds)
        .iter()
        .filter(|group| group.len() > 1)
        .count()
}
