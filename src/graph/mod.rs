//! Graph presentation model and the pure graph algorithms.
//!
//! Classifies identifiers, prunes a collected neighborhood down to the
//! structure connecting the seeds, and assembles node/edge lists for display.

mod assemble;
mod classify;
mod filter;

pub use assemble::{from_adjacency, from_tuples, node_size, PathGraph, TupleGraph};
pub use classify::{classify, normalize_id, Classification};
pub use filter::{
    connected_components, edge_count, filter_paths, seed_components, FilterOutcome,
    DEFAULT_MAX_PASSES,
};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Undirected adjacency list: node id -> neighbor ids.
pub type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Add an undirected edge to an adjacency list.
pub fn add_edge(adjacency: &mut Adjacency, a: &str, b: &str) {
    adjacency
        .entry(a.to_string())
        .or_default()
        .insert(b.to_string());
    adjacency
        .entry(b.to_string())
        .or_default()
        .insert(a.to_string());
}

/// A graph node ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Normalized namespaced identifier, e.g. `HGNC:8651`.
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub group: u8,
    pub is_seed: bool,
    pub degree: usize,
    pub size: usize,
}

/// A graph edge ready for display. Orientation follows the producing tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: String,
    pub evidence: Vec<String>,
}
