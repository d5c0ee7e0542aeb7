//! Conversion of relationship tuples or adjacency lists into display graphs.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::classify::{classify, normalize_id};
use super::filter::seed_components;
use super::{Adjacency, Edge, Node};
use crate::client::{is_excluded, RelationshipTuple};

const MIN_NODE_SIZE: usize = 5;
const MAX_NODE_SIZE: usize = 20;

/// Label used for edges reconstructed from an adjacency list.
const ADJACENCY_EDGE_LABEL: &str = "connected to";

/// Display size for a node of the given degree, clamped to [5, 20].
pub fn node_size(degree: usize) -> usize {
    (MIN_NODE_SIZE + degree).clamp(MIN_NODE_SIZE, MAX_NODE_SIZE)
}

/// Graph assembled from relationship tuples.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Tuples dropped for carrying a trivial predicate.
    pub filtered_relation_count: usize,
    /// Tuples dropped for touching an excluded identifier.
    pub filtered_node_count: usize,
}

/// Graph assembled from a (filtered) adjacency list.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub connected_components: usize,
    /// Seed ids grouped by the component they landed in.
    pub seed_groups: Vec<Vec<String>>,
}

fn is_trivial_predicate(predicate: &str) -> bool {
    predicate == "transcribed_from" || predicate.ends_with(":transcribed_from")
}

/// `biolink:physically_interacts_with` -> `physically interacts with`
fn edge_label(predicate: &str) -> String {
    let local = predicate
        .split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(predicate);
    local.replace('_', " ")
}

fn new_node(id: &str, display_name: &str, is_seed: bool) -> Node {
    let class = classify(id);
    Node {
        id: id.to_string(),
        display_name: display_name.to_string(),
        category: class.category.to_string(),
        group: class.group,
        is_seed,
        degree: 0,
        size: MIN_NODE_SIZE,
    }
}

/// Build a display graph from relationship tuples around `focus_id`.
///
/// Tuples touching an excluded id or carrying the trivial `transcribed_from`
/// predicate are skipped and counted. One edge is produced per surviving tuple;
/// deduplication across query directions is the caller's job.
pub fn from_tuples(tuples: &[RelationshipTuple], focus_id: &str) -> TupleGraph {
    let focus = normalize_id(focus_id);
    let mut nodes: BTreeMap<String, Node> = BTreeMap::new();
    let mut edges = Vec::new();
    let mut filtered_relation_count = 0;
    let mut filtered_node_count = 0;

    for tuple in tuples {
        if is_excluded(&tuple.subject_id) || is_excluded(&tuple.object_id) {
            filtered_node_count += 1;
            continue;
        }
        if is_trivial_predicate(&tuple.predicate) {
            filtered_relation_count += 1;
            continue;
        }

        let source = normalize_id(&tuple.subject_id);
        let target = normalize_id(&tuple.object_id);

        nodes
            .entry(source.clone())
            .or_insert_with(|| new_node(&source, &tuple.subject_name, source == focus))
            .degree += 1;
        nodes
            .entry(target.clone())
            .or_insert_with(|| new_node(&target, &tuple.object_name, target == focus))
            .degree += 1;

        edges.push(Edge {
            source,
            target,
            label: edge_label(&tuple.predicate),
            evidence: tuple.evidence.clone(),
        });
    }

    let nodes = nodes
        .into_values()
        .map(|mut node| {
            node.size = node_size(node.degree);
            node
        })
        .collect();

    TupleGraph {
        nodes,
        edges,
        filtered_relation_count,
        filtered_node_count,
    }
}

/// Build a display graph from an undirected adjacency list.
///
/// One node per key, one edge per unordered neighbor pair.
pub fn from_adjacency(adjacency: &Adjacency, seeds: &BTreeSet<String>) -> PathGraph {
    let nodes = adjacency
        .iter()
        .map(|(id, neighbors)| {
            let mut node = new_node(id, id, seeds.contains(id));
            node.degree = neighbors.len();
            node.size = node_size(node.degree);
            node
        })
        .collect();

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut edges = Vec::new();
    for (id, neighbors) in adjacency {
        for neighbor in neighbors {
            let key = if id.as_str() <= neighbor.as_str() {
                (id.as_str(), neighbor.as_str())
            } else {
                (neighbor.as_str(), id.as_str())
            };
            if seen.insert(key) {
                edges.push(Edge {
                    source: id.clone(),
                    target: neighbor.clone(),
                    label: ADJACENCY_EDGE_LABEL.to_string(),
                    evidence: Vec::new(),
                });
            }
        }
    }

    let seed_groups = seed_components(adjacency, seeds);
    let connected_components = seed_groups.iter().filter(|g| g.len() > 1).count();

    PathGraph {
        nodes,
        edges,
        connected_components,
        seed_groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::add_edge;

    fn tuple(s: &str, p: &str, o: &str) -> RelationshipTuple {
        RelationshipTuple::new(s, &format!("{} name", s), p, o, &format!("{} name", o))
    }

    #[test]
    fn test_node_size_clamped() {
        assert_eq!(node_size(0), 5);
        assert_eq!(node_size(3), 8);
        assert_eq!(node_size(15), 20);
        assert_eq!(node_size(400), 20);
    }

    #[test]
    fn test_edge_label() {
        assert_eq!(edge_label("biolink:physically_interacts_with"), "physically interacts with");
        assert_eq!(edge_label("affects"), "affects");
    }

    #[test]
    fn test_from_tuples_basic() {
        let tuples = vec![
            tuple("HGNC:8651", "biolink:affects", "UMLS:C0037083"),
            tuple("HGNC:8651", "biolink:gene_associated_with_condition", "MONDO:0005148"),
        ];
        let graph = from_tuples(&tuples, "HGNC:8651");
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);

        let focus = graph.nodes.iter().find(|n| n.id == "HGNC:8651").unwrap();
        assert!(focus.is_seed);
        assert_eq!(focus.degree, 2);
        assert_eq!(focus.size, 7);
        assert_eq!(focus.category, "Gene");
        assert_eq!(focus.display_name, "HGNC:8651 name");

        let other = graph.nodes.iter().find(|n| n.id == "MONDO:0005148").unwrap();
        assert!(!other.is_seed);
        assert_eq!(other.group, 3);
        assert_eq!(graph.edges[1].label, "gene associated with condition");
    }

    #[test]
    fn test_from_tuples_filters_caid_and_transcribed_from() {
        let tuples = vec![
            tuple("CAID:CA000001", "biolink:affects", "HGNC:1"),
            tuple("HGNC:1", "biolink:related_to", "CAID:CA000002"),
            tuple("ENSEMBL:ENST0001", "biolink:transcribed_from", "HGNC:1"),
            tuple("HGNC:1", "biolink:affects", "UMLS:C1"),
        ];
        let graph = from_tuples(&tuples, "HGNC:1");
        assert_eq!(graph.filtered_node_count, 2);
        assert_eq!(graph.filtered_relation_count, 1);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.nodes.iter().all(|n| !n.id.starts_with("CAID:")));
        assert!(graph
            .edges
            .iter()
            .all(|e| !e.source.starts_with("CAID:") && !e.target.starts_with("CAID:")));
    }

    #[test]
    fn test_from_tuples_normalizes_protein_versions() {
        let tuples = vec![
            tuple("UniProtKB:P04637-2", "biolink:affects", "UMLS:C1"),
            tuple("UniProtKB:P04637", "biolink:treats", "UMLS:C2"),
        ];
        let graph = from_tuples(&tuples, "UniProtKB:P04637-1");
        let protein: Vec<_> = graph
            .nodes
            .iter()
            .filter(|n| n.id.starts_with("UniProtKB:"))
            .collect();
        assert_eq!(protein.len(), 1);
        assert_eq!(protein[0].id, "UniProtKB:P04637");
        assert_eq!(protein[0].degree, 2);
        assert!(protein[0].is_seed);
    }

    #[test]
    fn test_from_tuples_counts_invariant_to_order() {
        let mut tuples = vec![
            tuple("A:1", "biolink:affects", "B:1"),
            tuple("B:1", "biolink:affects", "C:1"),
            tuple("C:1", "biolink:treats", "A:1"),
            tuple("CAID:X", "biolink:affects", "A:1"),
        ];
        let forward = from_tuples(&tuples, "A:1");
        tuples.reverse();
        let backward = from_tuples(&tuples, "A:1");
        assert_eq!(forward.nodes.len(), backward.nodes.len());
        assert_eq!(forward.edges.len(), backward.edges.len());
        assert_eq!(forward.filtered_node_count, backward.filtered_node_count);
        let degrees = |g: &TupleGraph| g.nodes.iter().map(|n| (n.id.clone(), n.degree)).collect::<Vec<_>>();
        assert_eq!(degrees(&forward), degrees(&backward));
    }

    #[test]
    fn test_from_adjacency() {
        let mut adjacency = Adjacency::new();
        add_edge(&mut adjacency, "HGNC:2908", "UMLS:C0037083");
        add_edge(&mut adjacency, "UMLS:C0037083", "HGNC:2364");
        let seeds: BTreeSet<String> = ["HGNC:2908", "HGNC:2364"].iter().map(|s| s.to_string()).collect();

        let graph = from_adjacency(&adjacency, &seeds);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.connected_components, 1);
        assert_eq!(graph.seed_groups.len(), 1);

        let hub = graph.nodes.iter().find(|n| n.id == "UMLS:C0037083").unwrap();
        assert!(!hub.is_seed);
        assert_eq!(hub.degree, 2);
        assert_eq!(hub.size, 7);
        assert!(graph.edges.iter().all(|e| e.label == "connected to" && e.evidence.is_empty()));
    }

    #[test]
    fn test_from_adjacency_empty() {
        let seeds: BTreeSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
        let graph = from_adjacency(&Adjacency::new(), &seeds);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
        assert_eq!(graph.connected_components, 0);
    }
}
