//! Caller-facing graph queries.
//!
//! Single-entity queries run the two directional lookups concurrently, merge
//! them, and assemble a tuple graph. Connecting-path queries collect the seeds'
//! neighborhood, prune it to seed-connecting structure and assemble the rest.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::{
    merge_bidirectional, query_direction, Direction, RelationSource, RelationshipTuple,
};
use crate::config::Config;
use crate::error::{RelgraphError, Result};
use crate::graph::{
    edge_count, filter_paths, from_adjacency, from_tuples, normalize_id, Edge, Node,
    DEFAULT_MAX_PASSES,
};
use crate::traversal::{
    checkpoint_path_for, LogObserver, NeighborhoodCollector, ProgressObserver,
    TraversalCheckpoint, TraversalSettings, DEFAULT_CHECKPOINT_FILE,
};

/// Result of `get_everything` / `query_with_predicate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityGraphResult {
    pub entity: String,
    pub predicate: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Tuples returned by both directions before dedup.
    pub raw_relation_count: usize,
    pub filtered_relation_count: usize,
    pub filtered_node_count: usize,
    /// Explanation when nothing was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of `get_connecting_paths`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectingPathsResult {
    pub seed_ids: Vec<String>,
    pub max_depth: usize,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub collected_node_count: usize,
    pub collected_edge_count: usize,
    pub pruned_node_count: usize,
    pub pruned_edge_count: usize,
    pub connected_components: usize,
    pub seed_groups: Vec<Vec<String>>,
    pub processed_count: usize,
}

/// Service-level knobs, usually derived from `Config`.
#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub default_predicate: String,
    pub max_depth: usize,
    pub traversal: TraversalSettings,
    /// Base checkpoint path; each seed set gets its own file next to it.
    pub checkpoint_path: PathBuf,
    pub checkpoint_ttl: chrono::Duration,
    pub prune_max_passes: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        let traversal = TraversalSettings::default();
        Self {
            default_predicate: traversal.predicate.clone(),
            max_depth: 2,
            traversal,
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_FILE),
            checkpoint_ttl: chrono::Duration::hours(24),
            prune_max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl From<&Config> for QuerySettings {
    fn from(config: &Config) -> Self {
        Self {
            default_predicate: config.api.default_predicate.clone(),
            max_depth: config.traversal.max_depth,
            traversal: config.traversal_settings(),
            checkpoint_path: config.traversal.checkpoint_path.clone(),
            checkpoint_ttl: chrono::Duration::try_hours(config.traversal.checkpoint_ttl_hours)
                .unwrap_or_else(|| chrono::Duration::hours(24)),
            prune_max_passes: config.traversal.prune_max_passes,
        }
    }
}

/// Entry point for the three graph queries.
pub struct GraphQueryService {
    source: Arc<dyn RelationSource>,
    settings: QuerySettings,
    observer: Arc<dyn ProgressObserver>,
}

impl GraphQueryService {
    pub fn new(source: Arc<dyn RelationSource>, settings: QuerySettings) -> Self {
        Self {
            source,
            settings,
            observer: Arc::new(LogObserver),
        }
    }

    /// Replace the default log observer used by connecting-path traversals
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// All relationships of `entity` under the default predicate.
    pub async fn get_everything(&self, entity: &str) -> Result<EntityGraphResult> {
        let predicate = self.settings.default_predicate.clone();
        self.query_with_predicate(entity, &predicate).await
    }

    /// Relationships of `entity` under `predicate`, in both directions.
    pub async fn query_with_predicate(
        &self,
        entity: &str,
        predicate: &str,
    ) -> Result<EntityGraphResult> {
        let entity = entity.trim();
        let predicate = predicate.trim();
        if entity.is_empty() {
            return Err(RelgraphError::InvalidInput("entity must not be empty".to_string()));
        }
        if predicate.is_empty() {
            return Err(RelgraphError::InvalidInput(
                "predicate must not be empty".to_string(),
            ));
        }

        let (outgoing, incoming) = tokio::join!(
            self.lookup(entity, predicate, Direction::Outgoing),
            self.lookup(entity, predicate, Direction::Incoming),
        );
        let raw_relation_count = outgoing.len() + incoming.len();
        let tuples = merge_bidirectional(outgoing, incoming);
        log::info!(
            "{} {}: {} tuples ({} after dedup)",
            entity,
            predicate,
            raw_relation_count,
            tuples.len()
        );

        let graph = from_tuples(&tuples, entity);
        let message = if graph.edges.is_empty() {
            Some(if raw_relation_count == 0 {
                format!("No relationships found for {} with predicate {}", entity, predicate)
            } else {
                format!(
                    "All {} relationships for {} were filtered out ({} excluded identifiers, {} trivial relations)",
                    raw_relation_count, entity, graph.filtered_node_count, graph.filtered_relation_count
                )
            })
        } else {
            None
        };

        Ok(EntityGraphResult {
            entity: entity.to_string(),
            predicate: predicate.to_string(),
            nodes: graph.nodes,
            edges: graph.edges,
            raw_relation_count,
            filtered_relation_count: graph.filtered_relation_count,
            filtered_node_count: graph.filtered_node_count,
            message,
        })
    }

    /// The subgraph connecting `entities` within `max_depth` hops of each.
    ///
    /// Requires at least two distinct, non-empty entities after id
    /// normalization. A neighborhood that prunes down to nothing yields an
    /// empty graph, not an error.
    pub async fn get_connecting_paths(
        &self,
        entities: &[String],
        max_depth: Option<usize>,
    ) -> Result<ConnectingPathsResult> {
        let seeds: BTreeSet<String> = entities
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(normalize_id)
            .collect();
        if seeds.len() < 2 {
            return Err(RelgraphError::InvalidInput(format!(
                "connecting paths need at least 2 distinct entities, got {}",
                seeds.len()
            )));
        }
        let max_depth = max_depth.unwrap_or(self.settings.max_depth);
        if max_depth == 0 {
            return Err(RelgraphError::InvalidInput(
                "max_depth must be at least 1".to_string(),
            ));
        }

        let checkpoint_path = checkpoint_path_for(&self.settings.checkpoint_path, &seeds);
        log::debug!("Checkpoint file: {}", checkpoint_path.display());
        let checkpoint =
            TraversalCheckpoint::file(&checkpoint_path).with_ttl(self.settings.checkpoint_ttl);
        let collector = NeighborhoodCollector::new(
            self.source.clone(),
            checkpoint,
            self.settings.traversal.clone(),
        )
        .with_observer(self.observer.clone());

        let state = collector.collect(&seeds, max_depth).await;
        let outcome = filter_paths(&state.adjacency, &seeds, self.settings.prune_max_passes);
        log::info!(
            "Pruned {} nodes and {} edges in {} passes",
            outcome.pruned_node_count,
            outcome.pruned_edge_count,
            outcome.passes
        );

        let graph = from_adjacency(&outcome.filtered, &seeds);

        Ok(ConnectingPathsResult {
            seed_ids: seeds.into_iter().collect(),
            max_depth,
            nodes: graph.nodes,
            edges: graph.edges,
            collected_node_count: state.adjacency.len(),
            collected_edge_count: edge_count(&state.adjacency),
            pruned_node_count: outcome.pruned_node_count,
            pruned_edge_count: outcome.pruned_edge_count,
            connected_components: graph.connected_components,
            seed_groups: graph.seed_groups,
            processed_count: state.processed_count,
        })
    }

    /// One directional lookup; a failure counts as no relationships.
    async fn lookup(
        &self,
        entity: &str,
        predicate: &str,
        direction: Direction,
    ) -> Vec<RelationshipTuple> {
        match query_direction(self.source.as_ref(), entity, predicate, direction).await {
            Ok(tuples) => tuples,
            Err(e) => {
                log::warn!("{} lookup for {} failed: {}", direction, entity, e);
                Vec::new()
            }
        }
    }
}
