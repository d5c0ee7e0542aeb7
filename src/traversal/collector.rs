//! Multi-source, depth-bounded BFS over the relation API.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use super::{LogObserver, ProgressEvent, ProgressObserver, TraversalCheckpoint, TraversalState};
use crate::client::{is_excluded, query_direction, Direction, RelationSource, RelationshipTuple};
use crate::graph::normalize_id;

/// Tuning for one collector.
#[derive(Debug, Clone)]
pub struct TraversalSettings {
    /// Predicate used for both directional neighbor lookups.
    pub predicate: String,
    /// Pause after each node fetched from upstream while expandable nodes remain.
    pub node_delay: Duration,
    /// Pause between the outgoing and incoming lookups of one node.
    pub direction_delay: Duration,
    /// Save a checkpoint every this many expanded nodes.
    pub checkpoint_interval: usize,
}

impl Default for TraversalSettings {
    fn default() -> Self {
        Self {
            predicate: "biolink:related_to".to_string(),
            node_delay: Duration::from_millis(1000),
            direction_delay: Duration::from_millis(500),
            checkpoint_interval: 10,
        }
    }
}

/// Drives one traversal at a time, strictly sequentially: a single upstream
/// request is in flight at any moment.
pub struct NeighborhoodCollector {
    source: Arc<dyn RelationSource>,
    checkpoint: TraversalCheckpoint,
    observer: Arc<dyn ProgressObserver>,
    settings: TraversalSettings,
}

impl NeighborhoodCollector {
    pub fn new(
        source: Arc<dyn RelationSource>,
        checkpoint: TraversalCheckpoint,
        settings: TraversalSettings,
    ) -> Self {
        Self {
            source,
            checkpoint,
            observer: Arc::new(LogObserver),
            settings,
        }
    }

    /// Replace the default log observer
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Collect the `max_depth`-hop neighborhood around `seed_ids`.
    ///
    /// Resumes from a matching checkpoint when one is available. Nodes at
    /// `max_depth` are recorded but not expanded. Upstream failures leave the
    /// affected node with fewer (possibly zero) neighbors; they never abort.
    pub async fn collect(&self, seed_ids: &BTreeSet<String>, max_depth: usize) -> TraversalState {
        let mut state = match self.checkpoint.load(seed_ids, max_depth) {
            Some(state) => {
                self.observer.on_progress(&ProgressEvent::Resumed {
                    processed_count: state.processed_count,
                    frontier_len: state.frontier.len(),
                    visited: state.visited.len(),
                });
                state
            }
            None => TraversalState::new(seed_ids, max_depth),
        };

        while let Some((node, depth)) = state.frontier.pop_front() {
            if depth >= max_depth {
                continue;
            }

            let from_upstream = !state.cache.contains(&node);
            let neighbors = state
                .cache
                .get_neighbors(&node, || self.fetch_neighbors(&node))
                .await;

            for neighbor in &neighbors {
                if neighbor == &node || is_excluded(neighbor) {
                    continue;
                }
                state.link(&node, neighbor);
                if !state.visited.contains(neighbor) && depth + 1 <= max_depth {
                    state.visited.insert(neighbor.clone());
                    state.frontier.push_back((neighbor.clone(), depth + 1));
                }
            }

            state.processed_count += 1;
            self.observer.on_progress(&ProgressEvent::NodeProcessed {
                node: node.clone(),
                depth,
                neighbors: neighbors.len(),
                processed_count: state.processed_count,
                frontier_len: state.frontier.len(),
            });

            if state.processed_count % self.settings.checkpoint_interval.max(1) == 0 {
                if let Some(saved_at) = self.checkpoint.save(&state) {
                    state.saved_at = Some(saved_at);
                    self.observer.on_progress(&ProgressEvent::CheckpointSaved {
                        processed_count: state.processed_count,
                    });
                }
            }

            // Entries at the depth limit are discarded without a lookup
            let more_lookups = state.frontier.iter().any(|(_, d)| *d < max_depth);
            if from_upstream && more_lookups && !self.settings.node_delay.is_zero() {
                tokio::time::sleep(self.settings.node_delay).await;
            }
        }

        self.checkpoint.clear();
        self.observer.on_progress(&ProgressEvent::Completed {
            visited: state.visited.len(),
            edges: state.edge_count(),
            processed_count: state.processed_count,
        });

        state
    }

    /// Both directional lookups for `node`, returning the opposite endpoint of
    /// every tuple. Filtering and dedup happen in the cache.
    async fn fetch_neighbors(&self, node: &str) -> Vec<String> {
        let mut neighbors: Vec<String> = self
            .lookup(node, Direction::Outgoing)
            .await
            .into_iter()
            .map(|t| normalize_id(&t.object_id))
            .collect();

        if !self.settings.direction_delay.is_zero() {
            tokio::time::sleep(self.settings.direction_delay).await;
        }

        neighbors.extend(
            self.lookup(node, Direction::Incoming)
                .await
                .into_iter()
                .map(|t| normalize_id(&t.subject_id)),
        );
        neighbors
    }

    async fn lookup(&self, node: &str, direction: Direction) -> Vec<RelationshipTuple> {
        let predicate = self.settings.predicate.as_str();
        match query_direction(self.source.as_ref(), node, predicate, direction).await {
            Ok(tuples) => tuples,
            Err(e) => {
                self.observer.on_progress(&ProgressEvent::FetchFailed {
                    node: node.to_string(),
                    direction,
                    error: e.to_string(),
                });
                Vec::new()
            }
        }
    }
}
