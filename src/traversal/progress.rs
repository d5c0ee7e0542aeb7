use crate::client::Direction;

/// Observable points in a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Traversal picked up from a checkpoint.
    Resumed {
        processed_count: usize,
        frontier_len: usize,
        visited: usize,
    },
    /// A node's neighbors were expanded.
    NodeProcessed {
        node: String,
        depth: usize,
        neighbors: usize,
        processed_count: usize,
        frontier_len: usize,
    },
    CheckpointSaved {
        processed_count: usize,
    },
    /// One directional lookup failed; the node continues with what it has.
    FetchFailed {
        node: String,
        direction: Direction,
        error: String,
    },
    Completed {
        visited: usize,
        edges: usize,
        processed_count: usize,
    },
}

/// Receives traversal events synchronously, in order.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Resumed {
                processed_count,
                frontier_len,
                visited,
            } => log::info!(
                "Resuming traversal: {} processed, {} queued, {} visited",
                processed_count,
                frontier_len,
                visited
            ),
            ProgressEvent::NodeProcessed {
                node,
                depth,
                neighbors,
                processed_count,
                frontier_len,
            } => log::info!(
                "[{} done, {} queued] {} (depth {}): {} neighbors",
                processed_count,
                frontier_len,
                node,
                depth,
                neighbors
            ),
            ProgressEvent::CheckpointSaved { processed_count } => {
                log::info!("Checkpoint saved after {} nodes", processed_count)
            }
            ProgressEvent::FetchFailed {
                node,
                direction,
                error,
            } => log::warn!("{} lookup for {} failed: {}", direction, node, error),
            ProgressEvent::Completed {
                visited,
                edges,
                processed_count,
            } => log::info!(
                "Traversal complete: {} nodes visited, {} edges, {} expanded",
                visited,
                edges,
                processed_count
            ),
        }
    }
}
