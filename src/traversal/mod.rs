//! Resumable neighborhood collection.
//!
//! `NeighborhoodCollector` runs a depth-bounded BFS from a seed set, memoizing
//! neighbor lookups in the traversal's own `NeighborCache` and periodically
//! checkpointing the whole `TraversalState` so an interrupted run can resume.

mod checkpoint;
mod collector;
mod progress;
mod state;

pub use checkpoint::{
    checkpoint_path_for, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore,
    TraversalCheckpoint, DEFAULT_CHECKPOINT_FILE,
};
pub use collector::{NeighborhoodCollector, TraversalSettings};
pub use progress::{LogObserver, ProgressEvent, ProgressObserver};
pub use state::TraversalState;
