pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod query;
pub mod traversal;

pub use config::Config;
pub use error::{RelgraphError, Result};
pub use client::{HttpRelationClient, RelationSource, RelationshipTuple};
pub use query::{ConnectingPathsResult, EntityGraphResult, GraphQueryService, QuerySettings};
pub use traversal::{NeighborhoodCollector, TraversalCheckpoint, TraversalState};
