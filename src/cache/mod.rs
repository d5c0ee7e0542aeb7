pub mod neighbor_cache;

pub use neighbor_cache::NeighborCache;
