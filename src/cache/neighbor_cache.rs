use std::collections::{BTreeMap, HashSet};
use std::future::Future;

use crate::client::is_excluded;

/// Per-traversal memo of neighbor lookups
///
/// Each node's neighbors are fetched at most once; later calls return the
/// stored list. Entries are never evicted, and the whole map can be exported
/// and restored so a resumed traversal skips lookups already answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborCache {
    entries: BTreeMap<String, Vec<String>>,
}

impl NeighborCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cache from exported entries
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Return the neighbors of `id`, calling `fetch` only on the first request.
    ///
    /// The fetched list is deduplicated (first occurrence kept) and stripped of
    /// self-references and excluded ids before it is stored. Excluded ids are
    /// never fetched and always map to an empty list.
    pub async fn get_neighbors<F, Fut>(&mut self, id: &str, fetch: F) -> Vec<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<String>>,
    {
        if let Some(cached) = self.entries.get(id) {
            log::debug!("Neighbor cache hit for {}", id);
            return cached.clone();
        }

        let neighbors = if is_excluded(id) {
            Vec::new()
        } else {
            let mut seen = HashSet::new();
            fetch()
                .await
                .into_iter()
                .filter(|n| n != id && !is_excluded(n))
                .filter(|n| seen.insert(n.clone()))
                .collect()
        };

        self.entries.insert(id.to_string(), neighbors.clone());
        neighbors
    }

    /// True if `id` has already been answered
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Get stored neighbors without fetching
    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.entries.get(id).map(|v| v.as_slice())
    }

    /// Number of cached nodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries, for serialization
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }
}
