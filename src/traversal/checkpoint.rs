//! Durable snapshots of in-progress traversals.
//!
//! `TraversalCheckpoint` owns the resume policy (time-to-live, then seed set
//! and depth must match); the bytes live in a swappable `CheckpointStore`
//! backend. At most one checkpoint exists per store and each save overwrites
//! it, so concurrent traversals each get their own file via
//! `checkpoint_path_for`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::TraversalState;
use crate::cache::NeighborCache;
use crate::error::{RelgraphError, Result};

/// Default file name, relative to the working directory.
pub const DEFAULT_CHECKPOINT_FILE: &str = "graph_traversal_checkpoint.json";

/// Checkpoint file for one seed set, next to `base`.
///
/// `dir/name.json` becomes `dir/name-<digest>.json`, where the digest covers the
/// sorted seed ids. Equal seed sets map to the same file in any input order.
pub fn checkpoint_path_for(base: &Path, seed_ids: &BTreeSet<String>) -> PathBuf {
    let mut hasher = Sha256::new();
    for seed in seed_ids {
        hasher.update(seed.as_bytes());
        hasher.update(b"\n");
    }
    let digest = format!("{:x}", hasher.finalize());

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "graph_traversal_checkpoint".to_string());
    let file_name = match base.extension() {
        Some(ext) => format!("{}-{}.{}", stem, &digest[..16], ext.to_string_lossy()),
        None => format!("{}-{}", stem, &digest[..16]),
    };
    base.with_file_name(file_name)
}

/// Storage backend for a single checkpoint document.
pub trait CheckpointStore: Send + Sync {
    /// Return the stored document, or None if nothing is stored.
    fn read(&self) -> Result<Option<String>>;
    /// Replace the stored document.
    fn write(&self, contents: &str) -> Result<()>;
    /// Delete the stored document; succeeds if nothing is stored.
    fn remove(&self) -> Result<()>;
    /// Human-readable location for log messages.
    fn describe(&self) -> String;
}

/// Checkpoint stored as a JSON file.
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, contents: &str) -> Result<()> {
        // Write-then-rename so an interrupted save never leaves a torn file
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Checkpoint held in memory; useful for embedding and tests.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    inner: Mutex<Option<String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        *self.inner.lock().unwrap() = Some(contents.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.inner.lock().unwrap() = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Serialized form: sets as arrays, maps as `[key, values]` pairs.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckpointRecord {
    seed_ids: Vec<String>,
    max_depth: usize,
    visited: Vec<String>,
    frontier: Vec<(String, usize)>,
    adjacency: Vec<(String, Vec<String>)>,
    neighbor_cache: Vec<(String, Vec<String>)>,
    processed_count: usize,
    /// Epoch milliseconds
    timestamp: i64,
}

impl CheckpointRecord {
    pub(crate) fn from_state(state: &TraversalState, saved_at: DateTime<Utc>) -> Self {
        Self {
            seed_ids: state.seed_ids.iter().cloned().collect(),
            max_depth: state.max_depth,
            visited: state.visited.iter().cloned().collect(),
            frontier: state.frontier.iter().cloned().collect(),
            adjacency: state
                .adjacency
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
                .collect(),
            neighbor_cache: state
                .cache
                .entries()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            processed_count: state.processed_count,
            timestamp: saved_at.timestamp_millis(),
        }
    }

    fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp)
    }

    fn into_state(self, saved_at: DateTime<Utc>) -> TraversalState {
        TraversalState {
            seed_ids: self.seed_ids.into_iter().collect(),
            max_depth: self.max_depth,
            visited: self.visited.into_iter().collect(),
            frontier: self.frontier.into_iter().collect(),
            adjacency: self
                .adjacency
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            cache: NeighborCache::from_entries(self.neighbor_cache),
            processed_count: self.processed_count,
            saved_at: Some(saved_at),
        }
    }
}

/// Save/load policy for traversal checkpoints.
pub struct TraversalCheckpoint {
    store: Box<dyn CheckpointStore>,
    ttl: Duration,
}

impl TraversalCheckpoint {
    /// Wrap a backend with the default 24 hour time-to-live
    pub fn new(store: Box<dyn CheckpointStore>) -> Self {
        Self {
            store,
            ttl: Duration::hours(24),
        }
    }

    /// File-backed checkpoint at `path`
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self::new(Box::new(FileCheckpointStore::new(path)))
    }

    /// In-memory checkpoint
    pub fn memory() -> Self {
        Self::new(Box::new(MemoryCheckpointStore::new()))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &dyn CheckpointStore {
        self.store.as_ref()
    }

    /// Persist `state`, overwriting any previous checkpoint.
    ///
    /// Returns the save time, or None if the write failed (logged, non-fatal).
    pub fn save(&self, state: &TraversalState) -> Option<DateTime<Utc>> {
        let saved_at = Utc::now();
        match self.try_save(state, saved_at) {
            Ok(()) => {
                log::debug!(
                    "Checkpoint saved to {} ({} processed, {} queued)",
                    self.store.describe(),
                    state.processed_count,
                    state.frontier.len()
                );
                Some(saved_at)
            }
            Err(e) => {
                log::warn!("Failed to save checkpoint to {}: {}", self.store.describe(), e);
                None
            }
        }
    }

    fn try_save(&self, state: &TraversalState, saved_at: DateTime<Utc>) -> Result<()> {
        let record = CheckpointRecord::from_state(state, saved_at);
        let json = serde_json::to_string(&record)?;
        self.store.write(&json)
    }

    /// Restore a checkpoint for exactly `expected_seeds` at `max_depth`.
    ///
    /// Returns None when nothing is stored, when the checkpoint is older than
    /// the time-to-live, when its seed set or depth differs, or when it cannot
    /// be read.
    pub fn load(
        &self,
        expected_seeds: &BTreeSet<String>,
        max_depth: usize,
    ) -> Option<TraversalState> {
        match self.try_load(expected_seeds, max_depth) {
            Ok(state) => state,
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable checkpoint at {}: {}",
                    self.store.describe(),
                    e
                );
                None
            }
        }
    }

    fn try_load(
        &self,
        expected_seeds: &BTreeSet<String>,
        max_depth: usize,
    ) -> Result<Option<TraversalState>> {
        let Some(contents) = self.store.read()? else {
            return Ok(None);
        };
        let record: CheckpointRecord = serde_json::from_str(&contents)?;

        let saved_at = record.saved_at().ok_or_else(|| {
            RelgraphError::Checkpoint(format!("invalid timestamp {}", record.timestamp))
        })?;
        let age = Utc::now() - saved_at;
        if age > self.ttl {
            log::info!(
                "Discarding checkpoint from {} ({} hours old)",
                saved_at.to_rfc3339(),
                age.num_hours()
            );
            return Ok(None);
        }

        let stored_seeds: BTreeSet<String> = record.seed_ids.iter().cloned().collect();
        if &stored_seeds != expected_seeds {
            log::info!("Discarding checkpoint for a different seed set");
            return Ok(None);
        }

        if record.max_depth != max_depth {
            log::info!(
                "Discarding checkpoint collected at depth {} (requested {})",
                record.max_depth,
                max_depth
            );
            return Ok(None);
        }

        Ok(Some(record.into_state(saved_at)))
    }

    /// Delete the checkpoint after a completed traversal.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove() {
            log::warn!("Failed to remove checkpoint {}: {}", self.store.describe(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeds(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn sample_state() -> TraversalState {
        let mut state = TraversalState::new(&seeds(&["HGNC:2908", "HGNC:2364"]), 2);
        state.frontier.pop_front();
        state.visited.insert("UMLS:C0037083".to_string());
        state.link("HGNC:2364", "UMLS:C0037083");
        state.frontier.push_back(("UMLS:C0037083".to_string(), 1));
        state.cache = NeighborCache::from_entries(vec![
            ("HGNC:2364".to_string(), vec!["UMLS:C0037083".to_string()]),
            ("CAID:CA1".to_string(), Vec::new()),
        ]);
        state.processed_count = 1;
        state
    }

    fn assert_same_progress(a: &TraversalState, b: &TraversalState) {
        assert_eq!(a.seed_ids, b.seed_ids);
        assert_eq!(a.max_depth, b.max_depth);
        assert_eq!(a.visited, b.visited);
        assert_eq!(a.frontier, b.frontier);
        assert_eq!(a.adjacency, b.adjacency);
        assert_eq!(a.cache, b.cache);
        assert_eq!(a.processed_count, b.processed_count);
    }

    #[test]
    fn test_round_trip_memory() {
        let checkpoint = TraversalCheckpoint::memory();
        let state = sample_state();
        let saved_at = checkpoint.save(&state).unwrap();

        let loaded = checkpoint.load(&state.seed_ids, 2).unwrap();
        assert_same_progress(&state, &loaded);
        assert_eq!(
            loaded.saved_at.unwrap().timestamp_millis(),
            saved_at.timestamp_millis()
        );
    }

    #[test]
    fn test_round_trip_file_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CHECKPOINT_FILE);
        let checkpoint = TraversalCheckpoint::file(&path);
        let state = sample_state();

        assert!(checkpoint.save(&state).is_some());
        assert!(path.exists());
        let loaded = checkpoint.load(&state.seed_ids, 2).unwrap();
        assert_same_progress(&state, &loaded);

        checkpoint.clear();
        assert!(!path.exists());
        assert!(checkpoint.load(&state.seed_ids, 2).is_none());
        // clearing twice is harmless
        checkpoint.clear();
    }

    #[test]
    fn test_file_format_uses_pairs_and_timestamp() {
        let checkpoint = TraversalCheckpoint::memory();
        checkpoint.save(&sample_state()).unwrap();
        let raw = checkpoint.store().read().unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json["timestamp"].is_i64());
        assert!(json["seedIds"].is_array());
        assert_eq!(json["processedCount"], 1);
        assert_eq!(json["maxDepth"], 2);
        assert_eq!(json["adjacency"][0][0], "HGNC:2364");
        // entries are key-ordered: CAID:CA1 sorts before HGNC:2364
        assert_eq!(json["neighborCache"][1][1][0], "UMLS:C0037083");
        assert_eq!(json["frontier"][0][1], 0);
    }

    #[test]
    fn test_missing_checkpoint_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let checkpoint = TraversalCheckpoint::file(temp_dir.path().join("none.json"));
        assert!(checkpoint.load(&seeds(&["A"]), 2).is_none());
    }

    #[test]
    fn test_stale_checkpoint_rejected() {
        let checkpoint = TraversalCheckpoint::memory();
        let state = sample_state();
        let old = Utc::now() - Duration::hours(25);
        let record = CheckpointRecord::from_state(&state, old);
        checkpoint
            .store()
            .write(&serde_json::to_string(&record).unwrap())
            .unwrap();
        assert!(checkpoint.load(&state.seed_ids, 2).is_none());

        let recent = Utc::now() - Duration::hours(23);
        let record = CheckpointRecord::from_state(&state, recent);
        checkpoint
            .store()
            .write(&serde_json::to_string(&record).unwrap())
            .unwrap();
        assert!(checkpoint.load(&state.seed_ids, 2).is_some());
    }

    #[test]
    fn test_seed_mismatch_rejected_order_independent() {
        let checkpoint = TraversalCheckpoint::memory();
        let state = sample_state();
        checkpoint.save(&state).unwrap();

        assert!(checkpoint.load(&seeds(&["HGNC:2908"]), 2).is_none());
        assert!(checkpoint.load(&seeds(&["HGNC:2908", "HGNC:9999"]), 2).is_none());
        // Same set given in a different order still resumes
        assert!(checkpoint.load(&seeds(&["HGNC:2364", "HGNC:2908"]), 2).is_some());
    }

    #[test]
    fn test_stored_seed_order_ignored() {
        let checkpoint = TraversalCheckpoint::memory();
        let raw = format!(
            r#"{{"seedIds":["B","A"],"maxDepth":2,"visited":["A","B"],"frontier":[["A",0]],"adjacency":[],"neighborCache":[],"processedCount":0,"timestamp":{}}}"#,
            Utc::now().timestamp_millis()
        );
        checkpoint.store().write(&raw).unwrap();
        let loaded = checkpoint.load(&seeds(&["A", "B"]), 2).unwrap();
        assert_eq!(loaded.frontier.len(), 1);
    }

    #[test]
    fn test_corrupt_checkpoint_is_none() {
        let checkpoint = TraversalCheckpoint::memory();
        checkpoint.store().write("{not json").unwrap();
        assert!(checkpoint.load(&seeds(&["A"]), 2).is_none());
    }

    #[test]
    fn test_save_failure_is_non_fatal() {
        let temp_dir = TempDir::new().unwrap();
        // parent directory does not exist
        let checkpoint =
            TraversalCheckpoint::file(temp_dir.path().join("missing").join("cp.json"));
        assert!(checkpoint.save(&sample_state()).is_none());
    }

    #[test]
    fn test_custom_ttl() {
        let checkpoint = TraversalCheckpoint::memory().with_ttl(Duration::hours(1));
        let state = sample_state();
        let record = CheckpointRecord::from_state(&state, Utc::now() - Duration::hours(2));
        checkpoint
            .store()
            .write(&serde_json::to_string(&record).unwrap())
            .unwrap();
        assert!(checkpoint.load(&state.seed_ids, 2).is_none());
    }

    #[test]
    fn test_depth_mismatch_rejected() {
        let checkpoint = TraversalCheckpoint::memory();
        let mut state = sample_state();
        state.max_depth = 3;
        checkpoint.save(&state).unwrap();

        // a deeper collection must not leak nodes beyond a shallower bound
        assert!(checkpoint.load(&state.seed_ids, 2).is_none());
        assert!(checkpoint.load(&state.seed_ids, 3).is_some());
    }

    #[test]
    fn test_record_without_depth_is_unreadable() {
        let checkpoint = TraversalCheckpoint::memory();
        let raw = format!(
            r#"{{"seedIds":["A","B"],"visited":["A","B"],"frontier":[],"adjacency":[],"neighborCache":[],"processedCount":0,"timestamp":{}}}"#,
            Utc::now().timestamp_millis()
        );
        checkpoint.store().write(&raw).unwrap();
        assert!(checkpoint.load(&seeds(&["A", "B"]), 2).is_none());
    }

    #[test]
    fn test_checkpoint_path_per_seed_set() {
        let base = Path::new("/tmp/work/graph_traversal_checkpoint.json");
        let ab = checkpoint_path_for(base, &seeds(&["A:1", "B:1"]));
        let ba = checkpoint_path_for(base, &seeds(&["B:1", "A:1"]));
        let ac = checkpoint_path_for(base, &seeds(&["A:1", "C:1"]));

        assert_eq!(ab, ba);
        assert_ne!(ab, ac);
        assert_eq!(ab.parent(), base.parent());
        let name = ab.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("graph_traversal_checkpoint-"));
        assert!(name.ends_with(".json"));
        // seeds joined without a separator must not collide
        assert_ne!(
            checkpoint_path_for(base, &seeds(&["AB", "C"])),
            checkpoint_path_for(base, &seeds(&["A", "BC"]))
        );
    }
}
