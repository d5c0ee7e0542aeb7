//! Relation API access: the tuple model, the `RelationSource` seam and the
//! reqwest-backed client.
//!
//! Every lookup is a single triple pattern (subject, predicate, object) where
//! exactly one of subject/object is a wildcard (empty string).

mod http;

pub use http::HttpRelationClient;

use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::Result;

/// Identifiers under this prefix are unreliable variant records; they are never
/// looked up and never surface in assembled graphs.
pub const EXCLUDED_PREFIX: &str = "CAID:";

/// Returns true for identifiers that must be skipped everywhere.
pub fn is_excluded(id: &str) -> bool {
    id.starts_with(EXCLUDED_PREFIX)
}

/// One relationship returned by the relation API.
///
/// On the wire this is a 7-element JSON array:
/// `[subject_id, subject_name, predicate, object_id, object_name, <unused>, evidence]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireTuple")]
pub struct RelationshipTuple {
    pub subject_id: String,
    pub subject_name: String,
    pub predicate: String,
    pub object_id: String,
    pub object_name: String,
    pub evidence: Vec<String>,
}

#[derive(Deserialize)]
struct WireTuple(
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    IgnoredAny,
    Option<Vec<serde_json::Value>>,
);

impl From<WireTuple> for RelationshipTuple {
    fn from(t: WireTuple) -> Self {
        let evidence = t
            .6
            .unwrap_or_default()
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        Self {
            subject_name: t.1.unwrap_or_else(|| t.0.clone()),
            subject_id: t.0,
            predicate: t.2,
            object_name: t.4.unwrap_or_else(|| t.3.clone()),
            object_id: t.3,
            evidence,
        }
    }
}

impl RelationshipTuple {
    pub fn new(
        subject_id: &str,
        subject_name: &str,
        predicate: &str,
        object_id: &str,
        object_name: &str,
    ) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            subject_name: subject_name.to_string(),
            predicate: predicate.to_string(),
            object_id: object_id.to_string(),
            object_name: object_name.to_string(),
            evidence: Vec::new(),
        }
    }
}

/// Anything that can answer a single triple-pattern lookup.
///
/// Implementations report every failure (transport, timeout, status, content
/// type) as `RelgraphError::Upstream`; callers treat that as zero results.
#[async_trait]
pub trait RelationSource: Send + Sync {
    async fn query(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Result<Vec<RelationshipTuple>>;
}

/// Which side of the pattern the entity sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// entity -> *
    Outgoing,
    /// * -> entity
    Incoming,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Outgoing => write!(f, "outgoing"),
            Direction::Incoming => write!(f, "incoming"),
        }
    }
}

/// Run a single directional lookup with `entity` on the given side.
///
/// Callers decide how to report a failure; both treat it as zero results.
pub async fn query_direction(
    source: &dyn RelationSource,
    entity: &str,
    predicate: &str,
    direction: Direction,
) -> Result<Vec<RelationshipTuple>> {
    match direction {
        Direction::Outgoing => source.query(entity, predicate, "").await,
        Direction::Incoming => source.query("", predicate, entity).await,
    }
}

/// Merge the two directional result sets, dropping duplicates.
///
/// Two tuples are the same relationship when they share a predicate and the
/// same endpoint pair, in either orientation. The first occurrence wins.
pub fn merge_bidirectional(
    outgoing: Vec<RelationshipTuple>,
    incoming: Vec<RelationshipTuple>,
) -> Vec<RelationshipTuple> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut merged = Vec::with_capacity(outgoing.len() + incoming.len());
    for tuple in outgoing.into_iter().chain(incoming) {
        let (lo, hi) = if tuple.subject_id <= tuple.object_id {
            (tuple.subject_id.clone(), tuple.object_id.clone())
        } else {
            (tuple.object_id.clone(), tuple.subject_id.clone())
        };
        if seen.insert((lo, tuple.predicate.clone(), hi)) {
            merged.push(tuple);
        }
    }
    merged
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::RelgraphError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory relation source answering from a fixed tuple list.
    pub struct StubSource {
        tuples: Vec<RelationshipTuple>,
        failing: HashSet<String>,
        calls: AtomicUsize,
        log: Mutex<Vec<(String, String)>>,
    }

    impl StubSource {
        pub fn new(tuples: Vec<RelationshipTuple>) -> Self {
            Self {
                tuples,
                failing: HashSet::new(),
                calls: AtomicUsize::new(0),
                log: Mutex::new(Vec::new()),
            }
        }

        /// Build from `(subject, object)` pairs using a generic predicate.
        pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
            Self::new(
                pairs
                    .iter()
                    .map(|(s, o)| RelationshipTuple::new(s, s, "biolink:related_to", o, o))
                    .collect(),
            )
        }

        /// Lookups touching this id fail with an upstream error.
        pub fn failing_for(mut self, id: &str) -> Self {
            self.failing.insert(id.to_string());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Entities looked up so far, with the wildcard side marked `*`.
        pub fn lookups(&self) -> Vec<(String, String)> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RelationSource for StubSource {
        async fn query(
            &self,
            subject: &str,
            predicate: &str,
            object: &str,
        ) -> Result<Vec<RelationshipTuple>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let s = if subject.is_empty() { "*" } else { subject };
            let o = if object.is_empty() { "*" } else { object };
            self.log.lock().unwrap().push((s.to_string(), o.to_string()));

            if self.failing.contains(subject) || self.failing.contains(object) {
                return Err(RelgraphError::Upstream("stub failure".to_string()));
            }

            let generic = predicate == "biolink:related_to";
            Ok(self
                .tuples
                .iter()
                .filter(|t| generic || t.predicate == predicate)
                .filter(|t| {
                    (subject.is_empty() || t.subject_id == subject)
                        && (object.is_empty() || t.object_id == object)
                })
                .cloned()
                .collect())
        }
    }
}
