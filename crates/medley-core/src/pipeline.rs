//! Top-level orchestration wiring directive parsing, record hashing,
//! clustering, and index publication into the single call a batch job
//! actually makes.
//!
//! Each stage (`parse_directives`, `hash_record`, `build_matching_ids`,
//! `IndexStore::publish`) stays public and independently testable; this
//! module only sequences them, the way the teacher's merge pipeline
//! sequences canonicalisation, union-find, and merging while leaving each
//! stage itself callable on its own.
use std::fmt;

use rayon::prelude::*;

use crate::cluster::{ClusterConfig, ClusterError, build_matching_ids};
use crate::directive::{DirectiveError, parse_directives};
use crate::hasher::{LookupPair, hash_record};
use crate::ids::ID_t;
use crate::record::RecordView;
use crate::store::{IndexStore, StoreError};

/// Errors produced by [`build_all_indexes`]. Each variant wraps the
/// underlying stage's own error type rather than flattening it, since a
/// caller that wants to branch on e.g. a cluster-out-of-memory condition
/// needs the original [`ClusterError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The directive text failed to parse.
    Directive(DirectiveError),
    /// Clustering the hashed relation failed.
    Cluster(ClusterError),
    /// Publishing the computed relations to the store failed.
    Store(StoreError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directive(e) => write!(f, "directive parsing failed: {e}"),
            Self::Cluster(e) => write!(f, "clustering failed: {e}"),
            Self::Store(e) => write!(f, "index publication failed: {e}"),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<DirectiveError> for BuildError {
    fn from(e: DirectiveError) -> Self {
        Self::Directive(e)
    }
}

impl From<ClusterError> for BuildError {
    fn from(e: ClusterError) -> Self {
        Self::Cluster(e)
    }
}

impl From<StoreError> for BuildError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// The four logical index roles a build publishes, named for diagnostics.
///
/// The underlying [`IndexStore`] a caller supplies need not be four
/// separate files — `InMemoryIndexStore` is one in-process object — but a
/// production deployment backed by real sorted files will want to know
/// which role each path plays, mirroring the abstract `paths` argument of
/// the caller API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    /// Path or identifier for the `Hash2ID` index.
    pub hash2id: String,
    /// Path or identifier for the `ID2Hash` index.
    pub id2hash: String,
    /// Path or identifier for the `Match2ID` index.
    pub match2id: String,
    /// Path or identifier for the `ID2Match` index.
    pub id2match: String,
}

/// Runs the full indexing pipeline over `records` and publishes the
/// resulting relations to `store`.
///
/// `records` pairs each entity id with its projected view; id selection
/// from the source dataset is the caller's responsibility and happens
/// before this call. `directive_text` is one or more directive strings,
/// OR-combined (see [`crate::directive::parse_directives`]).
/// `max_edit_distance` is the group-level deletion depth applied during
/// hashing.
///
/// Per-record hashing runs in parallel via `rayon`; clustering and
/// publication are single-pass over the combined relation.
pub fn build_all_indexes<S: AsRef<str>, R: RecordView + Sync>(
    records: &[(ID_t, R)],
    directive_text: &[S],
    max_edit_distance: u64,
    store: &mut dyn IndexStore,
    _paths: &IndexPaths,
) -> Result<(), BuildError> {
    let plan = parse_directives(directive_text)?;

    let pairs: Vec<LookupPair> = records
        .par_iter()
        .flat_map(|(id, record)| hash_record(*id, record, &plan, max_edit_distance))
        .collect();

    let mut hash_rows: Vec<(ID_t, crate::ids::Hash_t)> = pairs.iter().map(|p| (p.id, p.hash_value)).collect();
    hash_rows.sort_unstable();
    hash_rows.dedup();

    let matching = build_matching_ids(&pairs, ClusterConfig::default())?;
    let match_rows: Vec<(crate::ids::MatchingID_t, ID_t)> = matching.iter().map(|p| (p.matching_id, p.id)).collect();

    store.publish(&hash_rows, &match_rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::query::find_related_by_ids;
    use crate::store::InMemoryIndexStore;
    use std::collections::HashMap;

    fn eid(n: u64) -> ID_t {
        ID_t::new(n).expect("fits 48 bits")
    }

    fn rec(pairs: &[(&str, &str)]) -> HashMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    fn paths() -> IndexPaths {
        IndexPaths {
            hash2id: "hash2id".to_owned(),
            id2hash: "id2hash".to_owned(),
            match2id: "match2id".to_owned(),
            id2match: "id2match".to_owned(),
        }
    }

    #[test]
    fn exact_duplicates_end_up_in_same_cluster() {
        let records = vec![
            (eid(1), rec(&[("fname", "Alice"), ("lname", "Smith")])),
            (eid(2), rec(&[("fname", "Alice"), ("lname", "Smith")])),
            (eid(3), rec(&[("fname", "Bob"), ("lname", "Jones")])),
        ];
        let mut store = InMemoryIndexStore::new();
        build_all_indexes(&records, &["&fname,lname"], 0, &mut store, &paths()).expect("build ok");

        let (related, _) = find_related_by_ids(&[eid(1)], &store, None);
        let ids: std::collections::HashSet<_> = related.iter().map(|r| r.id).collect();
        assert!(ids.contains(&eid(2)));
        assert!(!ids.contains(&eid(3)));
    }

    #[test]
    fn empty_directive_text_is_rejected() {
        let records: Vec<(ID_t, HashMap<String, serde_json::Value>)> = vec![];
        let empty: Vec<&str> = vec![];
        let mut store = InMemoryIndexStore::new();
        let result = build_all_indexes(&records, &empty, 0, &mut store, &paths());
        assert!(matches!(result, Err(BuildError::Directive(DirectiveError::DirectiveEmpty))));
    }

    #[test]
    fn rebuild_with_identical_inputs_is_deterministic() {
        let records = vec![
            (eid(1), rec(&[("fname", "Alice"), ("lname", "Smith")])),
            (eid(2), rec(&[("fname", "Alice"), ("lname", "Smith")])),
        ];
        let mut store_a = InMemoryIndexStore::new();
        let mut store_b = InMemoryIndexStore::new();
        build_all_indexes(&records, &["&fname,lname"], 0, &mut store_a, &paths()).expect("build ok");
        build_all_indexes(&records, &["&fname,lname"], 0, &mut store_b, &paths()).expect("build ok");

        let (result_a, _) = find_related_by_ids(&[eid(1)], &store_a, None);
        let (result_b, _) = find_related_by_ids(&[eid(1)], &store_b, None);
        assert_eq!(result_a, result_b);
    }
}
