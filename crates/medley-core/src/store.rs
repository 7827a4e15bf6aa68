//! The on-disk sorted key/value relations an index build publishes, and the
//! trait callers implement to supply or consume them.
//!
//! Medley itself performs no file or network I/O: persistence is an
//! injected dependency, the same way external lookups are kept out of a
//! validation engine core and handed to callers as a trait object.
use std::collections::BTreeMap;
use std::fmt;

use crate::ids::{Hash_t, ID_t, MatchingID_t};

/// Errors a concrete [`IndexStore`] may report.
///
/// The inner string carries implementation-specific diagnostics (a path, an
/// I/O message); it is not part of the error's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not complete a read.
    ReadFailed(String),
    /// The store could not complete a write.
    WriteFailed(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed(msg) => write!(f, "index store read failed: {msg}"),
            Self::WriteFailed(msg) => write!(f, "index store write failed: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// The four sorted relations an index build publishes, and the reads a
/// query engine needs against them.
///
/// Implementations may back this with memory-mapped files, an embedded
/// key/value engine, or (as shipped here) a plain in-memory map — the
/// engine does not care, as long as lookups are by exact key and the
/// relation is internally consistent (every `ID2Hash` entry has a matching
/// `Hash2ID` entry and vice versa, same for `ID2Match` / `Match2ID`).
///
/// Object-safe: callers hold it as `&dyn IndexStore`.
pub trait IndexStore {
    /// All fingerprints recorded for `id`, empty if `id` is unknown.
    fn hashes_for_id(&self, id: ID_t) -> Vec<Hash_t>;

    /// All ids that were hashed to `hash`, empty if nothing matches.
    fn ids_for_hash(&self, hash: Hash_t) -> Vec<ID_t>;

    /// The matching id `id` was assigned, if `id` participated in clustering.
    fn matching_id_for_id(&self, id: ID_t) -> Option<MatchingID_t>;

    /// Every id sharing `matching_id`'s cluster, empty if unknown.
    fn ids_for_matching_id(&self, matching_id: MatchingID_t) -> Vec<ID_t>;

    /// Replaces the stored relations with the given rows. Callers publish
    /// one build's worth of output in a single call; an implementation may
    /// treat partial failure as leaving the prior generation untouched.
    fn publish(
        &mut self,
        hash_rows: &[(ID_t, Hash_t)],
        match_rows: &[(MatchingID_t, ID_t)],
    ) -> Result<(), StoreError>;
}

/// A reference [`IndexStore`] backed by sorted in-memory maps.
///
/// Suitable for tests, small batch jobs, and anywhere the full relation
/// comfortably fits in memory. Each of the four views is kept as its own
/// `BTreeMap` so lookups in either direction are `O(log n)` without a
/// separate index structure.
#[derive(Debug, Default, Clone)]
pub struct InMemoryIndexStore {
    id_to_hashes: BTreeMap<ID_t, Vec<Hash_t>>,
    hash_to_ids: BTreeMap<Hash_t, Vec<ID_t>>,
    id_to_matching: BTreeMap<ID_t, MatchingID_t>,
    matching_to_ids: BTreeMap<MatchingID_t, Vec<ID_t>>,
}

impl InMemoryIndexStore {
    /// Builds an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexStore for InMemoryIndexStore {
    fn hashes_for_id(&self, id: ID_t) -> Vec<Hash_t> {
        self.id_to_hashes.get(&id).cloned().unwrap_or_default()
    }

    fn ids_for_hash(&self, hash: Hash_t) -> Vec<ID_t> {
        self.hash_to_ids.get(&hash).cloned().unwrap_or_default()
    }

    fn matching_id_for_id(&self, id: ID_t) -> Option<MatchingID_t> {
        self.id_to_matching.get(&id).copied()
    }

    fn ids_for_matching_id(&self, matching_id: MatchingID_t) -> Vec<ID_t> {
        self.matching_to_ids.get(&matching_id).cloned().unwrap_or_default()
    }

    fn publish(
        &mut self,
        hash_rows: &[(ID_t, Hash_t)],
        match_rows: &[(MatchingID_t, ID_t)],
    ) -> Result<(), StoreError> {
        let mut id_to_hashes: BTreeMap<ID_t, Vec<Hash_t>> = BTreeMap::new();
        let mut hash_to_ids: BTreeMap<Hash_t, Vec<ID_t>> = BTreeMap::new();
        for &(id, hash) in hash_rows {
            id_to_hashes.entry(id).or_default().push(hash);
            hash_to_ids.entry(hash).or_default().push(id);
        }

        let mut id_to_matching: BTreeMap<ID_t, MatchingID_t> = BTreeMap::new();
        let mut matching_to_ids: BTreeMap<MatchingID_t, Vec<ID_t>> = BTreeMap::new();
        for &(matching_id, id) in match_rows {
            id_to_matching.insert(id, matching_id);
            matching_to_ids.entry(matching_id).or_default().push(id);
        }

        for ids in hash_to_ids.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
        for hashes in id_to_hashes.values_mut() {
            hashes.sort_unstable();
            hashes.dedup();
        }
        for ids in matching_to_ids.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }

        self.id_to_hashes = id_to_hashes;
        self.hash_to_ids = hash_to_ids;
        self.id_to_matching = id_to_matching;
        self.matching_to_ids = matching_to_ids;
        Ok(())
    }
}
