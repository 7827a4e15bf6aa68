//! Answers the two lookup shapes over a published set of indexes: relate
//! known ids to each other, or relate a freshly supplied record to ids
//! already indexed.
use std::collections::HashSet;
use std::fmt;

use crate::directive::Plan;
use crate::hasher::hash_record;
use crate::ids::ID_t;
use crate::record::RecordView;
use crate::store::IndexStore;

/// Errors produced by the query entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A query referenced an index that is missing entirely.
    MissingIndex(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIndex(name) => write!(f, "query references missing index: {name}"),
        }
    }
}

impl std::error::Error for QueryError {}

/// A non-fatal condition raised while answering a query: a single-key
/// fanout exceeded `per_key_limit`. The full (un-truncated) result is
/// still returned alongside this warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWarning {
    /// Human-readable description of which join step and key overflowed.
    pub message: String,
}

/// One result row of [`find_related_by_ids`]: `id` is related to `given_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FoundById {
    /// The id the caller asked about.
    pub given_id: ID_t,
    /// An id found related to it.
    pub id: ID_t,
}

/// One result row of [`find_related_by_example`]: an indexed id related to
/// the example record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FoundByExample {
    /// An indexed id found related to the example.
    pub id: ID_t,
}

fn warn_if_over(key: &str, count: usize, per_key_limit: Option<usize>, warnings: &mut Vec<QueryWarning>) {
    if let Some(limit) = per_key_limit {
        if count > limit {
            warnings.push(QueryWarning {
                message: format!("fanout for {key} returned {count} rows, exceeding the configured limit of {limit}"),
            });
        }
    }
}

/// Q1: relates each of `ids` to every other id sharing a cluster, by
/// walking `ID2Hash -> Hash2ID -> ID2Match -> Match2ID` for each seed.
///
/// `per_key_limit`, if given, is a soft ceiling: a join step whose fanout
/// for a given key exceeds it produces a [`QueryWarning`] rather than an
/// error or a truncated result.
pub fn find_related_by_ids(
    ids: &[ID_t],
    store: &dyn IndexStore,
    per_key_limit: Option<usize>,
) -> (Vec<FoundById>, Vec<QueryWarning>) {
    let mut warnings = Vec::new();
    let mut seen: HashSet<FoundById> = HashSet::new();
    let mut out = Vec::new();

    for &given_id in ids {
        let hashes = store.hashes_for_id(given_id);
        warn_if_over(&format!("ID2Hash[{given_id}]"), hashes.len(), per_key_limit, &mut warnings);

        let mut candidates: HashSet<ID_t> = HashSet::new();
        for hash in hashes {
            let ids_for_hash = store.ids_for_hash(hash);
            warn_if_over(&format!("Hash2ID[{hash}]"), ids_for_hash.len(), per_key_limit, &mut warnings);
            candidates.extend(ids_for_hash);
        }

        let mut related: HashSet<ID_t> = HashSet::new();
        for candidate in candidates {
            if let Some(matching_id) = store.matching_id_for_id(candidate) {
                let ids_for_matching = store.ids_for_matching_id(matching_id);
                warn_if_over(
                    &format!("Match2ID[{}]", matching_id.get()),
                    ids_for_matching.len(),
                    per_key_limit,
                    &mut warnings,
                );
                related.extend(ids_for_matching);
            }
        }

        for id in related {
            let row = FoundById { given_id, id };
            if seen.insert(row) {
                out.push(row);
            }
        }
    }

    out.sort_unstable();
    (out, warnings)
}

/// Q2: relates a set of freshly supplied `example_records` (not yet
/// indexed) to ids already published in `store`.
///
/// Callers typically pass `max_edit_distance = 0` at query time to avoid
/// over-fuzzing the probe set.
pub fn find_related_by_example<R: RecordView>(
    example_records: &[R],
    plan: &Plan,
    max_edit_distance: u64,
    store: &dyn IndexStore,
    per_key_limit: Option<usize>,
) -> (Vec<FoundByExample>, Vec<QueryWarning>) {
    let mut warnings = Vec::new();
    let probe_id = ID_t::ZERO;

    let mut probe_hashes: HashSet<_> = HashSet::new();
    for record in example_records {
        for pair in hash_record(probe_id, record, plan, max_edit_distance) {
            probe_hashes.insert(pair.hash_value);
        }
    }

    let mut candidate_ids: HashSet<ID_t> = HashSet::new();
    for hash in &probe_hashes {
        let ids_for_hash = store.ids_for_hash(*hash);
        warn_if_over(&format!("Hash2ID[{hash}]"), ids_for_hash.len(), per_key_limit, &mut warnings);
        candidate_ids.extend(ids_for_hash);
    }

    let mut matching_ids = HashSet::new();
    for id in candidate_ids {
        if let Some(matching_id) = store.matching_id_for_id(id) {
            matching_ids.insert(matching_id);
        }
    }

    let mut final_ids: HashSet<ID_t> = HashSet::new();
    for matching_id in matching_ids {
        let ids_for_matching = store.ids_for_matching_id(matching_id);
        warn_if_over(
            &format!("Match2ID[{}]", matching_id.get()),
            ids_for_matching.len(),
            per_key_limit,
            &mut warnings,
        );
        final_ids.extend(ids_for_matching);
    }

    let mut out: Vec<FoundByExample> = final_ids.into_iter().map(|id| FoundByExample { id }).collect();
    out.sort_unstable();
    (out, warnings)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::directive::parse_directives;
    use crate::ids::Hash_t;
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

    fn build_store(
        plan: &Plan,
        rows: &[(u64, HashMap<String, serde_json::Value>)],
        max_edit_distance: u64,
    ) -> InMemoryIndexStore {
        let mut hash_rows = Vec::new();
        for (id, record) in rows {
            for pair in hash_record(eid(*id), record, plan, max_edit_distance) {
                hash_rows.push((pair.id, pair.hash_value));
            }
        }
        let lookup_pairs: Vec<_> = hash_rows
            .iter()
            .map(|&(id, hash_value)| crate::hasher::LookupPair { id, hash_value })
            .collect();
        let matching = crate::cluster::build_matching_ids(&lookup_pairs, crate::cluster::ClusterConfig::default())
            .expect("cluster ok");
        let match_rows: Vec<_> = matching.iter().map(|p| (p.matching_id, p.id)).collect();

        let mut store = InMemoryIndexStore::new();
        store.publish(&hash_rows, &match_rows).expect("publish ok");
        store
    }

    #[test]
    fn self_match_always_present() {
        let plan = parse_directives(&["&fname,lname"]).expect("valid");
        let rows = vec![(1, rec(&[("fname", "Alice"), ("lname", "Smith")]))];
        let store = build_store(&plan, &rows, 0);
        let (result, warnings) = find_related_by_ids(&[eid(1)], &store, None);
        assert!(warnings.is_empty());
        assert!(result.iter().any(|r| r.given_id == eid(1) && r.id == eid(1)));
    }

    #[test]
    fn exact_duplicates_are_related() {
        let plan = parse_directives(&["&fname,lname"]).expect("valid");
        let rows = vec![
            (1, rec(&[("fname", "Alice"), ("lname", "Smith")])),
            (2, rec(&[("fname", "Alice"), ("lname", "Smith")])),
            (3, rec(&[("fname", "Bob"), ("lname", "Jones")])),
        ];
        let store = build_store(&plan, &rows, 0);
        let (result, _) = find_related_by_ids(&[eid(1)], &store, None);
        let related_ids: HashSet<_> = result.iter().map(|r| r.id).collect();
        assert!(related_ids.contains(&eid(2)));
        assert!(!related_ids.contains(&eid(3)));
    }

    #[test]
    fn find_by_example_matches_indexed_population() {
        // Three non-required groups (fname, lname, city): indexing at
        // max_edit_distance=2 emits, among others, the fingerprint that
        // drops lname and city entirely, so it lines up with a query-time
        // probe that only supplies postal+fname (d=0, per S6).
        let plan = parse_directives(&["&postal;fname;lname;city"]).expect("valid");
        let rows = vec![(
            1,
            rec(&[
                ("postal", "94110"),
                ("fname", "Alice"),
                ("lname", "Smith"),
                ("city", "SF"),
            ]),
        )];
        let store = build_store(&plan, &rows, 2);
        let example = vec![rec(&[("postal", "94110"), ("fname", "Alice")])];
        let (result, _) = find_related_by_example(&example, &plan, 0, &store, None);
        assert!(
            result.iter().any(|r| r.id == eid(1)),
            "should match on shared postal+fname regardless of lname/city"
        );
    }

    #[test]
    fn overflow_of_per_key_limit_is_a_warning_not_a_failure() {
        let plan = parse_directives(&["&fname,lname"]).expect("valid");
        let rows = vec![
            (1, rec(&[("fname", "Alice"), ("lname", "Smith")])),
            (2, rec(&[("fname", "Alice"), ("lname", "Smith")])),
            (3, rec(&[("fname", "Alice"), ("lname", "Smith")])),
        ];
        let store = build_store(&plan, &rows, 0);
        let (result, warnings) = find_related_by_ids(&[eid(1)], &store, Some(1));
        assert!(!result.is_empty());
        assert!(!warnings.is_empty());
    }

    #[test]
    fn unknown_id_yields_empty_result_not_error() {
        let plan = parse_directives(&["&fname,lname"]).expect("valid");
        let rows = vec![(1, rec(&[("fname", "Alice"), ("lname", "Smith")]))];
        let store = build_store(&plan, &rows, 0);
        let (result, _) = find_related_by_ids(&[eid(99)], &store, None);
        assert!(result.is_empty());
    }
}
