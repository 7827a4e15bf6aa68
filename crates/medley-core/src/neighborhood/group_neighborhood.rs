//! The set-element deletion neighborhood over a record's non-required
//! group hashes.
use std::collections::HashSet;

use crate::hashing::hash_sequence;
use crate::ids::Hash_t;

/// Enumerates the set of aggregate 64-bit hashes obtained by hashing every
/// subset of `groups` of size at least `max(1, m - depth)` (`m =
/// groups.len()`), combining each subset's elements in their original
/// index order (aggregate hashing is order-sensitive — elements are never
/// reordered to match the deletion-iteration order).
///
/// `depth` is clamped to `min(depth, m - 1)` so that at least one element
/// always survives. When `groups` is empty, the lone output is the
/// aggregate hash of zero elements, a sentinel for the empty input.
pub fn group_neighborhood(groups: &[Hash_t], depth: u64) -> HashSet<Hash_t> {
    let m = groups.len();
    if m == 0 {
        let mut out = HashSet::new();
        out.insert(hash_sequence::<[&[u8]; 0], &[u8]>([]));
        return out;
    }

    let depth_clamped = depth.min((m - 1) as u64);
    let mut out = HashSet::new();
    let mut seen_subsets: HashSet<Vec<usize>> = HashSet::new();
    let indices: Vec<usize> = (0..m).collect();
    visit(groups, &indices, depth_clamped, &mut out, &mut seen_subsets);
    out
}

fn visit(
    groups: &[Hash_t],
    indices: &[usize],
    depth_remaining: u64,
    out: &mut HashSet<Hash_t>,
    seen_subsets: &mut HashSet<Vec<usize>>,
) {
    if !seen_subsets.insert(indices.to_vec()) {
        return;
    }
    let aggregate = hash_sequence(indices.iter().map(|&i| groups[i].to_le_bytes()));
    out.insert(aggregate);

    if depth_remaining == 0 || indices.len() <= 1 {
        return;
    }

    for pos in 0..indices.len() {
        let mut next = indices.to_vec();
        next.remove(pos);
        visit(groups, &next, depth_remaining - 1, out, seen_subsets);
    }
}
