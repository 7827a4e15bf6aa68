//! Record hashing — the heart of the engine.
//!
//! For each input record and each directive alternative: projects the
//! record onto the alternative's fields, expands string-level deletion
//! variants per field, hashes each group of fields to a group hash, folds
//! the required groups into a seed context, and emits one fingerprint per
//! element of the group-level deletion neighborhood of the non-required
//! groups.
use std::collections::{HashMap, HashSet};

use crate::directive::{Alternative, Plan};
use crate::hashing::{H64_SENTINEL, combine_hash_as_seed, hash_sequence};
use crate::ids::{Hash_t, ID_t};
use crate::neighborhood::group_neighborhood::group_neighborhood;
use crate::neighborhood::string_neighborhood::string_neighborhood;
use crate::record::RecordView;

/// A single `(id, fingerprint)` pair in the `Hash2ID` / `ID2Hash` relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupPair {
    /// The entity id the fingerprint was derived from.
    pub id: ID_t,
    /// The 64-bit fingerprint.
    pub hash_value: Hash_t,
}

/// Builds the `"fieldName:value"` byte string hashed for one field within a
/// group.
fn field_bytes(name: &str, value: &str) -> String {
    format!("{name}:{value}")
}

/// Computes the hash of one field group: the fields whose value is
/// non-empty after trim, in directive order, hashed as
/// `"name:value"` strings. Fields with an empty value are omitted from the
/// member list entirely, not hashed as empty.
fn group_hash(group: &crate::directive::Group, values: &HashMap<String, String>) -> Hash_t {
    let members: Vec<String> = group
        .fields
        .iter()
        .filter_map(|f| {
            let value = values.get(f.name.as_str()).map(String::as_str).unwrap_or("");
            if value.is_empty() {
                None
            } else {
                Some(field_bytes(&f.name, value))
            }
        })
        .collect();
    hash_sequence(members)
}

/// Computes every field's candidate value list for one alternative applied
/// to one record: fields with `expand == 0` contribute their single
/// projected value, fields with `expand = k > 0` contribute their full
/// [`string_neighborhood`].
fn field_candidates<R: RecordView>(record: &R, alt: &Alternative) -> HashMap<String, Vec<String>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = HashMap::new();
    for group in &alt.groups {
        for field in &group.fields {
            if !seen.insert(field.name.as_str()) {
                continue;
            }
            let value = record.field(&field.name);
            let candidates = if field.expand > 0 {
                string_neighborhood(&value, field.expand).into_iter().collect()
            } else {
                vec![value]
            };
            out.insert(field.name.clone(), candidates);
        }
    }
    out
}

/// Expands `candidates` (field name -> candidate values) into the Cartesian
/// product of one concrete value per field — the set of record variants a
/// record expands to under string-level deletion.
fn cartesian_product(candidates: &HashMap<String, Vec<String>>) -> Vec<HashMap<String, String>> {
    let mut variants = vec![HashMap::new()];
    for (name, values) in candidates {
        let mut next = Vec::with_capacity(variants.len() * values.len().max(1));
        for variant in &variants {
            for value in values {
                let mut extended = variant.clone();
                extended.insert(name.clone(), value.clone());
                next.push(extended);
            }
        }
        variants = next;
    }
    variants
}

/// Emits the fingerprints for one record variant under one alternative.
fn fingerprints_for_variant(alt: &Alternative, values: &HashMap<String, String>, max_edit_distance: u64) -> Vec<Hash_t> {
    let empty_group_hash = hash_sequence::<[&[u8]; 0], &[u8]>([]);

    let mut required_hashes = Vec::new();
    let mut other_hashes = Vec::new();
    for group in &alt.groups {
        let h = group_hash(group, values);
        if group.required {
            required_hashes.push(h);
        } else if h != empty_group_hash {
            other_hashes.push(h);
        }
    }

    let h_req = if required_hashes.is_empty() {
        Hash_t::new(H64_SENTINEL)
    } else {
        hash_sequence(required_hashes.iter().map(|h| h.to_le_bytes()))
    };

    let go: Vec<Hash_t> = if other_hashes.is_empty() {
        vec![Hash_t::new(H64_SENTINEL)]
    } else {
        other_hashes
    };

    group_neighborhood(&go, max_edit_distance)
        .into_iter()
        .map(|h| combine_hash_as_seed(h_req.get(), h))
        .collect()
}

/// Runs the full hashing pipeline over one record for every alternative in
/// `plan`, unioning and deduplicating the resulting `(id, fingerprint)`
/// pairs.
///
/// `max_edit_distance` is the group-level deletion depth applied to the
/// non-required groups. It is unsigned, so no clamping to "zero or above"
/// is necessary at the type level.
pub fn hash_record<R: RecordView>(id: ID_t, record: &R, plan: &Plan, max_edit_distance: u64) -> Vec<LookupPair> {
    let mut seen: HashSet<Hash_t> = HashSet::new();
    let mut out = Vec::new();
    for alt in &plan.alternatives {
        let candidates = field_candidates(record, alt);
        for variant in cartesian_product(&candidates) {
            for fingerprint in fingerprints_for_variant(alt, &variant, max_edit_distance) {
                if seen.insert(fingerprint) {
                    out.push(LookupPair {
                        id,
                        hash_value: fingerprint,
                    });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::directive::parse_directives;

    fn rec(pairs: &[(&str, &str)]) -> HashMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    fn eid(n: u64) -> ID_t {
        ID_t::new(n).expect("fits 48 bits")
    }

    #[test]
    fn emits_at_least_one_fingerprint_always() {
        let plan = parse_directives(&["&fname,lname"]).expect("valid");
        let r = rec(&[("fname", "Alice"), ("lname", "Smith")]);
        let pairs = hash_record(eid(1), &r, &plan, 0);
        assert!(!pairs.is_empty(), "every record must yield coverage");
    }

    #[test]
    fn exact_match_same_attributes_same_fingerprint() {
        let plan = parse_directives(&["&fname,lname"]).expect("valid");
        let a = rec(&[("fname", "Alice"), ("lname", "Smith")]);
        let b = rec(&[("fname", "Alice"), ("lname", "Smith")]);
        let pa = hash_record(eid(1), &a, &plan, 0);
        let pb = hash_record(eid(2), &b, &plan, 0);
        let fa: HashSet<_> = pa.iter().map(|p| p.hash_value).collect();
        let fb: HashSet<_> = pb.iter().map(|p| p.hash_value).collect();
        assert!(!fa.is_disjoint(&fb), "identical required content must share a fingerprint");
    }

    #[test]
    fn required_group_guards_against_unrelated_match() {
        // Differing required field should yield disjoint fingerprints even
        // though the non-required groups overlap.
        let plan = parse_directives(&["w;x;y;&z"]).expect("valid");
        let a = rec(&[("w", "A"), ("x", "B"), ("y", "C"), ("z", "D")]);
        let b = rec(&[("w", "A"), ("x", "B"), ("y", "C"), ("z", "E")]);
        let pa = hash_record(eid(1), &a, &plan, 1);
        let pb = hash_record(eid(2), &b, &plan, 1);
        let fa: HashSet<_> = pa.iter().map(|p| p.hash_value).collect();
        let fb: HashSet<_> = pb.iter().map(|p| p.hash_value).collect();
        assert!(fa.is_disjoint(&fb), "required field differs, records must not be related");
    }

    #[test]
    fn group_deletion_relates_records_differing_in_one_group() {
        // All groups non-required, d=1 lets either record drop the group
        // it doesn't share.
        let plan = parse_directives(&["w;x;y;z"]).expect("valid");
        let a = rec(&[("w", "A"), ("x", "B"), ("y", "C"), ("z", "D")]);
        let b = rec(&[("w", "A"), ("x", "B"), ("y", "C"), ("z", "E")]);
        let pa = hash_record(eid(1), &a, &plan, 1);
        let pb = hash_record(eid(2), &b, &plan, 1);
        let fa: HashSet<_> = pa.iter().map(|p| p.hash_value).collect();
        let fb: HashSet<_> = pb.iter().map(|p| p.hash_value).collect();
        assert!(!fa.is_disjoint(&fb), "dropping the differing group should relate them");
    }

    #[test]
    fn string_neighborhood_relates_near_miss_spellings() {
        // "Freddie" and "Freddy" share "Freddi" under one deletion.
        let plan = parse_directives(&["fname%1"]).expect("valid");
        let a = rec(&[("fname", "Freddie")]);
        let b = rec(&[("fname", "Freddy")]);
        let pa = hash_record(eid(1), &a, &plan, 0);
        let pb = hash_record(eid(2), &b, &plan, 0);
        let fa: HashSet<_> = pa.iter().map(|p| p.hash_value).collect();
        let fb: HashSet<_> = pb.iter().map(|p| p.hash_value).collect();
        assert!(!fa.is_disjoint(&fb));
    }

    #[test]
    fn missing_field_is_empty_and_omitted_from_group() {
        let plan = parse_directives(&["fname,lname"]).expect("valid");
        let with_both = rec(&[("fname", "Alice"), ("lname", "Smith")]);
        let missing_lname = rec(&[("fname", "Alice")]);
        // Both should be hashable without panicking and produce fingerprints.
        assert!(!hash_record(eid(1), &with_both, &plan, 0).is_empty());
        assert!(!hash_record(eid(2), &missing_lname, &plan, 0).is_empty());
    }

    #[test]
    fn dedupes_on_id_and_fingerprint() {
        let plan = parse_directives(&["fname%1", "fname%1"]).expect("two identical alternatives");
        let a = rec(&[("fname", "Alice")]);
        let pairs = hash_record(eid(1), &a, &plan, 0);
        let unique: HashSet<_> = pairs.iter().collect();
        assert_eq!(pairs.len(), unique.len());
    }

    #[test]
    fn or_alternatives_each_recoverable_independently() {
        let plan = parse_directives(&["fname;lname", "lname;city"]).expect("valid");
        let shared_fname_lname = rec(&[("fname", "A"), ("lname", "B"), ("city", "X")]);
        let other_shared_fname_lname = rec(&[("fname", "A"), ("lname", "B"), ("city", "Y")]);
        let pa = hash_record(eid(1), &shared_fname_lname, &plan, 0);
        let pb = hash_record(eid(2), &other_shared_fname_lname, &plan, 0);
        let fa: HashSet<_> = pa.iter().map(|p| p.hash_value).collect();
        let fb: HashSet<_> = pb.iter().map(|p| p.hash_value).collect();
        assert!(!fa.is_disjoint(&fb), "shared fname+lname recoverable via first alternative");
    }
}
