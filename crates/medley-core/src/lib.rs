#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod cluster;
pub mod directive;
pub mod hashing;
pub mod hasher;
pub mod ids;
pub mod neighborhood;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod store;
pub mod union_find;

pub use cluster::{ClusterConfig, ClusterError, MatchingPair, build_matching_ids};
pub use directive::{Alternative, DirectiveError, Field, Group, Plan, parse_directives};
pub use hashing::{H64_SENTINEL, combine64, hash_sequence};
pub use hasher::{LookupPair, hash_record};
#[allow(non_camel_case_types)]
pub use ids::{Hash_t, ID_t, MatchingID_t};
pub use neighborhood::group_neighborhood::group_neighborhood;
pub use neighborhood::string_neighborhood::string_neighborhood;
pub use pipeline::{BuildError, IndexPaths, build_all_indexes};
pub use query::{
    FoundByExample, FoundById, QueryError, QueryWarning, find_related_by_example,
    find_related_by_ids,
};
pub use record::RecordView;
pub use store::{IndexStore, InMemoryIndexStore, StoreError};
pub use union_find::UnionFind;

/// Returns the current version of the medley-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }
}
