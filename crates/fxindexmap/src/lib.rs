//! Insertion-ordered maps and sets hashed with `FxHash`.
//!
//! The assembler relies on iteration order matching insertion order (named tags are
//! listed in the order they were first requested, link references in code order), which
//! `std::collections::HashMap` does not give us.
use fxhash::FxBuildHasher;
pub use indexmap::*;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

/// Creates an empty [`FxIndexMap`].
pub fn new_map<K, V>() -> FxIndexMap<K, V> {
    FxIndexMap::with_hasher(FxBuildHasher::default())
}

/// Creates an empty [`FxIndexSet`].
pub fn new_set<T>() -> FxIndexSet<T> {
    FxIndexSet::with_hasher(FxBuildHasher::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_iterate_in_insertion_order() {
        let mut map = new_map();
        map.insert("b", 2);
        map.insert("a", 1);
        map.insert("c", 3);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn should_keep_first_position_of_duplicate() {
        let mut set = new_set();
        set.insert(3);
        set.insert(1);
        set.insert(3);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![3, 1]);
    }
}
