//! Array index compaction
//!
//! Given the array positions that are actually present, renumber each array
//! so its positions run 0..n-1 in ascending order of the old position. Both
//! reindexing after a removal and extraction use this.

use std::collections::{BTreeSet, HashMap};

use super::path::{FieldPath, PathSegment};

/// Collects observed array positions keyed by the path of their array.
#[derive(Debug, Default)]
pub struct IndexCompactor {
    observed: HashMap<FieldPath, BTreeSet<usize>>,
}

impl IndexCompactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every array position appearing in `path`.
    pub fn observe(&mut self, path: &FieldPath) {
        for (depth, seg) in path.segments().iter().enumerate() {
            if let PathSegment::Index(idx) = seg {
                self.observed
                    .entry(path.prefix(depth))
                    .or_default()
                    .insert(*idx);
            }
        }
    }

    /// Record only the array position at `depth`.
    pub fn observe_at(&mut self, path: &FieldPath, depth: usize) {
        if let Some(PathSegment::Index(idx)) = path.segments().get(depth) {
            self.observed
                .entry(path.prefix(depth))
                .or_default()
                .insert(*idx);
        }
    }

    pub fn finish(self) -> IndexMapping {
        let by_array = self
            .observed
            .into_iter()
            .map(|(array, present)| {
                let renumbered = present
                    .into_iter()
                    .enumerate()
                    .map(|(new, old)| (old, new))
                    .collect();
                (array, renumbered)
            })
            .collect();
        IndexMapping { by_array }
    }
}

/// Old-to-new position mapping per array path.
///
/// Array paths are keyed by their pre-compaction form, so nested arrays are
/// looked up with the outer index as it was observed.
#[derive(Debug, Default)]
pub struct IndexMapping {
    by_array: HashMap<FieldPath, HashMap<usize, usize>>,
}

impl IndexMapping {
    /// Rewrite every mapped array position in `path`.
    pub fn remap(&self, path: &FieldPath) -> FieldPath {
        let mut remapped = path.clone();
        for (depth, seg) in path.segments().iter().enumerate() {
            if let PathSegment::Index(old) = seg {
                let new = self
                    .by_array
                    .get(&path.prefix(depth))
                    .and_then(|positions| positions.get(old));
                if let Some(new) = new {
                    remapped.set_index_at(depth, *new);
                }
            }
        }
        remapped
    }

    /// True when no observed position moves.
    pub fn is_identity(&self) -> bool {
        self.by_array
            .values()
            .all(|positions| positions.iter().all(|(old, new)| old == new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn test_closes_gaps_in_ascending_order() {
        let mut compactor = IndexCompactor::new();
        for p in ["items[0].name", "items[2].name", "items[5].name", "title"] {
            compactor.observe(&path(p));
        }
        let mapping = compactor.finish();

        assert!(!mapping.is_identity());
        assert_eq!(mapping.remap(&path("items[0].name")), path("items[0].name"));
        assert_eq!(mapping.remap(&path("items[2].name")), path("items[1].name"));
        assert_eq!(mapping.remap(&path("items[5].name")), path("items[2].name"));
        assert_eq!(mapping.remap(&path("title")), path("title"));
    }

    #[test]
    fn test_nested_arrays_are_keyed_by_observed_outer_index() {
        let mut compactor = IndexCompactor::new();
        for p in ["a[1].b[3]", "a[1].b[7]", "a[4].b[0]"] {
            compactor.observe(&path(p));
        }
        let mapping = compactor.finish();

        assert_eq!(mapping.remap(&path("a[1].b[3]")), path("a[0].b[0]"));
        assert_eq!(mapping.remap(&path("a[1].b[7]")), path("a[0].b[1]"));
        assert_eq!(mapping.remap(&path("a[4].b[0]")), path("a[1].b[0]"));
    }

    #[test]
    fn test_observe_at_leaves_outer_positions_alone() {
        let mut compactor = IndexCompactor::new();
        compactor.observe_at(&path("a[3].b[2]"), 3);
        compactor.observe_at(&path("a[3].b[4]"), 3);
        let mapping = compactor.finish();

        assert_eq!(mapping.remap(&path("a[3].b[2].c")), path("a[3].b[0].c"));
        assert_eq!(mapping.remap(&path("a[3].b[4]")), path("a[3].b[1]"));
        assert_eq!(mapping.remap(&path("a[2].b[4]")), path("a[2].b[4]"));
    }

    #[test]
    fn test_contiguous_positions_are_identity() {
        let mut compactor = IndexCompactor::new();
        for p in ["x[0]", "x[1]", "x[2]"] {
            compactor.observe(&path(p));
        }
        assert!(compactor.finish().is_identity());
    }
}
