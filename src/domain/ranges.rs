//! Uncovered-range set: construction from coverage blocks and the
//! three-way classification the rewriter drives its traversal with.

use crate::domain::position::{CodeRange, SourcePos};

/// One record from the coverage profile: a source span and how many times the
/// test run executed it.
#[derive(Debug, Clone, Copy)]
pub struct CoverageBlock {
    pub range: CodeRange,
    pub hits: u64,
}

/// Relationship between a syntax node's span and the uncovered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// The span lies entirely inside one uncovered range.
    Contained,
    /// The span straddles an uncovered-range boundary; children must be
    /// inspected individually.
    Overlapping,
    /// The span lies entirely in covered territory; the whole subtree can be
    /// pruned.
    NonOverlapping,
}

/// Sorted, pairwise-disjoint, merged set of uncovered spans for one file.
/// Built once per file, then consulted read-only.
#[derive(Debug, Clone, Default)]
pub struct UncoveredRanges {
    ranges: Vec<CodeRange>,
}

impl UncoveredRanges {
    /// Merge the zero-hit blocks of one file into the minimal range set.
    ///
    /// Blocks must arrive sorted by start position (the profile reader sorts
    /// them defensively). Each zero-hit block's start column is pulled back by
    /// one so that a block wrapping an entirely empty body still covers its
    /// opening delimiter instead of leaving a zero-width gap.
    pub fn from_blocks<I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = CoverageBlock>,
    {
        let mut ranges: Vec<CodeRange> = Vec::new();
        for block in blocks {
            if block.hits > 0 {
                continue;
            }
            let start = SourcePos::new(block.range.start.line, block.range.start.col.saturating_sub(1));
            let new = CodeRange::new(start, block.range.end);
            match ranges.last_mut() {
                Some(last) if new.start <= last.end => {
                    // Adjacent or overlapping: extend instead of appending.
                    last.end = new.end;
                }
                _ => ranges.push(new),
            }
        }
        UncoveredRanges { ranges }
    }

    /// A fully covered file yields an empty set and must be skipped outright
    /// by the pipeline.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn as_slice(&self) -> &[CodeRange] {
        &self.ranges
    }

    /// Classify `query` against the set.
    ///
    /// Because the set is sorted and disjoint, range ends increase
    /// monotonically, so a binary search for the first range whose end is not
    /// before `query.end` pins down the only candidate that could contain the
    /// query.
    pub fn classify(&self, query: &CodeRange) -> Coverage {
        let idx = self.ranges.partition_point(|r| r.end < query.end);

        //  previous  found
        //    [---)   [--)
        //             [)    contained        (query.start >= found.start)
        //           [--)    overlapping      (query.end > found.start)
        //          [)       non-overlapping  (query.start >= previous.end)
        //      [----)       overlapping

        if let Some(found) = self.ranges.get(idx) {
            if found.start <= query.start {
                return Coverage::Contained;
            }
            if found.start < query.end {
                return Coverage::Overlapping;
            }
        }

        if idx == 0 || self.ranges[idx - 1].end <= query.start {
            return Coverage::NonOverlapping;
        }
        Coverage::Overlapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, col: u32) -> SourcePos {
        SourcePos::new(line, col)
    }

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> CodeRange {
        CodeRange::new(pos(sl, sc), pos(el, ec))
    }

    fn block(sl: u32, sc: u32, el: u32, ec: u32, hits: u64) -> CoverageBlock {
        CoverageBlock { range: range(sl, sc, el, ec), hits }
    }

    #[test]
    fn test_builder_skips_hit_blocks() {
        let set = UncoveredRanges::from_blocks(vec![
            block(1, 1, 2, 5, 3),
            block(3, 1, 4, 5, 1),
        ]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_builder_widens_start_left_by_one() {
        let set = UncoveredRanges::from_blocks(vec![block(5, 10, 6, 2, 0)]);
        assert_eq!(set.as_slice(), &[range(5, 9, 6, 2)]);
    }

    #[test]
    fn test_builder_widening_saturates_at_zero() {
        let set = UncoveredRanges::from_blocks(vec![block(5, 0, 6, 2, 0)]);
        assert_eq!(set.as_slice()[0].start, pos(5, 0));
    }

    #[test]
    fn test_builder_merges_adjacent_blocks() {
        // Second block starts exactly where the first ends (after widening).
        let set = UncoveredRanges::from_blocks(vec![
            block(1, 2, 2, 5, 0),
            block(2, 6, 3, 8, 0),
        ]);
        assert_eq!(set.as_slice(), &[range(1, 1, 3, 8)]);
    }

    #[test]
    fn test_builder_merges_overlapping_blocks() {
        let set = UncoveredRanges::from_blocks(vec![
            block(1, 2, 4, 5, 0),
            block(3, 1, 6, 2, 0),
        ]);
        assert_eq!(set.as_slice(), &[range(1, 1, 6, 2)]);
    }

    #[test]
    fn test_builder_keeps_separated_blocks_apart() {
        let set = UncoveredRanges::from_blocks(vec![
            block(1, 2, 2, 5, 0),
            block(4, 2, 5, 5, 0),
        ]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_builder_covered_gap_splits_ranges() {
        let set = UncoveredRanges::from_blocks(vec![
            block(1, 2, 2, 5, 0),
            block(2, 6, 3, 1, 7),
            block(4, 2, 5, 5, 0),
        ]);
        assert_eq!(set.as_slice(), &[range(1, 1, 2, 5), range(4, 1, 5, 5)]);
    }

    fn simple_set() -> UncoveredRanges {
        UncoveredRanges::from_blocks(vec![
            block(10, 2, 12, 5, 0),
            block(20, 2, 22, 5, 0),
        ])
    }

    #[test]
    fn test_classify_contained() {
        let set = simple_set();
        assert_eq!(set.classify(&range(10, 5, 11, 3)), Coverage::Contained);
        assert_eq!(set.classify(&range(21, 1, 21, 9)), Coverage::Contained);
    }

    #[test]
    fn test_classify_exact_boundary_equality_is_contained() {
        let set = simple_set();
        // Query exactly equal to a stored range, not merely inside it.
        assert_eq!(set.classify(&range(10, 1, 12, 5)), Coverage::Contained);
    }

    #[test]
    fn test_classify_straddling_a_boundary_is_overlapping() {
        let set = simple_set();
        assert_eq!(set.classify(&range(9, 1, 11, 1)), Coverage::Overlapping);
        assert_eq!(set.classify(&range(11, 1, 13, 1)), Coverage::Overlapping);
    }

    #[test]
    fn test_classify_fully_covered_is_non_overlapping() {
        let set = simple_set();
        assert_eq!(set.classify(&range(1, 1, 5, 5)), Coverage::NonOverlapping);
        assert_eq!(set.classify(&range(14, 1, 18, 5)), Coverage::NonOverlapping);
        assert_eq!(set.classify(&range(30, 1, 31, 5)), Coverage::NonOverlapping);
    }

    #[test]
    fn test_classify_query_wider_than_a_range_is_overlapping() {
        let set = simple_set();
        // Touches covered code on both sides but spans a whole uncovered range.
        assert_eq!(set.classify(&range(9, 1, 14, 1)), Coverage::Overlapping);
        // Spans everything.
        assert_eq!(set.classify(&range(1, 1, 40, 1)), Coverage::Overlapping);
    }

    #[test]
    fn test_classify_touching_ends_is_non_overlapping() {
        let set = simple_set();
        // A half-open query ending exactly at a range start, or starting at a
        // range end, shares no characters with it.
        assert_eq!(set.classify(&range(9, 1, 10, 1)), Coverage::NonOverlapping);
        assert_eq!(set.classify(&range(12, 5, 14, 1)), Coverage::NonOverlapping);
    }

    #[test]
    fn test_classify_empty_set() {
        let set = UncoveredRanges::default();
        assert_eq!(set.classify(&range(1, 1, 2, 2)), Coverage::NonOverlapping);
    }

    #[test]
    fn test_classify_depends_only_on_merged_shape() {
        // One merged range vs. several touching sub-ranges covering the same
        // net area must classify identically.
        let merged = UncoveredRanges::from_blocks(vec![block(10, 2, 18, 5, 0)]);
        let split = UncoveredRanges::from_blocks(vec![
            block(10, 2, 13, 1, 0),
            block(13, 2, 15, 9, 0),
            block(15, 10, 18, 5, 0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(split.len(), 1, "touching sub-ranges must merge");

        let queries = [
            range(10, 1, 18, 5),
            range(11, 1, 12, 1),
            range(9, 1, 11, 1),
            range(17, 1, 19, 1),
            range(1, 1, 2, 1),
            range(19, 1, 20, 1),
        ];
        for q in &queries {
            assert_eq!(merged.classify(q), split.classify(q), "query {}", q);
        }
    }

    #[test]
    fn test_builder_order_insensitive_for_disjoint_blocks() {
        // Mutually disjoint zero-hit blocks give the same set however they are
        // interleaved with hit blocks, as long as start order holds.
        let a = UncoveredRanges::from_blocks(vec![
            block(1, 2, 2, 5, 0),
            block(3, 1, 3, 9, 4),
            block(5, 2, 6, 5, 0),
        ]);
        let b = UncoveredRanges::from_blocks(vec![
            block(1, 2, 2, 5, 0),
            block(5, 2, 6, 5, 0),
        ]);
        assert_eq!(a.as_slice(), b.as_slice());
    }
}
