// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use rust_htslib::bam;

use crate::breakpoints::geometry::query_spans;
use crate::breakpoints::soft_clips::resolve_records;
use crate::breakpoints::End;
use crate::utils::{is_primary, ref_end};

/// Classification input built from a representative pair of alignments (A, B).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignmentItem {
    pub chrom_a: i32,
    pub chrom_b: i32,
    pub primary_a: bool,
    pub primary_b: bool,
    /// Read in pair (1 or 2).
    pub read_a: u8,
    pub read_b: u8,
    pub pos_a: i64,
    pub end_a: i64,
    pub pos_b: i64,
    pub end_b: i64,
    pub strand_a: End,
    pub strand_b: End,
    pub left_clip_a: bool,
    pub right_clip_a: bool,
    pub left_clip_b: bool,
    pub right_clip_b: bool,
    pub query_start_a: i64,
    pub query_end_a: i64,
    pub query_start_b: i64,
    pub query_end_b: i64,
    /// Alignments of different reads of the template overlapping on the reference.
    pub read_overlaps_mate: bool,
}

fn read_in_pair(record: &bam::Record) -> u8 {
    if record.is_last_in_template() && !record.is_first_in_template() {
        2
    } else {
        1
    }
}

impl AlignmentItem {
    pub fn from_records(a: &bam::Record, b: &bam::Record) -> Self {
        let clips = resolve_records(a, b);
        let (read_a, read_b) = (read_in_pair(a), read_in_pair(b));
        let same_read = read_a == read_b;
        let spans = query_spans(
            &a.cigar(),
            a.is_reverse(),
            &b.cigar(),
            b.is_reverse(),
            same_read,
        );
        let (end_a, end_b) = (ref_end(a), ref_end(b));
        let read_overlaps_mate =
            !same_read && a.tid() == b.tid() && a.pos() < end_b && b.pos() < end_a;

        AlignmentItem {
            chrom_a: a.tid(),
            chrom_b: b.tid(),
            primary_a: is_primary(a),
            primary_b: is_primary(b),
            read_a,
            read_b,
            pos_a: a.pos(),
            end_a,
            pos_b: b.pos(),
            end_b,
            strand_a: End::from_reverse(a.is_reverse()),
            strand_b: End::from_reverse(b.is_reverse()),
            left_clip_a: clips.left_a,
            right_clip_a: clips.right_a,
            left_clip_b: clips.left_b,
            right_clip_b: clips.right_b,
            query_start_a: spans.start_a,
            query_end_a: spans.end_a,
            query_start_b: spans.start_b,
            query_end_b: spans.end_b,
            read_overlaps_mate,
        }
    }

    pub fn same_read(&self) -> bool {
        self.read_a == self.read_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::*;
    use rust_htslib::bam::record::Cigar::*;

    #[test]
    fn test_split_read_item() {
        let a = record(
            "r1",
            PAIRED | FIRST_IN_PAIR,
            0,
            1000,
            vec![Match(60), SoftClip(40)],
        );
        let b = record(
            "r1",
            PAIRED | FIRST_IN_PAIR | SUPPLEMENTARY,
            0,
            2000,
            vec![HardClip(60), Match(40)],
        );
        let item = AlignmentItem::from_records(&a, &b);
        assert!(item.same_read());
        assert!(item.primary_a && !item.primary_b);
        assert_eq!((item.pos_a, item.end_a), (1000, 1060));
        assert_eq!((item.pos_b, item.end_b), (2000, 2040));
        assert!(item.right_clip_a && item.left_clip_b);
        assert_eq!((item.query_start_b, item.query_end_b), (60, 100));
        assert!(!item.read_overlaps_mate);
    }

    #[test]
    fn test_overlapping_mates() {
        let a = record("r2", PAIRED | FIRST_IN_PAIR, 0, 100, vec![Match(100)]);
        let b = record(
            "r2",
            PAIRED | SECOND_IN_PAIR | REVERSE,
            0,
            150,
            vec![Match(100)],
        );
        let item = AlignmentItem::from_records(&a, &b);
        assert!(!item.same_read());
        assert!(item.read_overlaps_mate);
        assert_eq!(item.strand_b, End::Five);
    }
}
