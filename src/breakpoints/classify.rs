// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Classification of a pair of alignments into a typed, oriented breakpoint hypothesis.
//!
//! Pairs on the same chromosome are oriented such that the `first` alignment starts
//! earlier on the reference. All results are reported in that order, i.e. `break_a`
//! always stems from the earlier alignment (or the lower reference id for
//! translocations). Every regime returns a fully populated [`ClassifiedPair`].

use crate::breakpoints::{AlignmentItem, End, JoinType, SvType};

/// Mutually exclusive classification regimes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    InterChromosomal,
    BothPrimary,
    SplitSameRead,
    SplitDifferentReads,
}

impl Regime {
    pub fn of(item: &AlignmentItem) -> Self {
        if item.chrom_a != item.chrom_b {
            Regime::InterChromosomal
        } else if item.primary_a && item.primary_b {
            Regime::BothPrimary
        } else if item.same_read() {
            Regime::SplitSameRead
        } else {
            Regime::SplitDifferentReads
        }
    }
}

/// An oriented breakpoint hypothesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPair {
    pub chrom_a: i32,
    pub chrom_b: i32,
    pub break_a: i64,
    pub break_b: i64,
    pub precise_a: bool,
    pub precise_b: bool,
    pub svtype: SvType,
    pub join_type: JoinType,
    /// Unaligned read bases between the two blocks of a split read, sizing an insertion.
    pub query_gap: Option<i64>,
}

/// One alignment of the pair, seen from the classifier.
#[derive(Clone, Copy, Debug)]
struct Side {
    chrom: i32,
    pos: i64,
    end: i64,
    strand: End,
    left_clip: bool,
    right_clip: bool,
    query_start: i64,
    query_end: i64,
}

impl Side {
    fn start_break(&self) -> (i64, bool) {
        (self.pos, self.left_clip)
    }

    fn end_break(&self) -> (i64, bool) {
        (self.end, self.right_clip)
    }

    fn break_at(&self, end: End) -> (i64, bool) {
        match end {
            End::Three => self.end_break(),
            End::Five => self.start_break(),
        }
    }
}

/// Both sides of an item, ordered by reference position.
struct Oriented {
    first: Side,
    second: Side,
    first_is_a: bool,
}

fn orient(item: &AlignmentItem) -> Oriented {
    let a = Side {
        chrom: item.chrom_a,
        pos: item.pos_a,
        end: item.end_a,
        strand: item.strand_a,
        left_clip: item.left_clip_a,
        right_clip: item.right_clip_a,
        query_start: item.query_start_a,
        query_end: item.query_end_a,
    };
    let b = Side {
        chrom: item.chrom_b,
        pos: item.pos_b,
        end: item.end_b,
        strand: item.strand_b,
        left_clip: item.left_clip_b,
        right_clip: item.right_clip_b,
        query_start: item.query_start_b,
        query_end: item.query_end_b,
    };
    let a_first = if a.chrom != b.chrom {
        a.chrom < b.chrom
    } else {
        (a.pos, a.end) <= (b.pos, b.end)
    };
    if a_first {
        Oriented {
            first: a,
            second: b,
            first_is_a: true,
        }
    } else {
        Oriented {
            first: b,
            second: a,
            first_is_a: false,
        }
    }
}

fn hypothesis(
    sides: &Oriented,
    first_break: (i64, bool),
    second_break: (i64, bool),
    svtype: SvType,
    join_type: JoinType,
) -> ClassifiedPair {
    ClassifiedPair {
        chrom_a: sides.first.chrom,
        chrom_b: sides.second.chrom,
        break_a: first_break.0,
        break_b: second_break.0,
        precise_a: first_break.1,
        precise_b: second_break.1,
        svtype,
        join_type,
        query_gap: None,
    }
}

fn deletion_shaped(sides: &Oriented, svtype: SvType) -> ClassifiedPair {
    hypothesis(
        sides,
        sides.first.end_break(),
        sides.second.start_break(),
        svtype,
        JoinType::THREE_TO_FIVE,
    )
}

fn duplication_shaped(sides: &Oriented, svtype: SvType) -> ClassifiedPair {
    hypothesis(
        sides,
        sides.first.start_break(),
        sides.second.end_break(),
        svtype,
        JoinType::FIVE_TO_THREE,
    )
}

/// Inversion-like join connecting equally oriented ends. Clipped ends decide whether the
/// join connects both alignment ends (3to3) or both starts (5to5); if clipping is
/// absent or ambiguous, `guess` decides.
fn inversion_join(sides: &Oriented, svtype: SvType, guess: End) -> ClassifiedPair {
    let (first, second) = (&sides.first, &sides.second);
    let right = first.right_clip || second.right_clip;
    let left = first.left_clip || second.left_clip;
    let end = match (left, right) {
        (false, true) => End::Three,
        (true, false) => End::Five,
        _ => guess,
    };
    hypothesis(
        sides,
        first.break_at(end),
        second.break_at(end),
        svtype,
        JoinType::new(end, end),
    )
}

/// Classify the given item into a breakpoint hypothesis.
pub fn classify(item: &AlignmentItem) -> ClassifiedPair {
    let sides = orient(item);
    match Regime::of(item) {
        Regime::InterChromosomal => inter_chromosomal(&sides),
        Regime::BothPrimary => both_primary(&sides),
        Regime::SplitSameRead => split_same_read(&sides),
        Regime::SplitDifferentReads => split_different_reads(&sides, item.read_overlaps_mate),
    }
}

/// Translocation breakpoints are taken at the clipped end, or the alignment start if
/// unclipped, and always reported as precise.
fn inter_chromosomal(sides: &Oriented) -> ClassifiedPair {
    let side_break = |side: &Side| -> (i64, End) {
        if side.right_clip {
            (side.end, End::Three)
        } else if side.left_clip {
            (side.pos, End::Five)
        } else {
            (side.pos, side.strand)
        }
    };
    let (break_a, end_a) = side_break(&sides.first);
    let (break_b, end_b) = side_break(&sides.second);
    hypothesis(
        sides,
        (break_a, true),
        (break_b, true),
        SvType::Tra,
        JoinType::new(end_a, end_b),
    )
}

fn both_primary(sides: &Oriented) -> ClassifiedPair {
    match (sides.first.strand, sides.second.strand) {
        (End::Three, End::Five) => deletion_shaped(sides, SvType::Del),
        (End::Five, End::Three) => duplication_shaped(sides, SvType::Dup),
        (strand, _) => inversion_join(sides, SvType::Inv, strand),
    }
}

fn split_same_read(sides: &Oriented) -> ClassifiedPair {
    let (first, second) = (&sides.first, &sides.second);

    if first.strand != second.strand {
        // Alignments of a single read on opposite strands.
        let a_first_on_read = if sides.first_is_a {
            first.query_start <= second.query_start
        } else {
            second.query_start <= first.query_start
        };
        let guess = if a_first_on_read == sides.first_is_a {
            End::Three
        } else {
            End::Five
        };
        return inversion_join(sides, SvType::Inv, guess);
    }

    // Same strand: query coordinates share the reference orientation.
    if first.query_start > second.query_start {
        // The read visits the later reference segment first.
        return duplication_shaped(sides, SvType::Dup);
    }

    let ref_gap = second.pos - first.end;
    let query_gap = second.query_start - first.query_end;
    if ref_gap >= 0 {
        if ref_gap >= query_gap {
            deletion_shaped(sides, SvType::Del)
        } else {
            let mut call = deletion_shaped(sides, SvType::Ins);
            call.query_gap = Some(query_gap - ref_gap);
            call
        }
    } else {
        // Nested: both blocks overlap on the reference.
        let ref_dist = -ref_gap;
        let query_dist = query_gap.abs();
        let (dup_start, dup_end) = (second.start_break(), first.end_break());
        if ref_dist < query_dist {
            let mut call = hypothesis(
                sides,
                dup_start,
                dup_end,
                SvType::Ins,
                JoinType::THREE_TO_FIVE,
            );
            call.query_gap = Some(query_dist);
            call
        } else {
            hypothesis(
                sides,
                dup_start,
                dup_end,
                SvType::Dup,
                JoinType::FIVE_TO_THREE,
            )
        }
    }
}

fn split_different_reads(sides: &Oriented, read_overlaps_mate: bool) -> ClassifiedPair {
    let (first, second) = (&sides.first, &sides.second);
    match (first.strand, second.strand) {
        // Deletion-shaped evidence between mates is reported as an insertion: it
        // typically indicates an inserted or duplicated segment.
        (End::Three, End::Five) => deletion_shaped(sides, SvType::Ins),
        (End::Five, End::Three) => duplication_shaped(sides, SvType::Dup),
        (strand, _) => {
            let right = first.right_clip && second.right_clip;
            let left = first.left_clip && second.left_clip;
            if read_overlaps_mate && (right || left) {
                let end = if right { End::Three } else { End::Five };
                hypothesis(
                    sides,
                    first.break_at(end),
                    second.break_at(end),
                    SvType::InvDup,
                    JoinType::new(end, end),
                )
            } else {
                inversion_join(sides, SvType::Inv, strand)
            }
        }
    }
}
