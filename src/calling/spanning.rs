// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Single alignments containing a whole SV as an interior insertion or deletion.

use std::rc::Rc;

use rust_htslib::bam;
use rust_htslib::bam::record::Cigar;

use crate::breakpoints::{ClassifiedPair, JoinType, SvType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanningKind {
    Ins,
    Del,
}

impl SpanningKind {
    pub fn svtype(self) -> SvType {
        match self {
            SpanningKind::Ins => SvType::Ins,
            SpanningKind::Del => SvType::Del,
        }
    }
}

/// An alignment spanning both breakpoints of an SV.
#[derive(Clone, Debug)]
pub struct SpanningAlignment {
    pub kind: SpanningKind,
    pub chrom: i32,
    /// Reference position of the event.
    pub start: i64,
    /// `start + 1` for insertions, `start + length` for deletions.
    pub end: i64,
    pub length: i64,
    pub record: Rc<bam::Record>,
}

impl SpanningAlignment {
    /// Find the largest interior insertion or deletion of at least `min_sv_size`.
    /// Operations at the first or last cigar position are never considered.
    pub fn detect(record: &Rc<bam::Record>, min_sv_size: u32) -> Option<Self> {
        let cigar = record.cigar();
        let n = cigar.len();
        let mut pos = record.pos();
        let mut best: Option<(SpanningKind, i64, u32)> = None;
        for (i, op) in cigar.iter().enumerate() {
            let interior = i > 0 && i + 1 < n;
            match op {
                Cigar::Ins(l) if interior && *l >= min_sv_size => {
                    if best.map_or(true, |(_, _, len)| *l > len) {
                        best = Some((SpanningKind::Ins, pos, *l));
                    }
                }
                Cigar::Del(l) if interior && *l >= min_sv_size => {
                    if best.map_or(true, |(_, _, len)| *l > len) {
                        best = Some((SpanningKind::Del, pos, *l));
                    }
                }
                _ => (),
            }
            if matches!(
                op,
                Cigar::Match(_)
                    | Cigar::Del(_)
                    | Cigar::RefSkip(_)
                    | Cigar::Equal(_)
                    | Cigar::Diff(_)
            ) {
                pos += op.len() as i64;
            }
        }

        best.map(|(kind, start, length)| {
            let length = length as i64;
            SpanningAlignment {
                kind,
                chrom: record.tid(),
                start,
                end: match kind {
                    SpanningKind::Ins => start + 1,
                    SpanningKind::Del => start + length,
                },
                length,
                record: Rc::clone(record),
            }
        })
    }

    /// Precise breakpoint hypothesis of the event.
    pub fn hypothesis(&self) -> ClassifiedPair {
        ClassifiedPair {
            chrom_a: self.chrom,
            chrom_b: self.chrom,
            break_a: self.start,
            break_b: self.end,
            precise_a: true,
            precise_b: true,
            svtype: self.kind.svtype(),
            join_type: JoinType::THREE_TO_FIVE,
            query_gap: match self.kind {
                SpanningKind::Ins => Some(self.length),
                SpanningKind::Del => None,
            },
        }
    }
}

/// Keep only spanning alignments of the most frequent kind. Ties keep the kind seen first.
pub fn majority_kind(spanning: Vec<SpanningAlignment>) -> Vec<SpanningAlignment> {
    let first = match spanning.first() {
        Some(s) => s.kind,
        None => return spanning,
    };
    let count = |kind| spanning.iter().filter(|s| s.kind == kind).count();
    let other = match first {
        SpanningKind::Ins => SpanningKind::Del,
        SpanningKind::Del => SpanningKind::Ins,
    };
    let kind = if count(other) > count(first) {
        other
    } else {
        first
    };
    spanning.into_iter().filter(|s| s.kind == kind).collect()
}
