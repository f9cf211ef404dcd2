// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Query coordinates of the aligned blocks of a representative pair.

use rust_htslib::bam::record::Cigar;

use crate::utils::{query_span, read_length};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuerySpans {
    pub start_a: i64,
    pub end_a: i64,
    pub start_b: i64,
    pub end_b: i64,
}

/// Compute the query spans of both alignments.
///
/// If both alignments stem from the same physical read but lie on opposite strands,
/// the span of `b` is flipped into the orientation of `a`, such that gaps and overlaps
/// on the read can be compared directly.
pub fn query_spans(
    a_cigar: &[Cigar],
    a_reverse: bool,
    b_cigar: &[Cigar],
    b_reverse: bool,
    same_read: bool,
) -> QuerySpans {
    let (start_a, end_a) = query_span(a_cigar);
    let (mut start_b, mut end_b) = query_span(b_cigar);

    if same_read && a_reverse != b_reverse {
        let len = read_length(b_cigar);
        let (s, e) = (len - end_b, len - start_b);
        start_b = s;
        end_b = e;
    }

    QuerySpans {
        start_a,
        end_a,
        start_b,
        end_b,
    }
}
