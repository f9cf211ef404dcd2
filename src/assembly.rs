// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use rust_htslib::bam;

/// Contig assembled from the reads around a breakpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Contig {
    pub seq: String,
    /// Number of reads soft clipped at the left end of the contig.
    pub left_clips: usize,
    /// Number of reads soft clipped at the right end of the contig.
    pub right_clips: usize,
    /// Reference bases covered by the contig.
    pub ref_bases: usize,
}

/// Local assembly of the reads supporting a breakpoint.
pub trait Assembler {
    /// Assemble the given reads around `anchor`, considering reads within `window`.
    fn assemble(&self, reads: &[&bam::Record], anchor: i64, window: i64) -> Option<Contig>;
}

/// Reads aligned within `window` of `anchor`.
pub(crate) fn reads_near<'a>(
    reads: &[&'a bam::Record],
    chrom: i32,
    anchor: i64,
    window: i64,
) -> Vec<&'a bam::Record> {
    reads
        .iter()
        .filter(|rec| {
            rec.tid() == chrom
                && rec.pos() <= anchor + window
                && rec.cigar().end_pos() >= anchor - window
        })
        .copied()
        .collect()
}
