// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::hash::Hasher;

use fnv::FnvHasher;
use rust_htslib::bam;
use rust_htslib::bam::record::{Aux, Cigar};

/// Hash of a query name, as recorded by the upstream read graph for each node.
/// This is the 64 bit FNV-1a hash of the raw name bytes, such that producers in any
/// language or build compute the same value.
pub fn qname_hash(qname: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(qname);
    hasher.finish()
}

pub(crate) fn is_primary(record: &bam::Record) -> bool {
    !record.is_secondary() && !record.is_supplementary()
}

/// Reference end position (exclusive) of the given record.
pub(crate) fn ref_end(record: &bam::Record) -> i64 {
    record.cigar().end_pos()
}

fn is_clip(op: &Cigar) -> bool {
    matches!(op, Cigar::SoftClip(_) | Cigar::HardClip(_))
}

/// Whether the first and the last cigar operation are a soft or hard clip.
pub(crate) fn clip_flags(cigar: &[Cigar]) -> (bool, bool) {
    (
        cigar.first().map_or(false, is_clip),
        cigar.last().map_or(false, is_clip),
    )
}

/// Total soft and hard clipped bases before the first aligned operation.
pub(crate) fn leading_clip_len(cigar: &[Cigar]) -> i64 {
    cigar
        .iter()
        .take_while(|op| is_clip(op))
        .map(|op| op.len() as i64)
        .sum()
}

/// Total soft and hard clipped bases after the last aligned operation.
pub(crate) fn trailing_clip_len(cigar: &[Cigar]) -> i64 {
    cigar
        .iter()
        .rev()
        .take_while(|op| is_clip(op))
        .map(|op| op.len() as i64)
        .sum()
}

/// Longest soft clip at either end of the alignment.
pub(crate) fn max_soft_clip(cigar: &[Cigar]) -> u32 {
    let soft = |op: Option<&Cigar>| match op {
        Some(Cigar::SoftClip(l)) => *l,
        _ => 0,
    };
    soft(cigar.first()).max(soft(cigar.last()))
}

fn consumes_query(op: &Cigar) -> bool {
    matches!(
        op,
        Cigar::Match(_) | Cigar::Ins(_) | Cigar::Equal(_) | Cigar::Diff(_) | Cigar::SoftClip(_)
    )
}

/// Start and end of the aligned block in query coordinates of the cigar orientation.
/// Hard clipped bases count toward the start, so that both alignments of a split
/// read are expressed relative to the full read.
pub(crate) fn query_span(cigar: &[Cigar]) -> (i64, i64) {
    let mut start = 0;
    let mut end = 0;
    let mut aligned = false;
    for op in cigar {
        if is_clip(op) {
            if aligned {
                break;
            }
            start += op.len() as i64;
            end = start;
        } else {
            aligned = true;
            if consumes_query(op) {
                end += op.len() as i64;
            }
        }
    }
    (start, end)
}

/// Full length of the read including hard clipped bases.
pub(crate) fn read_length(cigar: &[Cigar]) -> i64 {
    cigar
        .iter()
        .filter(|op| consumes_query(op) || matches!(op, Cigar::HardClip(_)))
        .map(|op| op.len() as i64)
        .sum()
}

/// Number of bases aligned to the reference (M, = and X operations).
pub(crate) fn aligned_len(cigar: &[Cigar]) -> i64 {
    cigar
        .iter()
        .filter(|op| matches!(op, Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_)))
        .map(|op| op.len() as i64)
        .sum()
}

pub(crate) fn aux_integer(record: &bam::Record, tag: &[u8]) -> Option<i64> {
    match record.aux(tag) {
        Ok(Aux::I8(v)) => Some(v as i64),
        Ok(Aux::U8(v)) => Some(v as i64),
        Ok(Aux::I16(v)) => Some(v as i64),
        Ok(Aux::U16(v)) => Some(v as i64),
        Ok(Aux::I32(v)) => Some(v as i64),
        Ok(Aux::U32(v)) => Some(v as i64),
        _ => None,
    }
}

pub(crate) fn aux_float(record: &bam::Record, tag: &[u8]) -> Option<f64> {
    match record.aux(tag) {
        Ok(Aux::Float(v)) => Some(v as f64),
        Ok(Aux::Double(v)) => Some(v),
        _ => aux_integer(record, tag).map(|v| v as f64),
    }
}

/// Number of entries in the SA (supplementary alignment) tag.
pub(crate) fn sa_entries(record: &bam::Record) -> Option<usize> {
    if let Ok(Aux::String(sa)) = record.aux(b"SA") {
        Some(sa.split_terminator(';').count())
    } else {
        None
    }
}

/// Arithmetic mean, zero for empty input.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use rust_htslib::bam;
    use rust_htslib::bam::record::{Aux, Cigar, CigarString};

    pub(crate) const PAIRED: u16 = 0x1;
    pub(crate) const PROPER_PAIR: u16 = 0x2;
    pub(crate) const MATE_UNMAPPED: u16 = 0x8;
    pub(crate) const REVERSE: u16 = 0x10;
    pub(crate) const MATE_REVERSE: u16 = 0x20;
    pub(crate) const FIRST_IN_PAIR: u16 = 0x40;
    pub(crate) const SECOND_IN_PAIR: u16 = 0x80;
    pub(crate) const SUPPLEMENTARY: u16 = 0x800;

    /// Build a record with a sequence matching the query length of the cigar.
    pub(crate) fn record(
        qname: &str,
        flags: u16,
        tid: i32,
        pos: i64,
        cigar: Vec<Cigar>,
    ) -> bam::Record {
        let cigar = CigarString(cigar);
        let qlen = cigar
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    Cigar::Match(_)
                        | Cigar::Ins(_)
                        | Cigar::SoftClip(_)
                        | Cigar::Equal(_)
                        | Cigar::Diff(_)
                )
            })
            .map(|op| op.len() as usize)
            .sum::<usize>();
        let seq = vec![b'A'; qlen];
        let qual = vec![30u8; qlen];
        let mut record = bam::Record::new();
        record.set(qname.as_bytes(), Some(&cigar), &seq, &qual);
        record.set_flags(flags);
        record.set_tid(tid);
        record.set_pos(pos);
        record.set_mapq(60);
        record.set_mtid(-1);
        record.set_mpos(-1);
        record
    }

    pub(crate) fn with_tag(mut record: bam::Record, tag: &[u8], value: Aux) -> bam::Record {
        record.push_aux(tag, value).unwrap();
        record
    }
}
