// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Regional annotation of calls: breakpoint ordering, region kind, support and depth.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use bio::data_structures::interval_tree::ArrayBackedIntervalTree;
use bio::io::bed;
use rust_htslib::bam;

use crate::calling::ClusterCall;

/// svlen reported for calls between different chromosomes.
pub const INTER_CHROMOSOMAL_SVLEN: i64 = 1_000_000;
/// Window on each side of a breakpoint used for the raw read depth.
pub const DEPTH_FLANK: i64 = 5_000;

/// Relation of a call's breakpoints to a set of regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionKind {
    /// No breakpoint inside a region.
    ExtraRegional,
    /// Exactly one breakpoint inside a region.
    HemiRegional,
    /// Both breakpoints inside the same region.
    IntraRegional,
    /// Both breakpoints inside different regions.
    InterRegional,
}

pub trait RegionIndex {
    fn intersects(&self, chrom: i32, start: i64, end: i64) -> bool;

    /// Label of the region containing the position, if any.
    fn overlap_label(&self, chrom: i32, pos: i64) -> Option<usize>;
}

pub trait DepthIndex {
    /// Mean read depth in the given interval.
    fn coverage(&self, tid: i32, start: i64, end: i64) -> f64;
}

/// Regions of a BED file, labelled by their row index.
pub struct BedRegions {
    trees: HashMap<i32, ArrayBackedIntervalTree<i64, usize>>,
}

impl BedRegions {
    pub fn from_path(path: impl AsRef<Path>, header: &bam::HeaderView) -> Result<Self> {
        let path = path.as_ref();
        let reader = bed::Reader::from_file(path)
            .with_context(|| format!("failed to open BED file {}", path.display()))?;
        Self::from_reader(reader, |contig| header.tid(contig.as_bytes()))
    }

    /// Read regions, mapping contig names to reference ids. Regions on contigs without
    /// reference id are skipped.
    pub fn from_reader<R: io::Read>(
        mut reader: bed::Reader<R>,
        tid: impl Fn(&str) -> Option<u32>,
    ) -> Result<Self> {
        let mut trees: HashMap<i32, ArrayBackedIntervalTree<i64, usize>> = HashMap::new();
        for (label, record) in reader.records().enumerate() {
            let record = record.context("failed to read BED record")?;
            match tid(record.chrom()) {
                Some(tid) => trees
                    .entry(tid as i32)
                    .or_insert_with(ArrayBackedIntervalTree::new)
                    .insert(record.start() as i64..record.end() as i64, label),
                None => warn!(
                    "Skipping region {}:{}-{}: contig not found in alignment header.",
                    record.chrom(),
                    record.start(),
                    record.end()
                ),
            }
        }
        for tree in trees.values_mut() {
            tree.index();
        }
        Ok(BedRegions { trees })
    }
}

impl RegionIndex for BedRegions {
    fn intersects(&self, chrom: i32, start: i64, end: i64) -> bool {
        self.trees
            .get(&chrom)
            .map_or(false, |tree| !tree.find(start..end.max(start + 1)).is_empty())
    }

    fn overlap_label(&self, chrom: i32, pos: i64) -> Option<usize> {
        self.trees.get(&chrom).and_then(|tree| {
            tree.find(pos..pos + 1)
                .iter()
                .map(|entry| *entry.data())
                .min()
        })
    }
}

fn region_kind(call: &ClusterCall, regions: &dyn RegionIndex) -> RegionKind {
    let label_a = regions.overlap_label(call.chr_a, call.pos_a);
    let label_b = regions.overlap_label(call.chr_b, call.pos_b);
    match (label_a, label_b) {
        (None, None) => RegionKind::ExtraRegional,
        (Some(_), None) | (None, Some(_)) => RegionKind::HemiRegional,
        (Some(a), Some(b)) if a == b && call.chr_a == call.chr_b => RegionKind::IntraRegional,
        _ => RegionKind::InterRegional,
    }
}

/// Annotate a call with its region kind, read support and local depth. Breakpoints are
/// ordered such that side A comes first on the genome.
pub fn annotate(
    call: &mut ClusterCall,
    regions: Option<&dyn RegionIndex>,
    depth: Option<&dyn DepthIndex>,
) {
    if (call.chr_a, call.pos_a) > (call.chr_b, call.pos_b) {
        call.swap_sides();
    }

    call.kind = Some(regions.map_or(RegionKind::ExtraRegional, |regions| {
        region_kind(call, regions)
    }));
    call.su = Some(call.evidence.weighted_support());
    if call.chr_a != call.chr_b {
        call.svlen = INTER_CHROMOSOMAL_SVLEN;
    }
    call.raw_reads_10kb = Some(depth.map_or(0.0, |depth| {
        let flank =
            |tid, pos: i64| depth.coverage(tid, (pos - DEPTH_FLANK).max(0), pos + DEPTH_FLANK);
        flank(call.chr_a, call.pos_a).max(flank(call.chr_b, call.pos_b))
    }));
}
