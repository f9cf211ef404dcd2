// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::mem;

use crate::annotation::RegionKind;
use crate::assembly::Contig;
use crate::breakpoints::{Breakpoints, JoinType, SvType};
use crate::evidence::Evidence;

pub mod cluster_caller;
pub mod params;
pub mod partition;
pub mod read_buffer;
pub mod spanning;
pub mod templates;

pub use cluster_caller::ClusterCaller;
pub use partition::{NodeInfo, PartitionData, PartitionEdge};
pub use read_buffer::{AlignmentSource, ReadBuffer};

/// A called structural variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterCall {
    pub svtype: SvType,
    pub join_type: JoinType,
    #[serde(rename = "chrA")]
    pub chr_a: i32,
    #[serde(rename = "chrB")]
    pub chr_b: i32,
    #[serde(rename = "posA")]
    pub pos_a: i64,
    #[serde(rename = "posB")]
    pub pos_b: i64,
    #[serde(rename = "cipos95A")]
    pub cipos95_a: i64,
    #[serde(rename = "cipos95B")]
    pub cipos95_b: i64,
    #[serde(rename = "preciseA")]
    pub precise_a: bool,
    #[serde(rename = "preciseB")]
    pub precise_b: bool,
    pub svlen: i64,
    #[serde(flatten)]
    pub evidence: Evidence,
    pub contig: Option<String>,
    pub contig2: Option<String>,
    pub ref_bases: usize,
    /// 1 if a supporting template has alignments in both partitions of the edge.
    pub linked: u8,
    /// 1 if called from an edge between partitions, 0 if called from a single partition.
    pub block_edge: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<RegionKind>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub raw_reads_10kb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub su: Option<usize>,
}

impl ClusterCall {
    pub(crate) fn new(
        breakpoints: &Breakpoints,
        evidence: Evidence,
        contigs: (Option<Contig>, Option<Contig>),
        linked: bool,
        block_edge: bool,
    ) -> Self {
        let ref_bases = contigs.0.iter().chain(contigs.1.iter()).map(|c| c.ref_bases).sum();
        ClusterCall {
            svtype: breakpoints.svtype(),
            join_type: breakpoints.join_type(),
            chr_a: breakpoints.chrom_a(),
            chr_b: breakpoints.chrom_b(),
            pos_a: breakpoints.pos_a(),
            pos_b: breakpoints.pos_b(),
            cipos95_a: breakpoints.cipos95_a(),
            cipos95_b: breakpoints.cipos95_b(),
            precise_a: breakpoints.precise_a(),
            precise_b: breakpoints.precise_b(),
            svlen: breakpoints.svlen(),
            evidence,
            contig: contigs.0.map(|c| c.seq),
            contig2: contigs.1.map(|c| c.seq),
            ref_bases,
            linked: linked as u8,
            block_edge: block_edge as u8,
            kind: None,
            raw_reads_10kb: None,
            su: None,
        }
    }

    /// Exchange breakpoint A and B, reversing the join type.
    pub fn swap_sides(&mut self) {
        mem::swap(&mut self.chr_a, &mut self.chr_b);
        mem::swap(&mut self.pos_a, &mut self.pos_b);
        mem::swap(&mut self.cipos95_a, &mut self.cipos95_b);
        mem::swap(&mut self.precise_a, &mut self.precise_b);
        mem::swap(&mut self.contig, &mut self.contig2);
        self.join_type = JoinType::new(self.join_type.b, self.join_type.a);
    }
}
