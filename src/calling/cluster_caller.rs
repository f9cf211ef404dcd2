// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Calling of SVs from the edges and single partitions of a read graph.

use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use anyhow::Result;
use itertools::Itertools;
use rust_htslib::bam;

use crate::assembly::{reads_near, Assembler, Contig};
use crate::breakpoints::{classify, make_call, AlignmentItem, Breakpoints, ClassifiedPair};
use crate::calling::params::CallParams;
use crate::calling::partition::{PartitionData, PartitionEdge};
use crate::calling::read_buffer::{AlignmentSource, ReadBuffer};
use crate::calling::spanning::{majority_kind, SpanningAlignment};
use crate::calling::templates::{choose_pair, generic_insertion, group_templates, Template};
use crate::calling::ClusterCall;
use crate::evidence::aggregate;
use crate::utils::{is_primary, qname_hash};

/// Outcome of processing an edge.
#[derive(Debug)]
enum EdgeOutcome {
    /// One side of the edge yielded no reads.
    Skipped,
    Processed(Option<ClusterCall>),
}

/// Evidence collected for a cluster: hypotheses with the template they stem from, and
/// spanning alignments.
#[derive(Default)]
struct Observations {
    pairs: Vec<(ClassifiedPair, Template)>,
    spanning: Vec<SpanningAlignment>,
    /// Query name hashes of templates that only yielded single alignment insertions.
    inferred: HashSet<u64>,
}

fn find_spanning(template: &[Rc<bam::Record>], min_sv_size: u32) -> Option<SpanningAlignment> {
    template
        .iter()
        .filter(|rec| is_primary(rec))
        .find_map(|rec| SpanningAlignment::detect(rec, min_sv_size))
}

pub struct ClusterCaller<S: AlignmentSource> {
    params: CallParams,
    buffer: ReadBuffer<S>,
    assembler: Option<Box<dyn Assembler>>,
}

impl<S: AlignmentSource> ClusterCaller<S> {
    /// Create a caller reading alignments from the given source, caching up to
    /// `params.max_buffered_reads()` records.
    pub fn new(params: CallParams, source: S) -> Self {
        let buffer = ReadBuffer::new(source, params.max_buffered_reads());
        ClusterCaller {
            params,
            buffer,
            assembler: None,
        }
    }

    /// Assemble contigs around precise breakpoints of each call.
    pub fn with_assembler(mut self, assembler: Box<dyn Assembler>) -> Self {
        self.assembler = Some(assembler);
        self
    }

    /// Call SVs from all edges of the given partitions, then from all partitions that
    /// were not covered by an edge or look self-contained. Failures are isolated to the
    /// edge or partition they occur in.
    pub fn call(&mut self, partitions: &PartitionData) -> Vec<ClusterCall> {
        let mut calls = Vec::new();
        let mut processed = HashSet::new();

        let edges = partitions
            .s_between
            .iter()
            .sorted_by_key(|edge| (edge.u, edge.v))
            .collect_vec();
        for edge in edges {
            match self.call_edge(edge, partitions) {
                Ok(EdgeOutcome::Skipped) => {
                    debug!("Skipping edge {}-{}: no reads on one side.", edge.u, edge.v);
                }
                Ok(EdgeOutcome::Processed(call)) => {
                    processed.insert(edge.u);
                    processed.insert(edge.v);
                    calls.extend(call);
                }
                Err(e) => warn!("Failed to process edge {}-{}: {}", edge.u, edge.v, e),
            }
        }

        for &partition in partitions.parts.keys() {
            if processed.contains(&partition) && !self.is_self_contained(partition, partitions) {
                continue;
            }
            match self.call_partition(partition, partitions) {
                Ok(call) => calls.extend(call),
                Err(e) => warn!("Failed to process partition {}: {}", partition, e),
            }
        }

        info!("Called {} SVs.", calls.len());
        calls
    }

    fn is_self_contained(&self, partition: u64, partitions: &PartitionData) -> bool {
        let internal = partitions.internal_support(partition);
        internal > 2 * self.params.min_support()
            && internal > partitions.external_support(partition)
    }

    fn call_edge(
        &mut self,
        edge: &PartitionEdge,
        partitions: &PartitionData,
    ) -> Result<EdgeOutcome> {
        let reads_u = self.buffer.fetch_nodes(&edge.nodes_u, partitions)?;
        let reads_v = self.buffer.fetch_nodes(&edge.nodes_v, partitions)?;
        if reads_u.is_empty() || reads_v.is_empty() {
            return Ok(EdgeOutcome::Skipped);
        }

        let mut observations = Observations::default();
        for template in group_templates(reads_u.iter().chain(reads_v.iter())) {
            if let Some(spanning) = find_spanning(&template, self.params.min_sv_size()) {
                observations.spanning.push(spanning);
            } else if template.len() > 1 {
                if let Some((a, b)) = choose_pair(&template) {
                    let hypothesis = classify(&AlignmentItem::from_records(a, b));
                    observations.pairs.push((hypothesis, template.clone()));
                }
            }
        }

        let names_u: HashSet<&[u8]> = reads_u.iter().map(|rec| rec.qname()).collect();
        let names_v: HashSet<&[u8]> = reads_v.iter().map(|rec| rec.qname()).collect();
        let linked = |template: &[Rc<bam::Record>]| {
            template.first().map_or(false, |rec| {
                names_u.contains(rec.qname()) && names_v.contains(rec.qname())
            })
        };

        Ok(EdgeOutcome::Processed(self.finish(observations, linked, true)))
    }

    fn call_partition(
        &mut self,
        partition: u64,
        partitions: &PartitionData,
    ) -> Result<Option<ClusterCall>> {
        let nodes = match partitions.parts.get(&partition) {
            Some(nodes) => nodes,
            None => return Ok(None),
        };
        let reads = self.buffer.fetch_nodes(nodes, partitions)?;
        if reads.is_empty() {
            return Ok(None);
        }

        let mut observations = Observations::default();
        let mut unexplained = Vec::new();
        for template in group_templates(&reads) {
            if let Some(spanning) = find_spanning(&template, self.params.min_sv_size()) {
                observations.spanning.push(spanning);
            } else if template.len() > 1 {
                match choose_pair(&template) {
                    Some((a, b)) => {
                        let hypothesis = classify(&AlignmentItem::from_records(a, b));
                        observations.pairs.push((hypothesis, template.clone()));
                    }
                    None => unexplained.extend(template.iter().cloned()),
                }
            } else {
                unexplained.extend(template);
            }
        }

        if observations.spanning.is_empty()
            && observations.pairs.len() < self.params.min_support()
        {
            for read in unexplained {
                if let Some(hypothesis) = generic_insertion(&read, self.params.clip_length()) {
                    observations.inferred.insert(qname_hash(read.qname()));
                    observations.pairs.push((hypothesis, vec![read]));
                }
            }
        }

        Ok(self.finish(observations, |_| false, false))
    }

    /// Merge observations into a call, if supported well enough.
    fn finish(
        &self,
        observations: Observations,
        linked: impl Fn(&[Rc<bam::Record>]) -> bool,
        block_edge: bool,
    ) -> Option<ClusterCall> {
        let spanning = majority_kind(observations.spanning);
        let breakpoints = if spanning.is_empty() {
            let hypotheses = observations.pairs.iter().map(|(h, _)| h.clone()).collect_vec();
            make_call(&hypotheses, &self.params.insert_size())?
        } else {
            let hypotheses = spanning.iter().map(|s| s.hypothesis()).collect_vec();
            make_call(&hypotheses, &self.params.insert_size())?
        };

        // templates agreeing with the consensus
        let supporting = observations
            .pairs
            .iter()
            .filter(|(h, _)| {
                h.svtype == breakpoints.svtype()
                    && h.chrom_a == breakpoints.chrom_a()
                    && h.chrom_b == breakpoints.chrom_b()
            })
            .map(|(_, template)| template)
            .collect_vec();
        let is_linked = supporting.iter().any(|template| linked(template));

        let mut seen = BTreeSet::new();
        let reads = supporting
            .iter()
            .flat_map(|template| template.iter())
            .chain(spanning.iter().map(|s| &s.record))
            .filter(|rec| seen.insert(Rc::as_ptr(rec)))
            .map(|rec| &**rec)
            .collect_vec();

        let evidence = aggregate(&reads, spanning.len(), &observations.inferred, &self.params);
        if !evidence.is_sufficient(breakpoints.svtype(), &self.params) {
            debug!(
                "Dropping {} candidate at {}:{} with support {}.",
                breakpoints.svtype(),
                breakpoints.chrom_a(),
                breakpoints.pos_a(),
                evidence.weighted_support()
            );
            return None;
        }

        let contigs = self.assemble(&breakpoints, &reads);
        Some(ClusterCall::new(&breakpoints, evidence, contigs, is_linked, block_edge))
    }

    fn assemble(
        &self,
        breakpoints: &Breakpoints,
        reads: &[&bam::Record],
    ) -> (Option<Contig>, Option<Contig>) {
        let assembler = match &self.assembler {
            Some(assembler) => assembler,
            None => return (None, None),
        };
        let window = self.params.assembly_window();
        let side = |precise: bool, chrom: i32, pos: i64| {
            if precise {
                assembler.assemble(&reads_near(reads, chrom, pos, window), pos, window)
            } else {
                None
            }
        };
        (
            side(
                breakpoints.precise_a(),
                breakpoints.chrom_a(),
                breakpoints.pos_a(),
            ),
            side(
                breakpoints.precise_b(),
                breakpoints.chrom_b(),
                breakpoints.pos_b(),
            ),
        )
    }
}
