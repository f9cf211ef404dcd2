// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Aggregation of the reads supporting a call into summary statistics.

use std::collections::HashSet;

use itertools::Itertools;
use rust_htslib::bam;
use rust_htslib::bam::record::Cigar;

use crate::breakpoints::SvType;
use crate::calling::params::CallParams;
use crate::utils::{aligned_len, aux_float, aux_integer, is_primary, max_soft_clip, mean, qname_hash, sa_entries};

/// Read support of a call. Rates are scaled by 100.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Templates with two primary alignments.
    pub pe: usize,
    /// Supplementary alignments.
    pub supp: usize,
    /// Alignments with a soft clip of at least the minimum clip length.
    pub sc: usize,
    /// Alignments containing the whole event in a single cigar.
    pub spanning: usize,
    #[serde(rename = "NP")]
    pub np: usize,
    pub plus: usize,
    pub minus: usize,
    pub n_sa: f64,
    #[serde(rename = "NMpri")]
    pub nm_pri: f64,
    #[serde(rename = "NMsupp")]
    pub nm_supp: f64,
    #[serde(rename = "MAPQpri")]
    pub mapq_pri: f64,
    #[serde(rename = "MAPQsupp")]
    pub mapq_supp: f64,
    #[serde(rename = "DN", skip_serializing_if = "Option::is_none", default)]
    pub dn: Option<f64>,
    #[serde(rename = "DP", skip_serializing_if = "Option::is_none", default)]
    pub dp: Option<f64>,
    #[serde(rename = "maxASsupp", skip_serializing_if = "Option::is_none", default)]
    pub max_as_supp: Option<f64>,
    #[serde(rename = "NMbase", skip_serializing_if = "Option::is_none", default)]
    pub nm_base: Option<f64>,
}

impl Evidence {
    /// Weighted support of pairs and split reads. A spanning alignment covers both
    /// breakpoints and counts twice.
    pub fn weighted_support(&self) -> usize {
        self.pe + self.supp + 2 * self.spanning
    }

    /// Whether the evidence suffices for a call of the given type. Insertions are often
    /// supported mostly by clipped reads and pass with enough clipping support as long as
    /// some split or spanning evidence exists.
    pub fn is_sufficient(&self, svtype: SvType, params: &CallParams) -> bool {
        if self.weighted_support() >= params.min_support() {
            return true;
        }
        svtype == SvType::Ins
            && self.supp + self.spanning > params.ins_min_split_support()
            && self.supp + self.sc + self.spanning > params.min_support()
    }
}

/// Mismatches per aligned base, scaled by 100.
fn mismatch_rate(record: &bam::Record) -> Option<f64> {
    let nm = aux_integer(record, b"NM")?;
    let aligned = aligned_len(&record.cigar());
    if aligned == 0 {
        None
    } else {
        Some(nm as f64 / aligned as f64 * 100.0)
    }
}

/// Bases in small indels per aligned base, scaled by 100.
fn gap_fraction(record: &bam::Record, min_sv_size: u32) -> f64 {
    let cigar = record.cigar();
    let aligned = aligned_len(&cigar);
    if aligned == 0 {
        return 0.0;
    }
    let gaps: u32 = cigar
        .iter()
        .filter_map(|op| match op {
            Cigar::Ins(l) | Cigar::Del(l) if *l < min_sv_size => Some(*l),
            _ => None,
        })
        .sum();
    gaps as f64 / aligned as f64 * 100.0
}

/// Accumulate the evidence of the given reads.
///
/// Reads are deduplicated by identity, such that an alignment contributing to both
/// sides of an edge is counted once. `spanning` is the number of spanning alignments
/// among the reads. Templates in `inferred` (query name hashes) only contribute single
/// alignment insertion evidence and are not counted as pairs.
pub fn aggregate(
    reads: &[&bam::Record],
    spanning: usize,
    inferred: &HashSet<u64>,
    params: &CallParams,
) -> Evidence {
    let mut evidence = Evidence {
        spanning,
        ..Default::default()
    };

    let mut seen = HashSet::new();
    let reads = reads
        .iter()
        .filter(|rec| {
            seen.insert((
                qname_hash(rec.qname()),
                rec.flags(),
                rec.tid(),
                rec.pos(),
            ))
        })
        .collect_vec();

    let (mut n_sa, mut nm_pri, mut nm_supp, mut mapq_pri, mut mapq_supp) =
        (Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());
    let (mut dn, mut dp, mut scores, mut gaps) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());

    for (hash, template) in &reads
        .iter()
        .sorted_by_key(|rec| qname_hash(rec.qname()))
        .group_by(|rec| qname_hash(rec.qname()))
    {
        let template = template.collect_vec();
        let primaries = template.iter().filter(|rec| is_primary(rec)).count();
        if primaries >= 2 && !inferred.contains(&hash) {
            evidence.pe += 1;
        }
        if params.extended_tags() {
            // once per template
            if let Some(v) = template.iter().find_map(|rec| aux_float(rec, b"DN")) {
                dn.push(v);
            }
            if let Some(v) = template.iter().find_map(|rec| aux_float(rec, b"DP")) {
                dp.push(v);
            }
        }
    }

    for rec in reads {
        if rec.is_supplementary() {
            evidence.supp += 1;
            nm_supp.extend(mismatch_rate(rec));
            mapq_supp.push(rec.mapq() as f64);
            if params.extended_tags() {
                scores.extend(aux_float(rec, b"AS"));
            }
        } else {
            nm_pri.extend(mismatch_rate(rec));
            mapq_pri.push(rec.mapq() as f64);
        }
        if max_soft_clip(&rec.cigar()) >= params.clip_length() {
            evidence.sc += 1;
        }
        if rec.is_proper_pair() {
            evidence.np += 1;
        }
        if rec.is_reverse() {
            evidence.minus += 1;
        } else {
            evidence.plus += 1;
        }
        if let Some(entries) = sa_entries(rec) {
            n_sa.push(entries as f64);
        }
        if params.extended_tags() {
            gaps.push(gap_fraction(rec, params.min_sv_size()));
        }
    }

    evidence.n_sa = mean(&n_sa);
    evidence.nm_pri = mean(&nm_pri);
    evidence.nm_supp = mean(&nm_supp);
    evidence.mapq_pri = mean(&mapq_pri);
    evidence.mapq_supp = mean(&mapq_supp);
    if params.extended_tags() {
        evidence.dn = Some(mean(&dn));
        evidence.dp = Some(mean(&dp));
        evidence.max_as_supp = Some(scores.into_iter().fold(0.0, f64::max));
        evidence.nm_base = Some(mean(&gaps));
    }
    evidence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::*;
    use rust_htslib::bam::record::Aux;
    use rust_htslib::bam::record::Cigar::*;

    fn split_read(name: &str) -> Vec<bam::Record> {
        vec![
            with_tag(
                with_tag(
                    record(
                        name,
                        PAIRED | FIRST_IN_PAIR,
                        0,
                        1000,
                        vec![Match(80), SoftClip(20)],
                    ),
                    b"NM",
                    Aux::U8(2),
                ),
                b"SA",
                Aux::String("chr1,1581,+,80H20M,60,0;"),
            ),
            with_tag(
                with_tag(
                    record(
                        name,
                        PAIRED | FIRST_IN_PAIR | SUPPLEMENTARY,
                        0,
                        1580,
                        vec![HardClip(80), Match(20)],
                    ),
                    b"NM",
                    Aux::U8(0),
                ),
                b"AS",
                Aux::U8(20),
            ),
            record(
                name,
                PAIRED | SECOND_IN_PAIR | REVERSE,
                0,
                1700,
                vec![Match(100)],
            ),
        ]
    }

    #[test]
    fn test_basic_counts() {
        let reads = split_read("t1");
        let refs = reads.iter().collect_vec();
        let evidence = aggregate(&refs, 0, &HashSet::new(), &CallParams::default());
        assert_eq!(evidence.pe, 1);
        assert_eq!(evidence.supp, 1);
        assert_eq!(evidence.sc, 1);
        assert_eq!((evidence.plus, evidence.minus), (2, 1));
        assert_relative_eq!(evidence.n_sa, 1.0);
        assert_relative_eq!(evidence.nm_pri, 2.5);
        assert_relative_eq!(evidence.nm_supp, 0.0);
        assert_relative_eq!(evidence.mapq_supp, 60.0);
        assert!(evidence.dn.is_none());
    }

    #[test]
    fn test_duplicate_reads_counted_once() {
        let reads = split_read("t1");
        let refs = reads.iter().chain(reads.iter()).collect_vec();
        let evidence = aggregate(&refs, 0, &HashSet::new(), &CallParams::default());
        assert_eq!(evidence.supp, 1);
        assert_eq!(evidence.pe, 1);
    }

    #[test]
    fn test_inferred_insertion_templates_are_no_pairs() {
        let reads = split_read("t1");
        let refs = reads.iter().collect_vec();
        let inferred: HashSet<u64> = [qname_hash(b"t1")].iter().cloned().collect();
        let evidence = aggregate(&refs, 0, &inferred, &CallParams::default());
        assert_eq!(evidence.pe, 0);
        assert_eq!(evidence.supp, 1);
        assert_eq!(evidence.sc, 1);
    }

    #[test]
    fn test_extended_tags() {
        let mut reads = split_read("t1");
        reads[0] = with_tag(reads[0].clone(), b"DN", Aux::Float(0.5));
        reads[2] = with_tag(reads[2].clone(), b"DN", Aux::Float(0.9));
        let refs = reads.iter().collect_vec();
        let params = CallParams::builder().extended_tags(true).build();
        let evidence = aggregate(&refs, 0, &HashSet::new(), &params);
        // one value per template
        assert_relative_eq!(evidence.dn.unwrap(), 0.5);
        assert_relative_eq!(evidence.dp.unwrap(), 0.0);
        assert_relative_eq!(evidence.max_as_supp.unwrap(), 20.0);
        assert_relative_eq!(evidence.nm_base.unwrap(), 0.0);
    }

    #[test]
    fn test_empty_reduces_to_zero() {
        let evidence = aggregate(&[], 2, &HashSet::new(), &CallParams::default());
        assert_eq!(evidence.spanning, 2);
        assert_relative_eq!(evidence.nm_pri, 0.0);
        assert_eq!(evidence.weighted_support(), 4);
    }

    #[test]
    fn test_threshold() {
        let params = CallParams::default();
        let below = Evidence {
            pe: 1,
            supp: 1,
            ..Default::default()
        };
        assert!(!below.is_sufficient(SvType::Del, &params));
        let spanning = Evidence {
            pe: 1,
            spanning: 1,
            ..Default::default()
        };
        assert!(spanning.is_sufficient(SvType::Del, &params));
    }

    #[test]
    fn test_insertion_clip_exception() {
        let params = CallParams::default();
        let clipped = Evidence {
            supp: 1,
            sc: 3,
            ..Default::default()
        };
        assert!(!clipped.is_sufficient(SvType::Del, &params));
        assert!(clipped.is_sufficient(SvType::Ins, &params));
        let no_split = Evidence {
            sc: 10,
            ..Default::default()
        };
        assert!(!no_split.is_sufficient(SvType::Ins, &params));
        let borderline = Evidence {
            supp: 1,
            sc: 2,
            ..Default::default()
        };
        assert!(!borderline.is_sufficient(SvType::Ins, &params));
    }
}
