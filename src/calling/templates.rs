// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Grouping of alignments by template and selection of informative alignment pairs.

use std::collections::HashMap;
use std::rc::Rc;

use rust_htslib::bam;

use crate::breakpoints::{ClassifiedPair, JoinType, SvType};
use crate::utils::{is_primary, leading_clip_len, ref_end, trailing_clip_len};

pub type Template = Vec<Rc<bam::Record>>;

/// Group alignments by query name, in order of first appearance. Alignments occurring
/// more than once (e.g. fetched for both sides of an edge) are kept once.
pub fn group_templates<'a>(reads: impl IntoIterator<Item = &'a Rc<bam::Record>>) -> Vec<Template> {
    let mut index: HashMap<&[u8], usize> = HashMap::new();
    let mut templates: Vec<Template> = Vec::new();
    for read in reads {
        match index.get(read.qname()) {
            Some(&i) => {
                let template = &mut templates[i];
                let known = template.iter().any(|other| {
                    other.flags() == read.flags()
                        && other.tid() == read.tid()
                        && other.pos() == read.pos()
                });
                if !known {
                    template.push(Rc::clone(read));
                }
            }
            None => {
                index.insert(read.qname(), templates.len());
                templates.push(vec![Rc::clone(read)]);
            }
        }
    }
    templates
}

/// Choose the representative alignment pair of a template: a primary and a supplementary
/// alignment of the same read, or otherwise the two primary alignments of a pair that
/// is not properly aligned.
pub fn choose_pair(template: &[Rc<bam::Record>]) -> Option<(&bam::Record, &bam::Record)> {
    let usable = |rec: &&Rc<bam::Record>| !rec.is_duplicate() && !rec.is_unmapped();
    let primaries: Vec<&bam::Record> = template
        .iter()
        .filter(usable)
        .filter(|rec| is_primary(rec))
        .map(|rec| &**rec)
        .collect();
    let supplementaries: Vec<&bam::Record> = template
        .iter()
        .filter(usable)
        .filter(|rec| rec.is_supplementary())
        .map(|rec| &**rec)
        .collect();

    for primary in &primaries {
        if let Some(supp) = supplementaries
            .iter()
            .find(|supp| supp.is_first_in_template() == primary.is_first_in_template())
        {
            return Some((*primary, *supp));
        }
    }
    if primaries.len() >= 2 && !primaries[0].is_proper_pair() {
        return Some((primaries[0], primaries[1]));
    }
    None
}

/// Insertion hypothesis from a single alignment. Clipped alignments are placed at the
/// clipped end, precisely. Otherwise, the direction of an unmapped or discordant mate is
/// used: forward alignments point to their end, reverse ones to their start.
pub fn generic_insertion(record: &bam::Record, clip_length: u32) -> Option<ClassifiedPair> {
    let cigar = record.cigar();
    let (pos, precise) = if leading_clip_len(&cigar) >= clip_length as i64 {
        (record.pos(), true)
    } else if trailing_clip_len(&cigar) >= clip_length as i64 {
        (ref_end(record), true)
    } else if record.is_paired() && (record.is_mate_unmapped() || !record.is_proper_pair()) {
        if record.is_reverse() {
            (record.pos(), false)
        } else {
            (ref_end(record), false)
        }
    } else {
        return None;
    };

    Some(ClassifiedPair {
        chrom_a: record.tid(),
        chrom_b: record.tid(),
        break_a: pos,
        break_b: pos + 1,
        precise_a: precise,
        precise_b: false,
        svtype: SvType::Ins,
        join_type: JoinType::THREE_TO_FIVE,
        query_gap: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::*;
    use rust_htslib::bam::record::Cigar::*;

    fn rc(rec: bam::Record) -> Rc<bam::Record> {
        Rc::new(rec)
    }

    #[test]
    fn test_group_templates() {
        let a = rc(record("t1", PAIRED | FIRST_IN_PAIR, 0, 100, vec![Match(50)]));
        let b = rc(record("t2", PAIRED | FIRST_IN_PAIR, 0, 300, vec![Match(50)]));
        let c = rc(record("t1", PAIRED | SECOND_IN_PAIR, 0, 900, vec![Match(50)]));
        let reads = vec![a.clone(), b, c, a];
        let templates = group_templates(&reads);
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].len(), 2);
        assert_eq!(templates[0][0].qname(), b"t1");
        assert_eq!(templates[1][0].qname(), b"t2");
    }

    #[test]
    fn test_prefers_split_of_same_read() {
        let template = vec![
            rc(record(
                "t",
                PAIRED | FIRST_IN_PAIR,
                0,
                1000,
                vec![Match(60), SoftClip(40)],
            )),
            rc(record(
                "t",
                PAIRED | SECOND_IN_PAIR | REVERSE,
                0,
                1300,
                vec![Match(100)],
            )),
            rc(record(
                "t",
                PAIRED | FIRST_IN_PAIR | SUPPLEMENTARY,
                0,
                5000,
                vec![HardClip(60), Match(40)],
            )),
        ];
        let (a, b) = choose_pair(&template).unwrap();
        assert_eq!(a.pos(), 1000);
        assert_eq!(b.pos(), 5000);
    }

    #[test]
    fn test_discordant_primaries() {
        let template = vec![
            rc(record("t", PAIRED | FIRST_IN_PAIR, 0, 1000, vec![Match(100)])),
            rc(record(
                "t",
                PAIRED | SECOND_IN_PAIR | REVERSE,
                0,
                4000,
                vec![Match(100)],
            )),
        ];
        let (a, b) = choose_pair(&template).unwrap();
        assert_eq!((a.pos(), b.pos()), (1000, 4000));
    }

    #[test]
    fn test_proper_pair_is_uninformative() {
        let template = vec![
            rc(record(
                "t",
                PAIRED | PROPER_PAIR | FIRST_IN_PAIR,
                0,
                1000,
                vec![Match(100)],
            )),
            rc(record(
                "t",
                PAIRED | PROPER_PAIR | SECOND_IN_PAIR | REVERSE,
                0,
                1200,
                vec![Match(100)],
            )),
        ];
        assert!(choose_pair(&template).is_none());
        assert!(choose_pair(&template[..1]).is_none());
    }

    #[test]
    fn test_generic_insertion() {
        let left = record(
            "t",
            PAIRED | PROPER_PAIR,
            0,
            1000,
            vec![SoftClip(20), Match(80)],
        );
        let hyp = generic_insertion(&left, 15).unwrap();
        assert_eq!((hyp.break_a, hyp.precise_a), (1000, true));

        let right = record(
            "t",
            PAIRED | PROPER_PAIR,
            0,
            1000,
            vec![Match(80), SoftClip(20)],
        );
        assert_eq!(generic_insertion(&right, 15).unwrap().break_a, 1080);

        let mate_unmapped = record("t", PAIRED | MATE_UNMAPPED | REVERSE, 0, 1000, vec![Match(100)]);
        let hyp = generic_insertion(&mate_unmapped, 15).unwrap();
        assert_eq!((hyp.break_a, hyp.precise_a), (1000, false));

        let concordant = record("t", PAIRED | PROPER_PAIR, 0, 1000, vec![Match(100)]);
        assert!(generic_insertion(&concordant, 15).is_none());
    }
}
