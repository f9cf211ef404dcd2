// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Resolution of the active clip site of both alignments of a representative pair.

use rust_htslib::bam;
use rust_htslib::bam::record::Cigar;

use crate::utils::{clip_flags, leading_clip_len, trailing_clip_len};

/// Left and right clip presence of the two alignments after resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipSites {
    pub left_a: bool,
    pub right_a: bool,
    pub left_b: bool,
    pub right_b: bool,
}

struct Clipped<'a> {
    cigar: &'a [Cigar],
    is_reverse: bool,
    left: bool,
    right: bool,
}

impl<'a> Clipped<'a> {
    fn new(cigar: &'a [Cigar], is_reverse: bool) -> Self {
        let (left, right) = clip_flags(cigar);
        Clipped {
            cigar,
            is_reverse,
            left,
            right,
        }
    }

    fn both(&self) -> bool {
        self.left && self.right
    }

    /// Clipped bases before the first aligned base, in forward read coordinates.
    fn template_start(&self) -> i64 {
        if self.is_reverse {
            trailing_clip_len(self.cigar)
        } else {
            leading_clip_len(self.cigar)
        }
    }

    /// Keep only the clip following the aligned block in read orientation.
    fn keep_read_trailing(&mut self) {
        if self.is_reverse {
            self.right = false;
        } else {
            self.left = false;
        }
    }

    /// Keep only the clip preceding the aligned block in read orientation.
    fn keep_read_leading(&mut self) {
        if self.is_reverse {
            self.left = false;
        } else {
            self.right = false;
        }
    }

    fn keep_longer(&mut self) {
        if leading_clip_len(self.cigar) >= trailing_clip_len(self.cigar) {
            self.right = false;
        } else {
            self.left = false;
        }
    }
}

/// Decide the active clip sites of alignments `a` and `b`.
///
/// Alignments clipped at a single end keep that clip. An alignment clipped at both ends
/// is resolved to one side: for two alignments of the same read, the alignment whose
/// aligned block starts first on the read keeps the clip following its block, while the
/// other keeps the clip preceding its block. For alignments of different reads, the
/// longer clip is kept.
pub fn resolve(
    a_cigar: &[Cigar],
    a_flags: u16,
    b_cigar: &[Cigar],
    b_flags: u16,
) -> ClipSites {
    let mut a = Clipped::new(a_cigar, a_flags & 0x10 != 0);
    let mut b = Clipped::new(b_cigar, b_flags & 0x10 != 0);

    if a.both() || b.both() {
        let same_read = a_flags & 0x40 == b_flags & 0x40;
        if same_read {
            let a_first = a.template_start() <= b.template_start();
            let (first, second) = if a_first {
                (&mut a, &mut b)
            } else {
                (&mut b, &mut a)
            };
            if first.both() {
                first.keep_read_trailing();
            }
            if second.both() {
                second.keep_read_leading();
            }
        } else {
            if a.both() {
                a.keep_longer();
            }
            if b.both() {
                b.keep_longer();
            }
        }
    }

    ClipSites {
        left_a: a.left,
        right_a: a.right,
        left_b: b.left,
        right_b: b.right,
    }
}

/// Resolve the clip sites of two records.
pub fn resolve_records(a: &bam::Record, b: &bam::Record) -> ClipSites {
    resolve(&a.cigar(), a.flags(), &b.cigar(), b.flags())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam::record::Cigar::*;

    #[test]
    fn test_single_clips_are_kept() {
        let sites = resolve(&[Match(80), SoftClip(20)], 0x40, &[SoftClip(80), Match(20)], 0x840);
        assert_eq!(
            sites,
            ClipSites {
                left_a: false,
                right_a: true,
                left_b: true,
                right_b: false,
            }
        );
    }

    #[test]
    fn test_same_read_forward() {
        // a covers read bases 10..60, b covers 60..100 (both forward)
        let a = [SoftClip(10), Match(50), SoftClip(40)];
        let b = [HardClip(60), Match(40)];
        let sites = resolve(&a, 0x40, &b, 0x840);
        assert!(!sites.left_a && sites.right_a);
        assert!(sites.left_b && !sites.right_b);
    }

    #[test]
    fn test_same_read_later_alignment_keeps_leading_clip() {
        // a starts at read base 60, b at read base 0
        let a = [SoftClip(60), Match(30), SoftClip(10)];
        let b = [Match(60), HardClip(40)];
        let sites = resolve(&a, 0x40, &b, 0x840);
        assert!(sites.left_a && !sites.right_a);
        assert!(!sites.left_b && sites.right_b);
    }

    #[test]
    fn test_same_read_reverse_strand() {
        // reverse alignment: the trailing clip precedes the block on the read
        let a = [SoftClip(50), Match(40), SoftClip(10)];
        let b = [Match(50), HardClip(50)];
        let sites = resolve(&a, 0x50, &b, 0x840);
        // a starts at read base 10 in forward coordinates, b at 0, so a is second
        // and keeps the clip preceding its block in read orientation (right)
        assert!(!sites.left_a && sites.right_a);
    }

    #[test]
    fn test_different_reads_keep_longer_clip() {
        let a = [SoftClip(5), Match(70), SoftClip(25)];
        let b = [SoftClip(30), Match(60), SoftClip(10)];
        let sites = resolve(&a, 0x40, &b, 0x80);
        assert!(!sites.left_a && sites.right_a);
        assert!(sites.left_b && !sites.right_b);
    }

    #[test]
    fn test_never_both_sides() {
        let cigars: Vec<Vec<Cigar>> = vec![
            vec![Match(100)],
            vec![SoftClip(10), Match(90)],
            vec![Match(90), SoftClip(10)],
            vec![SoftClip(10), Match(80), SoftClip(10)],
            vec![HardClip(20), Match(60), SoftClip(20)],
            vec![SoftClip(30), Match(60), HardClip(10)],
        ];
        for a in &cigars {
            for b in &cigars {
                for &a_flags in &[0x40u16, 0x50, 0x80, 0x90] {
                    for &b_flags in &[0x40u16, 0x850, 0x80, 0x890] {
                        let sites = resolve(a, a_flags, b, b_flags);
                        assert!(!(sites.left_a && sites.right_a));
                        assert!(!(sites.left_b && sites.right_b));
                    }
                }
            }
        }
    }
}
