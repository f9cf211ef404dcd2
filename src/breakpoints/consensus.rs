// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Consensus of many breakpoint hypotheses into a single pair of coordinates.
//!
//! Each observation opens an interval at its position, extending by the insert size
//! derived search limit into the direction where the true breakpoint is expected.
//! Precise observations only cover their own position. The breakpoint is placed where
//! most intervals overlap.

use itertools::Itertools;
use linear_map::LinearMap;
use statrs::statistics::{Data, Median, OrderStatistics};

use crate::breakpoints::{ClassifiedPair, JoinType, SvType};
use crate::estimation::insert_size::InsertSize;
use crate::utils::mean;

/// Consensus breakpoints of a cluster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Breakpoints {
    svtype: SvType,
    join_type: JoinType,
    chrom_a: i32,
    chrom_b: i32,
    pos_a: i64,
    pos_b: i64,
    cipos95_a: i64,
    cipos95_b: i64,
    precise_a: bool,
    precise_b: bool,
    svlen: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Event {
    pos: i64,
    delta: i64,
    precise: bool,
}

impl Event {
    fn key(&self) -> (i64, i64, bool) {
        (self.pos, self.delta, self.precise)
    }
}

/// Signed search limits for side A and B.
fn limits(svtype: SvType, join_type: JoinType, magnitude: i64) -> (i64, i64) {
    if svtype == SvType::Del || join_type == JoinType::THREE_TO_FIVE {
        (magnitude, -magnitude)
    } else if svtype == SvType::Dup || join_type == JoinType::FIVE_TO_THREE {
        (-magnitude, magnitude)
    } else if join_type == JoinType::THREE_TO_THREE {
        (magnitude, magnitude)
    } else if join_type == JoinType::FIVE_TO_FIVE {
        (-magnitude, -magnitude)
    } else {
        (magnitude, -magnitude)
    }
}

/// Sweep over the observation intervals of one side and return the position of
/// maximal overlap together with its precision.
pub(crate) fn break_ops(positions: &[i64], precise: &[i64], limit: i64) -> Option<(i64, bool)> {
    if positions.is_empty() && precise.is_empty() {
        return None;
    }
    let mut events = Vec::with_capacity(2 * (positions.len() + precise.len()));
    for &pos in positions {
        events.push(Event {
            pos,
            delta: 1,
            precise: false,
        });
        events.push(Event {
            pos: pos + limit,
            delta: -1,
            precise: false,
        });
    }
    for &pos in precise {
        events.push(Event {
            pos,
            delta: 1,
            precise: true,
        });
        events.push(Event {
            pos: pos + limit.signum(),
            delta: -1,
            precise: true,
        });
    }
    events.sort_by(|a, b| {
        let ord = a.key().cmp(&b.key());
        if limit < 0 {
            ord.reverse()
        } else {
            ord
        }
    });

    let mut sum = 0;
    let mut best: Option<(i64, Event)> = None;
    for event in events {
        sum += event.delta;
        if best.map_or(true, |(max, _)| sum > max) {
            best = Some((sum, event));
        }
    }
    best.map(|(_, event)| {
        (
            event.pos,
            event.precise || precise.contains(&event.pos),
        )
    })
}

/// Distance from the median to the 97.5th percentile of the approximate positions.
fn cipos95(approximate: &[i64], precise: bool, precise_count: usize) -> i64 {
    if (precise && precise_count > 1) || approximate.is_empty() {
        return 0;
    }
    let mut data = Data::new(approximate.iter().map(|p| *p as f64).collect_vec());
    let median = data.median();
    let upper = data.quantile(0.975);
    (upper - median).abs().round() as i64
}

struct Side {
    precise: Vec<i64>,
    imprecise: Vec<i64>,
}

impl Side {
    fn consensus(&self, limit: i64) -> Option<(i64, bool, i64)> {
        let (pos, precise) = break_ops(&self.imprecise, &self.precise, limit)?;
        Some((pos, precise, cipos95(&self.imprecise, precise, self.precise.len())))
    }
}

type VoteKey = (SvType, JoinType, i32, i32);

/// Merge the hypotheses of a cluster into consensus breakpoints.
///
/// Only hypotheses sharing the most frequent (svtype, join type, chromosome pair)
/// contribute, ties are broken by first occurrence. Returns `None` for empty input.
pub fn make_call(hypotheses: &[ClassifiedPair], insert_size: &InsertSize) -> Option<Breakpoints> {
    let mut votes: LinearMap<VoteKey, usize> = LinearMap::new();
    for hyp in hypotheses {
        *votes
            .entry((hyp.svtype, hyp.join_type, hyp.chrom_a, hyp.chrom_b))
            .or_insert(0) += 1;
    }
    // ties are resolved by insertion order
    let mut majority: Option<(VoteKey, usize)> = None;
    for (key, count) in votes.iter() {
        if majority.map_or(true, |(_, max)| *count > max) {
            majority = Some((*key, *count));
        }
    }
    let ((svtype, join_type, chrom_a, chrom_b), _) = majority?;

    let informative = hypotheses
        .iter()
        .filter(|hyp| {
            hyp.svtype == svtype
                && hyp.join_type == join_type
                && hyp.chrom_a == chrom_a
                && hyp.chrom_b == chrom_b
        })
        .collect_vec();

    let side = |select: fn(&ClassifiedPair) -> (i64, bool)| {
        let mut side = Side {
            precise: Vec::new(),
            imprecise: Vec::new(),
        };
        for hyp in &informative {
            let (pos, precise) = select(hyp);
            if precise {
                side.precise.push(pos);
            } else {
                side.imprecise.push(pos);
            }
        }
        side
    };
    let side_a = side(|hyp| (hyp.break_a, hyp.precise_a));
    let side_b = side(|hyp| (hyp.break_b, hyp.precise_b));

    let (limit_a, limit_b) = limits(svtype, join_type, insert_size.limit());
    let (mut pos_a, precise_a, cipos95_a) = side_a.consensus(limit_a)?;
    let (mut pos_b, precise_b, cipos95_b) = side_b.consensus(limit_b)?;

    let svlen = if svtype == SvType::Ins {
        let gaps = informative
            .iter()
            .filter_map(|hyp| hyp.query_gap.map(|gap| gap as f64))
            .collect_vec();
        if !gaps.is_empty() {
            mean(&gaps).round() as i64
        } else if !precise_a && !precise_b {
            let separation = (pos_b - pos_a).abs();
            let mid = (pos_a + pos_b) / 2;
            pos_a = mid;
            pos_b = mid;
            separation.min(cipos95_a.max(cipos95_b))
        } else if precise_a && !precise_b {
            pos_b = pos_a + 1;
            cipos95_b / 2
        } else if precise_b && !precise_a {
            pos_a = pos_b - 1;
            cipos95_a / 2
        } else {
            (pos_b - pos_a).abs()
        }
    } else if chrom_a == chrom_b {
        (pos_b - pos_a).abs()
    } else {
        0
    };

    Some(Breakpoints {
        svtype,
        join_type,
        chrom_a,
        chrom_b,
        pos_a,
        pos_b,
        cipos95_a,
        cipos95_b,
        precise_a,
        precise_b,
        svlen,
    })
}
