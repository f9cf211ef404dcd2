// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use itertools::Itertools;
use rust_htslib::bam::{self, Read};
use statrs::statistics::{Data, Distribution, OrderStatistics};

use crate::errors::Error;

pub const NUM_FRAGMENTS: usize = 1_000_000;

/// Insert size distribution of the library, bounding how far an approximate breakpoint
/// may be displaced from the read evidence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, new)]
pub struct InsertSize {
    pub mean: f64,
    pub sd: f64,
}

impl Default for InsertSize {
    fn default() -> Self {
        InsertSize {
            mean: 300.0,
            sd: 150.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SkipReason {
    NotPaired,
    NotFirstInTemplate,
    MapqZero,
    Duplicate,
    Unmapped,
    MateUnmappedOrElsewhere,
    Clipped,
}

impl InsertSize {
    /// Search limit around approximate breakpoints.
    pub fn limit(&self) -> i64 {
        ((self.mean + self.sd).round() as i64).max(1)
    }

    /// Estimate the insert size from the first `num_records` usable records of a BAM file.
    /// Only paired, first in template, mapped, non-duplicate and unclipped records with
    /// their mate on the same contig are used. Values outside the 5%-95% percentile range
    /// are discarded before computing mean and standard deviation.
    pub fn estimate(path: impl AsRef<Path>, num_records: Option<usize>) -> Result<Self> {
        let mut bam = bam::Reader::from_path(path.as_ref())?;
        let mut skips: HashMap<SkipReason, usize> = HashMap::new();
        let mut tlens = Vec::new();
        let limit = num_records.unwrap_or(NUM_FRAGMENTS);

        let mut record = bam::Record::new();
        while let Some(res) = bam.read(&mut record) {
            res?;
            let skip = if !record.is_paired() {
                Some(SkipReason::NotPaired)
            } else if !record.is_first_in_template() {
                Some(SkipReason::NotFirstInTemplate)
            } else if record.mapq() == 0 {
                Some(SkipReason::MapqZero)
            } else if record.is_duplicate() {
                Some(SkipReason::Duplicate)
            } else if record.is_unmapped() {
                Some(SkipReason::Unmapped)
            } else if record.is_mate_unmapped() || record.tid() != record.mtid() {
                Some(SkipReason::MateUnmappedOrElsewhere)
            } else if record.cigar().iter().any(|op| {
                matches!(
                    op,
                    bam::record::Cigar::SoftClip(_) | bam::record::Cigar::HardClip(_)
                )
            }) {
                Some(SkipReason::Clipped)
            } else {
                None
            };
            if let Some(reason) = skip {
                *skips.entry(reason).or_insert(0) += 1;
                continue;
            }

            tlens.push(record.insert_size().abs() as f64);
            if tlens.len() >= limit {
                break;
            }
        }

        if tlens.is_empty() {
            warn!(
                "Found no records to use for estimating the insert size ({} records skipped: {:?}).",
                skips.values().sum::<usize>(),
                skips
            );
            return Err(Error::NoInsertSizeRecords.into());
        }

        let mut tlens = Data::new(tlens);
        let upper = tlens.percentile(95);
        let lower = tlens.percentile(5);
        let valid = Data::new(
            tlens
                .iter()
                .cloned()
                .filter(|l| *l <= upper && *l >= lower)
                .collect_vec(),
        );
        let sd = valid.std_dev().unwrap_or(0.0);
        if sd == 0.0 {
            return Err(Error::UnrealisticIsizeSd.into());
        }

        let insert_size = InsertSize {
            mean: valid.iter().sum::<f64>() / valid.len() as f64,
            sd,
        };
        info!(
            "Estimated insert size: mean={:.1} sd={:.1}",
            insert_size.mean, insert_size.sd
        );
        Ok(insert_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit() {
        assert_eq!(InsertSize::new(300.0, 150.0).limit(), 450);
        assert_eq!(InsertSize::new(0.0, 0.0).limit(), 1);
    }

    #[test]
    fn test_missing_file() {
        assert!(InsertSize::estimate("does/not/exist.bam", Some(10)).is_err());
    }
}
