// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use rust_htslib::bam::{self, Read};
use structopt::clap::AppSettings;
use structopt::StructOpt;

use crate::annotation::{annotate, BedRegions, RegionIndex};
use crate::calling::params::CallParams;
use crate::calling::partition::PartitionData;
use crate::calling::ClusterCaller;
use crate::estimation::insert_size::InsertSize;

#[derive(Debug, StructOpt, Serialize, Deserialize, Clone)]
#[structopt(
    name = "svbreak",
    about = "Calling of structural variant breakpoints from clustered read alignments.",
    setting = AppSettings::ColoredHelp
)]
pub enum SvBreak {
    #[structopt(
        name = "call",
        about = "Call SVs from the read-graph partitions of a BAM file. Calls are written to STDOUT as JSON, one per line.",
        setting = AppSettings::ColoredHelp
    )]
    Call {
        #[structopt(parse(from_os_str), help = "BAM file with the clustered alignments.")]
        bam: PathBuf,
        #[structopt(
            parse(from_os_str),
            help = "JSON file with the read-graph partitions, edges and node identities."
        )]
        partitions: PathBuf,
        #[structopt(
            long = "min-support",
            default_value = "3",
            help = "Minimum weighted read support (pairs + split reads + 2 * spanning reads) of a call."
        )]
        min_support: usize,
        #[structopt(
            long = "min-sv-size",
            default_value = "30",
            help = "Minimum length of an insertion or deletion inside a single alignment."
        )]
        min_sv_size: u32,
        #[structopt(
            long = "clip-length",
            default_value = "15",
            help = "Minimum soft clip length for an alignment to count as clipped."
        )]
        clip_length: u32,
        #[structopt(long = "insert-mean", default_value = "300", help = "Mean insert size.")]
        insert_mean: f64,
        #[structopt(
            long = "insert-sd",
            default_value = "150",
            help = "Standard deviation of the insert size."
        )]
        insert_sd: f64,
        #[structopt(
            long = "estimate-insert-size",
            help = "Estimate the insert size from the BAM file instead of using --insert-mean and --insert-sd."
        )]
        estimate_insert_size: bool,
        #[structopt(
            long = "insert-size-records",
            help = "Number of records to use for estimating the insert size (default: 1000000)."
        )]
        insert_size_records: Option<usize>,
        #[structopt(
            long = "max-buffered-reads",
            default_value = "1000000",
            help = "Number of records after which fetched records are no longer cached."
        )]
        max_buffered_reads: usize,
        #[structopt(
            long = "extended-tags",
            help = "Aggregate DN, DP and AS tags in addition to the basic read evidence."
        )]
        extended_tags: bool,
        #[structopt(
            long = "ins-min-split-support",
            default_value = "0",
            help = "Insertions supported mainly by clipped reads need more than this many split or spanning reads."
        )]
        ins_min_split_support: usize,
        #[structopt(
            long,
            parse(from_os_str),
            help = "BED file with regions, used to annotate calls as intra-, inter-, hemi- or extra-regional."
        )]
        regions: Option<PathBuf>,
        #[structopt(short, long, help = "Provide verbose logging output.")]
        verbose: bool,
    },
}

impl SvBreak {
    pub fn verbose(&self) -> bool {
        match self {
            SvBreak::Call { verbose, .. } => *verbose,
        }
    }
}

pub fn run(opt: SvBreak) -> Result<()> {
    match opt {
        SvBreak::Call {
            bam,
            partitions,
            min_support,
            min_sv_size,
            clip_length,
            insert_mean,
            insert_sd,
            estimate_insert_size,
            insert_size_records,
            max_buffered_reads,
            extended_tags,
            ins_min_split_support,
            regions,
            ..
        } => {
            let insert_size = if estimate_insert_size {
                InsertSize::estimate(&bam, insert_size_records)?
            } else {
                InsertSize::new(insert_mean, insert_sd)
            };
            let params = CallParams::builder()
                .min_support(min_support)
                .min_sv_size(min_sv_size)
                .clip_length(clip_length)
                .insert_size(insert_size)
                .max_buffered_reads(max_buffered_reads)
                .extended_tags(extended_tags)
                .ins_min_split_support(ins_min_split_support)
                .build();

            let partitions = PartitionData::from_path(&partitions)?;
            let reader = bam::Reader::from_path(&bam)?;
            let header = reader.header().clone();
            let regions = match regions {
                Some(path) => Some(BedRegions::from_path(path, &header)?),
                None => None,
            };

            let mut caller = ClusterCaller::new(params, reader);
            let calls = caller.call(&partitions);

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for mut call in calls {
                annotate(
                    &mut call,
                    regions.as_ref().map(|r| r as &dyn RegionIndex),
                    None,
                );
                serde_json::to_writer(&mut out, &call)?;
                writeln!(out)?;
            }
            out.flush()?;
        }
    }
    Ok(())
}
