// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::estimation::insert_size::InsertSize;

/// Parameters of the cluster caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct CallParams {
    /// Minimum weighted read support (pe + supp + 2 * spanning) of a call.
    #[builder(default = 3)]
    min_support: usize,
    /// Minimum length of an interior insertion or deletion to count as spanning evidence.
    #[builder(default = 30)]
    min_sv_size: u32,
    /// Minimum soft clip length of an alignment to count as clipped.
    #[builder(default = 15)]
    clip_length: u32,
    #[builder(default)]
    insert_size: InsertSize,
    /// Number of records after which the read buffer stops caching.
    #[builder(default = 1_000_000)]
    max_buffered_reads: usize,
    /// Aggregate DN, DP, AS and gap fraction tags in addition to the basic evidence.
    #[builder(default = false)]
    extended_tags: bool,
    /// Window around a precise breakpoint from which reads are passed to the assembler.
    #[builder(default = 500)]
    assembly_window: i64,
    /// Insertions supported mainly by clipped reads need more than this many
    /// supplementary or spanning alignments.
    #[builder(default = 0)]
    ins_min_split_support: usize,
}

impl Default for CallParams {
    fn default() -> Self {
        CallParams::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = CallParams::default();
        assert_eq!(params.min_support(), 3);
        assert_eq!(params.min_sv_size(), 30);
        assert_eq!(params.clip_length(), 15);
        assert_eq!(params.max_buffered_reads(), 1_000_000);
        assert_eq!(params.insert_size(), InsertSize::new(300.0, 150.0));
        assert!(!params.extended_tags());
    }

    #[test]
    fn test_builder_overrides() {
        let params = CallParams::builder().min_support(5).extended_tags(true).build();
        assert_eq!(params.min_support(), 5);
        assert!(params.extended_tags());
        assert_eq!(params.assembly_window(), 500);
    }

    #[test]
    fn test_deserialize() {
        let params: CallParams = serde_json::from_str(
            r#"{"min_support":2,"min_sv_size":50,"clip_length":20,
                "insert_size":{"mean":450.0,"sd":80.0},"max_buffered_reads":10,
                "extended_tags":true,"assembly_window":250,"ins_min_split_support":1}"#,
        )
        .unwrap();
        assert_eq!(params.min_sv_size(), 50);
        assert_relative_eq!(params.insert_size().mean, 450.0);
    }
}
