// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub(crate) enum Error {
    #[error("partition refers to node {node} which has no entry in the node info table")]
    UnknownNode { node: u64 },
    #[error("edge refers to unknown partition {partition}")]
    UnknownPartition { partition: u64 },
    #[error("invalid join type '{value}', must be of the form 3to5, 5to3, 3to3 or 5to5")]
    InvalidJoinType { value: String },
    #[error("invalid SV type '{value}'")]
    InvalidSvType { value: String },
    #[error("found no records to use for estimating the insert size; the input is probably single end data")]
    NoInsertSizeRecords,
    #[error("unrealistic insert size distribution: the standard deviation is 0.0, consider sampling more reads for estimating the insert size")]
    UnrealisticIsizeSd,
}
