// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Read-graph partitions as handed over by the upstream clustering.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_htslib::bam;

use crate::errors::Error;
use crate::utils::qname_hash;

/// Identity of the alignment behind a graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct NodeInfo {
    /// Query name hash, see [`crate::qname_hash`].
    pub hash: u64,
    pub flag: u16,
    pub pos: i64,
    pub tid: i32,
    /// Virtual file offset of the record in the alignment file.
    pub offset: u64,
}

impl NodeInfo {
    /// Whether the record is the alignment this node was built from.
    pub fn matches(&self, record: &bam::Record) -> bool {
        record.flags() == self.flag
            && record.pos() == self.pos
            && record.tid() == self.tid
            && qname_hash(record.qname()) == self.hash
    }
}

/// Edge between two partitions, with the nodes of each side supporting it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct PartitionEdge {
    pub u: u64,
    pub v: u64,
    pub nodes_u: Vec<u64>,
    pub nodes_v: Vec<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionData {
    /// Partition id to member nodes.
    pub parts: BTreeMap<u64, Vec<u64>>,
    /// Edges between partitions.
    pub s_between: Vec<PartitionEdge>,
    /// Partition id to nodes connected by edges within the partition.
    #[serde(default)]
    pub s_within: BTreeMap<u64, Vec<u64>>,
    pub node_info: BTreeMap<u64, NodeInfo>,
}

impl PartitionData {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("error reading partition file {}", path.display()))?;
        let partitions: PartitionData = serde_json::from_str(&data)
            .with_context(|| format!("invalid partition file {}", path.display()))?;
        partitions.validate()?;
        Ok(partitions)
    }

    /// Check that all edges and members refer to known partitions and nodes.
    pub fn validate(&self) -> Result<()> {
        for edge in &self.s_between {
            for partition in &[edge.u, edge.v] {
                if !self.parts.contains_key(partition) {
                    return Err(Error::UnknownPartition {
                        partition: *partition,
                    }
                    .into());
                }
            }
        }
        let members = self.parts.values().flatten();
        let edge_nodes = self
            .s_between
            .iter()
            .flat_map(|edge| edge.nodes_u.iter().chain(edge.nodes_v.iter()));
        for node in members.chain(edge_nodes) {
            if !self.node_info.contains_key(node) {
                return Err(Error::UnknownNode { node: *node }.into());
            }
        }
        Ok(())
    }

    pub fn node(&self, node: u64) -> Option<&NodeInfo> {
        self.node_info.get(&node)
    }

    /// Number of nodes with edges inside the partition.
    pub fn internal_support(&self, partition: u64) -> usize {
        self.s_within.get(&partition).map_or(0, |nodes| nodes.len())
    }

    /// Number of partition nodes supporting edges to other partitions.
    pub fn external_support(&self, partition: u64) -> usize {
        self.s_between
            .iter()
            .map(|edge| {
                let mut n = 0;
                if edge.u == partition {
                    n += edge.nodes_u.len();
                }
                if edge.v == partition {
                    n += edge.nodes_v.len();
                }
                n
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::*;
    use rust_htslib::bam::record::Cigar::Match;

    const JSON: &str = r#"{
        "parts": {"0": [1, 2], "1": [3]},
        "s_between": [{"u": 0, "v": 1, "nodes_u": [1], "nodes_v": [3]}],
        "s_within": {"0": [1, 2]},
        "node_info": {
            "1": {"hash": 1, "flag": 65, "pos": 100, "tid": 0, "offset": 0},
            "2": {"hash": 2, "flag": 129, "pos": 200, "tid": 0, "offset": 10},
            "3": {"hash": 3, "flag": 2113, "pos": 900, "tid": 0, "offset": 20}
        }
    }"#;

    #[test]
    fn test_deserialize() {
        let data: PartitionData = serde_json::from_str(JSON).unwrap();
        data.validate().unwrap();
        assert_eq!(data.parts[&0], vec![1, 2]);
        assert_eq!(data.s_between[0].nodes_v, vec![3]);
        assert_eq!(data.node(2).unwrap().offset, 10);
        assert_eq!(data.internal_support(0), 2);
        assert_eq!(data.external_support(0), 1);
        assert_eq!(data.external_support(1), 1);
        assert_eq!(data.internal_support(1), 0);
    }

    #[test]
    fn test_unknown_partition() {
        let mut data: PartitionData = serde_json::from_str(JSON).unwrap();
        data.s_between[0].v = 7;
        let err = data.validate().unwrap_err();
        assert_eq!(
            err.downcast::<Error>().unwrap(),
            Error::UnknownPartition { partition: 7 }
        );
    }

    #[test]
    fn test_unknown_node() {
        let mut data: PartitionData = serde_json::from_str(JSON).unwrap();
        data.parts.get_mut(&1).unwrap().push(9);
        let err = data.validate().unwrap_err();
        assert_eq!(err.downcast::<Error>().unwrap(), Error::UnknownNode { node: 9 });
    }

    #[test]
    fn test_node_matches_record() {
        let rec = record("read1", PAIRED | FIRST_IN_PAIR, 0, 100, vec![Match(50)]);
        let info = NodeInfo::new(qname_hash(b"read1"), PAIRED | FIRST_IN_PAIR, 100, 0, 0);
        assert!(info.matches(&rec));
        let moved = NodeInfo::new(qname_hash(b"read1"), PAIRED | FIRST_IN_PAIR, 101, 0, 0);
        assert!(!moved.matches(&rec));
        let other = NodeInfo::new(qname_hash(b"read2"), PAIRED | FIRST_IN_PAIR, 100, 0, 0);
        assert!(!other.matches(&rec));
    }
}
