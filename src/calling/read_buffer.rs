// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;
use rust_htslib::bam::{self, Read};

use crate::calling::partition::{NodeInfo, PartitionData};
use crate::errors::Error;

/// Records following the seek position that are inspected in addition to the first one
/// before giving up on a node.
pub const FETCH_RETRIES: usize = 5;

/// Random access to alignment records by virtual file offset.
pub trait AlignmentSource {
    fn seek(&mut self, offset: u64) -> Result<()>;

    fn read_next(&mut self) -> Option<Result<bam::Record>>;
}

impl AlignmentSource for bam::Reader {
    fn seek(&mut self, offset: u64) -> Result<()> {
        bam::Read::seek(self, offset as i64)?;
        Ok(())
    }

    fn read_next(&mut self) -> Option<Result<bam::Record>> {
        let mut record = bam::Record::new();
        match self.read(&mut record) {
            None => None,
            Some(Ok(())) => Some(Ok(record)),
            Some(Err(e)) => Some(Err(e.into())),
        }
    }
}

/// A buffer for alignment records of graph nodes. Records are cached until the
/// given number of records is buffered. Cached records are never evicted; nodes that
/// are not yet cached when the buffer is full are fetched from the source on each
/// request.
pub struct ReadBuffer<S: AlignmentSource> {
    source: S,
    records: HashMap<u64, Rc<bam::Record>>,
    max_buffered: usize,
}

impl<S: AlignmentSource> ReadBuffer<S> {
    pub fn new(source: S, max_buffered: usize) -> Self {
        ReadBuffer {
            source,
            records: HashMap::new(),
            max_buffered,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fetch the record of a node. Returns `None` if the record found at the node's offset
    /// (and the following retries) does not match the node.
    pub fn fetch(&mut self, node: u64, info: &NodeInfo) -> Result<Option<Rc<bam::Record>>> {
        if let Some(record) = self.records.get(&node) {
            return Ok(Some(Rc::clone(record)));
        }

        self.source.seek(info.offset)?;
        for _ in 0..=FETCH_RETRIES {
            let record = match self.source.read_next() {
                Some(record) => record?,
                None => break,
            };
            if info.matches(&record) {
                let record = Rc::new(record);
                if self.records.len() < self.max_buffered {
                    self.records.insert(node, Rc::clone(&record));
                }
                return Ok(Some(record));
            }
        }
        debug!(
            "Dropping node {}: no matching record found at offset {}.",
            node, info.offset
        );
        Ok(None)
    }

    /// Fetch the records of all given nodes, skipping nodes without a matching record.
    pub fn fetch_nodes(
        &mut self,
        nodes: &[u64],
        partitions: &PartitionData,
    ) -> Result<Vec<Rc<bam::Record>>> {
        let mut records = Vec::with_capacity(nodes.len());
        for &node in nodes {
            let info = partitions
                .node(node)
                .ok_or(Error::UnknownNode { node })?;
            if let Some(record) = self.fetch(node, info)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Alignment source backed by a vector. Offsets are indices into the vector.
    pub(crate) struct VecSource {
        records: Vec<bam::Record>,
        cursor: usize,
        pub(crate) reads: usize,
    }

    impl VecSource {
        pub(crate) fn new(records: Vec<bam::Record>) -> Self {
            VecSource {
                records,
                cursor: 0,
                reads: 0,
            }
        }
    }

    impl AlignmentSource for VecSource {
        fn seek(&mut self, offset: u64) -> Result<()> {
            self.cursor = offset as usize;
            Ok(())
        }

        fn read_next(&mut self) -> Option<Result<bam::Record>> {
            let record = self.records.get(self.cursor)?.clone();
            self.cursor += 1;
            self.reads += 1;
            Some(Ok(record))
        }
    }
}
