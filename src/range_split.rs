//! Partitioning of a sparse GND index range into fetch-sized request blocks.
//!
//! The metadata endpoint describes which diagram indices exist as a list of closed
//! `[start, end]` pairs, e.g. `[[0, 57], [71, 71], [93, 102]]`. Each record request
//! asks for at most `set_size` diagrams, so the pairs are regrouped into blocks whose
//! sizes add up to exactly `set_size` (the last block may be smaller). A single pair
//! may be cut across several blocks and a block may hold several pairs.

use crate::error::{GndError, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: i64,
    pub end: i64,
}

impl IndexRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Number of indices covered by the closed range.
    pub fn len(&self) -> usize {
        (self.end - self.start + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn indices(&self) -> impl Iterator<Item = i64> {
        self.start..=self.end
    }
}

impl From<[i64; 2]> for IndexRange {
    fn from(pair: [i64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Ordered block index -> sub-ranges requested together in one record fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestRangeMap {
    blocks: BTreeMap<usize, Vec<IndexRange>>,
}

impl RequestRangeMap {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, block: usize) -> Option<&[IndexRange]> {
        self.blocks.get(&block).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[IndexRange])> {
        self.blocks.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Number of diagram indices in one block.
    pub fn block_size(&self, block: usize) -> usize {
        self.get(block)
            .map(|ranges| ranges.iter().map(IndexRange::len).sum())
            .unwrap_or(0)
    }

    /// Serialized form of a block for the record endpoint's `range` parameter.
    pub fn range_param(&self, block: usize) -> Option<String> {
        self.get(block).map(format_range_param)
    }

    fn push_block(&mut self, block: Vec<IndexRange>) {
        if !block.is_empty() {
            let next = self.blocks.len();
            self.blocks.insert(next, block);
        }
    }
}

/// `"s1-e1,s2-e2,..."`
pub fn format_range_param(ranges: &[IndexRange]) -> String {
    ranges.iter().join(",")
}

/// Split `index_range` into blocks of `set_size` indices. Index order is preserved and
/// concatenating the blocks reproduces the input coverage exactly.
pub fn split_request_range<R>(index_range: &[R], set_size: usize) -> Result<RequestRangeMap>
where
    R: Copy + Into<IndexRange>,
{
    if set_size == 0 {
        return Err(GndError::InvalidRange("set size must be positive".to_string()));
    }
    let set_size_i = set_size as i64;

    let mut map = RequestRangeMap::default();
    let mut current_block: Vec<IndexRange> = Vec::new();
    let mut current_block_size: i64 = 0;
    let mut previous_end: Option<i64> = None;

    for range in index_range.iter().copied() {
        let IndexRange { start, end } = range.into();
        if end < start {
            return Err(GndError::InvalidRange(format!("inverted pair {start}-{end}")));
        }
        if let Some(prev) = previous_end {
            if start <= prev {
                return Err(GndError::InvalidRange(format!(
                    "pair {start}-{end} overlaps or precedes the previous pair ending at {prev}"
                )));
            }
        }
        previous_end = Some(end);

        let mut range_start = start;
        let mut range_size = end - range_start + 1;

        while current_block_size + range_size > set_size_i {
            let fill_size = set_size_i - current_block_size;
            let sub_range_end = range_start + fill_size - 1;

            current_block.push(IndexRange::new(range_start, sub_range_end));
            map.push_block(std::mem::take(&mut current_block));
            current_block_size = 0;

            range_start = sub_range_end + 1;
            range_size = end - range_start + 1;
        }

        current_block.push(IndexRange::new(range_start, end));
        current_block_size += range_size;

        if current_block_size == set_size_i {
            map.push_block(std::mem::take(&mut current_block));
            current_block_size = 0;
        }
    }

    if current_block_size > 0 {
        map.push_block(current_block);
    }

    Ok(map)
}
