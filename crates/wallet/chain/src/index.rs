//! In-memory index of block records.

use crate::{BlockchainInterface, ChainError};
use alloy_primitives::{B256, map::B256HashMap};
use std::collections::BTreeMap;
use tern_primitives::BlockRecord;

/// In-memory lookup structure over known block records.
///
/// Records are keyed by header hash and include orphaned branches. The
/// canonical chain is tracked separately as a height-to-hash map, which the
/// state machine rewrites on every peak change. A third map buckets all
/// records by height so that old records can be evicted without scanning.
///
/// Nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct BlockRecordIndex {
    block_records: B256HashMap<BlockRecord>,
    height_to_hash: BTreeMap<u32, B256>,
    heights: BTreeMap<u32, Vec<B256>>,
}

impl BlockRecordIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record`, overwriting any record with the same header hash.
    pub fn add(&mut self, record: BlockRecord) {
        let (hash, height) = (record.header_hash, record.height);
        if self.block_records.insert(hash, record).is_none() {
            self.heights.entry(height).or_default().push(hash);
        }
    }

    /// Returns the record for `header_hash`.
    pub fn get(&self, header_hash: &B256) -> Result<&BlockRecord, ChainError> {
        self.block_record(header_hash)
    }

    /// Records `header_hash` as the canonical block at `height`.
    pub fn set_height(&mut self, height: u32, header_hash: B256) {
        self.height_to_hash.insert(height, header_hash);
    }

    /// Removes every canonical entry at or above `height`, returning how many
    /// were removed.
    pub fn remove_heights_from(&mut self, height: u32) -> usize {
        self.height_to_hash.split_off(&height).len()
    }

    /// Evicts every record strictly below `height`, canonical or not, and
    /// returns how many were evicted.
    ///
    /// The canonical height map is left intact.
    pub fn prune_below(&mut self, height: u32) -> usize {
        let kept = self.heights.split_off(&height);
        let evicted = std::mem::replace(&mut self.heights, kept);

        let mut count = 0;
        for hash in evicted.into_values().flatten() {
            if self.block_records.remove(&hash).is_some() {
                count += 1;
            }
        }
        count
    }

    /// Number of known records.
    pub fn len(&self) -> usize {
        self.block_records.len()
    }

    /// Returns `true` if no records are known.
    pub fn is_empty(&self) -> bool {
        self.block_records.is_empty()
    }

    /// Number of canonical heights recorded.
    pub fn canonical_len(&self) -> usize {
        self.height_to_hash.len()
    }

    /// Lowest height that still has a record, if any.
    pub fn lowest_record_height(&self) -> Option<u32> {
        self.heights.keys().next().copied()
    }
}

impl BlockchainInterface for BlockRecordIndex {
    fn contains_block(&self, header_hash: &B256) -> bool {
        self.block_records.contains_key(header_hash)
    }

    fn contains_height(&self, height: u32) -> bool {
        self.height_to_hash.contains_key(&height)
    }

    fn try_block_record(&self, header_hash: &B256) -> Option<&BlockRecord> {
        self.block_records.get(header_hash)
    }

    fn height_to_hash(&self, height: u32) -> Result<B256, ChainError> {
        self.height_to_hash.get(&height).copied().ok_or(ChainError::HeightNotFound(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(height: u32, tag: u8) -> BlockRecord {
        BlockRecord {
            header_hash: B256::with_last_byte(tag),
            height,
            weight: height as u128 * 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut index = BlockRecordIndex::new();
        index.add(record(1, 1));
        index.add(record(1, 1));

        assert_eq!(index.len(), 1);
        assert!(index.contains_block(&B256::with_last_byte(1)));
        assert_eq!(index.get(&B256::with_last_byte(1)).unwrap().height, 1);
    }

    #[test]
    fn test_missing_lookups_fail() {
        let index = BlockRecordIndex::new();
        assert!(matches!(
            index.get(&B256::with_last_byte(9)),
            Err(ChainError::BlockNotFound(hash)) if hash == B256::with_last_byte(9)
        ));
        assert!(matches!(index.height_to_hash(3), Err(ChainError::HeightNotFound(3))));
        assert!(!index.contains_height(3));
    }

    #[test]
    fn test_remove_heights_from() {
        let mut index = BlockRecordIndex::new();
        for h in 0..6 {
            index.set_height(h, B256::with_last_byte(h as u8));
        }

        assert_eq!(index.remove_heights_from(4), 2);
        assert_eq!(index.canonical_len(), 4);
        assert!(index.contains_height(3));
        assert!(!index.contains_height(4));
        assert_eq!(index.remove_heights_from(0), 4);
        assert_eq!(index.canonical_len(), 0);
    }

    #[test]
    fn test_prune_below_evicts_orphans_but_keeps_heights() {
        let mut index = BlockRecordIndex::new();
        for h in 0..5u8 {
            index.add(record(h as u32, h));
            index.set_height(h as u32, B256::with_last_byte(h));
        }
        // An orphan sibling at height 1.
        index.add(record(1, 0xa1));

        assert_eq!(index.prune_below(2), 3);
        assert_eq!(index.len(), 3);
        assert!(!index.contains_block(&B256::with_last_byte(0xa1)));
        assert_eq!(index.lowest_record_height(), Some(2));
        assert_eq!(index.height_to_hash(0).unwrap(), B256::with_last_byte(0));
    }
}
