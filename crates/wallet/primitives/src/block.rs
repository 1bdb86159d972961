//! Header block types.

use alloy_primitives::{B256, Bytes};
use serde::{Deserialize, Serialize};

/// Summary of a sub-slot that finished before a block was infused.
///
/// Only the fields the wallet needs for bookkeeping are retained; the VDF
/// proofs themselves are checked by the header validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndOfSubSlot {
    /// Challenge hash of the finished sub-slot.
    pub challenge_hash: B256,
    /// Sub-slot iterations for the next sub-slot, present at epoch boundaries.
    pub new_sub_slot_iters: Option<u64>,
    /// Difficulty for the next sub-slot, present at epoch boundaries.
    pub new_difficulty: Option<u64>,
}

/// The transaction-block part of a block's foliage.
///
/// Only transaction blocks carry one, and only they carry a timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoliageTransactionBlock {
    /// Hash of the previous transaction block.
    pub prev_transaction_block_hash: B256,
    /// Block timestamp, in seconds since the Unix epoch.
    pub timestamp: u64,
    /// Hash of the block's compact filter.
    pub filter_hash: B256,
}

/// A block without its transactions generator or body.
///
/// Header blocks arrive either one at a time from peers or as the
/// recent-chain tail of a [`WeightProof`](crate::WeightProof). The peak header
/// block is the only block that is ever persisted in full.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeaderBlock {
    /// Hash identifying this block.
    pub header_hash: B256,
    /// Hash of the parent block.
    pub prev_header_hash: B256,
    /// Height of the block. Genesis is height 0.
    pub height: u32,
    /// Cumulative weight of the chain ending at this block.
    pub weight: u128,
    /// Cumulative VDF iterations up to this block.
    pub total_iters: u128,
    /// Index of the signage point the proof of space was found for.
    pub signage_point_index: u8,
    /// Sub-slots that finished since the previous block.
    pub finished_sub_slots: Vec<EndOfSubSlot>,
    /// Present iff this is a transaction block.
    pub foliage_transaction_block: Option<FoliageTransactionBlock>,
    /// Serialized proof of space, opaque to the wallet.
    pub proof_of_space: Bytes,
}

impl HeaderBlock {
    /// Returns `true` if the block carries a foliage transaction block.
    pub const fn is_transaction_block(&self) -> bool {
        self.foliage_transaction_block.is_some()
    }

    /// Returns `true` if at least one sub-slot finished before this block.
    pub fn first_in_sub_slot(&self) -> bool {
        !self.finished_sub_slots.is_empty()
    }

    /// Returns the block timestamp, if this is a transaction block.
    pub fn timestamp(&self) -> Option<u64> {
        self.foliage_transaction_block.as_ref().map(|ftb| ftb.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_block_exposes_timestamp() {
        let mut block = HeaderBlock { height: 3, ..Default::default() };
        assert!(!block.is_transaction_block());
        assert_eq!(block.timestamp(), None);

        block.foliage_transaction_block =
            Some(FoliageTransactionBlock { timestamp: 1_700_000_000, ..Default::default() });
        assert!(block.is_transaction_block());
        assert_eq!(block.timestamp(), Some(1_700_000_000));
    }

    #[test]
    fn test_first_in_sub_slot() {
        let mut block = HeaderBlock::default();
        assert!(!block.first_in_sub_slot());

        block.finished_sub_slots.push(EndOfSubSlot::default());
        assert!(block.first_in_sub_slot());
    }
}
