//! Compact block summaries.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// A compact, derived summary of a validated [`HeaderBlock`](crate::HeaderBlock).
///
/// Block records are what the wallet keeps in memory for every known block.
/// They carry the fields needed for fork choice and for difficulty and
/// sub-slot iteration adjustment, and are never mutated once created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Hash identifying the block.
    pub header_hash: B256,
    /// Hash of the parent block.
    pub prev_hash: B256,
    /// Height of the block.
    pub height: u32,
    /// Cumulative weight of the chain ending at this block.
    pub weight: u128,
    /// Cumulative VDF iterations up to this block.
    pub total_iters: u128,
    /// Index of the signage point the proof of space was found for.
    pub signage_point_index: u8,
    /// Iterations required by the block's proof of space.
    pub required_iters: u64,
    /// Sub-slot iterations in effect for this block.
    pub sub_slot_iters: u64,
    /// Remaining blocks before the reward chain can be challenged.
    pub deficit: u8,
    /// Whether the block was infused in the sub-slot after its signage point.
    pub overflow: bool,
    /// Whether at least one sub-slot finished before this block.
    pub first_in_sub_slot: bool,
    /// Block timestamp, present iff this is a transaction block.
    pub timestamp: Option<u64>,
    /// Hash of the previous transaction block, present iff this is a transaction block.
    pub prev_transaction_block_hash: Option<B256>,
}

impl BlockRecord {
    /// Returns `true` if the record summarizes a transaction block.
    pub const fn is_transaction_block(&self) -> bool {
        self.timestamp.is_some()
    }
}
