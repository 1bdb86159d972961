//! Weight proof types.

use crate::HeaderBlock;
use alloy_primitives::{B256, Bytes};
use serde::{Deserialize, Serialize};

/// Per-sub-epoch data carried by a [`WeightProof`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubEpochData {
    /// Reward chain hash at the end of the sub-epoch.
    pub reward_chain_hash: B256,
    /// Number of overflow blocks in the sub-epoch.
    pub num_blocks_overflow: u8,
    /// New sub-slot iterations, if the sub-epoch closed an epoch.
    pub new_sub_slot_iters: Option<u64>,
    /// New difficulty, if the sub-epoch closed an epoch.
    pub new_difficulty: Option<u64>,
}

/// A succinct proof of the cumulative weight of a chain.
///
/// Older history is summarized by sub-epoch data and sampled segments, which
/// only the weight-proof verifier interprets. The most recent part of the
/// chain is included verbatim as [`WeightProof::recent_chain_data`]; its last
/// block is the tip the proof commits to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeightProof {
    /// Summaries of every sub-epoch up to the recent chain.
    pub sub_epochs: Vec<SubEpochData>,
    /// Serialized sub-epoch challenge segments, opaque to the wallet.
    pub sub_epoch_segments: Vec<Bytes>,
    /// The most recent header blocks of the chain, in ascending height order.
    pub recent_chain_data: Vec<HeaderBlock>,
}

impl WeightProof {
    /// Returns the block the proof ends at, if the recent chain is not empty.
    pub fn tip(&self) -> Option<&HeaderBlock> {
        self.recent_chain_data.last()
    }

    /// Returns the weight of the tip, if any.
    pub fn tip_weight(&self) -> Option<u128> {
        self.tip().map(|tip| tip.weight)
    }
}
