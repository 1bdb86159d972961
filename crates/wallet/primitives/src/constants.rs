//! Consensus constants.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Consensus constants the wallet needs to validate header blocks.
///
/// Only the subset consulted by the header chain is modelled here. The
/// starting values are used for the genesis block, which has no parent to
/// derive sub-slot iterations and difficulty from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsensusConstants {
    /// Sub-slot iterations for the first epoch.
    pub sub_slot_iters_starting: u64,
    /// Difficulty for the first epoch.
    pub difficulty_starting: u64,
    /// Number of blocks per sub-epoch.
    pub sub_epoch_blocks: u32,
    /// Number of blocks per epoch.
    pub epoch_blocks: u32,
    /// Number of recent blocks included verbatim in a weight proof.
    pub weight_proof_recent_blocks: u32,
    /// Challenge of the genesis block.
    pub genesis_challenge: B256,
}

impl ConsensusConstants {
    /// Mainnet-style defaults.
    pub const MAINNET: Self = Self {
        sub_slot_iters_starting: 1 << 27,
        difficulty_starting: 7,
        sub_epoch_blocks: 384,
        epoch_blocks: 4608,
        weight_proof_recent_blocks: 1000,
        genesis_challenge: B256::ZERO,
    };
}

impl Default for ConsensusConstants {
    fn default() -> Self {
        Self::MAINNET
    }
}
