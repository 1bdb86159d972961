//! Test utilities for the wallet blockchain.

use crate::{
    BlockRecordBuilder, BlockchainInterface, ChainError, DifficultyAdjuster, ForkPointFinder,
    HeaderValidator, ValidationError, WeightProofError, WeightProofVerifier,
};
use alloy_primitives::{
    B256,
    map::{B256HashMap, B256HashSet},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tern_primitives::{
    BlockRecord, ConsensusConstants, FoliageTransactionBlock, HeaderBlock, WeightProof,
};

/// Timestamp of the genesis block built by [`build_chain`].
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Required iterations reported by [`TestConsensus`] for valid blocks.
pub const TEST_REQUIRED_ITERS: u64 = 1024;

/// Installs a `tracing` subscriber that writes to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Deterministic header hash for the block at `height` on branch `branch`.
pub fn block_hash(branch: u8, height: u32) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[0] = branch.wrapping_add(1);
    bytes[28..].copy_from_slice(&height.to_be_bytes());
    B256::from(bytes)
}

/// Builds a header block. It is a transaction block iff `timestamp` is set.
pub fn header_block(
    branch: u8,
    height: u32,
    prev_header_hash: B256,
    weight: u128,
    timestamp: Option<u64>,
) -> HeaderBlock {
    HeaderBlock {
        header_hash: block_hash(branch, height),
        prev_header_hash,
        height,
        weight,
        total_iters: height as u128 * TEST_REQUIRED_ITERS as u128,
        foliage_transaction_block: timestamp
            .map(|timestamp| FoliageTransactionBlock { timestamp, ..Default::default() }),
        ..Default::default()
    }
}

/// Builds `len` consecutive header blocks on branch `branch`.
///
/// The chain continues from `parent`, or starts at a weightless genesis block
/// if there is none. Each block adds `weight_step` to its parent's weight.
/// Even heights are transaction blocks stamped twenty seconds apart.
pub fn build_chain(
    branch: u8,
    parent: Option<&HeaderBlock>,
    len: u32,
    weight_step: u128,
) -> Vec<HeaderBlock> {
    let mut blocks: Vec<HeaderBlock> = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let prev = blocks.last().or(parent);
        let (height, prev_hash, weight) = match prev {
            Some(prev) => (prev.height + 1, prev.header_hash, prev.weight + weight_step),
            None => (0, B256::ZERO, 0),
        };
        let timestamp = (height % 2 == 0).then(|| GENESIS_TIMESTAMP + height as u64 * 20);
        blocks.push(header_block(branch, height, prev_hash, weight, timestamp));
    }
    blocks
}

/// Derives the block record [`TestConsensus`] builds for `block`.
pub fn header_to_record(block: &HeaderBlock) -> BlockRecord {
    BlockRecord {
        header_hash: block.header_hash,
        prev_hash: block.prev_header_hash,
        height: block.height,
        weight: block.weight,
        total_iters: block.total_iters,
        signage_point_index: block.signage_point_index,
        required_iters: TEST_REQUIRED_ITERS,
        first_in_sub_slot: block.first_in_sub_slot(),
        timestamp: block.timestamp(),
        prev_transaction_block_hash: block
            .foliage_transaction_block
            .as_ref()
            .map(|ftb| ftb.prev_transaction_block_hash),
        ..Default::default()
    }
}

/// Wraps `blocks` in a weight proof whose recent chain data is the blocks.
pub fn weight_proof(blocks: &[HeaderBlock]) -> WeightProof {
    WeightProof { recent_chain_data: blocks.to_vec(), ..Default::default() }
}

/// Consensus collaborators with scripted outcomes.
///
/// Every block validates unless it was registered as invalid or as lacking a
/// proof of space. Difficulty never adjusts.
#[derive(Debug, Default)]
pub struct TestConsensus {
    invalid: B256HashMap<ValidationError>,
    no_pospace: B256HashSet,
}

impl TestConsensus {
    /// Creates a [`TestConsensus`] that accepts every block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the block `header_hash` with `err`.
    pub fn reject(mut self, header_hash: B256, err: ValidationError) -> Self {
        self.invalid.insert(header_hash, err);
        self
    }

    /// Reports no required iterations for the block `header_hash`.
    pub fn without_pospace(mut self, header_hash: B256) -> Self {
        self.no_pospace.insert(header_hash);
        self
    }
}

#[async_trait]
impl HeaderValidator for TestConsensus {
    async fn validate_header_block(
        &self,
        _constants: &ConsensusConstants,
        _chain: &dyn BlockchainInterface,
        block: &HeaderBlock,
        _expected_difficulty: u64,
        _expected_sub_slot_iters: u64,
    ) -> Result<Option<u64>, ValidationError> {
        if let Some(err) = self.invalid.get(&block.header_hash) {
            return Err(err.clone());
        }
        if self.no_pospace.contains(&block.header_hash) {
            return Ok(None);
        }
        Ok(Some(TEST_REQUIRED_ITERS))
    }
}

impl DifficultyAdjuster for TestConsensus {
    fn next_sub_slot_iters_and_difficulty(
        &self,
        constants: &ConsensusConstants,
        _first_in_sub_slot: bool,
        _prev: &BlockRecord,
        _chain: &dyn BlockchainInterface,
    ) -> Result<(u64, u64), ChainError> {
        Ok((constants.sub_slot_iters_starting, constants.difficulty_starting))
    }
}

impl BlockRecordBuilder for TestConsensus {
    fn block_to_block_record(
        &self,
        constants: &ConsensusConstants,
        _chain: &dyn BlockchainInterface,
        required_iters: u64,
        block: &HeaderBlock,
    ) -> Result<BlockRecord, ChainError> {
        Ok(BlockRecord {
            required_iters,
            sub_slot_iters: constants.sub_slot_iters_starting,
            ..header_to_record(block)
        })
    }
}

impl ForkPointFinder for TestConsensus {}

/// A weight proof verifier that derives records from the recent chain data.
#[derive(Debug, Default)]
pub struct TestVerifier {
    rejection: Option<WeightProofError>,
    calls: AtomicUsize,
}

impl TestVerifier {
    /// Creates a verifier that accepts every proof.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a verifier that rejects every proof with `err`.
    pub fn rejecting(err: WeightProofError) -> Self {
        Self { rejection: Some(err), calls: AtomicUsize::new(0) }
    }

    /// Number of proofs verified so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl WeightProofVerifier for TestVerifier {
    async fn validate_weight_proof(
        &self,
        weight_proof: &WeightProof,
        _skip_segments: bool,
    ) -> Result<Vec<BlockRecord>, WeightProofError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = &self.rejection {
            return Err(err.clone());
        }
        Ok(weight_proof.recent_chain_data.iter().map(header_to_record).collect())
    }
}
