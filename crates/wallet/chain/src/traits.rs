//! Seams between the header chain and the consensus machinery it relies on.
//!
//! The wallet blockchain does not implement consensus rules itself. Weight
//! proof verification, header validation, difficulty adjustment, block record
//! construction and fork point search are consumed through the traits below.

use crate::{ChainError, ValidationError, WeightProofError, fork::find_fork_point_in_chain};
use alloy_primitives::B256;
use async_trait::async_trait;
use tern_primitives::{BlockRecord, ConsensusConstants, HeaderBlock, WeightProof};

/// A read-only view of the known chain.
pub trait BlockchainInterface: Send + Sync {
    /// Returns `true` if a record for `header_hash` is known.
    fn contains_block(&self, header_hash: &B256) -> bool;

    /// Returns `true` if a canonical block is recorded at `height`.
    fn contains_height(&self, height: u32) -> bool;

    /// Returns the record for `header_hash`, if known.
    fn try_block_record(&self, header_hash: &B256) -> Option<&BlockRecord>;

    /// Returns the record for `header_hash`.
    ///
    /// # Errors
    /// Returns [`ChainError::BlockNotFound`] if the record is unknown.
    fn block_record(&self, header_hash: &B256) -> Result<&BlockRecord, ChainError> {
        self.try_block_record(header_hash).ok_or(ChainError::BlockNotFound(*header_hash))
    }

    /// Returns the hash of the canonical block at `height`.
    ///
    /// # Errors
    /// Returns [`ChainError::HeightNotFound`] if no canonical block is recorded there.
    fn height_to_hash(&self, height: u32) -> Result<B256, ChainError>;
}

/// Verifies weight proofs.
#[async_trait]
pub trait WeightProofVerifier: Send + Sync {
    /// Verifies `weight_proof` and returns the block records it attests to.
    ///
    /// When `skip_segments` is set, sampled sub-epoch segments are not
    /// re-validated.
    async fn validate_weight_proof(
        &self,
        weight_proof: &WeightProof,
        skip_segments: bool,
    ) -> Result<Vec<BlockRecord>, WeightProofError>;
}

/// Validates a single header block against consensus rules.
#[async_trait]
pub trait HeaderValidator: Send + Sync {
    /// Validates `block` given the chain view and the expected difficulty and
    /// sub-slot iterations.
    ///
    /// Returns the iterations required by the block's proof of space, or
    /// `None` if the proof of space yields none.
    async fn validate_header_block(
        &self,
        constants: &ConsensusConstants,
        chain: &dyn BlockchainInterface,
        block: &HeaderBlock,
        expected_difficulty: u64,
        expected_sub_slot_iters: u64,
    ) -> Result<Option<u64>, ValidationError>;
}

/// Computes the sub-slot iterations and difficulty for the next block.
pub trait DifficultyAdjuster: Send + Sync {
    /// Returns `(sub_slot_iters, difficulty)` for the block following `prev`.
    ///
    /// Only reads records at or below `prev`.
    fn next_sub_slot_iters_and_difficulty(
        &self,
        constants: &ConsensusConstants,
        first_in_sub_slot: bool,
        prev: &BlockRecord,
        chain: &dyn BlockchainInterface,
    ) -> Result<(u64, u64), ChainError>;
}

/// Builds the [`BlockRecord`] for a validated header block.
pub trait BlockRecordBuilder: Send + Sync {
    /// Derives the record for `block`, which has already passed validation
    /// with `required_iters`.
    fn block_to_block_record(
        &self,
        constants: &ConsensusConstants,
        chain: &dyn BlockchainInterface,
        required_iters: u64,
        block: &HeaderBlock,
    ) -> Result<BlockRecord, ChainError>;
}

/// Finds the fork point of two chains.
pub trait ForkPointFinder: Send + Sync {
    /// Returns the height of the highest common ancestor of `a` and `b`, or
    /// `None` if they share no ancestor.
    ///
    /// The default walks parent links through `chain`, so both ancestries
    /// down to the fork point must be resolvable.
    fn find_fork_point(
        &self,
        chain: &dyn BlockchainInterface,
        a: &BlockRecord,
        b: &BlockRecord,
    ) -> Result<Option<u32>, ChainError> {
        find_fork_point_in_chain(chain, a, b)
    }
}

/// All consensus seams the wallet blockchain needs for single-block ingestion.
pub trait Consensus: HeaderValidator + DifficultyAdjuster + BlockRecordBuilder + ForkPointFinder {}

impl<T> Consensus for T where T: HeaderValidator + DifficultyAdjuster + BlockRecordBuilder + ForkPointFinder {}
