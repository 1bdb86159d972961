use alloy_primitives::B256;
use tern_primitives::ErrorCode;
use tern_storage::StorageError;
use thiserror::Error;

/// Hard failures of the wallet blockchain.
///
/// Expected outcomes of offering a block, including consensus rejections, are
/// reported as [`ReceiveBlockResult`](tern_primitives::ReceiveBlockResult)
/// values instead.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The requested block record is not in the index.
    #[error("block {0} not found")]
    BlockNotFound(B256),

    /// No canonical block is recorded at the requested height.
    #[error("no canonical block at height {0}")]
    HeightNotFound(u32),

    /// The weight proof verifier rejected the proof.
    #[error(transparent)]
    WeightProofRejected(#[from] WeightProofError),

    /// The weight proof carries no recent chain data, so it has no tip.
    #[error("weight proof has no recent chain data")]
    EmptyWeightProof,

    /// The records backing a weight proof do not include its tip.
    #[error("weight proof tip {0} has no block record")]
    WeightProofTipMissing(B256),

    /// Represents an error that occurred while interacting with the storage layer.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error returned by a [`WeightProofVerifier`](crate::WeightProofVerifier).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightProofError {
    /// The proof failed verification.
    #[error("weight proof failed verification: {0}")]
    Invalid(String),
}

/// Error returned by a [`HeaderValidator`](crate::HeaderValidator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("header validation failed: {code}")]
pub struct ValidationError {
    /// The consensus error code.
    pub code: ErrorCode,
    /// Optional detail from the validator.
    pub message: Option<String>,
}

impl ValidationError {
    /// Creates a new [`ValidationError`] without detail.
    pub const fn new(code: ErrorCode) -> Self {
        Self { code, message: None }
    }

    /// Attaches a detail message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
