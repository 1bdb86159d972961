//! Consensus error codes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes reported when a header block fails consensus checks.
///
/// Codes are stable and travel with [`ReceiveBlockResult`](crate::ReceiveBlockResult)
/// so that the sync layer can decide whether to penalize the peer that sent the
/// block, fetch missing ancestors, or drop it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Error, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    /// The block's parent is not known.
    #[error("invalid prev block hash")]
    InvalidPrevBlockHash = 6,
    /// The proof of space does not satisfy the required iterations.
    #[error("invalid proof of space")]
    InvalidPospace = 9,
    /// The block height does not follow its parent.
    #[error("invalid height")]
    InvalidHeight = 10,
    /// The block weight is not the parent weight plus the expected difficulty.
    #[error("invalid weight")]
    InvalidWeight = 11,
    /// The total iterations do not match the expected value.
    #[error("invalid total iters")]
    InvalidTotalIters = 12,
    /// The block timestamp is not after the previous transaction block.
    #[error("timestamp too far in past")]
    TimestampTooFarInPast = 13,
    /// The block timestamp is too far ahead of the local clock.
    #[error("timestamp too far in future")]
    TimestampTooFarInFuture = 14,
    /// A finished sub-slot does not chain from the previous one.
    #[error("invalid prev challenge slot hash")]
    InvalidPrevChallengeSlotHash = 15,
    /// The signage point index is out of range.
    #[error("invalid signage point index")]
    InvalidSpIndex = 16,
    /// A VDF proof in the block failed to verify.
    #[error("invalid VDF")]
    InvalidVdf = 17,
    /// The block's sub-slot iterations do not match the expected value.
    #[error("invalid new sub slot iters")]
    InvalidNewSubSlotIters = 18,
    /// The block's difficulty does not match the expected value.
    #[error("invalid new difficulty")]
    InvalidNewDifficulty = 19,
    /// The deficit does not match the expected value.
    #[error("invalid deficit")]
    InvalidDeficit = 20,
    /// The foliage signature or hashes are inconsistent.
    #[error("invalid foliage")]
    InvalidFoliage = 21,
    /// The transactions filter hash does not match the filter.
    #[error("invalid transactions filter hash")]
    InvalidTransactionsFilterHash = 22,
    /// The reward chain hash is inconsistent with the block's contents.
    #[error("invalid reward chain hash")]
    InvalidRewardChainHash = 23,
    /// The block did not finish a sub-slot it was required to finish.
    #[error("should have finished sub slot")]
    ShouldHaveFinishedSubSlot = 24,
    /// Any validator failure without a more specific code.
    #[error("unknown")]
    Unknown = 1,
}

impl ErrorCode {
    /// Returns the numeric code.
    pub const fn code(self) -> u16 {
        self as u16
    }
}
