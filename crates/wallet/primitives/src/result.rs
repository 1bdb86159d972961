//! Outcomes of receiving a single header block.

use crate::ErrorCode;
use derive_more::Display;

/// The outcome of offering a header block to the wallet blockchain.
///
/// Every variant is an expected outcome. Rejections carry the [`ErrorCode`]
/// explaining them; hard failures such as storage errors are reported
/// separately through the caller's `Result`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiveBlockResult {
    /// The block was valid and became the new peak.
    #[display("new peak")]
    NewPeak,
    /// The block was valid but did not outweigh the current peak.
    #[display("added as orphan")]
    AddedAsOrphan,
    /// The block is already known. Nothing changed.
    #[display("already have block")]
    AlreadyHaveBlock,
    /// The block failed validation.
    #[display("invalid block: {_0}")]
    InvalidBlock(ErrorCode),
    /// The block's parent is unknown, so it cannot be validated yet.
    #[display("disconnected block: {_0}")]
    DisconnectedBlock(ErrorCode),
}

impl ReceiveBlockResult {
    /// Returns the error code carried by a rejection, if any.
    pub const fn error(&self) -> Option<ErrorCode> {
        match self {
            Self::InvalidBlock(err) | Self::DisconnectedBlock(err) => Some(*err),
            Self::NewPeak | Self::AddedAsOrphan | Self::AlreadyHaveBlock => None,
        }
    }

    /// Returns `true` if the block became the new peak.
    pub const fn is_new_peak(&self) -> bool {
        matches!(self, Self::NewPeak)
    }

    /// Returns a short, stable label, for use in logs and metrics.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NewPeak => "new_peak",
            Self::AddedAsOrphan => "added_as_orphan",
            Self::AlreadyHaveBlock => "already_have_block",
            Self::InvalidBlock(_) => "invalid_block",
            Self::DisconnectedBlock(_) => "disconnected_block",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReceiveBlockResult::NewPeak, None)]
    #[case(ReceiveBlockResult::AddedAsOrphan, None)]
    #[case(ReceiveBlockResult::AlreadyHaveBlock, None)]
    #[case(ReceiveBlockResult::InvalidBlock(ErrorCode::InvalidPospace), Some(ErrorCode::InvalidPospace))]
    #[case(
        ReceiveBlockResult::DisconnectedBlock(ErrorCode::InvalidPrevBlockHash),
        Some(ErrorCode::InvalidPrevBlockHash)
    )]
    fn test_error_code(#[case] result: ReceiveBlockResult, #[case] expected: Option<ErrorCode>) {
        assert_eq!(result.error(), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ReceiveBlockResult::InvalidBlock(ErrorCode::InvalidPospace).to_string(),
            "invalid block: invalid proof of space"
        );
        assert!(ReceiveBlockResult::NewPeak.is_new_peak());
        assert!(!ReceiveBlockResult::AddedAsOrphan.is_new_peak());
    }
}
