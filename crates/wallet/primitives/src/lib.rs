#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod block;
pub use block::{EndOfSubSlot, FoliageTransactionBlock, HeaderBlock};

mod record;
pub use record::BlockRecord;

mod weight_proof;
pub use weight_proof::{SubEpochData, WeightProof};

mod constants;
pub use constants::ConsensusConstants;

mod errors;
pub use errors::ErrorCode;

mod result;
pub use result::ReceiveBlockResult;
