#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::{ChainError, ValidationError, WeightProofError};

mod traits;
pub use traits::{
    BlockRecordBuilder, BlockchainInterface, Consensus, DifficultyAdjuster, ForkPointFinder,
    HeaderValidator, WeightProofVerifier,
};

mod index;
pub use index::BlockRecordIndex;

mod fork;
pub use fork::{ForkChoice, ForkResolver, find_fork_point_in_chain};

mod config;
pub use config::{ChainConfig, ConfigError, DEFAULT_BLOCK_RETENTION};

mod metrics;
pub use metrics::Metrics;

mod blockchain;
pub use blockchain::WalletBlockchain;

mod shared;
pub use shared::SharedBlockchain;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
