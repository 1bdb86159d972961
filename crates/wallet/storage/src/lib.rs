#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::StorageError;

mod traits;
pub use traits::{KeyValStore, KeyValStoreExt};

mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "rocksdb")]
mod rocks;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksStore;

mod peak;
pub use peak::{PEAK_BLOCK_KEY, PeakStore, SYNCED_WEIGHT_PROOF_KEY};
