//! A cloneable, single-writer handle to the wallet blockchain.

use crate::{ChainError, Consensus, WalletBlockchain, WeightProofVerifier};
use alloy_primitives::B256;
use std::sync::Arc;
use tern_primitives::{BlockRecord, HeaderBlock, ReceiveBlockResult, WeightProof};
use tern_storage::KeyValStore;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Shares a [`WalletBlockchain`] between tasks.
///
/// Mutations take the write lock for their whole duration, so they never
/// interleave. Queries take the read lock and observe the state as of the
/// last completed mutation.
#[derive(Debug)]
pub struct SharedBlockchain<S, V, C> {
    inner: Arc<RwLock<WalletBlockchain<S, V, C>>>,
}

impl<S, V, C> Clone for SharedBlockchain<S, V, C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S, V, C> SharedBlockchain<S, V, C> {
    /// Wraps `chain`.
    pub fn new(chain: WalletBlockchain<S, V, C>) -> Self {
        Self { inner: Arc::new(RwLock::new(chain)) }
    }

    /// Acquires the read lock for a consistent view across several queries.
    pub async fn read(&self) -> RwLockReadGuard<'_, WalletBlockchain<S, V, C>> {
        self.inner.read().await
    }

    /// Returns a copy of the peak header block.
    pub async fn peak(&self) -> Option<HeaderBlock> {
        self.inner.read().await.peak().cloned()
    }

    /// Returns the peak height, or `0` if there is no peak.
    pub async fn peak_height(&self) -> u32 {
        self.inner.read().await.peak_height()
    }

    /// Returns the latest known transaction-block timestamp.
    pub async fn latest_timestamp(&self) -> u64 {
        self.inner.read().await.latest_timestamp()
    }

    /// Returns `true` if a record for `header_hash` is known.
    pub async fn contains_block(&self, header_hash: &B256) -> bool {
        self.inner.read().await.contains_block(header_hash)
    }

    /// Returns the hash of the canonical block at `height`.
    pub async fn height_to_hash(&self, height: u32) -> Result<B256, ChainError> {
        self.inner.read().await.height_to_hash(height)
    }

    /// Returns a copy of the record for `header_hash`.
    pub async fn block_record(&self, header_hash: &B256) -> Result<BlockRecord, ChainError> {
        self.inner.read().await.block_record(header_hash).cloned()
    }
}

impl<S, V, C> SharedBlockchain<S, V, C>
where
    S: KeyValStore,
    V: WeightProofVerifier,
    C: Consensus,
{
    /// See [`WalletBlockchain::receive_block`].
    pub async fn receive_block(
        &self,
        block: &HeaderBlock,
    ) -> Result<ReceiveBlockResult, ChainError> {
        self.inner.write().await.receive_block(block).await
    }

    /// See [`WalletBlockchain::new_weight_proof`].
    pub async fn new_weight_proof(
        &self,
        weight_proof: WeightProof,
        records: Option<Vec<BlockRecord>>,
    ) -> Result<bool, ChainError> {
        self.inner.write().await.new_weight_proof(weight_proof, records).await
    }

    /// See [`WalletBlockchain::reset`].
    pub async fn reset(&self) -> Result<(), ChainError> {
        self.inner.write().await.reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ChainConfig,
        test_utils::{TestConsensus, TestVerifier, build_chain, weight_proof},
    };
    use tern_storage::MemoryStore;

    async fn shared() -> SharedBlockchain<MemoryStore, TestVerifier, TestConsensus> {
        let chain = WalletBlockchain::create(
            MemoryStore::new(),
            TestVerifier::new(),
            TestConsensus::new(),
            ChainConfig::default(),
        )
        .await
        .unwrap();
        SharedBlockchain::new(chain)
    }

    #[tokio::test]
    async fn test_concurrent_writers_are_serialized() {
        let chain = shared().await;
        let blocks = build_chain(0, None, 1, 10);
        chain.receive_block(&blocks[0]).await.unwrap();

        // Two heavier siblings race; exactly one wins, the other is either an
        // orphan or a reorg onto a strictly heavier block.
        let a = build_chain(1, Some(&blocks[0]), 3, 10);
        let b = build_chain(2, Some(&blocks[0]), 3, 11);

        let (ca, cb) = (chain.clone(), chain.clone());
        let ta = tokio::spawn(async move {
            for block in &a {
                ca.receive_block(block).await.unwrap();
            }
        });
        let tb = tokio::spawn(async move {
            for block in &b {
                cb.receive_block(block).await.unwrap();
            }
        });
        ta.await.unwrap();
        tb.await.unwrap();

        let peak = chain.peak().await.unwrap();
        assert_eq!(peak.header_hash, build_chain(2, Some(&blocks[0]), 3, 11)[2].header_hash);
        assert_eq!(chain.peak_height().await, 3);
        for height in 1..=3 {
            let hash = chain.height_to_hash(height).await.unwrap();
            assert_eq!(chain.block_record(&hash).await.unwrap().height, height);
        }
    }

    #[tokio::test]
    async fn test_weight_proof_and_reset_through_handle() {
        let chain = shared().await;
        let blocks = build_chain(0, None, 6, 10);

        assert!(chain.new_weight_proof(weight_proof(&blocks), None).await.unwrap());
        assert_eq!(chain.peak_height().await, 5);
        assert!(chain.contains_block(&blocks[3].header_hash).await);
        {
            let view = chain.read().await;
            assert_eq!(view.peak_height(), 5);
            assert_eq!(view.height_to_hash(5).unwrap(), blocks[5].header_hash);
        }

        chain.reset().await.unwrap();
        assert!(chain.peak().await.is_none());
        assert_eq!(chain.latest_timestamp().await, 0);
    }
}
