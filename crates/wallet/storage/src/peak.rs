//! Durable single-slot storage for the peak and the synced weight proof.

use crate::{KeyValStore, KeyValStoreExt, StorageError};
use tern_primitives::{HeaderBlock, WeightProof};
use tracing::{debug, error};

/// Key under which the peak header block is persisted.
pub const PEAK_BLOCK_KEY: &str = "PEAK_BLOCK";

/// Key under which the synced weight proof is persisted.
pub const SYNCED_WEIGHT_PROOF_KEY: &str = "SYNCED_WEIGHT_PROOF";

/// Persists the peak header block and the synced weight proof, and mirrors
/// both in memory together with the latest known transaction-block timestamp.
///
/// Writes go to the backing store first and only then to the mirror, so the
/// mirror never runs ahead of what is persisted. Replacing the peak is a
/// single overwriting write; there is no window in which no peak is stored.
#[derive(Debug)]
pub struct PeakStore<S> {
    store: S,
    peak: Option<HeaderBlock>,
    synced_weight_proof: Option<WeightProof>,
    latest_timestamp: u64,
}

impl<S> PeakStore<S> {
    /// Creates a new [`PeakStore`] with an empty mirror.
    pub const fn new(store: S) -> Self {
        Self { store, peak: None, synced_weight_proof: None, latest_timestamp: 0 }
    }

    /// Returns the mirrored peak without touching the backing store.
    pub const fn peak(&self) -> Option<&HeaderBlock> {
        self.peak.as_ref()
    }

    /// Returns the mirrored weight proof without touching the backing store.
    pub const fn synced_weight_proof(&self) -> Option<&WeightProof> {
        self.synced_weight_proof.as_ref()
    }

    /// Returns the latest known transaction-block timestamp.
    pub const fn latest_timestamp(&self) -> u64 {
        self.latest_timestamp
    }

    /// Returns the backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S> PeakStore<S>
where
    S: KeyValStore,
{
    /// Returns the peak, loading it from the backing store and caching it if
    /// the mirror is empty.
    pub async fn get_peak(&mut self) -> Result<Option<HeaderBlock>, StorageError> {
        if self.peak.is_none() {
            self.peak = self.load_peak().await?;
        }
        Ok(self.peak.clone())
    }

    /// Reads the persisted peak without caching it.
    pub async fn load_peak(&self) -> Result<Option<HeaderBlock>, StorageError> {
        self.store.get_object(PEAK_BLOCK_KEY).await.inspect_err(|err| {
            error!(target: "wallet_storage", %err, "Failed to load peak block");
        })
    }

    /// Persists `block` as the peak and updates the mirror.
    ///
    /// The latest timestamp is set to `timestamp` if given. Otherwise it is
    /// taken from the block if it is a transaction block, and left unchanged
    /// if it is not.
    pub async fn set_peak(
        &mut self,
        block: HeaderBlock,
        timestamp: Option<u64>,
    ) -> Result<(), StorageError> {
        self.store.set_object(PEAK_BLOCK_KEY, &block).await.inspect_err(|err| {
            error!(
                target: "wallet_storage",
                height = block.height,
                header_hash = %block.header_hash,
                %err,
                "Failed to store peak block"
            );
        })?;

        if let Some(timestamp) = timestamp.or_else(|| block.timestamp()) {
            self.latest_timestamp = timestamp;
        }
        debug!(
            target: "wallet_storage",
            height = block.height,
            header_hash = %block.header_hash,
            latest_timestamp = self.latest_timestamp,
            "Stored peak block"
        );
        self.peak = Some(block);
        Ok(())
    }

    /// Removes the persisted peak and clears the mirror and latest timestamp.
    pub async fn clear_peak(&mut self) -> Result<(), StorageError> {
        self.store.remove_object(PEAK_BLOCK_KEY).await.inspect_err(|err| {
            error!(target: "wallet_storage", %err, "Failed to remove peak block");
        })?;
        self.peak = None;
        self.latest_timestamp = 0;
        Ok(())
    }

    /// Returns the synced weight proof, loading it from the backing store and
    /// caching it if the mirror is empty.
    pub async fn get_weight_proof(&mut self) -> Result<Option<WeightProof>, StorageError> {
        if self.synced_weight_proof.is_none() {
            self.synced_weight_proof =
                self.store.get_object(SYNCED_WEIGHT_PROOF_KEY).await.inspect_err(|err| {
                    error!(target: "wallet_storage", %err, "Failed to load weight proof");
                })?;
        }
        Ok(self.synced_weight_proof.clone())
    }

    /// Persists `weight_proof` as the synced weight proof and updates the mirror.
    pub async fn set_weight_proof(&mut self, weight_proof: WeightProof) -> Result<(), StorageError> {
        self.store.set_object(SYNCED_WEIGHT_PROOF_KEY, &weight_proof).await.inspect_err(
            |err| {
                error!(target: "wallet_storage", %err, "Failed to store weight proof");
            },
        )?;
        self.synced_weight_proof = Some(weight_proof);
        Ok(())
    }

    /// Removes the persisted weight proof and clears the mirror.
    pub async fn clear_weight_proof(&mut self) -> Result<(), StorageError> {
        self.store.remove_object(SYNCED_WEIGHT_PROOF_KEY).await.inspect_err(|err| {
            error!(target: "wallet_storage", %err, "Failed to remove weight proof");
        })?;
        self.synced_weight_proof = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use alloy_primitives::B256;
    use async_trait::async_trait;
    use mockall::mock;
    use rstest::rstest;
    use std::sync::Arc;
    use tern_primitives::FoliageTransactionBlock;

    mock!(
        #[derive(Debug)]
        pub Store {}

        #[async_trait]
        impl KeyValStore for Store {
            async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
            async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
            async fn remove(&self, key: &str) -> Result<(), StorageError>;
        }
    );

    fn block(height: u32, timestamp: Option<u64>) -> HeaderBlock {
        HeaderBlock {
            header_hash: B256::repeat_byte(height as u8 + 1),
            height,
            weight: height as u128 * 10,
            foliage_transaction_block: timestamp
                .map(|timestamp| FoliageTransactionBlock { timestamp, ..Default::default() }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_peak_loads_from_store_and_caches() {
        let store = Arc::new(MemoryStore::new());
        let mut writer = PeakStore::new(store.clone());
        writer.set_peak(block(4, Some(100)), None).await.unwrap();

        let mut reader = PeakStore::new(store.clone());
        assert!(reader.peak().is_none());
        assert_eq!(reader.get_peak().await.unwrap(), Some(block(4, Some(100))));
        assert_eq!(reader.peak(), Some(&block(4, Some(100))));

        // The mirror is served even after the persisted value disappears.
        store.remove(PEAK_BLOCK_KEY).await.unwrap();
        assert_eq!(reader.get_peak().await.unwrap(), Some(block(4, Some(100))));
    }

    #[rstest]
    #[case::own_timestamp(Some(130), None, 130)]
    #[case::non_transaction_block(None, None, 100)]
    #[case::explicit_wins(Some(130), Some(125), 125)]
    #[case::explicit_without_own(None, Some(90), 90)]
    #[tokio::test]
    async fn test_set_peak_timestamp_rules(
        #[case] own: Option<u64>,
        #[case] explicit: Option<u64>,
        #[case] expected: u64,
    ) {
        let mut peaks = PeakStore::new(MemoryStore::new());
        peaks.set_peak(block(1, Some(100)), None).await.unwrap();
        assert_eq!(peaks.latest_timestamp(), 100);

        peaks.set_peak(block(2, own), explicit).await.unwrap();
        assert_eq!(peaks.latest_timestamp(), expected);
    }

    #[tokio::test]
    async fn test_clear_peak_removes_persisted_value() {
        let store = Arc::new(MemoryStore::new());
        let mut peaks = PeakStore::new(store.clone());
        peaks.set_peak(block(1, Some(100)), None).await.unwrap();

        peaks.clear_peak().await.unwrap();
        assert!(peaks.peak().is_none());
        assert_eq!(peaks.latest_timestamp(), 0);
        assert_eq!(store.get(PEAK_BLOCK_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_weight_proof_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let wp = WeightProof { recent_chain_data: vec![block(9, None)], ..Default::default() };

        let mut peaks = PeakStore::new(store.clone());
        peaks.set_weight_proof(wp.clone()).await.unwrap();

        let mut reopened = PeakStore::new(store.clone());
        assert_eq!(reopened.get_weight_proof().await.unwrap(), Some(wp));

        reopened.clear_weight_proof().await.unwrap();
        assert!(reopened.synced_weight_proof().is_none());
        assert_eq!(store.get(SYNCED_WEIGHT_PROOF_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_mirror_untouched() {
        let mut store = MockStore::new();
        store
            .expect_set()
            .times(1)
            .returning(|_, _| Err(StorageError::Database("disk full".to_string())));

        let mut peaks = PeakStore::new(store);
        let result = peaks.set_peak(block(1, Some(100)), None).await;

        assert!(matches!(result, Err(StorageError::Database(_))));
        assert!(peaks.peak().is_none());
        assert_eq!(peaks.latest_timestamp(), 0);
    }
}
