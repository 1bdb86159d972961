//! The wallet's header-chain state machine.

use crate::{
    BlockRecordIndex, BlockchainInterface, ChainConfig, ChainError, Consensus, ForkResolver,
    Metrics, WeightProofVerifier,
};
use alloy_primitives::B256;
use tern_primitives::{BlockRecord, ErrorCode, HeaderBlock, ReceiveBlockResult, WeightProof};
use tern_storage::{KeyValStore, PeakStore};
use tracing::{debug, info, warn};

/// Tracks the heaviest known header chain for a light wallet.
///
/// The chain is seeded from a weight proof and then extended one header block
/// at a time. Only the peak header block and the synced weight proof are
/// persisted; the [`BlockRecordIndex`] is rebuilt from the weight proof on
/// [`create`](Self::create).
///
/// Every mutating operation finishes all of its awaits, including the
/// persisted peak write, before touching in-memory state. Dropping a pending
/// mutation therefore never leaves the index half-updated. Mutations still
/// need a single writer, see [`SharedBlockchain`](crate::SharedBlockchain).
#[derive(Debug)]
pub struct WalletBlockchain<S, V, C> {
    config: ChainConfig,
    peaks: PeakStore<S>,
    index: BlockRecordIndex,
    verifier: V,
    consensus: C,
}

impl<S, V, C> WalletBlockchain<S, V, C>
where
    S: KeyValStore,
    V: WeightProofVerifier,
    C: Consensus,
{
    /// Opens the wallet blockchain on top of `store`.
    ///
    /// If a weight proof was persisted it is verified again and its records
    /// rebuild the index. The persisted peak is then re-adopted if the index
    /// still knows it and it outweighs the proof's tip. Otherwise the tip
    /// stays the peak.
    pub async fn create(
        store: S,
        verifier: V,
        consensus: C,
        config: ChainConfig,
    ) -> Result<Self, ChainError> {
        Metrics::init();
        let mut peaks = PeakStore::new(store);
        let weight_proof = peaks.get_weight_proof().await?;
        let persisted_peak = peaks.load_peak().await?;

        let mut chain =
            Self { config, peaks, index: BlockRecordIndex::new(), verifier, consensus };

        if let Some(weight_proof) = weight_proof {
            let records = chain.verify_weight_proof(&weight_proof).await?;
            chain.apply_weight_proof(weight_proof, records, false).await?;
        }
        if let Some(peak) = persisted_peak {
            chain.restore_peak(peak).await?;
        }

        info!(
            target: "wallet_blockchain",
            peak_height = chain.peak_height(),
            records = chain.index.len(),
            "Initialized wallet blockchain"
        );
        Ok(chain)
    }

    /// Offers a single header block to the chain.
    ///
    /// Consensus rejections and unknown parents are expected outcomes and are
    /// reported through [`ReceiveBlockResult`]. Only storage failures and
    /// lookups that break the index invariants return an error.
    pub async fn receive_block(
        &mut self,
        block: &HeaderBlock,
    ) -> Result<ReceiveBlockResult, ChainError> {
        let result = self.try_receive_block(block).await;
        if let Ok(outcome) = &result {
            Metrics::record_receive_block(outcome);
        }
        result
    }

    async fn try_receive_block(
        &mut self,
        block: &HeaderBlock,
    ) -> Result<ReceiveBlockResult, ChainError> {
        if self.index.contains_block(&block.header_hash) {
            debug!(
                target: "wallet_blockchain",
                height = block.height,
                header_hash = %block.header_hash,
                "Already have block"
            );
            return Ok(ReceiveBlockResult::AlreadyHaveBlock);
        }

        let constants = &self.config.constants;
        let (sub_slot_iters, difficulty) = if block.height == 0 {
            (constants.sub_slot_iters_starting, constants.difficulty_starting)
        } else {
            let Some(prev) = self.index.try_block_record(&block.prev_header_hash) else {
                debug!(
                    target: "wallet_blockchain",
                    height = block.height,
                    header_hash = %block.header_hash,
                    prev_header_hash = %block.prev_header_hash,
                    "Block parent is unknown"
                );
                return Ok(ReceiveBlockResult::DisconnectedBlock(ErrorCode::InvalidPrevBlockHash));
            };
            self.consensus.next_sub_slot_iters_and_difficulty(
                constants,
                block.first_in_sub_slot(),
                prev,
                &self.index,
            )?
        };

        let required_iters = match self
            .consensus
            .validate_header_block(constants, &self.index, block, difficulty, sub_slot_iters)
            .await
        {
            Ok(Some(required_iters)) => required_iters,
            Ok(None) => {
                warn!(
                    target: "wallet_blockchain",
                    height = block.height,
                    header_hash = %block.header_hash,
                    "Block has no valid proof of space"
                );
                return Ok(ReceiveBlockResult::InvalidBlock(ErrorCode::InvalidPospace));
            }
            Err(err) => {
                warn!(
                    target: "wallet_blockchain",
                    height = block.height,
                    header_hash = %block.header_hash,
                    %err,
                    "Block failed validation"
                );
                return Ok(ReceiveBlockResult::InvalidBlock(err.code));
            }
        };

        let record =
            self.consensus.block_to_block_record(constants, &self.index, required_iters, block)?;
        let resolved = self
            .peak_record()
            .and_then(|peak| ForkResolver::resolve(&self.consensus, &self.index, &record, peak));
        let choice = match resolved {
            Ok(choice) => choice,
            Err(err) => {
                // The block itself is valid, keep it so its children connect.
                warn!(
                    target: "wallet_blockchain",
                    height = record.height,
                    header_hash = %record.header_hash,
                    %err,
                    "Failed to resolve fork, indexing block as orphan"
                );
                self.index.add(record);
                return Err(err);
            }
        };

        let Some(rewrite_from) = choice.rewrite_from(record.height) else {
            debug!(
                target: "wallet_blockchain",
                height = record.height,
                header_hash = %record.header_hash,
                weight = record.weight,
                peak_height = self.peak_height(),
                "Added block as orphan"
            );
            self.index.add(record);
            return Ok(ReceiveBlockResult::AddedAsOrphan);
        };

        self.adopt_peak(record, block.clone(), rewrite_from).await?;
        Ok(ReceiveBlockResult::NewPeak)
    }

    /// Makes `record` the peak, rewriting canonical heights from
    /// `rewrite_from` up to the record.
    async fn adopt_peak(
        &mut self,
        record: BlockRecord,
        block: HeaderBlock,
        rewrite_from: u32,
    ) -> Result<(), ChainError> {
        // Walk back to the first rewritten height before anything is mutated.
        let mut latest_timestamp = self.peaks.latest_timestamp();
        let mut path: Vec<(u32, B256)> = Vec::new();
        let mut cursor = &record;
        loop {
            path.push((cursor.height, cursor.header_hash));
            if let Some(timestamp) = cursor.timestamp {
                latest_timestamp = latest_timestamp.max(timestamp);
            }
            if cursor.height <= rewrite_from {
                break;
            }
            cursor = self.index.block_record(&cursor.prev_hash)?;
        }

        let old_peak = self.peaks.peak().map(|peak| (peak.height, peak.header_hash));
        self.peaks.set_peak(block, Some(latest_timestamp)).await?;

        let (height, header_hash, weight) = (record.height, record.header_hash, record.weight);
        self.index.add(record);
        self.index.remove_heights_from(rewrite_from);
        for (height, hash) in path {
            self.index.set_height(height, hash);
        }
        self.prune(height);
        Metrics::record_peak(height);

        match old_peak {
            Some((old_height, old_hash)) if rewrite_from <= old_height => {
                let depth = old_height + 1 - rewrite_from;
                warn!(
                    target: "wallet_blockchain",
                    height,
                    %header_hash,
                    weight,
                    old_height,
                    %old_hash,
                    fork_height = rewrite_from.checked_sub(1),
                    depth,
                    "Reorged to heavier chain"
                );
                Metrics::record_reorg(depth);
            }
            _ => {
                info!(
                    target: "wallet_blockchain",
                    height,
                    %header_hash,
                    weight,
                    latest_timestamp,
                    "New peak"
                );
            }
        }
        Ok(())
    }

    /// Adopts `weight_proof` as the canonical chain if its tip outweighs the
    /// current peak.
    ///
    /// `records` are the block records the proof attests to. When absent the
    /// proof is verified and the verifier's records are used. Returns `false`
    /// without touching any state if the proof is not strictly heavier than
    /// the peak.
    ///
    /// # Errors
    /// Fails if the proof is empty, fails verification, or its tip is missing
    /// from the records, and on storage failures.
    pub async fn new_weight_proof(
        &mut self,
        weight_proof: WeightProof,
        records: Option<Vec<BlockRecord>>,
    ) -> Result<bool, ChainError> {
        let tip_weight = weight_proof.tip_weight().ok_or(ChainError::EmptyWeightProof)?;
        if let Some(peak) = self.peaks.peak() {
            if !ForkResolver::is_better(tip_weight, peak.weight) {
                debug!(
                    target: "wallet_blockchain",
                    tip_weight,
                    peak_weight = peak.weight,
                    "Ignoring weight proof that does not outweigh the peak"
                );
                return Ok(false);
            }
        }

        let records = match records {
            Some(records) => records,
            None => self.verify_weight_proof(&weight_proof).await?,
        };
        self.apply_weight_proof(weight_proof, records, true).await?;
        Ok(true)
    }

    async fn verify_weight_proof(
        &self,
        weight_proof: &WeightProof,
    ) -> Result<Vec<BlockRecord>, ChainError> {
        Ok(self
            .verifier
            .validate_weight_proof(weight_proof, self.config.skip_weight_proof_segments)
            .await
            .inspect_err(|err| {
                warn!(
                    target: "wallet_blockchain",
                    tip_height = weight_proof.tip().map(|tip| tip.height),
                    %err,
                    "Weight proof failed verification"
                );
            })?)
    }

    /// Replaces the canonical chain with the one described by a verified
    /// weight proof.
    async fn apply_weight_proof(
        &mut self,
        weight_proof: WeightProof,
        records: Vec<BlockRecord>,
        persist_proof: bool,
    ) -> Result<(), ChainError> {
        let tip = weight_proof.tip().cloned().ok_or(ChainError::EmptyWeightProof)?;
        if !records.iter().any(|record| record.header_hash == tip.header_hash) {
            warn!(
                target: "wallet_blockchain",
                height = tip.height,
                header_hash = %tip.header_hash,
                "Weight proof records do not include its tip"
            );
            return Err(ChainError::WeightProofTipMissing(tip.header_hash));
        }

        let latest_timestamp = records
            .iter()
            .filter_map(|record| record.timestamp)
            .fold(self.peaks.latest_timestamp(), u64::max);

        if persist_proof {
            self.peaks.set_weight_proof(weight_proof).await?;
        }
        let (height, header_hash, weight) = (tip.height, tip.header_hash, tip.weight);
        self.peaks.set_peak(tip, Some(latest_timestamp)).await?;

        // The proof's chain replaces the whole canonical height map.
        let count = records.len();
        self.index.remove_heights_from(0);
        for record in records {
            self.index.set_height(record.height, record.header_hash);
            self.index.add(record);
        }
        self.prune(height);
        Metrics::record_peak(height);
        Metrics::record_weight_proof_adopted();

        info!(
            target: "wallet_blockchain",
            height,
            %header_hash,
            weight,
            records = count,
            latest_timestamp,
            "Adopted weight proof"
        );
        Ok(())
    }

    /// Re-adopts a persisted peak after the index was rebuilt.
    async fn restore_peak(&mut self, peak: HeaderBlock) -> Result<(), ChainError> {
        if self.peaks.peak().is_some_and(|current| current.header_hash == peak.header_hash) {
            return Ok(());
        }
        let Some(record) = self.index.try_block_record(&peak.header_hash).cloned() else {
            warn!(
                target: "wallet_blockchain",
                height = peak.height,
                header_hash = %peak.header_hash,
                "Persisted peak has no block record, not restoring it"
            );
            return Ok(());
        };

        let choice =
            ForkResolver::resolve(&self.consensus, &self.index, &record, self.peak_record()?)?;
        match choice.rewrite_from(record.height) {
            Some(rewrite_from) => self.adopt_peak(record, peak, rewrite_from).await,
            None => {
                warn!(
                    target: "wallet_blockchain",
                    height = peak.height,
                    header_hash = %peak.header_hash,
                    "Persisted peak does not outweigh the weight proof, not restoring it"
                );
                Ok(())
            }
        }
    }

    /// Drops all chain state, in memory and persisted.
    ///
    /// The next weight proof is adopted regardless of its weight.
    pub async fn reset(&mut self) -> Result<(), ChainError> {
        self.peaks.clear_weight_proof().await?;
        self.peaks.clear_peak().await?;
        self.index = BlockRecordIndex::new();
        Metrics::record_peak(0);
        warn!(target: "wallet_blockchain", "Reset wallet blockchain");
        Ok(())
    }
}

impl<S, V, C> WalletBlockchain<S, V, C> {
    fn prune(&mut self, peak_height: u32) {
        let Some(floor) = self.config.retention_floor(peak_height) else {
            return;
        };
        let evicted = self.index.prune_below(floor);
        if evicted > 0 {
            debug!(target: "wallet_blockchain", floor, evicted, "Evicted old block records");
        }
        Metrics::record_evicted(evicted);
    }

    /// Returns the peak header block.
    pub const fn peak(&self) -> Option<&HeaderBlock> {
        self.peaks.peak()
    }

    /// Returns the peak height, or `0` if there is no peak.
    pub fn peak_height(&self) -> u32 {
        self.peak().map_or(0, |peak| peak.height)
    }

    /// Returns the block record of the peak.
    pub fn peak_record(&self) -> Result<Option<&BlockRecord>, ChainError> {
        self.peak().map(|peak| self.index.block_record(&peak.header_hash)).transpose()
    }

    /// Returns the highest transaction-block timestamp seen on the canonical
    /// chain.
    pub const fn latest_timestamp(&self) -> u64 {
        self.peaks.latest_timestamp()
    }

    /// Returns the last adopted weight proof.
    pub const fn synced_weight_proof(&self) -> Option<&WeightProof> {
        self.peaks.synced_weight_proof()
    }

    /// Returns `true` if a record for `header_hash` is known.
    pub fn contains_block(&self, header_hash: &B256) -> bool {
        self.index.contains_block(header_hash)
    }

    /// Returns `true` if a canonical block is recorded at `height`.
    pub fn contains_height(&self, height: u32) -> bool {
        self.index.contains_height(height)
    }

    /// Returns the hash of the canonical block at `height`.
    pub fn height_to_hash(&self, height: u32) -> Result<B256, ChainError> {
        self.index.height_to_hash(height)
    }

    /// Returns the record for `header_hash`.
    pub fn block_record(&self, header_hash: &B256) -> Result<&BlockRecord, ChainError> {
        self.index.block_record(header_hash)
    }

    /// Returns the record for `header_hash`, if known.
    pub fn try_block_record(&self, header_hash: &B256) -> Option<&BlockRecord> {
        self.index.try_block_record(header_hash)
    }

    /// Returns the block record index.
    pub const fn index(&self) -> &BlockRecordIndex {
        &self.index
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Returns the weight proof verifier.
    pub const fn verifier(&self) -> &V {
        &self.verifier
    }
}
