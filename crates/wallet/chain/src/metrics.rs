use tern_primitives::ReceiveBlockResult;

/// Metrics recorded by the wallet blockchain.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Height of the current peak.
    pub const WALLET_PEAK_HEIGHT: &'static str = "tern_wallet_peak_height";
    /// Outcomes of offered header blocks, labelled by result.
    pub const WALLET_RECEIVE_BLOCK_TOTAL: &'static str = "tern_wallet_receive_block_total";
    /// Peak changes that discarded part of the canonical chain.
    pub const WALLET_REORG_TOTAL: &'static str = "tern_wallet_reorg_total";
    /// Number of canonical heights discarded per reorg.
    pub const WALLET_REORG_DEPTH: &'static str = "tern_wallet_reorg_depth";
    /// Weight proofs adopted as the canonical chain.
    pub const WALLET_WEIGHT_PROOF_ADOPTED_TOTAL: &'static str =
        "tern_wallet_weight_proof_adopted_total";
    /// Block records evicted by the retention policy.
    pub const WALLET_EVICTED_RECORDS_TOTAL: &'static str = "tern_wallet_evicted_records_total";

    const RESULT_LABELS: [&'static str; 5] =
        ["new_peak", "added_as_orphan", "already_have_block", "invalid_block", "disconnected_block"];

    /// Describes and zeroes every wallet blockchain metric.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_gauge!(
            Self::WALLET_PEAK_HEIGHT,
            metrics::Unit::Count,
            "Height of the wallet's current peak",
        );

        metrics::describe_counter!(
            Self::WALLET_RECEIVE_BLOCK_TOTAL,
            metrics::Unit::Count,
            "Total number of header blocks offered to the wallet blockchain",
        );

        metrics::describe_counter!(
            Self::WALLET_REORG_TOTAL,
            metrics::Unit::Count,
            "Total number of reorgs applied by the wallet blockchain",
        );

        metrics::describe_histogram!(
            Self::WALLET_REORG_DEPTH,
            metrics::Unit::Count,
            "Number of canonical heights discarded by a reorg",
        );

        metrics::describe_counter!(
            Self::WALLET_WEIGHT_PROOF_ADOPTED_TOTAL,
            metrics::Unit::Count,
            "Total number of weight proofs adopted by the wallet blockchain",
        );

        metrics::describe_counter!(
            Self::WALLET_EVICTED_RECORDS_TOTAL,
            metrics::Unit::Count,
            "Total number of block records evicted below the retention window",
        );
    }

    fn zero() {
        metrics::gauge!(Self::WALLET_PEAK_HEIGHT).set(0.0);

        for label in Self::RESULT_LABELS {
            metrics::counter!(Self::WALLET_RECEIVE_BLOCK_TOTAL, "result" => label).increment(0);
        }

        metrics::counter!(Self::WALLET_REORG_TOTAL).increment(0);

        metrics::histogram!(Self::WALLET_REORG_DEPTH).record(0);

        metrics::counter!(Self::WALLET_WEIGHT_PROOF_ADOPTED_TOTAL).increment(0);

        metrics::counter!(Self::WALLET_EVICTED_RECORDS_TOTAL).increment(0);
    }

    pub(crate) fn record_receive_block(result: &ReceiveBlockResult) {
        metrics::counter!(Self::WALLET_RECEIVE_BLOCK_TOTAL, "result" => result.label())
            .increment(1);
    }

    pub(crate) fn record_peak(height: u32) {
        metrics::gauge!(Self::WALLET_PEAK_HEIGHT).set(height as f64);
    }

    pub(crate) fn record_reorg(depth: u32) {
        metrics::counter!(Self::WALLET_REORG_TOTAL).increment(1);
        metrics::histogram!(Self::WALLET_REORG_DEPTH).record(depth as f64);
    }

    pub(crate) fn record_weight_proof_adopted() {
        metrics::counter!(Self::WALLET_WEIGHT_PROOF_ADOPTED_TOTAL).increment(1);
    }

    pub(crate) fn record_evicted(count: usize) {
        if count > 0 {
            metrics::counter!(Self::WALLET_EVICTED_RECORDS_TOTAL).increment(count as u64);
        }
    }
}
