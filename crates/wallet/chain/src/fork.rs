//! Fork choice.

use crate::{BlockchainInterface, ChainError, ForkPointFinder};
use tern_primitives::BlockRecord;

/// Returns the height of the highest common ancestor of `a` and `b`.
///
/// Walks parent links through `chain`, always stepping back the higher of the
/// two records until both sit at the same height with the same hash. Returns
/// `None` if the walk reaches genesis on both sides without meeting, meaning
/// the two chains share no ancestor.
///
/// # Errors
/// Returns [`ChainError::BlockNotFound`] if an ancestor of either record above
/// the fork point is missing from `chain`.
pub fn find_fork_point_in_chain<'a>(
    chain: &'a dyn BlockchainInterface,
    mut a: &'a BlockRecord,
    mut b: &'a BlockRecord,
) -> Result<Option<u32>, ChainError> {
    while a.height > 0 || b.height > 0 {
        if a.height > b.height {
            a = chain.block_record(&a.prev_hash)?;
        } else if b.height > a.height {
            b = chain.block_record(&b.prev_hash)?;
        } else {
            if a.header_hash == b.header_hash {
                return Ok(Some(a.height));
            }
            a = chain.block_record(&a.prev_hash)?;
            b = chain.block_record(&b.prev_hash)?;
        }
    }
    Ok((a.header_hash == b.header_hash).then_some(0))
}

/// How a validated block relates to the current peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkChoice {
    /// There is no peak yet. The block becomes the peak outright.
    FirstPeak,
    /// The block is a heavier direct child of the peak.
    Extend {
        /// Height of the current peak.
        fork_height: u32,
    },
    /// The block is heavier and sits on a different branch.
    Reorg {
        /// Height of the common ancestor, or `None` if the branches share none.
        fork_height: Option<u32>,
    },
    /// The block does not outweigh the peak.
    Orphan,
}

impl ForkChoice {
    /// Lowest height whose canonical entry is replaced by adopting the block,
    /// or `None` if the block does not become the peak.
    pub const fn rewrite_from(&self, height: u32) -> Option<u32> {
        match self {
            Self::FirstPeak => Some(height),
            Self::Extend { fork_height } | Self::Reorg { fork_height: Some(fork_height) } => {
                Some(*fork_height + 1)
            }
            Self::Reorg { fork_height: None } => Some(0),
            Self::Orphan => None,
        }
    }
}

/// Decides whether a candidate block supersedes the current peak.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForkResolver;

impl ForkResolver {
    /// Returns `true` if `candidate` is strictly heavier than `current`.
    ///
    /// Equal weight is not better: the first chain seen wins ties.
    pub const fn is_better(candidate: u128, current: u128) -> bool {
        candidate > current
    }

    /// Returns the fork height between `candidate` and `peak`.
    ///
    /// A direct child of the peak forks at the peak's height without walking
    /// the chain. Anything else is delegated to `finder`.
    pub fn find_fork_height<F>(
        finder: &F,
        chain: &dyn BlockchainInterface,
        candidate: &BlockRecord,
        peak: &BlockRecord,
    ) -> Result<Option<u32>, ChainError>
    where
        F: ForkPointFinder + ?Sized,
    {
        if candidate.prev_hash == peak.header_hash {
            return Ok(Some(peak.height));
        }
        finder.find_fork_point(chain, candidate, peak)
    }

    /// Classifies `candidate` against `peak`.
    pub fn resolve<F>(
        finder: &F,
        chain: &dyn BlockchainInterface,
        candidate: &BlockRecord,
        peak: Option<&BlockRecord>,
    ) -> Result<ForkChoice, ChainError>
    where
        F: ForkPointFinder + ?Sized,
    {
        let Some(peak) = peak else {
            return Ok(ForkChoice::FirstPeak);
        };
        if !Self::is_better(candidate.weight, peak.weight) {
            return Ok(ForkChoice::Orphan);
        }
        if candidate.prev_hash == peak.header_hash {
            return Ok(ForkChoice::Extend { fork_height: peak.height });
        }
        let fork_height = Self::find_fork_height(finder, chain, candidate, peak)?;
        Ok(ForkChoice::Reorg { fork_height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockRecordIndex;
    use alloy_primitives::B256;
    use rstest::rstest;

    struct DefaultFinder;

    impl ForkPointFinder for DefaultFinder {}

    fn hash(branch: u8, height: u32) -> B256 {
        let mut bytes = [0u8; 32];
        bytes[0] = branch;
        bytes[28..].copy_from_slice(&height.to_be_bytes());
        B256::from(bytes)
    }

    fn record(branch: u8, height: u32, prev: B256, weight: u128) -> BlockRecord {
        BlockRecord {
            header_hash: hash(branch, height),
            prev_hash: prev,
            height,
            weight,
            ..Default::default()
        }
    }

    /// Main branch 0 over heights `0..=10`, branch 1 forking off after height 4
    /// up to height 7, and an unrelated branch 2 over heights `0..=3`.
    fn forked_index() -> BlockRecordIndex {
        let mut index = BlockRecordIndex::new();
        let mut prev = B256::ZERO;
        for h in 0..=10 {
            index.add(record(0, h, prev, h as u128 * 10));
            prev = hash(0, h);
        }
        let mut prev = hash(0, 4);
        for h in 5..=7 {
            index.add(record(1, h, prev, h as u128 * 20));
            prev = hash(1, h);
        }
        let mut prev = B256::repeat_byte(0xff);
        for h in 0..=3 {
            index.add(record(2, h, prev, h as u128));
            prev = hash(2, h);
        }
        index
    }

    #[rstest]
    #[case((0, 10), (1, 7), Some(4))]
    #[case((1, 7), (0, 10), Some(4))]
    #[case((0, 10), (0, 6), Some(6))]
    #[case((0, 3), (0, 3), Some(3))]
    #[case((0, 0), (0, 0), Some(0))]
    #[case((0, 10), (2, 3), None)]
    fn test_find_fork_point(
        #[case] a: (u8, u32),
        #[case] b: (u8, u32),
        #[case] expected: Option<u32>,
    ) {
        let index = forked_index();
        let a = index.get(&hash(a.0, a.1)).unwrap();
        let b = index.get(&hash(b.0, b.1)).unwrap();
        assert_eq!(find_fork_point_in_chain(&index, a, b).unwrap(), expected);
    }

    #[test]
    fn test_find_fork_point_missing_ancestor() {
        let mut index = forked_index();
        index.prune_below(6);

        let a = index.get(&hash(0, 10)).unwrap().clone();
        let b = index.get(&hash(1, 7)).unwrap().clone();
        assert!(matches!(
            find_fork_point_in_chain(&index, &a, &b),
            Err(ChainError::BlockNotFound(_))
        ));
    }

    #[rstest]
    #[case(11, 10, true)]
    #[case(10, 10, false)]
    #[case(9, 10, false)]
    fn test_is_better(#[case] candidate: u128, #[case] current: u128, #[case] expected: bool) {
        assert_eq!(ForkResolver::is_better(candidate, current), expected);
    }

    #[test]
    fn test_resolve() {
        let index = forked_index();
        let peak = index.get(&hash(0, 6)).unwrap();

        let first = record(0, 0, B256::ZERO, 0);
        assert_eq!(
            ForkResolver::resolve(&DefaultFinder, &index, &first, None).unwrap(),
            ForkChoice::FirstPeak
        );

        let child = index.get(&hash(0, 7)).unwrap();
        assert_eq!(
            ForkResolver::resolve(&DefaultFinder, &index, child, Some(peak)).unwrap(),
            ForkChoice::Extend { fork_height: 6 }
        );

        let heavier_branch = index.get(&hash(1, 7)).unwrap();
        assert_eq!(
            ForkResolver::resolve(&DefaultFinder, &index, heavier_branch, Some(peak)).unwrap(),
            ForkChoice::Reorg { fork_height: Some(4) }
        );

        let same_weight = BlockRecord { weight: peak.weight, ..heavier_branch.clone() };
        assert_eq!(
            ForkResolver::resolve(&DefaultFinder, &index, &same_weight, Some(peak)).unwrap(),
            ForkChoice::Orphan
        );
    }

    #[rstest]
    #[case(ForkChoice::FirstPeak, Some(3))]
    #[case(ForkChoice::Extend { fork_height: 2 }, Some(3))]
    #[case(ForkChoice::Reorg { fork_height: Some(1) }, Some(2))]
    #[case(ForkChoice::Reorg { fork_height: None }, Some(0))]
    #[case(ForkChoice::Orphan, None)]
    fn test_rewrite_from(#[case] choice: ForkChoice, #[case] expected: Option<u32>) {
        assert_eq!(choice.rewrite_from(3), expected);
    }
}
