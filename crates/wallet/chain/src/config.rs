//! Configuration of the wallet blockchain.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tern_primitives::ConsensusConstants;
use thiserror::Error;

/// Default number of heights below the peak whose block records are kept.
pub const DEFAULT_BLOCK_RETENTION: u32 = 1000;

/// Configuration of a [`WalletBlockchain`](crate::WalletBlockchain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Consensus constants handed to the validators.
    pub constants: ConsensusConstants,
    /// Number of heights below the peak for which block records are kept.
    ///
    /// Records further below the peak are evicted after every peak change,
    /// along with any orphans at those heights. The window never drops below
    /// one epoch plus one sub-epoch, see [`ChainConfig::retention_window`].
    /// `0` keeps every record.
    pub block_retention: u32,
    /// Skip re-validation of sampled sub-epoch segments when verifying weight
    /// proofs.
    pub skip_weight_proof_segments: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            constants: ConsensusConstants::default(),
            block_retention: DEFAULT_BLOCK_RETENTION,
            skip_weight_proof_segments: true,
        }
    }
}

impl ChainConfig {
    /// Parses a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Number of heights below the peak whose records are kept, or `None` if
    /// eviction is disabled.
    ///
    /// Never shorter than one epoch plus one sub-epoch, which is as far back
    /// as difficulty adjustment reads.
    pub const fn retention_window(&self) -> Option<u32> {
        if self.block_retention == 0 {
            return None;
        }
        let adjustment_window = self
            .constants
            .epoch_blocks
            .saturating_add(self.constants.sub_epoch_blocks);
        if self.block_retention > adjustment_window {
            Some(self.block_retention)
        } else {
            Some(adjustment_window)
        }
    }

    /// Height below which block records are evicted for a peak at
    /// `peak_height`, if any.
    pub const fn retention_floor(&self, peak_height: u32) -> Option<u32> {
        match self.retention_window() {
            Some(window) if peak_height > window => Some(peak_height - window),
            _ => None,
        }
    }
}

/// Error loading a [`ChainConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid TOML or has unknown fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(ChainConfig::from_toml_str("").unwrap(), ChainConfig::default());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
block_retention = 64
skip_weight_proof_segments = false

[constants]
sub_slot_iters_starting = 1024
difficulty_starting = 3
sub_epoch_blocks = 32
epoch_blocks = 128
weight_proof_recent_blocks = 50
genesis_challenge = "0x0000000000000000000000000000000000000000000000000000000000000000"
"#
        )
        .expect("write config");

        let config = ChainConfig::from_file(file.path()).unwrap();
        assert_eq!(config.block_retention, 64);
        assert!(!config.skip_weight_proof_segments);
        assert_eq!(config.constants.sub_slot_iters_starting, 1024);
        assert_eq!(config.constants.difficulty_starting, 3);
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            ChainConfig::from_toml_str("block_retention = 10\nunknown = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ChainConfig::from_file("/nonexistent/tern/chain.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    fn small_epochs(block_retention: u32) -> ChainConfig {
        ChainConfig {
            constants: ConsensusConstants {
                epoch_blocks: 8,
                sub_epoch_blocks: 2,
                ..Default::default()
            },
            block_retention,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(0, 5000, None)]
    #[case(20, 20, None)]
    #[case(20, 21, Some(1))]
    #[case(20, 35, Some(15))]
    #[case(4, 10, None)]
    #[case(4, 25, Some(15))]
    fn test_retention_floor(
        #[case] block_retention: u32,
        #[case] peak_height: u32,
        #[case] expected: Option<u32>,
    ) {
        assert_eq!(small_epochs(block_retention).retention_floor(peak_height), expected);
    }

    #[test]
    fn test_default_retention_covers_difficulty_adjustment() {
        let config = ChainConfig::default();
        let constants = &config.constants;
        assert_eq!(
            config.retention_window(),
            Some(constants.epoch_blocks + constants.sub_epoch_blocks)
        );
        assert!(config.retention_window() > Some(DEFAULT_BLOCK_RETENTION));
        assert_eq!(config.retention_floor(5_000), Some(5_000 - 4_992));
    }
}
