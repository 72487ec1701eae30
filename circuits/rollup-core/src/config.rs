use serde::{Deserialize, Serialize};

use crate::constants::{DATA_TREE_DEPTH, MAX_OUTPUTS, NULL_TREE_DEPTH, ROOT_TREE_DEPTH};
use crate::error::ConfigError;

/// Batch shape and tree depths shared by the inner and root rollup circuits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollupConfig {
    /// Transactions per inner rollup (`K`).
    pub inner_rollup_size: u32,
    /// Inner rollups per root rollup (`M`).
    pub rollups_per_rollup: u32,
    pub data_tree_depth: usize,
    pub null_tree_depth: usize,
    pub root_tree_depth: usize,
}

impl RollupConfig {
    pub fn new(inner_rollup_size: u32, rollups_per_rollup: u32) -> Self {
        Self {
            inner_rollup_size,
            rollups_per_rollup,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Total transaction slots covered by one root rollup (`K * M`).
    pub fn rollup_size(&self) -> u32 {
        self.inner_rollup_size.saturating_mul(self.rollups_per_rollup)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inner_rollup_size == 0 {
            return Err(ConfigError::Zero {
                field: "inner_rollup_size",
            });
        }
        if self.rollups_per_rollup == 0 {
            return Err(ConfigError::Zero {
                field: "rollups_per_rollup",
            });
        }
        if self
            .inner_rollup_size
            .checked_mul(self.rollups_per_rollup)
            .is_none()
        {
            return Err(ConfigError::RollupSizeOverflow {
                inner: self.inner_rollup_size,
                outer: self.rollups_per_rollup,
            });
        }
        for (field, depth) in [
            ("data_tree", self.data_tree_depth),
            ("null_tree", self.null_tree_depth),
            ("root_tree", self.root_tree_depth),
        ] {
            if depth == 0 || depth > 64 {
                return Err(ConfigError::InvalidDepth { field, depth });
            }
        }
        let commitments_per_rollup = self.rollup_size() as u64 * MAX_OUTPUTS as u64;
        if self.data_tree_depth < 64 && (1u64 << self.data_tree_depth) < commitments_per_rollup {
            return Err(ConfigError::DataTreeTooShallow {
                data_tree_depth: self.data_tree_depth,
                rollup_size: commitments_per_rollup,
            });
        }
        Ok(())
    }
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            inner_rollup_size: 2,
            rollups_per_rollup: 3,
            data_tree_depth: DATA_TREE_DEPTH,
            null_tree_depth: NULL_TREE_DEPTH,
            root_tree_depth: ROOT_TREE_DEPTH,
        }
    }
}
