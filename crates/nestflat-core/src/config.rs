//! Flatten configuration that callers can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How output columns are named.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeafNaming {
    /// The leaf's own field name (`number`).
    #[default]
    Leaf,
    /// Struct-field path from the root joined by `separator`
    /// (`addresses.phones.number`). List elements add no segment.
    Path { separator: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// Hard memory cap (in bytes) for the flat output of one call.
    pub mem_cap_bytes: usize,

    /// Root rows expanded per block. Each block is budgeted before it is
    /// materialized; output order is unaffected.
    pub block_rows: usize,

    /// Output column naming.
    pub naming: LeafNaming,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            mem_cap_bytes: 512 * 1024 * 1024, // 512 MiB default
            block_rows: 4096,
            naming: LeafNaming::Leaf,
        }
    }
}

impl FlattenConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `NESTFLAT_MEM_CAP_BYTES`: memory cap in bytes
    /// - `NESTFLAT_BLOCK_ROWS`: root rows per block
    /// - `NESTFLAT_PATH_SEPARATOR`: switch to path naming with this separator
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("NESTFLAT_MEM_CAP_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.mem_cap_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("NESTFLAT_BLOCK_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                if v > 0 {
                    cfg.block_rows = v;
                }
            }
        }

        if let Ok(s) = std::env::var("NESTFLAT_PATH_SEPARATOR") {
            if !s.is_empty() {
                cfg.naming = LeafNaming::Path { separator: s };
            }
        }

        cfg
    }

    /// Parse a JSON config; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_rows == 0 {
            return Err(Error::Config("block_rows must be positive".into()));
        }
        if let LeafNaming::Path { separator } = &self.naming {
            if separator.is_empty() {
                return Err(Error::Config("path separator must not be empty".into()));
            }
        }
        Ok(())
    }
}
