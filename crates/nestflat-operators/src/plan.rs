//! Operator planning surfaces: `Footprint` and `OpPlan`.

use nestflat_core::prelude::Schema;
use serde::{Deserialize, Serialize};

/// Coarse memory model for rows flowing out of an operator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Footprint {
    /// Estimated bytes per output row.
    pub bytes_per_row: u64,
    /// Estimated fixed overhead per call.
    pub overhead_bytes: u64,
}

impl Footprint {
    /// Estimate total live bytes for `rows` output rows.
    pub fn estimate_live(&self, rows: u64) -> u64 {
        self.overhead_bytes + self.bytes_per_row.saturating_mul(rows)
    }
}

/// Operator plan: flat output schema, repetition depth and a cached footprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpPlan {
    pub output_schema: Schema,

    /// Deepest repetition level of the input (0 when it holds no lists).
    pub max_level: usize,

    /// Footprint model cached to avoid recomputation.
    pub footprint: Footprint,
}

impl OpPlan {
    pub fn new(output_schema: Schema, max_level: usize, footprint: Footprint) -> Self {
        Self {
            output_schema,
            max_level,
            footprint,
        }
    }
}
