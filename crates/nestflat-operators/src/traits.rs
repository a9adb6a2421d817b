//! Operator trait + common interfaces.
//!
//! A host engine calls `plan(...)` with the input's type tree to obtain the
//! flat output schema, then `eval_block(...)` with the materialized column.

pub use nestflat_core::budget::MemoryBudget;
use nestflat_core::prelude::Field;
use nestflat_core::types::{NestedColumn, RowBatch};

use crate::plan::{Footprint, OpPlan};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("planning error: {0}")]
    Plan(String),

    #[error("execution error: {0}")]
    Exec(String),

    #[error(transparent)]
    Core(#[from] nestflat_core::Error),

    #[error(transparent)]
    Budget(#[from] nestflat_mem::Error),
}

/// Trait that all operators must implement.
///
/// Invariants:
/// - Implementations MUST allocate output only after growing a guard from the
///   `MemoryBudget` (via `nestflat-mem`).
/// - `eval_block` must be deterministic given the same input.
/// - A failed `eval_block` returns no partial output.
pub trait Operator: Send + Sync + 'static {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    /// Quick/rough memory footprint model for an input of `rows`/`bytes`.
    fn memory_need(&self, rows: u64, bytes: u64) -> Footprint;

    /// Given the input's type tree, return the output schema and footprint.
    fn plan(&self, input: &Field) -> Result<OpPlan, OpError>;

    /// Evaluate one fully materialized input column.
    fn eval_block(
        &self,
        input: &NestedColumn,
        budget: &dyn MemoryBudget<Guard = nestflat_mem::guard::BudgetGuardImpl>,
    ) -> Result<RowBatch, OpError>;
}
