//! FLATTEN: turn one nested column into a flat batch of primitive columns.
//!
//! Pipeline: [`classify`] the column into repetition levels, walk the
//! governing lists' offsets per root row ([`Unnester`]), and gather leaf values
//! into freshly allocated output columns ([`OutputRegistry`]).
//!
//! Output rows appear in root-row order, and within a root row in depth-first
//! order of the list elements.

pub mod classify;
pub mod output;
pub mod unnest;

use std::mem::size_of;

use tracing::{debug, trace};

use nestflat_core::config::{FlattenConfig, LeafNaming};
use nestflat_core::error::Result;
use nestflat_core::prelude::{Field, Schema};
use nestflat_core::types::{NestedColumn, RowBatch};
use nestflat_mem::guard::{BudgetGuardImpl, MemoryBudgetImpl};

use crate::plan::{Footprint, OpPlan};
use crate::traits::{MemoryBudget, OpError, Operator};

pub use classify::{classify, Leaf, LevelDescriptor, LevelMap, NestedNode, Shape};
pub use output::OutputRegistry;
pub use unnest::{unnest, RowSelection, Unnester};

/// Flatten `column` with leaf-named output columns.
pub fn flatten(column: &NestedColumn) -> Result<RowBatch> {
    let levels = classify(column, &LeafNaming::Leaf)?;
    unnest(&levels)
}

#[derive(Debug, Clone, Default)]
pub struct FlattenOp {
    pub config: FlattenConfig,
}

impl FlattenOp {
    pub fn new(config: FlattenConfig) -> Self {
        Self { config }
    }

    /// Evaluate under a fresh budget capped at `config.mem_cap_bytes`.
    pub fn run(&self, input: &NestedColumn) -> std::result::Result<RowBatch, OpError> {
        let budget = MemoryBudgetImpl::new(self.config.mem_cap_bytes);
        self.eval_block(input, &budget)
    }
}

/// Per-row cost of one selection index at each level.
fn selection_bytes(max_level: usize) -> usize {
    (max_level + 1) * size_of::<usize>()
}

impl Operator for FlattenOp {
    fn name(&self) -> &'static str {
        "flatten"
    }

    fn memory_need(&self, rows: u64, bytes: u64) -> Footprint {
        // Without the type tree only the input row width is known; the list
        // fan-out multiplies it at eval time.
        Footprint {
            bytes_per_row: bytes.checked_div(rows).unwrap_or(0),
            overhead_bytes: rows.saturating_mul(size_of::<usize>() as u64),
        }
    }

    fn plan(&self, input: &Field) -> std::result::Result<OpPlan, OpError> {
        self.config
            .validate()
            .map_err(|e| OpError::Plan(e.to_string()))?;
        let levels = classify(input, &self.config.naming)?;

        let fields: Vec<Field> = levels
            .leaves()
            .map(|(_, leaf)| {
                Field::new(
                    leaf.output_name.clone(),
                    leaf.data_type.clone(),
                    leaf.node.is_nullable(),
                )
            })
            .collect();
        let bytes_per_row = fields.len() * size_of::<Option<i64>>()
            + selection_bytes(levels.max_level());

        Ok(OpPlan::new(
            Schema::new(fields),
            levels.max_level(),
            Footprint {
                bytes_per_row: bytes_per_row as u64,
                overhead_bytes: 0,
            },
        ))
    }

    fn eval_block(
        &self,
        input: &NestedColumn,
        budget: &dyn MemoryBudget<Guard = BudgetGuardImpl>,
    ) -> std::result::Result<RowBatch, OpError> {
        self.config.validate()?;
        let levels = classify(input, &self.config.naming)?;
        let unnester = Unnester::new(&levels)?;
        let mut registry = OutputRegistry::new(&levels, 0)?;

        let root_rows = unnester.root_rows();
        let row_bytes = registry.bytes_per_row() + selection_bytes(levels.max_level());
        let mut guard = budget
            .try_acquire(0, "flatten")
            .ok_or_else(|| OpError::Exec("memory budget refused an empty guard".into()))?;

        debug!(
            column = %input.name,
            root_rows,
            max_level = levels.max_level(),
            leaves = levels.num_leaves(),
            "flatten start"
        );

        let mut start = 0;
        while start < root_rows {
            let end = root_rows.min(start.saturating_add(self.config.block_rows));
            let rows = unnester.count_rows(start..end)?;
            guard.grow(rows.saturating_mul(row_bytes))?;
            registry.reserve(rows);

            let selection = unnester.select(start..end)?;
            registry.append(&selection)?;
            trace!(start, end, rows, "flatten block");
            start = end;
        }

        let output = registry.finish()?;
        debug!(
            column = %input.name,
            rows = output.num_rows(),
            columns = output.num_columns(),
            "flatten done"
        );
        Ok(output)
    }
}
