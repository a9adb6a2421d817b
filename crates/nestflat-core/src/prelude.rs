//! Convenient re-exports for downstream crates.

pub use crate::budget::{BudgetGuard, MemoryBudget};
pub use crate::config::{FlattenConfig, LeafNaming};
pub use crate::error::{Error, Result};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{
    Column, ListArray, NestedArray, NestedColumn, PrimitiveArray, RowBatch, Scalar, StructArray,
};
