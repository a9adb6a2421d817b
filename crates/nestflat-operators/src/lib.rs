#![forbid(unsafe_code)]
//! nestflat-operators: the FLATTEN (unnest) operator.
//!
//! Design intent:
//! - Pure and synchronous: one call consumes one nested column and returns
//!   one flat batch; no shared mutable state between calls.
//! - Output allocations go through `nestflat-mem` guards so the configured
//!   cap is enforced before columns grow.
//! - The operator exposes a planning surface (`OpPlan`) with the flat output
//!   schema and a footprint model.

pub mod flatten;
pub mod plan;
pub mod traits;

pub use flatten::{flatten, FlattenOp};
pub use plan::{Footprint, OpPlan};
pub use traits::{OpError, Operator};
