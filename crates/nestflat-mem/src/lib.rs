#![forbid(unsafe_code)]
//! nestflat-mem: hard memory budgeting for flatten output.
//!
//! Concrete implementations of the `nestflat-core::budget` interfaces. Output
//! columns are only allocated after a guard covering their estimated size has
//! been acquired; dropping the guard returns the bytes (RAII).

pub mod error;
pub mod guard;
pub mod tracking;

pub use error::{Error, Result};
pub use guard::{BudgetGuardImpl, MemoryBudgetImpl};
pub use tracking::PeakTracker;
