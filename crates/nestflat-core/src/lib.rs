#![forbid(unsafe_code)]
//! nestflat-core: schema types, the nested column model, configuration and
//! errors shared by the flatten operator.
//!
//! Pure data and validation only. The classification and unnest algorithms
//! live in `nestflat-operators`; memory accounting lives in `nestflat-mem`.

pub mod budget;
pub mod config;
pub mod error;
pub mod prelude;
pub mod schema;
pub mod types;

#[cfg(feature = "arrow")]
pub mod arrow;

pub use error::{Error, Result};
