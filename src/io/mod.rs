//! Input/output helpers.
//!
//! - reconciled rows to CSV (`export`)
//! - report JSON read/write (`report`)

pub mod export;
pub mod report;

pub use export::*;
pub use report::*;
