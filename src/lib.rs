//! `defi-spread` library crate.
//!
//! Tracks the spread between DeFi stablecoin lending yields and TradFi
//! risk-free rates. The binary (`spread`) is a thin wrapper around this
//! library so that:
//!
//! - core logic is testable without spawning processes
//! - the same pipeline backs the CLI and the HTTP endpoint

pub mod api;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod reconcile;
pub mod report;
pub mod window;
