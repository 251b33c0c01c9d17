//! smartmoney: flags OHLCV patterns consistent with large-participant
//! accumulation, distribution and engineered shakeouts.
//!
//! Hexagonal architecture: detection logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
