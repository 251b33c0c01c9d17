//! Core domain types and detection logic.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod config_validation;
pub mod detector;
pub mod error;
pub mod indicator;
pub mod ohlcv;
pub mod pipeline;
pub mod series;
pub mod summary;
