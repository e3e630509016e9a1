//! tickforge: batch converter for raw per-channel tick files
//!
//! This library provides the core components for:
//! - Lazy per-channel tick readers with background buffering
//! - K-way time-ordered merging across all channels of a trading day
//! - Incremental consolidation of ticks into trade/quote bars
//! - Per-instrument processors with bounded-memory disk flushing
//! - Packaging of consolidated bars into compressed archives
//! - Structured logging and progress telemetry

pub mod cli;
pub mod config;
pub mod consolidator;
pub mod converter;
pub mod error;
pub mod instrument;
pub mod package;
pub mod processor;
pub mod source;
pub mod telemetry;
