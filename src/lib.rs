//! poloniex-bundle: Poloniex trade history as minute OHLCV bars
//!
//! This library provides the core components for:
//! - Rate-limited access to the Poloniex public API
//! - Complete trade history over arbitrary windows, splitting truncated ones
//! - Resampling trades into fixed-width OHLCV bars
//! - Day-by-day cached ingestion of named bundles
//! - Bar and asset storage in Parquet
//! - Logging and Prometheus metrics

pub mod api;
pub mod candle;
pub mod cli;
pub mod config;
pub mod data;
pub mod history;
pub mod ingest;
pub mod telemetry;
