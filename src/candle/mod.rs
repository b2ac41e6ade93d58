//! Candlestick bars
//!
//! Buckets raw trades into fixed-width OHLCV bars

mod resample;
mod types;

pub use resample::{Resampler, DEFAULT_BAR_WIDTH_SECS};
pub use types::{Bar, BarSet};
