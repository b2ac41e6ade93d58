//! Bar types

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV statistics for one time bucket
///
/// Prices are `None` when no trade fell in the bucket. Filling them is left
/// to the bar writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket start
    pub start: DateTime<Utc>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    /// Traded amount in base currency
    pub volume: Decimal,
}

impl Bar {
    /// Bar for a bucket without trades
    pub fn empty(start: DateTime<Utc>) -> Self {
        Self {
            start,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: Decimal::ZERO,
        }
    }

    /// Whether no trade fell in this bucket
    pub fn is_empty(&self) -> bool {
        self.close.is_none()
    }
}

/// Consecutive bars covering a time window, one per bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarSet {
    /// Start of the window
    pub start: DateTime<Utc>,
    /// End of the window (exclusive)
    pub end: DateTime<Utc>,
    /// Bucket width
    pub width: Duration,
    pub bars: Vec<Bar>,
}

impl BarSet {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bars that contain at least one trade
    pub fn traded(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter().filter(|b| !b.is_empty())
    }

    /// Total volume across the window
    pub fn volume(&self) -> Decimal {
        self.bars.iter().map(|b| b.volume).sum()
    }
}
