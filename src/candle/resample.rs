//! Trade-to-bar resampling

use super::{Bar, BarSet};
use crate::api::{ConfigError, Trade};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// Default bar width: one minute
pub const DEFAULT_BAR_WIDTH_SECS: i64 = 60;

/// Buckets trades into fixed-width bars aligned to the Unix epoch
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    width_secs: i64,
}

/// Running aggregate for one bucket
#[derive(Default)]
struct Bucket {
    open: Option<((DateTime<Utc>, u64), Decimal)>,
    close: Option<((DateTime<Utc>, u64), Decimal)>,
    high: Option<Decimal>,
    low: Option<Decimal>,
    volume: Decimal,
}

impl Bucket {
    fn add(&mut self, trade: &Trade) {
        let key = trade.sequence_key();
        let rate = trade.rate;

        if self.open.map_or(true, |(k, _)| key < k) {
            self.open = Some((key, rate));
        }
        if self.close.map_or(true, |(k, _)| key > k) {
            self.close = Some((key, rate));
        }
        self.high = Some(self.high.map_or(rate, |h| h.max(rate)));
        self.low = Some(self.low.map_or(rate, |l| l.min(rate)));
        self.volume += trade.amount;
    }

    fn into_bar(self, start: DateTime<Utc>) -> Bar {
        Bar {
            start,
            open: self.open.map(|(_, rate)| rate),
            high: self.high,
            low: self.low,
            close: self.close.map(|(_, rate)| rate),
            volume: self.volume,
        }
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self {
            width_secs: DEFAULT_BAR_WIDTH_SECS,
        }
    }
}

impl Resampler {
    /// Create a resampler producing bars of `width`
    pub fn new(width: Duration) -> Result<Self, ConfigError> {
        let width_secs = width.num_seconds();
        if width_secs <= 0 || Duration::seconds(width_secs) != width {
            return Err(ConfigError::InvalidBarWidth(width_secs));
        }
        Ok(Self { width_secs })
    }

    /// Bar width
    pub fn width(&self) -> Duration {
        Duration::seconds(self.width_secs)
    }

    /// Start of the bucket containing `ts`
    pub fn bucket_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let secs = ts.timestamp();
        let floored = secs - secs.rem_euclid(self.width_secs);
        DateTime::from_timestamp(floored, 0).unwrap_or(ts)
    }

    /// Resample trades into one bar per bucket overlapping `[start, end)`.
    ///
    /// Trades outside the window are ignored. Open and close are chosen by
    /// `(timestamp, global_trade_id)`, so the result does not depend on the
    /// order of `trades` or on how they were split across fetches.
    pub fn resample(&self, trades: &[Trade], start: DateTime<Utc>, end: DateTime<Utc>) -> BarSet {
        let first = self.bucket_start(start);
        let count = if end > start {
            // Round up, counting a fractional last second as a started bucket
            let mut count = (end - first).num_seconds() / self.width_secs;
            if first + Duration::seconds(count * self.width_secs) < end {
                count += 1;
            }
            count as usize
        } else {
            0
        };

        let mut buckets: Vec<Bucket> = (0..count).map(|_| Bucket::default()).collect();

        for trade in trades {
            if trade.timestamp < start || trade.timestamp >= end {
                continue;
            }
            let index = ((trade.timestamp - first).num_seconds() / self.width_secs) as usize;
            if let Some(bucket) = buckets.get_mut(index) {
                bucket.add(trade);
            }
        }

        let bars = buckets
            .into_iter()
            .enumerate()
            .map(|(i, bucket)| {
                bucket.into_bar(first + Duration::seconds(i as i64 * self.width_secs))
            })
            .collect();

        BarSet {
            start,
            end,
            width: self.width(),
            bars,
        }
    }
}
