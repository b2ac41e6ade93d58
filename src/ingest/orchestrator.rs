//! Day-by-day fetch, cache and resample loop

use super::{AssetMap, BarCache, CacheKey, IngestError, Sid};
use crate::api::{ConfigError, Pair, TradeSource};
use crate::candle::{BarSet, Resampler};
use crate::history::TradeHistoryFetcher;
use crate::telemetry::{self, CounterMetric};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use futures_util::stream::{self, Stream};

/// Most chunks a day can be split into: one per second
const MAX_CHUNKS_PER_DAY: u32 = 86_400;

/// Turns trade history into daily bar sets per asset
pub struct Ingestor<S> {
    fetcher: TradeHistoryFetcher<S>,
    resampler: Resampler,
    chunks_per_day: u32,
}

impl<S: TradeSource> Ingestor<S> {
    /// Create an ingestor fetching each day in `chunks_per_day` pieces
    pub fn new(
        fetcher: TradeHistoryFetcher<S>,
        resampler: Resampler,
        chunks_per_day: u32,
    ) -> Result<Self, ConfigError> {
        if chunks_per_day == 0 || chunks_per_day > MAX_CHUNKS_PER_DAY {
            return Err(ConfigError::InvalidChunking(chunks_per_day));
        }

        Ok(Self {
            fetcher,
            resampler,
            chunks_per_day,
        })
    }

    pub fn fetcher(&self) -> &TradeHistoryFetcher<S> {
        &self.fetcher
    }

    pub fn resampler(&self) -> &Resampler {
        &self.resampler
    }

    /// Lazily produce `(sid, bars)` for every asset and day in `[start, end)`.
    ///
    /// Items are ordered by asset, then UTC day. Every calendar day touched by
    /// the range is fetched and resampled whole, so a cached day never holds a
    /// partial window. Nothing is fetched until the stream is polled, and the
    /// stream ends after the first error.
    pub fn prepare_data<'a>(
        &'a self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        assets: &AssetMap,
        cache: &'a mut dyn BarCache,
    ) -> impl Stream<Item = Result<(Sid, BarSet), IngestError>> + Send + 'a {
        let days = day_windows(start, end);
        let jobs: Vec<(Sid, Pair, DateTime<Utc>, DateTime<Utc>)> = assets
            .iter()
            .flat_map(|(sid, pair)| days.iter().map(move |&(lo, hi)| (*sid, pair.clone(), lo, hi)))
            .collect();

        stream::try_unfold((jobs.into_iter(), cache), move |(mut jobs, cache)| async move {
            let Some((sid, pair, lo, hi)) = jobs.next() else {
                return Ok(None);
            };
            let bars = self.asset_day(sid, &pair, lo, hi, &mut *cache).await?;
            Ok::<_, IngestError>(Some(((sid, bars), (jobs, cache))))
        })
    }

    /// Bars of one asset over the UTC day starting at `start`, from the cache
    /// when present
    async fn asset_day(
        &self,
        sid: Sid,
        pair: &Pair,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cache: &mut dyn BarCache,
    ) -> Result<BarSet, IngestError> {
        let key = CacheKey::new(sid, start.date_naive());

        if let Some(bars) = cache.get(&key) {
            tracing::debug!(%key, "Cache hit");
            telemetry::increment(CounterMetric::CacheHits, 1);
            return Ok(bars);
        }
        telemetry::increment(CounterMetric::CacheMisses, 1);

        let mut trades = Vec::new();
        for (lo, hi) in split_chunks(start, end, self.chunks_per_day) {
            trades.extend(self.fetcher.fetch(pair, lo, hi).await?);
        }

        let bars = self.resampler.resample(&trades, start, end);
        tracing::info!(
            %key,
            pair = %pair,
            trades = trades.len(),
            bars = bars.traded().count(),
            "Resampled asset-day"
        );

        cache.insert(key, bars.clone());
        Ok(bars)
    }
}

/// Whole UTC days `[midnight, midnight + 24h)` overlapping `[start, end)`
fn day_windows(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut windows = Vec::new();
    if start >= end {
        return windows;
    }
    let mut day = start.date_naive().and_time(NaiveTime::default()).and_utc();
    while day < end {
        let next = day + Duration::days(1);
        windows.push((day, next));
        day = next;
    }
    windows
}

/// Split `[start, end)` into `chunks` contiguous windows on whole seconds
///
/// Windows shorter than a second are dropped, so short spans yield fewer
/// chunks.
fn split_chunks(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    chunks: u32,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let span = (end - start).num_seconds();
    let chunks = i64::from(chunks.max(1));

    let mut windows = Vec::new();
    let mut lo = start;
    for k in 1..=chunks {
        let hi = if k == chunks {
            end
        } else {
            start + Duration::seconds(span * k / chunks)
        };
        if hi > lo {
            windows.push((lo, hi));
            lo = hi;
        }
    }
    windows
}
