//! Named ingest recipes

use super::calendar::{TradingCalendar, POLONIEX_CALENDAR};
use super::{
    write_assets, AssetDbWriter, AssetMap, BarCache, IngestError, Ingestor, MinuteBarWriter,
};
use crate::api::{CurrencySource, Pair, TradeSource};
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::StreamExt;
use std::collections::BTreeMap;
use std::ops::Range;

/// Small bundle for smoke tests: one pair over January 2016
pub const TEST_BUNDLE: &str = ".test_poloniex";

/// Pairs and date range to ingest, on a named calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub pairs: Vec<Pair>,
    /// First instant to ingest; the first session's open when unset
    pub start: Option<DateTime<Utc>>,
    /// End of ingestion, exclusive; the last session's end when unset
    pub end: Option<DateTime<Utc>>,
    pub calendar_name: String,
}

/// Writers, cache and session range for one ingest run
pub struct IngestContext<'a> {
    pub asset_writer: &'a mut dyn AssetDbWriter,
    pub bar_writer: &'a mut dyn MinuteBarWriter,
    pub cache: &'a mut dyn BarCache,
    /// Time covered by the sessions being ingested
    pub sessions: Range<DateTime<Utc>>,
    pub show_progress: bool,
}

impl Bundle {
    /// Bundle over the Poloniex calendar with no fixed range
    pub fn new(pairs: Vec<Pair>) -> Self {
        Self {
            pairs,
            start: None,
            end: None,
            calendar_name: POLONIEX_CALENDAR.to_string(),
        }
    }

    /// Fix the ingested range
    pub fn with_range(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Range to ingest, falling back to the session bounds
    pub fn window(&self, sessions: &Range<DateTime<Utc>>) -> Range<DateTime<Utc>> {
        self.start.unwrap_or(sessions.start)..self.end.unwrap_or(sessions.end)
    }

    /// Register assets, then stream every asset-day into the bar writer
    pub async fn ingest<C, S>(
        &self,
        currencies: &C,
        ingestor: &Ingestor<S>,
        ctx: IngestContext<'_>,
    ) -> Result<AssetMap, IngestError>
    where
        C: CurrencySource + ?Sized,
        S: TradeSource,
    {
        let window = self.window(&ctx.sessions);
        tracing::info!(
            pairs = self.pairs.len(),
            start = %window.start,
            end = %window.end,
            calendar = %self.calendar_name,
            "Ingesting bundle"
        );

        let assets = write_assets(currencies, ctx.asset_writer, &self.pairs).await?;
        let bars = ingestor
            .prepare_data(window.start, window.end, &assets, ctx.cache)
            .boxed();
        ctx.bar_writer.write(bars, ctx.show_progress).await?;

        Ok(assets)
    }
}

/// Calendars and bundles by name
#[derive(Debug, Default)]
pub struct BundleRegistry {
    calendars: BTreeMap<String, TradingCalendar>,
    bundles: BTreeMap<String, Bundle>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Poloniex calendar and the test bundle
    pub fn with_defaults() -> Result<Self, IngestError> {
        let mut registry = Self::new();
        registry.register_calendar(TradingCalendar::poloniex());

        let test_bundle = Bundle {
            pairs: vec![Pair::new("USDT", "ETH")?],
            start: Some(utc_midnight(2016, 1, 1)),
            end: Some(utc_midnight(2016, 1, 31)),
            calendar_name: POLONIEX_CALENDAR.to_string(),
        };
        registry.register(TEST_BUNDLE, test_bundle)?;

        Ok(registry)
    }

    /// Add or replace a calendar
    pub fn register_calendar(&mut self, calendar: TradingCalendar) {
        self.calendars.insert(calendar.name.clone(), calendar);
    }

    /// Add a bundle on an already registered calendar
    pub fn register(&mut self, name: impl Into<String>, bundle: Bundle) -> Result<(), IngestError> {
        let name = name.into();
        if !self.calendars.contains_key(&bundle.calendar_name) {
            return Err(IngestError::UnknownCalendar(bundle.calendar_name));
        }
        if self.bundles.contains_key(&name) {
            return Err(IngestError::DuplicateBundle(name));
        }
        self.bundles.insert(name, bundle);
        Ok(())
    }

    pub fn bundle(&self, name: &str) -> Result<&Bundle, IngestError> {
        self.bundles
            .get(name)
            .ok_or_else(|| IngestError::UnknownBundle(name.to_string()))
    }

    pub fn calendar(&self, name: &str) -> Result<&TradingCalendar, IngestError> {
        self.calendars
            .get(name)
            .ok_or_else(|| IngestError::UnknownCalendar(name.to_string()))
    }

    /// Registered bundles in name order
    pub fn bundles(&self) -> impl Iterator<Item = (&str, &Bundle)> {
        self.bundles.iter().map(|(name, b)| (name.as_str(), b))
    }
}

fn utc_midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}
