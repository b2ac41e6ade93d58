//! Bundle ingestion
//!
//! Registers assets, then walks every (asset, day) of the requested range:
//! cached days are reused, missing days are fetched, resampled and cached.
//! The resulting bar sets are streamed to a minute bar writer.

mod assets;
mod bundle;
mod cache;
mod calendar;
mod orchestrator;

pub use assets::write_assets;
pub use bundle::{Bundle, BundleRegistry, IngestContext, TEST_BUNDLE};
pub use cache::{BarCache, CacheKey, MemoryCache};
pub use calendar::{TradingCalendar, POLONIEX_CALENDAR};
pub use orchestrator::Ingestor;

use crate::api::{ApiError, ConfigError, Pair};
use crate::candle::BarSet;
use crate::history::FetchError;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Symbol id assigned during asset registration
pub type Sid = u32;

/// Registered assets in sid order
pub type AssetMap = BTreeMap<Sid, Pair>;

/// Exchange name recorded for every asset
pub const EXCHANGE: &str = "POLONIEX";

/// One row of the asset table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub sid: Sid,
    /// Traded currency symbol, e.g. `ETH`
    pub symbol: String,
    /// Human-readable currency name
    pub asset_name: String,
    pub exchange: String,
}

/// Errors raised while ingesting a bundle
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Pair whose traded currency the exchange does not list
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),
    #[error("Unknown bundle: {0}")]
    UnknownBundle(String),
    #[error("Unknown calendar: {0}")]
    UnknownCalendar(String),
    #[error("Bundle already registered: {0}")]
    DuplicateBundle(String),
    /// Asset or bar writer failure
    #[error("Writer failed: {0}")]
    Writer(#[from] anyhow::Error),
}

/// Persists the asset table
#[async_trait]
pub trait AssetDbWriter: Send {
    async fn write(&mut self, assets: &[AssetRecord]) -> anyhow::Result<()>;
}

/// Persists resampled bars
///
/// The stream is lazy: bars are fetched as the writer polls it, and the
/// first error ends the ingest.
#[async_trait]
pub trait MinuteBarWriter: Send {
    async fn write(
        &mut self,
        bars: BoxStream<'_, Result<(Sid, BarSet), IngestError>>,
        show_progress: bool,
    ) -> anyhow::Result<()>;
}
