//! Complete trade history over arbitrary windows
//!
//! The exchange caps every trade history response, so large windows are
//! split until each piece fits under the cap.

mod fetcher;

pub use fetcher::{FetcherConfig, TradeHistoryFetcher};

use crate::api::ApiError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from the trade history fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    /// Exchange or transport failure that retrying did not resolve
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Window still overflows at the smallest splittable size
    #[error("Too many trades between {start} and {end} to fetch completely")]
    WindowTooDense {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}
