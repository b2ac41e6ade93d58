//! Poloniex API types

use super::ConfigError;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp format used by `returnTradeHistory`, always UTC
const TRADE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Currency pair in Poloniex `QUOTE_BASE` notation, e.g. `USDT_ETH`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    quote: String,
    base: String,
}

impl Pair {
    /// USDT markets with minute-level history on Poloniex
    pub const KNOWN: [&'static str; 11] = [
        "USDT_BTC", "USDT_ETH", "USDT_DASH", "USDT_ETC", "USDT_XMR", "USDT_ZEC", "USDT_XRP",
        "USDT_LTC", "USDT_REP", "USDT_NXT", "USDT_STR",
    ];

    /// Build a pair from its quote and base currencies
    pub fn new(quote: impl Into<String>, base: impl Into<String>) -> Result<Self, ConfigError> {
        let (quote, base): (String, String) = (quote.into(), base.into());
        format!("{}_{}", quote, base).parse()
    }

    /// Currency prices are quoted in (e.g. `USDT`)
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Traded currency (e.g. `ETH`), used as the asset symbol
    pub fn base(&self) -> &str {
        &self.base
    }
}

impl FromStr for Pair {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidPair(s.to_string());
        let (quote, base) = s.split_once('_').ok_or_else(invalid)?;

        let valid =
            |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid(quote) || !valid(base) {
            return Err(invalid());
        }

        Ok(Self {
            quote: quote.to_ascii_uppercase(),
            base: base.to_ascii_uppercase(),
        })
    }
}

impl TryFrom<String> for Pair {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.to_string()
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.quote, self.base)
    }
}

/// Candle period accepted by `returnChartData`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartPeriod {
    M5,
    M15,
    #[default]
    M30,
    H2,
    H4,
    D1,
}

impl ChartPeriod {
    pub const ALL: [ChartPeriod; 6] = [
        ChartPeriod::M5,
        ChartPeriod::M15,
        ChartPeriod::M30,
        ChartPeriod::H2,
        ChartPeriod::H4,
        ChartPeriod::D1,
    ];

    /// Period length in seconds
    pub fn seconds(self) -> u32 {
        match self {
            ChartPeriod::M5 => 300,
            ChartPeriod::M15 => 900,
            ChartPeriod::M30 => 1800,
            ChartPeriod::H2 => 7200,
            ChartPeriod::H4 => 14400,
            ChartPeriod::D1 => 86400,
        }
    }
}

impl TryFrom<u32> for ChartPeriod {
    type Error = ConfigError;

    fn try_from(seconds: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|p| p.seconds() == seconds)
            .ok_or(ConfigError::InvalidPeriod(seconds))
    }
}

/// Taker side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// A single executed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(rename = "globalTradeID")]
    pub global_trade_id: u64,
    #[serde(rename = "tradeID", deserialize_with = "de_id")]
    pub trade_id: u64,
    #[serde(rename = "date", deserialize_with = "de_trade_date")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub side: Side,
    /// Price in quote currency
    pub rate: Decimal,
    /// Size in base currency
    pub amount: Decimal,
    /// `rate * amount` in quote currency
    pub total: Decimal,
}

impl Trade {
    /// Ordering key that breaks same-second ties deterministically
    pub fn sequence_key(&self) -> (DateTime<Utc>, u64) {
        (self.timestamp, self.global_trade_id)
    }
}

/// Currency metadata from `returnCurrencies`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub disabled: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub delisted: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub frozen: bool,
}

/// Exchange-aggregated candle from `returnChartData`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartCandle {
    #[serde(deserialize_with = "de_epoch")]
    pub date: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub quote_volume: Decimal,
    pub weighted_average: Decimal,
}

/// Poloniex sends ids as either JSON numbers or strings
fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(u64),
        Str(String),
    }

    match Id::deserialize(deserializer)? {
        Id::Num(n) => Ok(n),
        Id::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn de_trade_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&raw, TRADE_DATE_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(serde::de::Error::custom)
}

fn de_epoch<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let secs = i64::deserialize(deserializer)?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", secs)))
}

/// Flags arrive as 0/1 integers
fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<u8>::deserialize(deserializer)?;
    Ok(value.unwrap_or(0) != 0)
}
