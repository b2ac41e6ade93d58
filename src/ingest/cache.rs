//! Per asset-day bar cache

use super::Sid;
use crate::candle::BarSet;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Cache key: one asset on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub sid: Sid,
    pub day: NaiveDate,
}

impl CacheKey {
    pub fn new(sid: Sid, day: NaiveDate) -> Self {
        Self { sid, day }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.sid, self.day.format("%Y-%m-%d"))
    }
}

/// Store of resampled asset-days
///
/// A present key is never recomputed; a missing key is always safe to
/// compute and insert.
pub trait BarCache: Send {
    fn get(&self, key: &CacheKey) -> Option<BarSet>;

    fn insert(&mut self, key: CacheKey, bars: BarSet);

    fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }
}

/// In-process cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<CacheKey, BarSet>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BarCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<BarSet> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: CacheKey, bars: BarSet) {
        self.entries.insert(key, bars);
    }

    fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }
}
