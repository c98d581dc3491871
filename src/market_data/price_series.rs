use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default number of samples kept per pair.
pub const DEFAULT_CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One observed price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(price: f64, timestamp: DateTime<Utc>) -> Self {
        Self { price, timestamp }
    }
}

// ---------------------------------------------------------------------------
// PriceSeries -- bounded FIFO per pair
// ---------------------------------------------------------------------------

/// Rolling price history for one pair, oldest first.
///
/// Invariant: `len() <= capacity()`. Appending past capacity evicts the
/// oldest samples.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pair: String,
    samples: VecDeque<PriceSample>,
    capacity: usize,
}

impl PriceSeries {
    /// A capacity of 0 is raised to 1.
    pub fn new(pair: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pair: pair.into(),
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn append(&mut self, sample: PriceSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Prices only, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.price).collect()
    }

    /// Up to `n` samples, newest first.
    pub fn recent(&self, n: usize) -> Vec<PriceSample> {
        self.samples.iter().rev().take(n).copied().collect()
    }

    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.back()
    }
}

// ---------------------------------------------------------------------------
// PriceHistoryStore -- thread-safe map of series
// ---------------------------------------------------------------------------

/// Per-pair series shared between the overview cycle and readers.
pub struct PriceHistoryStore {
    series: RwLock<HashMap<String, PriceSeries>>,
    capacity: usize,
}

impl PriceHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            series: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Append to the pair's series, creating it on first observation.
    pub fn append(&self, pair: &str, sample: PriceSample) {
        let mut map = self.series.write();
        map.entry(pair.to_string())
            .or_insert_with(|| PriceSeries::new(pair, self.capacity))
            .append(sample);
    }

    #[cfg(test)]
    pub fn len(&self, pair: &str) -> usize {
        self.series.read().get(pair).map_or(0, PriceSeries::len)
    }

    /// Snapshot of every requested pair's prices, in the order given.
    /// Pairs never observed come back empty.
    pub fn snapshot(&self, pairs: &[String]) -> Vec<(String, Vec<f64>)> {
        let map = self.series.read();
        pairs
            .iter()
            .map(|p| {
                let values = map.get(p).map(PriceSeries::values).unwrap_or_default();
                (p.clone(), values)
            })
            .collect()
    }
}
