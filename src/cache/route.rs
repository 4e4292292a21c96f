//! Cache of computed optimization responses.

use std::sync::Arc;
use std::time::Duration;

use super::{CacheCapacity, CacheStats, TtlLruCache};
use crate::clock::SharedClock;
use crate::cost::Criterion;
use crate::engine::{OptimizationRequest, OptimizationResponse};

pub const DEFAULT_ROUTE_CACHE_ENTRIES: usize = 1000;
pub const DEFAULT_ROUTE_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Request identity for caching. Coordinates are rounded to six decimals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteCacheKey {
    origin: (i64, i64),
    destination: (i64, i64),
    vehicle: String,
    criterion: Criterion,
    factor_bits: u64,
    alternatives: usize,
}

impl RouteCacheKey {
    pub fn for_request(request: &OptimizationRequest, alternatives: usize) -> Self {
        Self {
            origin: request.origin.micro_degrees(),
            destination: request.destination.micro_degrees(),
            vehicle: request.vehicle.fingerprint(),
            criterion: request.criterion,
            factor_bits: request.factor().to_bits(),
            alternatives,
        }
    }
}

/// Entry-bounded cache of responses.
pub struct RouteCache {
    inner: TtlLruCache<RouteCacheKey, Arc<OptimizationResponse>>,
}

impl RouteCache {
    pub fn new(max_entries: usize, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            inner: TtlLruCache::new("route", CacheCapacity::Entries(max_entries), ttl, clock),
        }
    }

    pub fn get(&self, key: &RouteCacheKey) -> Option<Arc<OptimizationResponse>> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: RouteCacheKey, response: Arc<OptimizationResponse>) -> bool {
        self.inner.insert(key, response)
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}
