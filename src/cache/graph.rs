//! Cache of base and vehicle-prepared road networks per region.

use std::sync::Arc;
use std::time::Duration;

use super::{CacheCapacity, CacheStats, TtlLruCache};
use crate::clock::SharedClock;
use crate::cost::CriterionWeights;
use crate::network::{BoundingBox, RoadNetwork};
use crate::vehicle::VehicleProfile;

pub const DEFAULT_GRAPH_CACHE_BYTES: usize = 100 * 1024 * 1024;
pub const DEFAULT_GRAPH_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphCacheKey {
    /// Unfiltered network rows for a region.
    Base { bbox: [i64; 4] },
    /// Network filtered for a vehicle and weighted for a criterion.
    Prepared {
        bbox: [i64; 4],
        vehicle: String,
        weights: [u64; 4],
    },
}

impl GraphCacheKey {
    pub fn base(bbox: &BoundingBox) -> Self {
        GraphCacheKey::Base {
            bbox: bbox.micro_degrees(),
        }
    }

    pub fn prepared(bbox: &BoundingBox, vehicle: &VehicleProfile, weights: &CriterionWeights) -> Self {
        GraphCacheKey::Prepared {
            bbox: bbox.micro_degrees(),
            vehicle: vehicle.fingerprint(),
            weights: weights.fingerprint(),
        }
    }
}

/// Size-bounded cache of road networks.
pub struct GraphCache {
    inner: TtlLruCache<GraphCacheKey, Arc<RoadNetwork>>,
}

impl GraphCache {
    pub fn new(max_bytes: usize, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            inner: TtlLruCache::new("graph", CacheCapacity::Bytes(max_bytes), ttl, clock),
        }
    }

    pub fn get(&self, key: &GraphCacheKey) -> Option<Arc<RoadNetwork>> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: GraphCacheKey, network: Arc<RoadNetwork>) -> bool {
        self.inner.insert(key, network)
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
