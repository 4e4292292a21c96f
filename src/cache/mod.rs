//! Caching subsystem.
//!
//! # Data Flow
//! ```text
//! Engine request
//!     → route.rs (RouteCache: rounded endpoints + vehicle + criterion)
//!     → on miss: graph.rs (GraphCache: region + vehicle + weights)
//!     → on miss: provider fetch, filter, weight, insert
//! ```
//!
//! # Design Decisions
//! - Caches are owned by the engine and injected; there are no globals
//! - One generic TTL + LRU implementation, bounded by entries or bytes
//! - Expired entries are evicted on read and count as misses
//! - A miss is never an error

pub mod graph;
pub mod route;
pub mod ttl_lru;

use std::sync::Arc;

pub use graph::{GraphCache, GraphCacheKey};
pub use route::{RouteCache, RouteCacheKey};
pub use ttl_lru::{CacheCapacity, CacheStats, TtlLruCache};

/// Approximate heap size of a cached value.
pub trait SizeEstimate {
    fn estimated_size_bytes(&self) -> usize;
}

impl<T: SizeEstimate + ?Sized> SizeEstimate for Arc<T> {
    fn estimated_size_bytes(&self) -> usize {
        (**self).estimated_size_bytes()
    }
}

impl SizeEstimate for crate::network::RoadNetwork {
    fn estimated_size_bytes(&self) -> usize {
        crate::network::RoadNetwork::estimated_size_bytes(self)
    }
}
