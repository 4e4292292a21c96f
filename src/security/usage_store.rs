//! Durable state behind the rate limiter.
//!
//! # Responsibilities
//! - Atomic count-then-insert admission for window strategies
//! - Compare-and-swap storage of token-bucket state
//! - Raw usage records for reporting
//!
//! # Design Decisions
//! - The trait is the seam for a centralized store; `InMemoryUsageStore`
//!   enforces quotas per process only
//! - Timestamps are unix milliseconds supplied by the caller's clock

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("usage store unavailable: {0}")]
    Unavailable(String),

    #[error("usage store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("bucket update lost {0} consecutive races")]
    Contention(u32),
}

/// Outcome of a window admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAdmission {
    pub admitted: bool,
    /// Requests counted in the window, including this one when admitted.
    pub count: u32,
    /// Oldest timestamp still inside the window.
    pub oldest_millis: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketState {
    pub tokens: f64,
    pub last_refill_millis: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub api_key_id: String,
    pub endpoint: String,
    pub timestamp_millis: u64,
    pub success: bool,
    pub status: u16,
    pub response_time_ms: u64,
}

#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Drop entries older than `window_start_millis` under `key`, then admit
    /// `now_millis` if fewer than `limit` remain. Must be atomic per key.
    async fn try_admit(
        &self,
        key: &str,
        window_start_millis: u64,
        now_millis: u64,
        limit: u32,
    ) -> Result<WindowAdmission, StoreError>;

    async fn load_bucket(&self, key: &str) -> Result<Option<BucketState>, StoreError>;

    /// Replace the bucket under `key` only if it still equals `expected`.
    async fn compare_and_swap_bucket(
        &self,
        key: &str,
        expected: Option<BucketState>,
        new: BucketState,
    ) -> Result<bool, StoreError>;

    async fn record_usage(&self, record: UsageRecord) -> Result<(), StoreError>;

    async fn usage_since(
        &self,
        api_key_id: &str,
        since_millis: u64,
    ) -> Result<Vec<UsageRecord>, StoreError>;

    /// Delete usage records older than `before_millis`; returns how many.
    /// Idle admission windows and buckets last touched before the cutoff
    /// are dropped as well.
    async fn purge_usage_before(&self, before_millis: u64) -> Result<usize, StoreError>;
}

/// Process-local store backed by `DashMap` shards.
#[derive(Debug, Default)]
pub struct InMemoryUsageStore {
    windows: DashMap<String, VecDeque<u64>>,
    buckets: DashMap<String, BucketState>,
    usage: DashMap<String, Vec<UsageRecord>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn try_admit(
        &self,
        key: &str,
        window_start_millis: u64,
        now_millis: u64,
        limit: u32,
    ) -> Result<WindowAdmission, StoreError> {
        // The entry guard holds the shard lock for the whole count-then-insert.
        let mut window = self.windows.entry(key.to_string()).or_default();
        while window.front().is_some_and(|&t| t < window_start_millis) {
            window.pop_front();
        }
        let admitted = window.len() < limit as usize;
        if admitted {
            window.push_back(now_millis);
        }
        Ok(WindowAdmission {
            admitted,
            count: window.len() as u32,
            oldest_millis: window.front().copied(),
        })
    }

    async fn load_bucket(&self, key: &str) -> Result<Option<BucketState>, StoreError> {
        Ok(self.buckets.get(key).map(|b| *b))
    }

    async fn compare_and_swap_bucket(
        &self,
        key: &str,
        expected: Option<BucketState>,
        new: BucketState,
    ) -> Result<bool, StoreError> {
        let swapped = match self.buckets.entry(key.to_string()) {
            Entry::Occupied(mut current) => {
                if expected.as_ref() == Some(current.get()) {
                    current.insert(new);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(slot) => {
                if expected.is_none() {
                    slot.insert(new);
                    true
                } else {
                    false
                }
            }
        };
        Ok(swapped)
    }

    async fn record_usage(&self, record: UsageRecord) -> Result<(), StoreError> {
        self.usage
            .entry(record.api_key_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn usage_since(
        &self,
        api_key_id: &str,
        since_millis: u64,
    ) -> Result<Vec<UsageRecord>, StoreError> {
        Ok(self
            .usage
            .get(api_key_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.timestamp_millis >= since_millis)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn purge_usage_before(&self, before_millis: u64) -> Result<usize, StoreError> {
        let mut removed = 0;
        for mut records in self.usage.iter_mut() {
            let before = records.len();
            records.retain(|r| r.timestamp_millis >= before_millis);
            removed += before - records.len();
        }
        self.usage.retain(|_, records| !records.is_empty());

        self.windows.retain(|_, window| {
            while window.front().is_some_and(|&t| t < before_millis) {
                window.pop_front();
            }
            !window.is_empty()
        });
        // An idle bucket has refilled to capacity, which is what a missing one means.
        self.buckets
            .retain(|_, bucket| bucket.last_refill_millis >= before_millis);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_try_admit_prunes_and_counts() {
        let store = InMemoryUsageStore::new();
        for t in [1_000, 2_000] {
            assert!(store.try_admit("k", 0, t, 2).await.unwrap().admitted);
        }
        let denied = store.try_admit("k", 0, 3_000, 2).await.unwrap();
        assert!(!denied.admitted);
        assert_eq!(denied.count, 2);
        assert_eq!(denied.oldest_millis, Some(1_000));

        let later = store.try_admit("k", 1_500, 4_000, 2).await.unwrap();
        assert!(later.admitted);
        assert_eq!(later.oldest_millis, Some(2_000));
    }

    #[tokio::test]
    async fn test_concurrent_admission_never_overshoots() {
        let store = Arc::new(InMemoryUsageStore::new());
        let mut handles = Vec::new();
        for i in 0..50u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.try_admit("k", 0, 1_000 + i, 10).await.unwrap().admitted
            }));
        }
        let mut admitted = 0;
        for h in handles {
            if h.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let store = InMemoryUsageStore::new();
        let a = BucketState {
            tokens: 5.0,
            last_refill_millis: 0,
        };
        let b = BucketState {
            tokens: 4.0,
            last_refill_millis: 10,
        };
        assert!(store.compare_and_swap_bucket("k", None, a).await.unwrap());
        assert!(!store.compare_and_swap_bucket("k", None, b).await.unwrap());
        assert!(store.compare_and_swap_bucket("k", Some(a), b).await.unwrap());
        assert_eq!(store.load_bucket("k").await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn test_usage_purge() {
        let store = InMemoryUsageStore::new();
        for t in [100, 200, 300] {
            store
                .record_usage(UsageRecord {
                    api_key_id: "k".into(),
                    endpoint: "/v1/optimize-route".into(),
                    timestamp_millis: t,
                    success: true,
                    status: 200,
                    response_time_ms: 5,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.usage_since("k", 150).await.unwrap().len(), 2);
        assert_eq!(store.purge_usage_before(250).await.unwrap(), 2);
        assert_eq!(store.usage_since("k", 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_drops_idle_windows_and_buckets() {
        let store = InMemoryUsageStore::new();
        store.try_admit("idle", 0, 100, 5).await.unwrap();
        store.try_admit("busy", 0, 100, 5).await.unwrap();
        store.try_admit("busy", 0, 900, 5).await.unwrap();
        let stale = BucketState {
            tokens: 1.0,
            last_refill_millis: 100,
        };
        let fresh = BucketState {
            tokens: 1.0,
            last_refill_millis: 900,
        };
        store.compare_and_swap_bucket("stale", None, stale).await.unwrap();
        store.compare_and_swap_bucket("fresh", None, fresh).await.unwrap();

        store.purge_usage_before(500).await.unwrap();

        assert!(!store.windows.contains_key("idle"));
        assert_eq!(store.windows.get("busy").map(|w| w.len()), Some(1));
        assert_eq!(store.load_bucket("stale").await.unwrap(), None);
        assert_eq!(store.load_bucket("fresh").await.unwrap(), Some(fresh));
    }
}
