//! Tiered rate limiting.
//!
//! # Responsibilities
//! - Decide admission per API key and endpoint using the tier's strategy
//! - Report quota state as `X-RateLimit-*` headers
//! - Aggregate recorded usage into summaries
//!
//! # Design Decisions
//! - Every store call runs under a timeout; any store failure fails open
//! - Fixed windows align to minute boundaries and can admit up to twice the
//!   limit across a boundary
//! - Quotas are only as global as the injected `UsageStore`

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::clock::SharedClock;
use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::resilience::{with_timeout, TimedOut};
use crate::security::tiers::{Strategy, TierTable};
use crate::security::usage_store::{BucketState, StoreError, UsageRecord, UsageStore};

const WINDOW_MILLIS: u64 = 60_000;

/// Admission decision plus the quota state reported to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix seconds at which the quota is next fully or partly restored.
    pub reset_at: u64,
    /// Seconds to wait before retrying; set only on denial.
    pub retry_after: Option<u64>,
    pub strategy: Strategy,
}

impl RateLimitResult {
    pub fn to_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            ("X-RateLimit-Reset", self.reset_at.to_string()),
            ("X-RateLimit-Strategy", self.strategy.as_str().to_string()),
        ];
        if let Some(retry_after) = self.retry_after {
            headers.push(("Retry-After", retry_after.to_string()));
        }
        headers
    }
}

/// Request counts for one grouping of usage records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageCounts {
    pub requests: u64,
    pub successful: u64,
    pub failed: u64,
    pub avg_response_time_ms: f64,
}

impl UsageCounts {
    fn add(&mut self, record: &UsageRecord) {
        self.requests += 1;
        if record.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.avg_response_time_ms +=
            (record.response_time_ms as f64 - self.avg_response_time_ms) / self.requests as f64;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub api_key_id: String,
    pub tier: String,
    pub period_hours: u64,
    pub requests_per_minute: u32,
    pub strategy: Strategy,
    pub total: UsageCounts,
    pub success_rate: f64,
    pub by_endpoint: BTreeMap<String, UsageCounts>,
    /// Keyed by the unix second at which the hour starts.
    pub by_hour: BTreeMap<u64, UsageCounts>,
}

pub struct RateLimiter {
    store: Arc<dyn UsageStore>,
    tiers: TierTable,
    clock: SharedClock,
    store_timeout: Duration,
    cas_attempts: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig, store: Arc<dyn UsageStore>, clock: SharedClock) -> Self {
        Self {
            store,
            tiers: TierTable::new(config.tiers.clone()),
            clock,
            store_timeout: Duration::from_millis(config.store_timeout_ms),
            cas_attempts: config.cas_attempts.max(1),
        }
    }

    /// Check and, when allowed, consume one request of quota.
    pub async fn check_limit(&self, api_key_id: &str, tier: &str, endpoint: &str) -> RateLimitResult {
        let resolved = self.tiers.resolve(tier);
        let limit = resolved.config.requests_per_minute;
        let strategy = resolved.config.strategy;
        let key = format!("{}:{api_key_id}:{endpoint}", strategy.as_str());
        let now = self.clock.now_millis();

        let outcome = match strategy {
            Strategy::SlidingWindow => self.check_sliding_window(&key, limit, now).await,
            Strategy::FixedWindow => self.check_fixed_window(&key, limit, now).await,
            Strategy::TokenBucket => self.check_token_bucket(&key, limit, now).await,
            Strategy::FailOpen => Ok(fail_open(limit, now)),
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    api_key_id,
                    tier = %resolved.name,
                    error = %e,
                    "Rate limit store failed, allowing request"
                );
                metrics::record_rate_limit_store_failure();
                fail_open(limit, now)
            }
        };

        if !result.allowed {
            tracing::info!(
                api_key_id,
                tier = %resolved.name,
                endpoint,
                retry_after = ?result.retry_after,
                "Rate limit exceeded"
            );
        }
        metrics::record_rate_limit_decision(&resolved.name, result.strategy.as_str(), result.allowed);
        result
    }

    async fn check_sliding_window(
        &self,
        key: &str,
        limit: u32,
        now: u64,
    ) -> Result<RateLimitResult, StoreError> {
        // Entries at exactly now - 60 s have left the window.
        let window_start = now.saturating_sub(WINDOW_MILLIS - 1);
        let admission = self
            .call(self.store.try_admit(key, window_start, now, limit))
            .await?;

        let expires_at = admission.oldest_millis.unwrap_or(now) + WINDOW_MILLIS;
        Ok(RateLimitResult {
            allowed: admission.admitted,
            limit,
            remaining: limit.saturating_sub(admission.count),
            reset_at: ceil_secs(expires_at),
            retry_after: (!admission.admitted).then(|| wait_secs(now, expires_at)),
            strategy: Strategy::SlidingWindow,
        })
    }

    async fn check_fixed_window(
        &self,
        key: &str,
        limit: u32,
        now: u64,
    ) -> Result<RateLimitResult, StoreError> {
        let window_start = now - now % WINDOW_MILLIS;
        let admission = self
            .call(self.store.try_admit(key, window_start, now, limit))
            .await?;

        let window_end = window_start + WINDOW_MILLIS;
        Ok(RateLimitResult {
            allowed: admission.admitted,
            limit,
            remaining: limit.saturating_sub(admission.count),
            reset_at: window_end / 1000,
            retry_after: (!admission.admitted).then(|| wait_secs(now, window_end)),
            strategy: Strategy::FixedWindow,
        })
    }

    async fn check_token_bucket(
        &self,
        key: &str,
        limit: u32,
        now: u64,
    ) -> Result<RateLimitResult, StoreError> {
        let capacity = f64::from(limit);
        let refill_per_sec = capacity / 60.0;
        let refill_secs = |tokens: f64| ((capacity - tokens) / refill_per_sec).ceil() as u64;

        for _ in 0..self.cas_attempts {
            let current = self.call(self.store.load_bucket(key)).await?;
            let (tokens, last_refill) = current
                .map(|b| (b.tokens, b.last_refill_millis))
                .unwrap_or((capacity, now));
            let elapsed = now.saturating_sub(last_refill) as f64 / 1000.0;
            let tokens = (tokens + elapsed * refill_per_sec).min(capacity);

            if tokens < 1.0 {
                let retry_after = ((1.0 - tokens) / refill_per_sec).ceil().max(1.0) as u64;
                return Ok(RateLimitResult {
                    allowed: false,
                    limit,
                    remaining: 0,
                    reset_at: now / 1000 + refill_secs(tokens),
                    retry_after: Some(retry_after),
                    strategy: Strategy::TokenBucket,
                });
            }

            let next = BucketState {
                tokens: tokens - 1.0,
                last_refill_millis: now,
            };
            if self
                .call(self.store.compare_and_swap_bucket(key, current, next))
                .await?
            {
                return Ok(RateLimitResult {
                    allowed: true,
                    limit,
                    remaining: next.tokens.floor() as u32,
                    reset_at: now / 1000 + refill_secs(next.tokens),
                    retry_after: None,
                    strategy: Strategy::TokenBucket,
                });
            }
        }
        Err(StoreError::Contention(self.cas_attempts))
    }

    /// Store a usage record. Failures are logged, never returned.
    pub async fn record_usage(&self, record: UsageRecord) {
        if let Err(e) = self.call(self.store.record_usage(record)).await {
            tracing::warn!(error = %e, "Failed to record usage");
            metrics::record_rate_limit_store_failure();
        }
    }

    /// Aggregate the last `hours` of usage for a key.
    pub async fn usage_summary(
        &self,
        api_key_id: &str,
        tier: &str,
        hours: u64,
    ) -> Result<UsageSummary, StoreError> {
        let resolved = self.tiers.resolve(tier);
        let now = self.clock.now_millis();
        let since = now.saturating_sub(hours.saturating_mul(3_600_000));
        let records = self
            .call(self.store.usage_since(api_key_id, since))
            .await?;

        let mut total = UsageCounts::default();
        let mut by_endpoint: BTreeMap<String, UsageCounts> = BTreeMap::new();
        let mut by_hour: BTreeMap<u64, UsageCounts> = BTreeMap::new();
        for record in &records {
            total.add(record);
            by_endpoint
                .entry(record.endpoint.clone())
                .or_default()
                .add(record);
            let hour = record.timestamp_millis / 1000 / 3600 * 3600;
            by_hour.entry(hour).or_default().add(record);
        }

        let success_rate = total.successful as f64 / total.requests.max(1) as f64;
        Ok(UsageSummary {
            api_key_id: api_key_id.to_string(),
            tier: resolved.name,
            period_hours: hours,
            requests_per_minute: resolved.config.requests_per_minute,
            strategy: resolved.config.strategy,
            total,
            success_rate,
            by_endpoint,
            by_hour,
        })
    }

    /// Delete usage records older than `retention`.
    pub async fn prune_usage(&self, retention: Duration) -> Result<usize, StoreError> {
        let cutoff = self
            .clock
            .now_millis()
            .saturating_sub(retention.as_millis() as u64);
        let removed = self.call(self.store.purge_usage_before(cutoff)).await?;
        tracing::debug!(removed, "Pruned usage records");
        Ok(removed)
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match with_timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(TimedOut(limit)) => Err(StoreError::Timeout(limit)),
        }
    }
}

fn fail_open(limit: u32, now: u64) -> RateLimitResult {
    RateLimitResult {
        allowed: true,
        limit,
        remaining: limit / 2,
        reset_at: (now + WINDOW_MILLIS) / 1000,
        retry_after: None,
        strategy: Strategy::FailOpen,
    }
}

fn ceil_secs(millis: u64) -> u64 {
    millis.div_ceil(1000)
}

fn wait_secs(now: u64, until: u64) -> u64 {
    until.saturating_sub(now).div_ceil(1000).max(1)
}
