//! Time-to-live cache in front of another policy source

use super::{PolicyBatch, PolicySource, SourceError};
use crate::types::Policy;
use chrono::{DateTime, Duration, Utc};
use psc_catalog::config::compile_time::source::DEFAULT_CACHE_TTL_SECONDS;
use psc_catalog::logging::codes;
use psc_catalog::{log_debug, log_error, log_success};
use std::sync::Mutex;

/// Snapshot held by the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub batch: PolicyBatch,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_stale_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at >= ttl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Reuse the snapshot while it is younger than the TTL
    IfStale,
    /// Always go to the inner source
    Force,
}

pub struct CachedPolicySource<S: PolicySource> {
    inner: S,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

impl<S: PolicySource> CachedPolicySource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_ttl_seconds(inner, DEFAULT_CACHE_TTL_SECONDS)
    }

    pub fn with_ttl_seconds(inner: S, ttl_seconds: u64) -> Self {
        Self {
            inner,
            ttl: Duration::seconds(
                i64::try_from(ttl_seconds)
                    .unwrap_or(i64::MAX)
                    .min(i64::MAX / 1000),
            ),
            entry: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn fetch(&self, mode: RefreshMode) -> Result<PolicyBatch, SourceError> {
        self.fetch_at(mode, Utc::now())
    }

    /// Fetch as of `now`; a failed refresh leaves the previous snapshot in place
    pub fn fetch_at(
        &self,
        mode: RefreshMode,
        now: DateTime<Utc>,
    ) -> Result<PolicyBatch, SourceError> {
        let mut entry = self.entry.lock().map_err(|_| SourceError::Unavailable {
            reason: "policy cache lock poisoned".to_string(),
        })?;

        if mode == RefreshMode::IfStale {
            if let Some(cached) = entry.as_ref().filter(|e| !e.is_stale_at(now, self.ttl)) {
                log_debug!("Serving cached policies",
                    "source" => self.inner.name(),
                    "policies" => cached.batch.policies.len()
                );
                return Ok(cached.batch.clone());
            }
        }

        match self.inner.fetch_batch() {
            Ok(batch) => {
                log_success!(codes::success::CACHE_REFRESHED, "Policy cache refreshed",
                    "source" => self.inner.name(),
                    "policies" => batch.policies.len(),
                    "rejected" => batch.rejected.len()
                );
                *entry = Some(CacheEntry {
                    batch: batch.clone(),
                    fetched_at: now,
                });
                Ok(batch)
            }
            Err(e) => {
                log_error!(codes::source::CACHE_REFRESH_FAILURE, "Policy cache refresh failed",
                    "source" => self.inner.name(),
                    "reason" => e
                );
                Err(e)
            }
        }
    }

    /// Current snapshot, if any
    pub fn entry(&self) -> Option<CacheEntry> {
        self.entry.lock().ok().and_then(|e| e.clone())
    }

    pub fn invalidate(&self) {
        if let Ok(mut entry) = self.entry.lock() {
            *entry = None;
        }
    }
}

impl<S: PolicySource> PolicySource for CachedPolicySource<S> {
    fn name(&self) -> &str {
        "cached"
    }

    fn fetch_policies(&self) -> Result<Vec<Policy>, SourceError> {
        self.fetch(RefreshMode::IfStale).map(|batch| batch.policies)
    }

    fn fetch_batch(&self) -> Result<PolicyBatch, SourceError> {
        self.fetch(RefreshMode::IfStale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::PolicyFailure;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl PolicySource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch_policies(&self) -> Result<Vec<Policy>, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Unavailable {
                    reason: "offline".into(),
                });
            }
            Ok(vec![Policy::new(format!("p{}", n), "P", json!({}))])
        }
    }

    #[test]
    fn test_ttl_and_refresh_modes() {
        let cache = CachedPolicySource::with_ttl_seconds(CountingSource::new(false), 60);
        let t0 = Utc::now();

        let first = cache.fetch_at(RefreshMode::IfStale, t0).unwrap();
        let again = cache
            .fetch_at(RefreshMode::IfStale, t0 + Duration::seconds(30))
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 1);

        let stale = cache
            .fetch_at(RefreshMode::IfStale, t0 + Duration::seconds(60))
            .unwrap();
        assert_eq!(stale.policies[0].id, "p1");

        let forced = cache
            .fetch_at(RefreshMode::Force, t0 + Duration::seconds(61))
            .unwrap();
        assert_eq!(forced.policies[0].id, "p2");
        assert_eq!(
            cache.entry().unwrap().fetched_at,
            t0 + Duration::seconds(61)
        );
    }

    #[test]
    fn test_failed_refresh_is_reported() {
        let cache = CachedPolicySource::new(CountingSource::new(true));
        assert!(cache.fetch(RefreshMode::Force).is_err());
        assert!(cache.entry().is_none());
    }

    struct RejectingSource;

    impl PolicySource for RejectingSource {
        fn name(&self) -> &str {
            "rejecting"
        }

        fn fetch_policies(&self) -> Result<Vec<Policy>, SourceError> {
            self.fetch_batch().map(|batch| batch.policies)
        }

        fn fetch_batch(&self) -> Result<PolicyBatch, SourceError> {
            Ok(PolicyBatch {
                policies: vec![Policy::new("ok", "OK", json!({}))],
                rejected: vec![PolicyFailure {
                    policy_id: "bad".into(),
                    policy_name: "Bad".into(),
                    reason: "record 1: unknown platform".into(),
                }],
            })
        }
    }

    #[test]
    fn test_rejections_survive_the_cache() {
        let cache = CachedPolicySource::new(RejectingSource);
        let t0 = Utc::now();
        let fresh = cache.fetch_at(RefreshMode::Force, t0).unwrap();
        let cached = cache.fetch_at(RefreshMode::IfStale, t0).unwrap();
        assert_eq!(fresh, cached);
        assert_eq!(cached.rejected[0].policy_id, "bad");
        assert_eq!(cache.fetch_policies().unwrap().len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let cache = CachedPolicySource::new(CountingSource::new(false));
        cache.fetch_policies().unwrap();
        cache.invalidate();
        assert!(cache.entry().is_none());
        cache.fetch_policies().unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }
}
