//! In-process plan cache backed by DashMap for lock-free concurrent access.
//! Plans are keyed by the input table's fingerprint and the full scenario, so
//! a changed parameter or a reloaded table never serves a stale plan.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use wave_core::config::CacheConfig;
use wave_core::{ScenarioKey, ScenarioParams};
use wave_engine::TargetingPlan;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub dataset: String,
    pub scenario: ScenarioKey,
}

impl PlanKey {
    pub fn new(dataset_fingerprint: impl Into<String>, params: &ScenarioParams) -> Self {
        Self {
            dataset: dataset_fingerprint.into(),
            scenario: params.key(),
        }
    }
}

struct CacheEntry {
    plan: Arc<TargetingPlan>,
    inserted_at: Instant,
}

/// Lock-free local cache for computed targeting plans.
pub struct PlanCache {
    store: Arc<DashMap<PlanKey, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl PlanCache {
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            store: Arc::new(DashMap::with_capacity(max_entries)),
            ttl: Duration::from_secs(ttl_secs),
            max_entries,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl_secs, config.max_entries)
    }

    /// Get a plan from the cache, returns None if expired or missing.
    pub fn get(&self, key: &PlanKey) -> Option<Arc<TargetingPlan>> {
        let Some(entry) = self.store.get(key) else {
            metrics::counter!("plan_cache.miss").increment(1);
            return None;
        };
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.store.remove(key);
            metrics::counter!("plan_cache.expired").increment(1);
            return None;
        }
        metrics::counter!("plan_cache.hit").increment(1);
        Some(entry.plan.clone())
    }

    /// Insert or replace a plan.
    pub fn put(&self, key: PlanKey, plan: Arc<TargetingPlan>) {
        // Simple eviction: if over capacity, skip insert (background cleanup handles this)
        if self.store.len() >= self.max_entries && !self.store.contains_key(&key) {
            debug!(entries = self.store.len(), "Plan cache full, skipping insert");
            return;
        }
        self.store.insert(
            key,
            CacheEntry {
                plan,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every plan computed from the table with this fingerprint.
    pub fn invalidate_dataset(&self, fingerprint: &str) -> usize {
        let before = self.store.len();
        self.store.retain(|key, _| key.dataset != fingerprint);
        let removed = before - self.store.len();
        debug!(fingerprint, removed, "Plan cache invalidated for dataset");
        removed
    }

    /// Remove expired entries. Call this periodically from a background task.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
