//! Worksheet cache.
//!
//! Holds the last successful read of each worksheet with the time it was
//! fetched. Entries are replaced whole (`Arc` swap in a `DashMap`), never
//! patched, so a reader sees either the previous or the new rows.
//! Refresh is lazy: a stale entry is re-read by the next caller that asks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::DashboardError;
use crate::source::SheetSource;
use crate::types::{RefreshPolicy, Row};

/// Monotonic time source for staleness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Last successful read of one worksheet.
#[derive(Debug)]
pub struct CacheEntry {
    pub worksheet: String,
    pub rows: Arc<Vec<Row>>,
    pub fetched_at: Instant,
    /// Wall-clock fetch time, for display only.
    pub fetched_at_utc: DateTime<Utc>,
}

impl CacheEntry {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// Stale once `now - fetched_at >= ttl`; a zero TTL is always stale.
    pub fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}

/// Diagnostic view of one cached worksheet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub worksheet: String,
    pub rows: usize,
    pub age_seconds: u64,
    pub stale: bool,
    pub fetched_at: DateTime<Utc>,
}

/// Outcome of [`SheetCache::refresh_cached`].
#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub refreshed: Vec<String>,
    pub failed: Vec<(String, DashboardError)>,
}

pub struct SheetCache {
    source: Arc<dyn SheetSource>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    policy: RefreshPolicy,
    entries: DashMap<String, Arc<CacheEntry>>,
    fetch_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SheetCache {
    pub fn new(
        source: Arc<dyn SheetSource>,
        clock: Arc<dyn Clock>,
        default_ttl: Duration,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            source,
            clock,
            default_ttl,
            policy,
            entries: DashMap::new(),
            fetch_locks: DashMap::new(),
        }
    }

    pub fn source(&self) -> &Arc<dyn SheetSource> {
        &self.source
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Rows of `worksheet` using the configured TTL.
    pub async fn rows(&self, worksheet: &str) -> Result<Arc<Vec<Row>>, DashboardError> {
        self.get(worksheet, self.default_ttl).await
    }

    /// Cached rows while younger than `ttl`, otherwise a fresh read.
    pub async fn get(
        &self,
        worksheet: &str,
        ttl: Duration,
    ) -> Result<Arc<Vec<Row>>, DashboardError> {
        if let Some(rows) = self.fresh_rows(worksheet, ttl) {
            log::debug!("Cache hit for '{}'", worksheet);
            return Ok(rows);
        }

        let lock = self.fetch_lock(worksheet);
        let _guard = lock.lock().await;
        // A concurrent caller may have refreshed while we waited.
        if let Some(rows) = self.fresh_rows(worksheet, ttl) {
            return Ok(rows);
        }

        match self.fetch_and_store(worksheet).await {
            Ok(rows) => Ok(rows),
            Err(err) => self.fallback(worksheet, err),
        }
    }

    /// Unconditional re-read of `worksheet`. A failure leaves the old entry.
    pub async fn refresh(&self, worksheet: &str) -> Result<Arc<Vec<Row>>, DashboardError> {
        let lock = self.fetch_lock(worksheet);
        let _guard = lock.lock().await;
        self.fetch_and_store(worksheet).await
    }

    /// Re-read every worksheet currently cached.
    pub async fn refresh_cached(&self) -> RefreshSummary {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();

        let mut summary = RefreshSummary::default();
        for name in names {
            match self.refresh(&name).await {
                Ok(_) => summary.refreshed.push(name),
                Err(err) => {
                    log::warn!("Refresh of '{}' failed: {}", name, err);
                    summary.failed.push((name, err));
                }
            }
        }
        summary
    }

    /// Snapshot of the current entry, if any.
    pub fn entry(&self, worksheet: &str) -> Option<Arc<CacheEntry>> {
        self.entries.get(worksheet).map(|e| Arc::clone(e.value()))
    }

    pub fn status(&self) -> Vec<CacheStatus> {
        let now = self.clock.now();
        let mut status: Vec<CacheStatus> = self
            .entries
            .iter()
            .map(|e| {
                let entry = e.value();
                CacheStatus {
                    worksheet: entry.worksheet.clone(),
                    rows: entry.rows.len(),
                    age_seconds: entry.age(now).as_secs(),
                    stale: entry.is_stale(now, self.default_ttl),
                    fetched_at: entry.fetched_at_utc,
                }
            })
            .collect();
        status.sort_by(|a, b| a.worksheet.cmp(&b.worksheet));
        status
    }

    fn fresh_rows(&self, worksheet: &str, ttl: Duration) -> Option<Arc<Vec<Row>>> {
        let entry = self.entry(worksheet)?;
        if entry.is_stale(self.clock.now(), ttl) {
            None
        } else {
            Some(Arc::clone(&entry.rows))
        }
    }

    fn fetch_lock(&self, worksheet: &str) -> Arc<Mutex<()>> {
        self.fetch_locks
            .entry(worksheet.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    async fn fetch_and_store(&self, worksheet: &str) -> Result<Arc<Vec<Row>>, DashboardError> {
        let started = Instant::now();
        let rows = Arc::new(self.source.fetch(worksheet).await?);
        log::info!(
            "Fetched '{}' from {}: {} row(s) in {}ms",
            worksheet,
            self.source.describe(),
            rows.len(),
            started.elapsed().as_millis()
        );

        let entry = Arc::new(CacheEntry {
            worksheet: worksheet.to_string(),
            rows: Arc::clone(&rows),
            fetched_at: self.clock.now(),
            fetched_at_utc: Utc::now(),
        });
        self.entries.insert(worksheet.to_string(), entry);
        Ok(rows)
    }

    fn fallback(
        &self,
        worksheet: &str,
        err: DashboardError,
    ) -> Result<Arc<Vec<Row>>, DashboardError> {
        if self.policy == RefreshPolicy::ServeStale && err.is_retryable() {
            if let Some(stale) = self.entry(worksheet) {
                log::warn!(
                    "Serving stale '{}' ({}s old): {}",
                    worksheet,
                    stale.age(self.clock.now()).as_secs(),
                    err
                );
                return Ok(Arc::clone(&stale.rows));
            }
        }
        Err(err)
    }
}
