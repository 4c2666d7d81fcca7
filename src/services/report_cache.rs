use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;

use crate::models::{CacheStats, ReportOptions, ReportSource, ReportType};

/// Source of "now" for cache expiry, injectable so tests can move time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A generated report as it is stored.
#[derive(Debug, Clone)]
pub struct CachedReport {
    pub report_type: ReportType,
    pub data: Value,
    pub quality_score: f64,
    pub source: ReportSource,
    pub fallback_used: bool,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub report: CachedReport,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub access_count: u64,
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Process-local report cache with per-entry expiry.
///
/// Expired entries are never purged in the background; they read as misses
/// and get overwritten by the next write to the same key. Concurrent misses
/// on one key both compute and the last write wins.
#[derive(Clone)]
pub struct ReportCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    clock: Arc<dyn Clock>,
}

impl ReportCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            clock,
        }
    }

    /// Pipe-delimited key over every parameter that shapes the payload.
    pub fn cache_key(report_type: &ReportType, options: &ReportOptions) -> String {
        let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            report_type,
            date(options.start_date),
            date(options.end_date),
            date(options.as_of_date),
            options.format.unwrap_or_default().as_str(),
            options.validation_level.unwrap_or_default().as_str(),
            if options.prefer_journal_based { "journal" } else { "auto" },
        )
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Returns the entry for `key` unless it has expired, recording the access.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let found = match self.entries.get_mut(key) {
            Some(mut entry) if now < entry.expires_at => {
                entry.access_count += 1;
                entry.last_accessed = Some(now);
                Some(entry.value().clone())
            }
            _ => None,
        };

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, key: String, report: CachedReport, ttl_minutes: u32) {
        let created_at = self.clock.now();
        let entry = CacheEntry {
            report,
            created_at,
            expires_at: created_at + Duration::minutes(i64::from(ttl_minutes)),
            access_count: 0,
            last_accessed: None,
        };
        self.entries.insert(key, entry);
    }

    /// Empties the map. Hit and miss counters keep running.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops every entry, valid or not, cached for one report type.
    pub fn clear_report_type(&self, report_type: &ReportType) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| &entry.report.report_type != report_type);
        before.saturating_sub(self.entries.len())
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Read-only snapshot; expiry is judged against the clock at call time.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let hit_count = self.hits.load(Ordering::Relaxed);
        let miss_count = self.misses.load(Ordering::Relaxed);
        let mut stats = CacheStats {
            total_entries: self.entries.len(),
            hit_count,
            miss_count,
            ..Default::default()
        };
        if hit_count + miss_count > 0 {
            stats.hit_rate = hit_count as f64 / (hit_count + miss_count) as f64;
        }

        let mut quality_sum = 0.0;
        let mut by_source: HashMap<ReportSource, usize> = HashMap::new();

        for entry in self.entries.iter() {
            if now < entry.expires_at {
                stats.valid_entries += 1;
                quality_sum += entry.report.quality_score;
                *by_source.entry(entry.report.source).or_insert(0) += 1;
            } else {
                stats.expired_entries += 1;
            }

            if stats.oldest_entry.map_or(true, |oldest| entry.created_at < oldest) {
                stats.oldest_entry = Some(entry.created_at);
            }
            if stats.newest_entry.map_or(true, |newest| entry.created_at > newest) {
                stats.newest_entry = Some(entry.created_at);
            }
        }

        if stats.valid_entries > 0 {
            stats.average_quality = quality_sum / stats.valid_entries as f64;
        }
        stats.by_source = by_source;
        stats
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;

    /// Clock that only moves when told to.
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Mutex::new(Utc::now()),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::ManualClock;
    use super::*;
    use crate::models::ValidationLevel;
    use chrono::NaiveDate;
    use serde_json::json;

    fn cache_with_clock() -> (ReportCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (ReportCache::new(clock.clone()), clock)
    }

    fn report(report_type: ReportType, quality_score: f64, source: ReportSource) -> CachedReport {
        CachedReport {
            report_type,
            data: json!({ "ok": true }),
            quality_score,
            source,
            fallback_used: false,
        }
    }

    #[test]
    fn test_cache_key_uses_defaults_and_preference() {
        let options = ReportOptions {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31),
            ..Default::default()
        };
        assert_eq!(
            ReportCache::cache_key(&ReportType::ProfitLoss, &options),
            "profit-loss|2025-01-01|2025-03-31||json|basic|auto"
        );

        let journal = ReportOptions {
            prefer_journal_based: true,
            validation_level: Some(ValidationLevel::Strict),
            ..options
        };
        assert_eq!(
            ReportCache::cache_key(&ReportType::ProfitLoss, &journal),
            "profit-loss|2025-01-01|2025-03-31||json|strict|journal"
        );
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.insert(
            "k".to_string(),
            report(ReportType::BalanceSheet, 0.9, ReportSource::Journal),
            15,
        );

        clock.advance(Duration::minutes(14));
        assert!(cache.get("k").is_some());

        clock.advance(Duration::minutes(1));
        assert!(cache.get("k").is_none());
        // Expired entries stay in the map until overwritten.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats_split_valid_and_expired() {
        let (cache, clock) = cache_with_clock();
        cache.insert("a".into(), report(ReportType::CashFlow, 0.6, ReportSource::Backend), 5);
        cache.insert("b".into(), report(ReportType::CashFlow, 0.9, ReportSource::Journal), 30);
        cache.insert("c".into(), report(ReportType::TrialBalance, 0.7, ReportSource::Journal), 30);

        clock.advance(Duration::minutes(10));
        let stats = cache.stats();

        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.valid_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert!((stats.average_quality - 0.8).abs() < 1e-9);
        assert_eq!(stats.by_source.get(&ReportSource::Journal), Some(&2));
        assert_eq!(stats.by_source.get(&ReportSource::Backend), None);
        // Computing stats must not purge anything.
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_stats_on_empty_cache() {
        let (cache, _) = cache_with_clock();
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.average_quality, 0.0);
        assert_eq!(stats.hit_rate, 0.0);
        assert!(stats.oldest_entry.is_none());
        assert!(stats.newest_entry.is_none());
    }

    #[test]
    fn test_get_records_hits_misses_and_access() {
        let (cache, clock) = cache_with_clock();
        let first_write = cache.now();
        cache.insert("a".into(), report(ReportType::BalanceSheet, 0.9, ReportSource::Journal), 15);
        clock.advance(Duration::minutes(2));
        let second_write = cache.now();
        cache.insert("b".into(), report(ReportType::CashFlow, 0.8, ReportSource::Hybrid), 15);

        assert!(cache.get("missing").is_none());
        cache.get("a");
        clock.advance(Duration::minutes(1));
        let entry = cache.get("a").unwrap();

        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed, Some(cache.now()));

        // Expired lookups count as misses.
        clock.advance(Duration::minutes(20));
        assert!(cache.get("b").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.miss_count, 2);
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
        assert_eq!(stats.oldest_entry, Some(first_write));
        assert_eq!(stats.newest_entry, Some(second_write));
    }

    #[test]
    fn test_clear_report_type_only_removes_matching_entries() {
        let (cache, _) = cache_with_clock();
        cache.insert("a".into(), report(ReportType::CashFlow, 0.6, ReportSource::Backend), 5);
        cache.insert("b".into(), report(ReportType::CashFlow, 0.9, ReportSource::Journal), 5);
        cache.insert("c".into(), report(ReportType::TrialBalance, 0.7, ReportSource::Journal), 5);

        assert_eq!(cache.clear_report_type(&ReportType::CashFlow), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("c").is_some());

        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
