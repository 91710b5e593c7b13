use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{CourseCache, KeyValueStore};
use crate::errors::LoadResult;
use crate::models::Course;
use crate::utils::datetime::DateTimeParser;

use super::normalizer::Normalizer;
use super::source::CourseSource;

/// Where a successful load got its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Cache,
    Source,
}

/// Result of a successful load; the record set is immutable from here on
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub records: Arc<[Course]>,
    pub last_modified: DateTime<Utc>,
    pub origin: LoadOrigin,
}

/// Cache-or-fetch orchestration
///
/// Failures are returned as-is: no retry, and nothing partial is handed back.
pub struct DataLoader {
    source: Box<dyn CourseSource>,
    cache: Option<CourseCache<Box<dyn KeyValueStore>>>,
    normalizer: Normalizer,
}

impl DataLoader {
    pub fn new(
        source: Box<dyn CourseSource>,
        cache: Option<CourseCache<Box<dyn KeyValueStore>>>,
        tz: Tz,
    ) -> Self {
        Self {
            source,
            cache,
            normalizer: Normalizer::new(tz),
        }
    }

    pub async fn load(&self, now: DateTime<Utc>) -> LoadResult<LoadOutcome> {
        if let Some(entry) = self.cache.as_ref().and_then(|cache| cache.get(now)) {
            info!("Loaded {} courses from cache", entry.records.len());
            return Ok(LoadOutcome {
                records: entry.records.into(),
                last_modified: entry.last_modified,
                origin: LoadOrigin::Cache,
            });
        }

        let payload = self.source.fetch().await?;
        let records = self.normalizer.normalize_all(&payload.records);
        let last_modified = payload
            .last_modified
            .or_else(|| latest_record_timestamp(&records))
            .unwrap_or(now);

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&records, last_modified, now) {
                warn!("Course cache write failed, continuing without it: {}", e);
            }
        }

        info!(
            "Loaded {} courses from {}",
            records.len(),
            self.source.describe()
        );

        Ok(LoadOutcome {
            records: records.into(),
            last_modified,
            origin: LoadOrigin::Source,
        })
    }
}

/// Largest non-zero derived timestamp across all records
fn latest_record_timestamp(records: &[Course]) -> Option<DateTime<Utc>> {
    records
        .iter()
        .map(Course::latest_timestamp)
        .filter(|ts| *ts != 0)
        .max()
        .and_then(DateTimeParser::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryKeyValueStore;
    use crate::errors::LoadError;
    use crate::ingestor::source::SourcePayload;
    use crate::models::RawCourse;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StubSource {
        payload: Option<SourcePayload>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CourseSource for StubSource {
        fn describe(&self) -> String {
            "stub".to_string()
        }

        async fn fetch(&self) -> LoadResult<SourcePayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payload
                .clone()
                .ok_or_else(|| LoadError::network("stub", "connection refused"))
        }
    }

    fn stub(payload: Option<SourcePayload>) -> (Box<dyn CourseSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(StubSource {
                payload,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    fn payload(last_modified: Option<DateTime<Utc>>) -> SourcePayload {
        SourcePayload {
            records: vec![
                RawCourse::default()
                    .with("类别", "A")
                    .with("报名截止时间", "2020-01-01"),
                RawCourse::default()
                    .with("类别", "B")
                    .with("结束时间", "2030-06-01 12:00"),
            ],
            last_modified,
        }
    }

    fn memory_cache() -> CourseCache<Box<dyn KeyValueStore>> {
        CourseCache::new(
            Box::new(MemoryKeyValueStore::new()) as Box<dyn KeyValueStore>,
            Duration::from_secs(3600),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_then_cache_hit() {
        let (source, calls) = stub(Some(payload(None)));
        let loader = DataLoader::new(source, Some(memory_cache()), Tz::UTC);

        let first = loader.load(now()).await.unwrap();
        assert_eq!(first.origin, LoadOrigin::Source);
        assert_eq!(first.records.len(), 2);

        let second = loader.load(now() + chrono::Duration::minutes(30)).await.unwrap();
        assert_eq!(second.origin, LoadOrigin::Cache);
        assert_eq!(second.records, first.records);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let third = loader.load(now() + chrono::Duration::hours(2)).await.unwrap();
        assert_eq!(third.origin, LoadOrigin::Source);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_last_modified_precedence() {
        let header = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let (source, _) = stub(Some(payload(Some(header))));
        let outcome = DataLoader::new(source, None, Tz::UTC).load(now()).await.unwrap();
        assert_eq!(outcome.last_modified, header);

        let (source, _) = stub(Some(payload(None)));
        let outcome = DataLoader::new(source, None, Tz::UTC).load(now()).await.unwrap();
        assert_eq!(
            outcome.last_modified,
            Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
        );

        let (source, _) = stub(Some(SourcePayload {
            records: vec![RawCourse::default().with("类别", "A")],
            last_modified: None,
        }));
        let outcome = DataLoader::new(source, None, Tz::UTC).load(now()).await.unwrap();
        assert_eq!(outcome.last_modified, now());
    }

    #[test]
    fn test_failure_is_not_retried() {
        let (source, calls) = stub(None);
        let loader = DataLoader::new(source, Some(memory_cache()), Tz::UTC);

        let err = tokio_test::block_on(loader.load(now())).unwrap_err();
        assert!(matches!(err, LoadError::Network { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_not_fatal() {
        let (source, _) = stub(Some(payload(None)));
        let cache = CourseCache::new(
            Box::new(MemoryKeyValueStore::with_quota(8)) as Box<dyn KeyValueStore>,
            Duration::from_secs(3600),
        );
        let outcome = DataLoader::new(source, Some(cache), Tz::UTC)
            .load(now())
            .await
            .unwrap();
        assert_eq!(outcome.records.len(), 2);
    }
}
