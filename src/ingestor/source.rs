//! Where raw course lists come from
//!
//! The loader only sees the `CourseSource` trait. Two handlers exist: an
//! HTTP one (reqwest) and a local file one, picked from the configured
//! location by `source_for_location`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::SourceConfig;
use crate::errors::{LoadError, LoadResult};
use crate::models::RawCourse;

/// Raw records plus whatever freshness metadata the source offered
#[derive(Debug, Clone, Default)]
pub struct SourcePayload {
    pub records: Vec<RawCourse>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CourseSource: Send + Sync {
    /// Human-readable location, for logs
    fn describe(&self) -> String;

    async fn fetch(&self) -> LoadResult<SourcePayload>;
}

/// Decode a payload that must be a JSON array of objects
pub fn parse_payload(bytes: &[u8], origin: &str) -> LoadResult<Vec<RawCourse>> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| LoadError::malformed(origin, e.to_string()))?;

    let serde_json::Value::Array(items) = value else {
        return Err(LoadError::malformed(origin, "expected a JSON array of courses"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            serde_json::Value::Object(map) => Ok(RawCourse(map)),
            other => Err(LoadError::malformed(
                origin,
                format!("item {} is not an object: {}", index, other),
            )),
        })
        .collect()
}

/// Course list served over HTTP(S)
pub struct HttpCourseSource {
    client: Client,
    url: String,
}

impl HttpCourseSource {
    pub fn new(url: impl Into<String>, config: &SourceConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CourseSource for HttpCourseSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> LoadResult<SourcePayload> {
        debug!("Fetching course list from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LoadError::network(&self.url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Http {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::network(&self.url, format!("Failed to read response: {}", e)))?;

        let records = parse_payload(&bytes, &self.url)?;
        info!("Fetched {} courses from {}", records.len(), self.url);

        Ok(SourcePayload {
            records,
            last_modified,
        })
    }
}

/// Course list on the local filesystem
pub struct FileCourseSource {
    path: PathBuf,
}

impl FileCourseSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CourseSource for FileCourseSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> LoadResult<SourcePayload> {
        let origin = self.describe();
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| LoadError::io(&origin, e.to_string()))?;

        // File mtime plays the role of the Last-Modified header
        let last_modified = tokio::fs::metadata(&self.path)
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from);

        let records = parse_payload(&bytes, &origin)?;
        info!("Read {} courses from {}", records.len(), origin);

        Ok(SourcePayload {
            records,
            last_modified,
        })
    }
}

/// HTTP(S) URLs go to `HttpCourseSource`, anything else is a file path
pub fn source_for_location(location: &str, config: &SourceConfig) -> Box<dyn CourseSource> {
    match Url::parse(location) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Box::new(HttpCourseSource::new(location, config))
        }
        Ok(url) if url.scheme() == "file" => match url.to_file_path() {
            Ok(path) => Box::new(FileCourseSource::new(path)),
            Err(()) => Box::new(FileCourseSource::new(location)),
        },
        _ => Box::new(FileCourseSource::new(location)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_registry::CourseField;

    #[test]
    fn test_parse_payload_array() {
        let records = parse_payload(r#"[{"类别": "A"}, {"category": "B"}]"#.as_bytes(), "test").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get(CourseField::Category).as_deref(), Some("B"));
    }

    #[test]
    fn test_parse_payload_rejects_non_array() {
        let err = parse_payload(br#"{"courses": []}"#, "test").unwrap_err();
        assert!(matches!(err, LoadError::MalformedPayload { .. }));

        let err = parse_payload(b"<html>", "test").unwrap_err();
        assert!(matches!(err, LoadError::MalformedPayload { .. }));

        let err = parse_payload(r#"[{"类别": "A"}, 3]"#.as_bytes(), "test").unwrap_err();
        assert!(err.to_string().contains("item 1"));
    }

    #[test]
    fn test_source_for_location() {
        let config = SourceConfig::default();
        assert_eq!(
            source_for_location("https://example.com/data.json", &config).describe(),
            "https://example.com/data.json"
        );
        assert_eq!(
            source_for_location("./data.json", &config).describe(),
            "./data.json"
        );
    }

    #[tokio::test]
    async fn test_file_source_reads_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"[{"类别": "A", "学分": "2"}]"#).unwrap();

        let payload = FileCourseSource::new(&path).fetch().await.unwrap();
        assert_eq!(payload.records.len(), 1);
        assert!(payload.last_modified.is_some());
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let err = FileCourseSource::new("/definitely/not/here.json")
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
