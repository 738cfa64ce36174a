//! Cache manager for persisting feature payloads to disk
//!
//! Provides a `CacheManager` that stores serializable payloads as JSON files
//! stamped with the time they were written.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// A persisted payload and the moment it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub payload: T,
    /// Write time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// What the payload was fetched for (location, feed URL); `None` if unscoped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl<T> CacheEntry<T> {
    /// Age of the entry at `now`
    ///
    /// Entries stamped in the future (clock skew) are treated as brand new.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        let millis = now.timestamp_millis().saturating_sub(self.timestamp);
        Duration::from_millis(millis.max(0) as u64)
    }

    /// Whether the entry may still be rendered without fetching
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        is_valid(self.age(now), ttl)
    }

    /// The write time as a UTC timestamp
    pub fn written_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// An entry of age `age` is valid while it is strictly younger than `ttl`
pub fn is_valid(age: Duration, ttl: Duration) -> bool {
    age < ttl
}

/// Manages reading and writing cached payloads to disk
///
/// The cache manager stores data as JSON files in an XDG-compliant cache
/// directory (`~/.cache/homedash/` on Linux), one file per feature key.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "homedash")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Writes a payload under `key`, stamped with `now`
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the cache entry (e.g., "weather")
    /// * `payload` - The data to cache (must implement Serialize)
    /// * `now` - The write time recorded in the entry
    pub fn write<T: Serialize>(&self, key: &str, payload: &T, now: DateTime<Utc>) -> std::io::Result<()> {
        self.write_scoped(key, None, payload, now)
    }

    /// Writes a payload under `key`, tagged with the query it answers
    pub fn write_scoped<T: Serialize>(
        &self,
        key: &str,
        scope: Option<&str>,
        payload: &T,
        now: DateTime<Utc>,
    ) -> std::io::Result<()> {
        self.ensure_dir()?;

        let entry = CacheEntry {
            payload,
            timestamp: now.timestamp_millis(),
            scope: scope.map(str::to_string),
        };

        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.cache_path(key), json)
    }

    /// Reads the entry stored under `key`
    ///
    /// Returns `None` if the entry doesn't exist or cannot be parsed. Freshness
    /// is left to the caller, which knows the feature's TTL.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let content = fs::read_to_string(self.cache_path(key)).ok()?;
        serde_json::from_str(&content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn create_test_cache() -> (CacheManager, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_is_valid_boundaries() {
        let ttl = Duration::from_secs(30 * 60);
        assert!(is_valid(Duration::from_secs(29 * 60 + 59), ttl));
        assert!(!is_valid(Duration::from_secs(30 * 60), ttl));
        assert!(!is_valid(Duration::from_secs(30 * 60 + 1), ttl));
        assert!(is_valid(Duration::ZERO, ttl));
    }

    #[test]
    fn test_write_creates_file_with_payload_and_timestamp() {
        let (cache, temp_dir) = create_test_cache();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        cache.write("test_key", &data, noon()).expect("Write should succeed");

        let expected_path = temp_dir.path().join("test_key.json");
        assert!(expected_path.exists(), "Cache file should exist");

        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"payload\""));
        assert!(content.contains("\"timestamp\""));
        assert!(content.contains(&noon().timestamp_millis().to_string()));
    }

    #[test]
    fn test_read_returns_none_for_missing_key() {
        let (cache, _temp_dir) = create_test_cache();

        let result: Option<CacheEntry<TestData>> = cache.read("nonexistent_key");

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[test]
    fn test_read_returns_none_for_corrupt_file() {
        let (cache, temp_dir) = create_test_cache();
        fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();

        let result: Option<CacheEntry<TestData>> = cache.read("broken");

        assert!(result.is_none());
    }

    #[test]
    fn test_entry_freshness_follows_age() {
        let (cache, _temp_dir) = create_test_cache();
        let data = TestData {
            name: "fresh".to_string(),
            value: 100,
        };
        let ttl = Duration::from_secs(30 * 60);

        cache.write("fresh_key", &data, noon()).expect("Write should succeed");
        let entry: CacheEntry<TestData> = cache.read("fresh_key").expect("Should read cache");

        assert_eq!(entry.payload, data);
        assert!(entry.is_fresh(noon() + chrono::Duration::seconds(29 * 60 + 59), ttl));
        assert!(!entry.is_fresh(noon() + chrono::Duration::seconds(30 * 60 + 1), ttl));
    }

    #[test]
    fn test_future_timestamp_counts_as_zero_age() {
        let entry = CacheEntry {
            payload: (),
            timestamp: noon().timestamp_millis(),
            scope: None,
        };

        let age = entry.age(noon() - chrono::Duration::minutes(5));

        assert_eq!(age, Duration::ZERO);
    }

    #[test]
    fn test_written_at_round_trips_timestamp() {
        let entry = CacheEntry {
            payload: (),
            timestamp: noon().timestamp_millis(),
            scope: None,
        };
        assert_eq!(entry.written_at(), Some(noon()));
    }

    #[test]
    fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let cache = CacheManager::with_dir(nested_path.clone());

        let data = TestData {
            name: "nested".to_string(),
            value: 1,
        };

        cache.write("nested_key", &data, noon()).expect("Write should succeed");

        assert!(nested_path.exists(), "Nested directory should be created");
        assert!(nested_path.join("nested_key.json").exists(), "Cache file should exist");
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(cache) = CacheManager::new() {
            let path_str = cache.cache_dir.to_string_lossy();
            assert!(
                path_str.contains("homedash"),
                "Cache path should contain project name"
            );
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }

    #[test]
    fn test_overwrite_existing_cache() {
        let (cache, _temp_dir) = create_test_cache();
        let data1 = TestData {
            name: "first".to_string(),
            value: 1,
        };
        let data2 = TestData {
            name: "second".to_string(),
            value: 2,
        };
        let later = noon() + chrono::Duration::minutes(10);

        cache.write("overwrite_key", &data1, noon()).expect("First write should succeed");
        cache.write("overwrite_key", &data2, later).expect("Second write should succeed");

        let entry: CacheEntry<TestData> = cache.read("overwrite_key").expect("Should read cache");

        assert_eq!(entry.payload, data2, "Cache should contain latest data");
        assert_eq!(entry.timestamp, later.timestamp_millis());
    }

    #[test]
    fn test_scoped_write_records_scope() {
        let (cache, temp_dir) = create_test_cache();
        let data = TestData {
            name: "scoped".to_string(),
            value: 7,
        };

        cache
            .write_scoped("news", Some("https://feeds.example/rss"), &data, noon())
            .expect("Write should succeed");

        let entry: CacheEntry<TestData> = cache.read("news").expect("Should read cache");
        assert_eq!(entry.scope.as_deref(), Some("https://feeds.example/rss"));

        // Unscoped entries leave the field out of the file entirely
        cache.write("plain", &data, noon()).unwrap();
        let content = fs::read_to_string(temp_dir.path().join("plain.json")).unwrap();
        assert!(!content.contains("scope"));
        let entry: CacheEntry<TestData> = cache.read("plain").unwrap();
        assert!(entry.scope.is_none());
    }
}
