//! In-process backend with expiry bookkeeping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{BackendResult, KeyValueBackend};
use crate::error::BackendError;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Option<u64>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Backend keeping keys in a `HashMap`.
///
/// Expired keys are dropped lazily on access. Failures can be injected per
/// key to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
    failing_keys: Mutex<Vec<String>>,
    connects: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failure(&self, key: &str) -> BackendResult<()> {
        let failing = self.failing_keys.lock().unwrap_or_else(|e| e.into_inner());
        if failing.iter().any(|k| k == key) {
            return Err(BackendError::Command(format!("injected failure for {}", key)));
        }
        Ok(())
    }

    /// Make every command touching `key` fail.
    pub fn fail_on(&self, key: impl Into<String>) {
        self.failing_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.into());
    }

    /// Number of times `connect` was called.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Expiry a live key was written with, in seconds.
    ///
    /// `None` for missing keys, `Some(None)` for keys without expiry.
    pub fn ttl_of(&self, key: &str) -> Option<Option<u64>> {
        let now = Instant::now();
        self.entries()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.ttl)
    }

    /// Raw stored value, bypassing any codec.
    pub fn raw(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }

    /// All live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries()
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn connect(&self) -> BackendResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.check_failure(key)?;
        let now = Instant::now();
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> BackendResult<()> {
        self.check_failure(key)?;
        let entry = Entry {
            value: value.to_string(),
            ttl,
            expires_at: ttl.and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs))),
        };
        self.entries().insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> BackendResult<()> {
        self.check_failure(key)?;
        self.entries().remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> BackendResult<Vec<String>> {
        let now = Instant::now();
        let mut entries = self.entries();
        entries.retain(|_, e| e.is_live(now));
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_del() {
        let backend = MemoryBackend::new();
        backend.set("a", "1", None).await.unwrap();

        assert_eq!(backend.get("a").await.unwrap(), Some("1".to_string()));
        backend.del("a").await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), None);
        // Deleting again is fine.
        backend.del("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_ttl_is_recorded() {
        let backend = MemoryBackend::new();
        backend.set("with", "x", Some(5)).await.unwrap();
        backend.set("without", "x", None).await.unwrap();

        assert_eq!(backend.ttl_of("with"), Some(Some(5)));
        assert_eq!(backend.ttl_of("without"), Some(None));
        assert_eq!(backend.ttl_of("missing"), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let backend = MemoryBackend::new();
        backend.set("gone", "x", Some(0)).await.unwrap();
        assert_eq!(backend.get("gone").await.unwrap(), None);
        assert!(backend.scan_prefix("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_prefix() {
        let backend = MemoryBackend::new();
        backend.set("s:peer:1", "x", None).await.unwrap();
        backend.set("s:peer:2", "x", None).await.unwrap();
        backend.set("s:ip", "x", None).await.unwrap();
        backend.set("t:peer:1", "x", None).await.unwrap();

        let mut keys = backend.scan_prefix("s:peer:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["s:peer:1", "s:peer:2"]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = MemoryBackend::new();
        backend.fail_on("bad");

        assert!(backend.set("bad", "x", None).await.is_err());
        assert!(backend.set("good", "x", None).await.is_ok());
    }
}
