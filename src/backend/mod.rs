//! Key-value backends
//!
//! The session store only needs GET/SET/DEL, a prefix scan and an explicit
//! connect step. [`RedisBackend`] talks to a Redis server, [`MemoryBackend`]
//! keeps everything in process.

pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BackendError;

pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Invoked with every error the backend reports.
pub type ErrorHandler = Arc<dyn Fn(&BackendError) + Send + Sync>;

#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Establish the connection. Must be idempotent.
    async fn connect(&self) -> BackendResult<()>;

    async fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Store `value`; `ttl` in seconds, `None` means no expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> BackendResult<()>;

    /// Remove `key`. Missing keys are not an error.
    async fn del(&self, key: &str) -> BackendResult<()>;

    /// Every key currently starting with `prefix`.
    ///
    /// Each call runs a fresh scan. Keys written concurrently may or may not
    /// show up.
    async fn scan_prefix(&self, prefix: &str) -> BackendResult<Vec<String>>;
}

#[async_trait]
impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Arc<B> {
    async fn connect(&self) -> BackendResult<()> {
        (**self).connect().await
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> BackendResult<()> {
        (**self).set(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> BackendResult<()> {
        (**self).del(key).await
    }

    async fn scan_prefix(&self, prefix: &str) -> BackendResult<Vec<String>> {
        (**self).scan_prefix(prefix).await
    }
}
