//! Redis backend over a multiplexed async connection.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::RedisError;
use tokio::sync::OnceCell;

use super::{BackendResult, ErrorHandler, KeyValueBackend};
use crate::error::BackendError;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

const SCAN_COUNT: usize = 100;

pub struct RedisBackend {
    url: String,
    connection: OnceCell<MultiplexedConnection>,
    on_error: Option<ErrorHandler>,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("url", &self.url)
            .field("connected", &self.connection.initialized())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl RedisBackend {
    /// `url` defaults to [`DEFAULT_REDIS_URL`]. Nothing is dialed until the
    /// first command.
    pub fn new(url: Option<&str>) -> Self {
        Self {
            url: url.unwrap_or(DEFAULT_REDIS_URL).to_string(),
            connection: OnceCell::new(),
            on_error: None,
        }
    }

    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.on_error = Some(handler);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn report(&self, error: BackendError) -> BackendError {
        match &self.on_error {
            Some(handler) => handler(&error),
            None => tracing::error!("redis error ({}): {}", self.url, error),
        }
        error
    }

    fn command_error(&self, e: RedisError) -> BackendError {
        let error = if e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error() {
            BackendError::Connection(e.to_string())
        } else {
            BackendError::Command(e.to_string())
        };
        self.report(error)
    }

    async fn connection(&self) -> BackendResult<MultiplexedConnection> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                tracing::debug!("connecting to {}", self.url);
                let client = redis::Client::open(self.url.as_str())
                    .map_err(|e| BackendError::Connection(e.to_string()))?;
                let conn = client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| BackendError::Connection(e.to_string()))?;
                Ok::<_, BackendError>(conn)
            })
            .await
            .map_err(|e| self.report(e))?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    async fn connect(&self) -> BackendResult<()> {
        self.connection().await.map(|_| ())
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.command_error(e))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl);
        }
        let _: () = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| self.command_error(e))?;
        Ok(())
    }

    async fn del(&self, key: &str) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.command_error(e))?;
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> BackendResult<Vec<String>> {
        let mut conn = self.connection().await?;
        let pattern = match_pattern(prefix);

        // SCAN may return a key more than once across pages.
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, page): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .map_err(|e| self.command_error(e))?;

            for key in page {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!("scan {} matched {} keys", pattern, keys.len());
        Ok(keys)
    }
}

/// Glob pattern matching every key that starts with `prefix` literally.
pub(crate) fn match_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}
