//! Session store over a [`KeyValueBackend`].

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::OnceCell;

use super::keys::{
    KeyLayout, FIELD_API_ID, FIELD_AUTH_KEY, FIELD_DC_ID, FIELD_IP, FIELD_IS_BOT, FIELD_PORT,
    FIELD_TEST_MODE, FIELD_USER_ID, SCALAR_FIELDS,
};
use super::state::SessionState;
use super::Session;
use crate::backend::{ErrorHandler, KeyValueBackend, RedisBackend};
use crate::codec::{self, PeerRecord, SecretChatRecord};
use crate::config::SessionOptions;
use crate::error::{DecodeError, Result, StoreError};

pub const DEFAULT_DC_ID: i32 = 2;
pub const DEFAULT_PORT: u16 = 443;

/// Session persisted in a key-value store.
///
/// The backend connection is opened on the first operation and reused
/// afterwards.
pub struct RedisSession<B = RedisBackend> {
    backend: B,
    keys: KeyLayout,
    session_exp: Option<u64>,
    peer_exp: Option<u64>,
    connected: OnceCell<()>,
    state: SessionState,
}

impl RedisSession<RedisBackend> {
    /// Session against the Redis server named by `options.redis_url`.
    pub fn open(
        name: &str,
        options: &SessionOptions,
        on_error: Option<ErrorHandler>,
    ) -> Result<Self> {
        let mut backend = RedisBackend::new(options.redis_url.as_deref());
        if let Some(handler) = on_error {
            backend = backend.with_error_handler(handler);
        }
        Self::with_backend(name, options, backend)
    }
}

impl<B: KeyValueBackend> RedisSession<B> {
    pub fn with_backend(name: &str, options: &SessionOptions, backend: B) -> Result<Self> {
        options.validate()?;
        let keys = KeyLayout::new(name, &options.session_delim)?;

        Ok(Self {
            backend,
            keys,
            // 0 means "no expiry", same as leaving it unset.
            session_exp: options.session_exp.filter(|&secs| secs > 0),
            peer_exp: options.peer_exp.filter(|&secs| secs > 0),
            connected: OnceCell::new(),
            state: SessionState::default(),
        })
    }

    pub fn name(&self) -> &str {
        self.keys.name()
    }

    async fn ensure_connected(&self) -> Result<()> {
        self.connected
            .get_or_try_init(|| async {
                tracing::debug!("opening backend for session {}", self.keys.name());
                self.backend
                    .connect()
                    .await
                    .map_err(|e| StoreError::backend("connect", self.keys.namespace(), e))
            })
            .await?;
        Ok(())
    }

    async fn get_raw(&self, op: &'static str, key: &str) -> Result<Option<String>> {
        self.ensure_connected().await?;
        self.backend
            .get(key)
            .await
            .map_err(|e| StoreError::backend(op, key, e))
    }

    async fn put(&self, op: &'static str, key: &str, value: &str, ttl: Option<u64>) -> Result<()> {
        self.ensure_connected().await?;
        tracing::debug!("{}: set {} (ttl {:?})", op, key, ttl);
        self.backend
            .set(key, value, ttl)
            .await
            .map_err(|e| StoreError::backend(op, key, e))
    }

    async fn remove(&self, op: &'static str, key: &str) -> Result<()> {
        self.ensure_connected().await?;
        tracing::debug!("{}: del {}", op, key);
        self.backend
            .del(key)
            .await
            .map_err(|e| StoreError::backend(op, key, e))
    }

    async fn scan(&self, op: &'static str, prefix: &str) -> Result<Vec<String>> {
        self.ensure_connected().await?;
        self.backend
            .scan_prefix(prefix)
            .await
            .map_err(|e| StoreError::backend(op, prefix, e))
    }

    async fn put_field(&self, op: &'static str, field: &str, value: &str) -> Result<()> {
        self.put(op, &self.keys.field(field), value, self.session_exp)
            .await
    }

    /// Writes every `(key, value)` pair concurrently. All writes are attempted;
    /// the first failure is reported once they have all finished.
    async fn put_all(&self, op: &'static str, entries: Vec<(String, String)>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.ensure_connected().await?;

        let total = entries.len();
        let writes = entries
            .iter()
            .map(|(key, value)| self.put(op, key, value, self.peer_exp));
        let failures: Vec<StoreError> = join_all(writes)
            .await
            .into_iter()
            .filter_map(|result| result.err())
            .collect();

        for failure in &failures {
            tracing::warn!("{}: {}", op, failure);
        }

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(StoreError::PartialWrite {
                op,
                failed,
                total,
                source: Box::new(first),
            }),
        }
    }

    fn decode_peer(op: &'static str, key: &str, raw: &str) -> Result<PeerRecord> {
        codec::from_hex(raw)
            .and_then(|bytes| PeerRecord::decode(&bytes))
            .map_err(|e| StoreError::decode(op, key, e))
    }

    fn decode_secret_chat(op: &'static str, key: &str, raw: &str) -> Result<SecretChatRecord> {
        codec::from_hex(raw)
            .and_then(|bytes| SecretChatRecord::decode(&bytes))
            .map_err(|e| StoreError::decode(op, key, e))
    }

    /// First stored peer satisfying `predicate`, by linear scan.
    async fn find_peer<F>(&self, op: &'static str, predicate: F) -> Result<Option<PeerRecord>>
    where
        F: Fn(&PeerRecord) -> bool + Send,
    {
        for key in self.scan(op, &self.keys.peer_prefix()).await? {
            // Expired or deleted since the scan.
            let Some(raw) = self.get_raw(op, &key).await? else {
                continue;
            };
            let peer = Self::decode_peer(op, &key, &raw)?;
            if predicate(&peer) {
                return Ok(Some(peer));
            }
        }
        Ok(None)
    }

    fn apply_field(
        state: &mut SessionState,
        field: &str,
        raw: &str,
    ) -> std::result::Result<(), DecodeError> {
        let invalid = || DecodeError::InvalidScalar(raw.to_string());
        match field {
            FIELD_DC_ID => state.dc_id = raw.parse().map_err(|_| invalid())?,
            FIELD_IP => state.ip = Some(raw.to_string()),
            FIELD_PORT => state.port = Some(raw.parse().map_err(|_| invalid())?),
            FIELD_AUTH_KEY => state.auth_key = Some(codec::from_hex(raw)?),
            FIELD_TEST_MODE => state.test_mode = parse_bool(raw).ok_or_else(invalid)?,
            FIELD_API_ID => state.api_id = Some(raw.parse().map_err(|_| invalid())?),
            FIELD_USER_ID => state.user_id = Some(raw.parse().map_err(|_| invalid())?),
            FIELD_IS_BOT => state.is_bot = Some(parse_bool(raw).ok_or_else(invalid)?),
            _ => {}
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[async_trait]
impl<B: KeyValueBackend> Session for RedisSession<B> {
    fn state(&self) -> &SessionState {
        &self.state
    }

    async fn set_address(
        &mut self,
        dc_id: i32,
        ip: &str,
        port: u16,
        test_mode: bool,
    ) -> Result<()> {
        let dc_id = if dc_id == 0 { DEFAULT_DC_ID } else { dc_id };
        let port = if port == 0 { DEFAULT_PORT } else { port };

        // State changes only once every write has landed.
        const OP: &str = "set_address";
        self.put_field(OP, FIELD_DC_ID, &dc_id.to_string()).await?;
        self.put_field(OP, FIELD_IP, ip).await?;
        self.put_field(OP, FIELD_PORT, &port.to_string()).await?;
        self.put_field(OP, FIELD_TEST_MODE, &test_mode.to_string())
            .await?;

        self.state.dc_id = dc_id;
        self.state.ip = Some(ip.to_string());
        self.state.port = Some(port);
        self.state.test_mode = test_mode;
        Ok(())
    }

    async fn set_auth_key(&mut self, auth_key: Option<&[u8]>, dc_id: i32) -> Result<()> {
        if dc_id != self.state.dc_id {
            tracing::debug!(
                "skipping auth key for dc {} (session is on dc {})",
                dc_id,
                self.state.dc_id
            );
            return Ok(());
        }

        match auth_key {
            Some(key) => {
                self.put_field("set_auth_key", FIELD_AUTH_KEY, &codec::to_hex(key))
                    .await?
            }
            None => {
                self.remove("set_auth_key", &self.keys.field(FIELD_AUTH_KEY))
                    .await?
            }
        }
        self.state.auth_key = auth_key.map(<[u8]>::to_vec);
        Ok(())
    }

    async fn set_api_id(&mut self, api_id: i32) -> Result<()> {
        self.put_field("set_api_id", FIELD_API_ID, &api_id.to_string())
            .await?;
        self.state.api_id = Some(api_id);
        Ok(())
    }

    async fn set_is_bot(&mut self, is_bot: bool) -> Result<()> {
        self.put_field("set_is_bot", FIELD_IS_BOT, &is_bot.to_string())
            .await?;
        self.state.is_bot = Some(is_bot);
        Ok(())
    }

    async fn set_user_id(&mut self, user_id: i64) -> Result<()> {
        self.put_field("set_user_id", FIELD_USER_ID, &user_id.to_string())
            .await?;
        self.state.user_id = Some(user_id);
        Ok(())
    }

    async fn load(&mut self) -> Result<()> {
        // Parse into a copy so a corrupt field leaves the state untouched.
        let mut state = self.state.clone();
        for field in SCALAR_FIELDS {
            let key = self.keys.field(field);
            if let Some(raw) = self.get_raw("load", &key).await? {
                Self::apply_field(&mut state, field, &raw)
                    .map_err(|e| StoreError::decode("load", &key, e))?;
            }
        }
        self.state = state;
        Ok(())
    }

    async fn delete(&self) -> Result<usize> {
        let keys = self.scan("delete", &self.keys.namespace()).await?;
        for key in &keys {
            self.remove("delete", key).await?;
        }
        tracing::debug!("deleted {} keys of session {}", keys.len(), self.keys.name());
        Ok(keys.len())
    }

    async fn update_peers(&self, peers: &[PeerRecord]) -> Result<()> {
        let entries = peers
            .iter()
            .map(|peer| (self.keys.peer(peer.id), codec::to_hex(&peer.encode())))
            .collect();
        self.put_all("update_peers", entries).await
    }

    async fn update_secret_chats(&self, chats: &[SecretChatRecord]) -> Result<()> {
        let entries = chats
            .iter()
            .map(|chat| (self.keys.secret_chat(chat.id), codec::to_hex(&chat.encode())))
            .collect();
        self.put_all("update_secret_chats", entries).await
    }

    async fn get_peer_by_id(&self, id: i64) -> Result<Option<PeerRecord>> {
        const OP: &str = "get_peer_by_id";
        let key = self.keys.peer(id);
        match self.get_raw(OP, &key).await? {
            Some(raw) => Self::decode_peer(OP, &key, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn get_peer_by_username(&self, username: &str) -> Result<Option<PeerRecord>> {
        self.find_peer("get_peer_by_username", |peer| peer.matches_username(username))
            .await
    }

    async fn get_peer_by_phone_number(&self, phone_number: &str) -> Result<Option<PeerRecord>> {
        self.find_peer("get_peer_by_phone_number", |peer| {
            peer.matches_phone_number(phone_number)
        })
        .await
    }

    async fn get_secret_chat_by_id(&self, id: i32) -> Result<Option<SecretChatRecord>> {
        const OP: &str = "get_secret_chat_by_id";
        let key = self.keys.secret_chat(id);
        match self.get_raw(OP, &key).await? {
            Some(raw) => Self::decode_secret_chat(OP, &key, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn remove_secret_chat_by_id(&self, id: i32) -> Result<()> {
        self.remove("remove_secret_chat_by_id", &self.keys.secret_chat(id))
            .await
    }
}
