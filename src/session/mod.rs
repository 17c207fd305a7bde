//! Session Store Module
//!
//! Persists login state, cached peers and secret chats of one client session
//! into a key-value backend, under the `<name><delim>` namespace.

pub mod keys;
pub mod state;
pub mod store;

use async_trait::async_trait;

use crate::codec::{PeerRecord, SecretChatRecord};
use crate::error::Result;

pub use keys::KeyLayout;
pub use state::SessionState;
pub use store::RedisSession;

/// Storage capabilities a client needs from its session.
#[async_trait]
pub trait Session: Send + Sync {
    fn state(&self) -> &SessionState;

    /// `dc_id` 0 falls back to 2, `port` 0 to 443.
    async fn set_address(&mut self, dc_id: i32, ip: &str, port: u16, test_mode: bool)
        -> Result<()>;

    /// Skipped when `dc_id` is not the current data center. `None` clears the key.
    async fn set_auth_key(&mut self, auth_key: Option<&[u8]>, dc_id: i32) -> Result<()>;

    async fn set_api_id(&mut self, api_id: i32) -> Result<()>;

    async fn set_is_bot(&mut self, is_bot: bool) -> Result<()>;

    async fn set_user_id(&mut self, user_id: i64) -> Result<()>;

    /// Apply every stored scalar; missing ones keep their current value.
    async fn load(&mut self) -> Result<()>;

    /// Remove every key of the session, returning how many were removed.
    async fn delete(&self) -> Result<usize>;

    async fn update_peers(&self, peers: &[PeerRecord]) -> Result<()>;

    async fn update_secret_chats(&self, chats: &[SecretChatRecord]) -> Result<()>;

    async fn get_peer_by_id(&self, id: i64) -> Result<Option<PeerRecord>>;

    async fn get_peer_by_username(&self, username: &str) -> Result<Option<PeerRecord>>;

    async fn get_peer_by_phone_number(&self, phone_number: &str) -> Result<Option<PeerRecord>>;

    async fn get_secret_chat_by_id(&self, id: i32) -> Result<Option<SecretChatRecord>>;

    async fn remove_secret_chat_by_id(&self, id: i32) -> Result<()>;
}
