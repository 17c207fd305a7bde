pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod session;
pub mod tl;

pub use backend::{ErrorHandler, KeyValueBackend, MemoryBackend, RedisBackend};
pub use codec::{PeerRecord, SecretChatRecord, PEER_FORMAT_V2};
pub use config::SessionOptions;
pub use error::{BackendError, ConfigError, DecodeError, Result, StoreError};
pub use session::{KeyLayout, RedisSession, Session, SessionState};
