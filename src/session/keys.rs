//! Key layout of one session namespace.

use crate::error::ConfigError;

pub const FIELD_IP: &str = "ip";
pub const FIELD_DC_ID: &str = "dcId";
pub const FIELD_PORT: &str = "port";
pub const FIELD_AUTH_KEY: &str = "authKey";
pub const FIELD_TEST_MODE: &str = "testMode";
pub const FIELD_API_ID: &str = "apiId";
pub const FIELD_USER_ID: &str = "userId";
pub const FIELD_IS_BOT: &str = "isBot";

/// Every scalar field persisted for a session, in load order.
pub const SCALAR_FIELDS: [&str; 8] = [
    FIELD_DC_ID,
    FIELD_IP,
    FIELD_PORT,
    FIELD_AUTH_KEY,
    FIELD_TEST_MODE,
    FIELD_API_ID,
    FIELD_USER_ID,
    FIELD_IS_BOT,
];

const PEER_SEGMENT: &str = "peer";
const SECRET_CHAT_SEGMENT: &str = "e2e";

/// Builds `<name><delim>...` keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    name: String,
    delim: String,
}

impl KeyLayout {
    pub fn new(name: &str, delim: &str) -> Result<Self, ConfigError> {
        if delim.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        if name.contains(delim) {
            return Err(ConfigError::DelimiterInName {
                name: name.to_string(),
                delim: delim.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            delim: delim.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix shared by every key of this session.
    pub fn namespace(&self) -> String {
        format!("{}{}", self.name, self.delim)
    }

    pub fn field(&self, field: &str) -> String {
        format!("{}{}{}", self.name, self.delim, field)
    }

    pub fn peer_prefix(&self) -> String {
        format!("{}{}{}{}", self.name, self.delim, PEER_SEGMENT, self.delim)
    }

    pub fn peer(&self, id: i64) -> String {
        format!("{}{}", self.peer_prefix(), id)
    }

    pub fn secret_chat_prefix(&self) -> String {
        format!("{}{}{}{}", self.name, self.delim, SECRET_CHAT_SEGMENT, self.delim)
    }

    pub fn secret_chat(&self, id: i32) -> String {
        format!("{}{}", self.secret_chat_prefix(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delimiter_layout() {
        let keys = KeyLayout::new("main", ":").unwrap();
        assert_eq!(keys.namespace(), "main:");
        assert_eq!(keys.field(FIELD_AUTH_KEY), "main:authKey");
        assert_eq!(keys.peer(-1001234), "main:peer:-1001234");
        assert_eq!(keys.secret_chat(42), "main:e2e:42");
        assert_eq!(keys.peer_prefix(), "main:peer:");
    }

    #[test]
    fn test_custom_delimiter() {
        let keys = KeyLayout::new("bot:1", "__").unwrap();
        assert_eq!(keys.field(FIELD_DC_ID), "bot:1__dcId");
        assert_eq!(keys.peer(7), "bot:1__peer__7");
    }

    #[test]
    fn test_rejects_colliding_name() {
        assert_eq!(
            KeyLayout::new("a:b", ":"),
            Err(ConfigError::DelimiterInName {
                name: "a:b".to_string(),
                delim: ":".to_string()
            })
        );
        assert_eq!(KeyLayout::new("a", ""), Err(ConfigError::EmptyDelimiter));
    }
}
