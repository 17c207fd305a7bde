/// In-memory mirror of the persisted scalar fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// 0 until an address is set or loaded
    pub dc_id: i32,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub auth_key: Option<Vec<u8>>,
    pub test_mode: bool,
    pub api_id: Option<i32>,
    pub user_id: Option<i64>,
    pub is_bot: Option<bool>,
}
