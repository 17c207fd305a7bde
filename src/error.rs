use thiserror::Error;

/// Failure while reading a stored value back into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid vector constructor: {0:#010x}")]
    InvalidVectorConstructor(u32),

    #[error("invalid vector length: {0}")]
    InvalidLength(i32),

    #[error("invalid boolean constructor: {0:#010x}")]
    InvalidBool(u32),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("value is not valid hex")]
    InvalidHex,

    #[error("invalid scalar value: {0}")]
    InvalidScalar(String),
}

/// Failure reported by a key-value backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("command error: {0}")]
    Command(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("session delimiter must not be empty")]
    EmptyDelimiter,

    #[error("session name `{name}` contains the delimiter `{delim}`")]
    DelimiterInName { name: String, delim: String },

    #[error("failed to read options file: {0}")]
    Read(String),

    #[error("failed to parse options: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{op} failed on `{key}`: {source}")]
    Backend {
        op: &'static str,
        key: String,
        #[source]
        source: BackendError,
    },

    #[error("{op} could not decode `{key}`: {source}")]
    Decode {
        op: &'static str,
        key: String,
        #[source]
        source: DecodeError,
    },

    #[error("{op}: {failed} of {total} writes failed, first: {source}")]
    PartialWrite {
        op: &'static str,
        failed: usize,
        total: usize,
        #[source]
        source: Box<StoreError>,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub(crate) fn backend(op: &'static str, key: impl Into<String>, source: BackendError) -> Self {
        Self::Backend {
            op,
            key: key.into(),
            source,
        }
    }

    pub(crate) fn decode(op: &'static str, key: impl Into<String>, source: DecodeError) -> Self {
        Self::Decode {
            op,
            key: key.into(),
            source,
        }
    }

    /// Key the failing operation was working on, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Backend { key, .. } | Self::Decode { key, .. } => Some(key),
            Self::PartialWrite { source, .. } => source.key(),
            Self::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
