//! TL primitive codec
//!
//! Little-endian integers, TL strings/bytes, booleans, doubles and vectors,
//! matching the MTProto binary layout.

pub mod reader;
pub mod writer;

pub use reader::TlReader;
pub use writer::TlWriter;

/// Constructor id of `boolTrue`.
pub const BOOL_TRUE: u32 = 0x9972_75b5;
/// Constructor id of `boolFalse`.
pub const BOOL_FALSE: u32 = 0xbc79_9737;
/// Constructor id of a bare `vector`.
pub const VECTOR: u32 = 0x1cb5_c415;

/// Largest length that fits the single-byte length prefix.
pub(crate) const SHORT_LEN_MAX: usize = 253;
/// Marker byte announcing a 3-byte length prefix.
pub(crate) const LONG_LEN_MARKER: u8 = 0xfe;
