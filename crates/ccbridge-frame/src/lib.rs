//! Request framing and response encoding for the console bridge.
//!
//! Requests are framed with a fixed 8-byte header:
//! - a 4-byte little-endian command id (must be non-negative)
//! - a 4-byte little-endian payload length (`0..=65536`)
//!
//! Responses are not framed. They start with a one-byte value count followed
//! by the values themselves: fixed-width little-endian scalars, `i32`-tagged
//! buffers, or (for memory reads) a stream of `u16`-tagged chunks.
//!
//! No partial reads or writes ever leak to callers.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_header, decode_tagged_field, decode_tagged_string, encode_header, encode_request,
    encode_tagged_field, get_u32_le, Frame, FrameConfig, FrameHeader, HEADER_SIZE, MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::{ResponseWriter, FAULT_SENTINEL, MAX_CHUNK_LEN};
