use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Request header: command id (4) + payload length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Maximum request payload size: 64 KiB.
pub const MAX_PAYLOAD: usize = 0x10000;

/// A validated request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Command identifier, always non-negative.
    pub command_id: i32,
    /// Number of payload bytes following the header.
    pub payload_length: usize,
}

/// A complete request frame borrowed from the reader's scratch buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Command identifier.
    pub command_id: i32,
    /// The request payload.
    pub payload: &'a [u8],
}

/// Encode a request header.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬─────────────────┐
/// │ Command (4B) │ Length (4B)  │ Payload          │
/// │ i32 LE       │ i32 LE       │ (Length bytes)   │
/// └──────────────┴──────────────┴─────────────────┘
/// ```
pub fn encode_header(command_id: i32, payload_length: i32, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_i32_le(command_id);
    dst.put_i32_le(payload_length);
}

/// Encode a complete request (header + payload).
pub fn encode_request(command_id: i32, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::FieldTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    encode_header(command_id, payload.len() as i32, dst);
    dst.put_slice(payload);
    Ok(())
}

/// Decode and validate a request header.
///
/// Fails with [`FrameError::InvalidCommandId`] for negative ids and
/// [`FrameError::InvalidPayloadLength`] for lengths outside `0..=max_payload`.
pub fn decode_header(bytes: &[u8; HEADER_SIZE], max_payload: usize) -> Result<FrameHeader> {
    let mut src = &bytes[..];
    let command_id = src.get_i32_le();
    let payload_length = src.get_i32_le();

    if command_id < 0 {
        return Err(FrameError::InvalidCommandId(command_id));
    }
    if payload_length < 0 || payload_length as usize > max_payload {
        return Err(FrameError::InvalidPayloadLength {
            length: payload_length,
            max: max_payload,
        });
    }

    Ok(FrameHeader {
        command_id,
        payload_length: payload_length as usize,
    })
}

/// Encode a request-side tagged field: `u16` LE length then the bytes.
pub fn encode_tagged_field(value: &[u8], dst: &mut BytesMut) -> Result<()> {
    if value.len() > u16::MAX as usize {
        return Err(FrameError::FieldTooLarge {
            size: value.len(),
            max: u16::MAX as usize,
        });
    }
    dst.reserve(2 + value.len());
    dst.put_u16_le(value.len() as u16);
    dst.put_slice(value);
    Ok(())
}

/// Decode a request-side tagged field starting at `offset`.
///
/// Returns an owned copy of the field and the number of bytes consumed
/// (length prefix included). Never reads past the end of `payload`.
pub fn decode_tagged_field(payload: &[u8], offset: usize) -> Result<(Vec<u8>, usize)> {
    let len = checked_slice(payload, offset, 2)?.get_u16_le() as usize;
    let value = checked_slice(payload, offset + 2, len)?;
    Ok((value.to_vec(), 2 + len))
}

/// Decode a tagged field as text.
///
/// The length describes the content only; no terminator is expected on the
/// wire. Invalid UTF-8 is replaced rather than rejected.
pub fn decode_tagged_string(payload: &[u8], offset: usize) -> Result<(String, usize)> {
    let (bytes, consumed) = decode_tagged_field(payload, offset)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    };
    Ok((text, consumed))
}

/// Read a little-endian `u32` at `offset`.
pub fn get_u32_le(payload: &[u8], offset: usize) -> Result<u32> {
    Ok(checked_slice(payload, offset, 4)?.get_u32_le())
}

fn checked_slice(payload: &[u8], offset: usize, needed: usize) -> Result<&[u8]> {
    let available = payload.len().saturating_sub(offset);
    if offset > payload.len() || needed > available {
        return Err(FrameError::TruncatedField {
            offset,
            needed,
            available,
        });
    }
    Ok(&payload[offset..offset + needed])
}

/// Configuration for frame reading and response writing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum request payload size in bytes. Default: 64 KiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
