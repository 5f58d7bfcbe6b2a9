use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use ccbridge_transport::BridgeStream;

use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Largest chunk a streamed read may carry; lengths at or above
/// [`FAULT_SENTINEL`] would be ambiguous.
pub const MAX_CHUNK_LEN: usize = 0x7FFF;

/// Chunk header value that replaces a chunk length when a read faults.
pub const FAULT_SENTINEL: u16 = 0x8000;

/// Encodes response values and writes them to any `Write` stream.
///
/// Values are staged in an internal buffer and written out by
/// [`flush`](Self::flush), which either writes every staged byte or fails.
/// All multi-byte scalars are little-endian.
pub struct ResponseWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> ResponseWriter<T> {
    /// Create a new response writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new response writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Stage the leading value count of a response.
    pub fn value_count(&mut self, count: u8) {
        self.buf.put_u8(count);
    }

    /// Stage a `u8` value.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Stage a little-endian `u16` value.
    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    /// Stage a little-endian `i32` value.
    pub fn put_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    /// Stage a little-endian `u32` value.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    /// Stage a buffer value: `i32` LE length then the raw bytes.
    pub fn put_tagged(&mut self, value: &[u8]) -> Result<()> {
        if value.len() > i32::MAX as usize {
            return Err(FrameError::FieldTooLarge {
                size: value.len(),
                max: i32::MAX as usize,
            });
        }
        self.buf.reserve(4 + value.len());
        self.buf.put_i32_le(value.len() as i32);
        self.buf.put_slice(value);
        Ok(())
    }

    /// Stage a string value. No terminator is written.
    pub fn put_str(&mut self, value: &str) -> Result<()> {
        self.put_tagged(value.as_bytes())
    }

    /// Stage one streamed read chunk: `u16` LE length then the bytes.
    pub fn put_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.len() > MAX_CHUNK_LEN {
            return Err(FrameError::FieldTooLarge {
                size: chunk.len(),
                max: MAX_CHUNK_LEN,
            });
        }
        self.buf.reserve(2 + chunk.len());
        self.buf.put_u16_le(chunk.len() as u16);
        self.buf.put_slice(chunk);
        Ok(())
    }

    /// Stage the fault sentinel that ends a streamed read early.
    pub fn put_fault_sentinel(&mut self) {
        self.buf.put_u16_le(FAULT_SENTINEL);
    }

    /// Number of staged bytes not yet written.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop staged bytes without writing them.
    pub fn discard(&mut self) {
        self.buf.clear();
    }

    /// Write every staged byte to the stream and flush it (blocking).
    ///
    /// A short write is retried until all bytes are out; a zero-length write
    /// means the peer is gone.
    pub fn flush(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => {
                    self.buf.clear();
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buf.clear();
                    return Err(FrameError::Io(err));
                }
            }
        }
        self.buf.clear();

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream. Staged bytes are lost.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl ResponseWriter<BridgeStream> {
    /// Create a response writer for `BridgeStream` and apply write timeout from config.
    pub fn with_config_stream(inner: BridgeStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
