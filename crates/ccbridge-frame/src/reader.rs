use std::io::{ErrorKind, Read};

use ccbridge_transport::BridgeStream;
use tracing::trace;

use crate::codec::{decode_header, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Reads complete request frames from any `Read` stream.
///
/// One fixed-capacity scratch buffer is allocated up front and reused for
/// every frame; returned frames borrow from it until the next read.
pub struct FrameReader<T> {
    inner: T,
    buf: Box<[u8]>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Reader with the default 64 KiB payload ceiling and no timeouts.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Reader with explicit limits.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: vec![0u8; config.max_payload_size].into_boxed_slice(),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached, whether
    /// between frames or in the middle of one.
    pub fn read_frame(&mut self) -> Result<Frame<'_>> {
        let mut header = [0u8; HEADER_SIZE];
        read_exact(&mut self.inner, &mut header)?;

        let header = decode_header(&header, self.config.max_payload_size)?;
        trace!(
            command_id = header.command_id,
            payload_length = header.payload_length,
            "received frame header"
        );

        let payload = &mut self.buf[..header.payload_length];
        if !payload.is_empty() {
            read_exact(&mut self.inner, payload)?;
        }

        Ok(Frame {
            command_id: header.command_id,
            payload,
        })
    }

    /// The wrapped stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// The wrapped stream, mutably.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Limits in effect.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<BridgeStream> {
    /// Create a frame reader for `BridgeStream` and apply read timeout from config.
    pub fn with_config_stream(inner: BridgeStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

/// Fill `buf` completely, retrying short and interrupted reads.
fn read_exact<R: Read>(inner: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match inner.read(&mut buf[filled..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}

pub(crate) fn transport_to_frame_error(err: ccbridge_transport::TransportError) -> FrameError {
    match err {
        ccbridge_transport::TransportError::Io(io)
        | ccbridge_transport::TransportError::Accept(io) => FrameError::Io(io),
        ccbridge_transport::TransportError::Bind { source, .. }
        | ccbridge_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
    }
}
