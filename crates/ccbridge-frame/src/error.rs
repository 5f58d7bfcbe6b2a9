/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header carries a negative command id.
    #[error("invalid command id {0} (must be non-negative)")]
    InvalidCommandId(i32),

    /// The header declares a payload length outside `0..=max`.
    #[error("invalid payload length {length} (max {max})")]
    InvalidPayloadLength { length: i32, max: usize },

    /// A field extends past the end of the received payload.
    #[error("truncated field at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedField {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A response buffer is too large for its length prefix.
    #[error("field too large ({size} bytes, max {max})")]
    FieldTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether the error means the header itself could not be trusted.
    pub fn is_malformed_frame(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidCommandId(_) | FrameError::InvalidPayloadLength { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
