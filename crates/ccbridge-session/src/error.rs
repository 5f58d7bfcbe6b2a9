use ccbridge_frame::FrameError;

/// Errors that end a connection.
///
/// Console failures are not represented here; they are reported to the
/// controller inside the response and the connection keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] ccbridge_transport::TransportError),

    /// Frame-level error (malformed header, truncated field, I/O).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The command id is not part of the protocol.
    #[error("unknown command {0}")]
    UnknownCommand(i32),

    /// The payload does not have the shape the command requires.
    #[error("invalid payload for {command}: expected {expected}, got {actual} bytes")]
    InvalidPayload {
        command: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// A transfer buffer could not be allocated.
    #[error("failed to allocate {size} byte transfer buffer")]
    Allocation { size: usize },
}

impl SessionError {
    /// Whether the error is the peer closing the connection.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, SessionError::Frame(FrameError::ConnectionClosed))
    }

    /// Whether the error is a protocol violation by the peer.
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            SessionError::Frame(err) => {
                err.is_malformed_frame() || matches!(err, FrameError::TruncatedField { .. })
            }
            SessionError::UnknownCommand(_) | SessionError::InvalidPayload { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
