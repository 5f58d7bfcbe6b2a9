use std::fmt;
use std::io;
use std::path::Path;

use ccbridge_frame::FrameError;
use ccbridge_session::SessionError;
use ccbridge_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Socket-level I/O failure.
pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => FAILURE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn profile_error(path: &Path, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::InvalidData => DATA_INVALID,
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        _ => USAGE,
    };
    CliError::new(
        code,
        format!("failed to load profile {}: {err}", path.display()),
    )
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        err if err.is_malformed_frame() => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::TruncatedField { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::UnknownCommand(_) | SessionError::InvalidPayload { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        SessionError::Allocation { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_violations_are_data_invalid() {
        let err = session_error("session failed", SessionError::UnknownCommand(42));
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("unknown command 42"));

        let err = session_error(
            "session failed",
            SessionError::Frame(FrameError::InvalidCommandId(-1)),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn bind_failures_map_by_kind() {
        let addr = "127.0.0.1:1".parse().unwrap();
        let denied = TransportError::Bind {
            addr,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(transport_error("bind", denied).code, PERMISSION_DENIED);

        let in_use = TransportError::Bind {
            addr,
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert_eq!(transport_error("bind", in_use).code, TRANSPORT_ERROR);
    }

    #[test]
    fn peer_reset_is_plain_failure() {
        let err = frame_error(
            "read",
            FrameError::Io(io::Error::from(io::ErrorKind::ConnectionReset)),
        );
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn allocation_failure_is_internal() {
        let err = session_error("read", SessionError::Allocation { size: 0x7FFF });
        assert_eq!(err.code, INTERNAL);
    }

    #[test]
    fn profile_errors() {
        let path = Path::new("console.json");
        assert_eq!(
            profile_error(path, io::Error::from(io::ErrorKind::NotFound)).code,
            USAGE
        );
        assert_eq!(
            profile_error(path, io::Error::new(io::ErrorKind::InvalidData, "bad")).code,
            DATA_INVALID
        );
    }
}
