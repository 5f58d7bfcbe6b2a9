/// Status code reported to the controller on success.
pub const STATUS_OK: i32 = 0;

/// Generic failure status code.
pub const STATUS_ERROR: i32 = -1;

/// Failures reported by a console control capability.
///
/// These never end a connection; the bridge turns them into status codes or
/// fault sentinels in the response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    /// The control library could not be located or bound.
    #[error("console control library unavailable")]
    LibraryUnavailable,

    /// An operation was attempted before the capability was initialized.
    #[error("console control capability not initialized")]
    NotInitialized,

    /// A console operation was attempted without a connected console.
    #[error("no console connected")]
    NotConnected,

    /// The process id does not name a running process.
    #[error("unknown process {0:#010x}")]
    UnknownProcess(u32),

    /// The memory range could not be accessed.
    #[error("memory fault at {address:#x} ({length} bytes)")]
    Fault { address: u64, length: usize },

    /// A raw failure code passed through from the control library.
    #[error("console control failure (status {0})")]
    Status(i32),
}

impl ConsoleError {
    /// Status code reported to the controller for this failure.
    pub fn status(&self) -> i32 {
        match self {
            ConsoleError::Status(code) if *code != STATUS_OK => *code,
            _ => STATUS_ERROR,
        }
    }
}

pub type ConsoleResult<T> = std::result::Result<T, ConsoleError>;
