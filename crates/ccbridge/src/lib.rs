//! Console control bridge.
//!
//! ccbridge fronts a console control capability for a single controller
//! process. The controller connects over local TCP, sends length-prefixed
//! command frames and receives value-counted responses; memory reads are
//! streamed in chunks so transfers of any size never buffer whole.
//!
//! # Crate Structure
//!
//! - [`transport`] - TCP listener and the connected stream type
//! - [`frame`] - Request framing, tagged fields and response encoding
//! - [`console`] - The capability trait and an in-memory simulated console
//! - [`session`] - Command dispatch, chunked transfers and the serve loop

/// Re-export transport types.
pub mod transport {
    pub use ccbridge_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ccbridge_frame::*;
}

/// Re-export console capability types.
pub mod console {
    pub use ccbridge_console::*;
}

/// Re-export session types.
pub mod session {
    pub use ccbridge_session::*;
}

pub use ccbridge_console::{ConsoleControl, ConsoleProfile, SimulatedConsole};
pub use ccbridge_session::{BridgeServer, LoopExit, ServeReport};
