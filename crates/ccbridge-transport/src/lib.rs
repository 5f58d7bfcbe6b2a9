//! Blocking stream transport for the console bridge.
//!
//! The bridge serves exactly one controller over a local TCP socket. This is
//! the lowest layer: everything else reads and writes through the
//! [`BridgeStream`] type provided here.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::TcpBridgeListener;
pub use traits::BridgeStream;
