//! Command handling for the console bridge.
//!
//! A [`BridgeServer`] accepts one controller and runs a [`Connection`] loop
//! over it. Each frame is decoded into a [`Request`], executed by the
//! [`Dispatcher`] against a [`ConsoleControl`](ccbridge_console::ConsoleControl)
//! capability, and answered before the next frame is read.
//!
//! # Example
//!
//! ```no_run
//! use ccbridge_console::SimulatedConsole;
//! use ccbridge_session::BridgeServer;
//!
//! let server = BridgeServer::bind("127.0.0.1:8765".parse().unwrap()).unwrap();
//! let report = server.serve_one(SimulatedConsole::default()).unwrap();
//! println!("{} commands, {:?}", report.commands, report.exit);
//! ```

pub mod command;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod process;
pub mod server;
pub mod session;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use command::{CommandId, Request};
pub use connection::{Connection, LoopExit};
pub use dispatch::{Dispatcher, Flow, SELF_TEST_STRING, SELF_TEST_VALUE};
pub use error::{Result, SessionError};
pub use process::{find_game_process, list_named_processes, GameProcess, NamedProcess};
pub use server::{BridgeServer, ServeReport};
pub use session::Session;
pub use transfer::{stream_read, write_memory, Chunk, ChunkPlan, ReadOutcome, CHUNK_CEILING};
