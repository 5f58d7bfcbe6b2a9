//! Console control capability.
//!
//! The bridge never talks to a console directly. Everything it needs, from
//! connecting to a console to reading a process's memory, goes through the
//! [`ConsoleControl`] trait. A binding to the native control library
//! implements it in production; [`SimulatedConsole`] implements it in memory
//! for tests and local development.

pub mod control;
pub mod error;
pub mod profile;
pub mod sim;

pub use control::{
    ConsoleControl, GAME_PROCESS_EXCLUDE, MAX_PROCESSES, MAX_TRANSFER, UNATTACHED_PID,
};
pub use error::{ConsoleError, ConsoleResult, STATUS_ERROR, STATUS_OK};
pub use profile::{ConsoleProfile, ProcessProfile, RegionProfile};
pub use sim::SimulatedConsole;
