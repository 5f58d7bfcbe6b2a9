//! The per-connection serve loop.

use std::io::{Read, Write};

use ccbridge_console::ConsoleControl;
use ccbridge_frame::{FrameConfig, FrameError, FrameReader, ResponseWriter};
use tracing::{debug, info, warn};

use crate::command::Request;
use crate::dispatch::{Dispatcher, Flow};
use crate::error::Result;
use crate::session::Session;

/// How a connection loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The controller closed the connection.
    Disconnected,
    /// The controller sent the teardown command.
    Teardown,
}

/// One controller connection: frame reader, response writer, dispatcher and
/// session state.
///
/// Commands are served strictly one at a time. A command's response is fully
/// written before the next frame is read.
pub struct Connection<R, W, C> {
    reader: FrameReader<R>,
    writer: ResponseWriter<W>,
    dispatcher: Dispatcher<C>,
    session: Session,
}

impl<R: Read, W: Write, C: ConsoleControl> Connection<R, W, C> {
    /// Create a connection with default frame configuration.
    pub fn new(reader: R, writer: W, console: C) -> Self {
        Self::from_parts(
            FrameReader::new(reader),
            ResponseWriter::new(writer),
            console,
        )
    }

    /// Create a connection with explicit frame configuration.
    pub fn with_config(reader: R, writer: W, console: C, config: FrameConfig) -> Self {
        Self::from_parts(
            FrameReader::with_config(reader, config.clone()),
            ResponseWriter::with_config(writer, config),
            console,
        )
    }

    /// Assemble a connection from an already configured reader and writer.
    pub fn from_parts(reader: FrameReader<R>, writer: ResponseWriter<W>, console: C) -> Self {
        Self {
            reader,
            writer,
            dispatcher: Dispatcher::new(console),
            session: Session::new(),
        }
    }

    /// Serve commands until the controller disconnects or tears down.
    ///
    /// Malformed frames, unknown commands and bad payloads end the loop with
    /// an error and nothing is written for the offending frame.
    pub fn run(&mut self) -> Result<LoopExit> {
        loop {
            let frame = match self.reader.read_frame() {
                Ok(frame) => frame,
                Err(FrameError::ConnectionClosed) => {
                    info!(
                        commands = self.session.commands_served(),
                        "controller disconnected"
                    );
                    return Ok(LoopExit::Disconnected);
                }
                Err(err) => {
                    warn!(error = %err, "failed to read frame");
                    return Err(err.into());
                }
            };
            debug!(
                command_id = frame.command_id,
                payload_len = frame.payload.len(),
                "received frame"
            );

            let request = Request::decode(frame).inspect_err(|err| {
                warn!(command_id = frame.command_id, error = %err, "rejecting frame");
            })?;

            match self
                .dispatcher
                .dispatch(&mut self.session, request, &mut self.writer)
            {
                Ok(Flow::Continue) => {}
                Ok(Flow::Terminate) => {
                    info!(
                        commands = self.session.commands_served(),
                        "teardown requested"
                    );
                    return Ok(LoopExit::Teardown);
                }
                Err(err) if err.is_disconnect() => {
                    info!("controller disconnected while receiving a response");
                    return Ok(LoopExit::Disconnected);
                }
                Err(err) => {
                    warn!(error = %err, "command failed");
                    return Err(err);
                }
            }
        }
    }

    /// Release the capability if the session still holds it initialized.
    pub fn shutdown_console(&mut self) -> bool {
        self.dispatcher.release(&mut self.session)
    }

    /// Session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The capability.
    pub fn console(&self) -> &C {
        self.dispatcher.console()
    }

    /// Split into the underlying reader, writer and capability.
    pub fn into_parts(self) -> (R, W, C) {
        (
            self.reader.into_inner(),
            self.writer.into_inner(),
            self.dispatcher.into_console(),
        )
    }
}
