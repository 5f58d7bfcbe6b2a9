//! Single-controller TCP server.

use std::net::SocketAddr;

use ccbridge_console::ConsoleControl;
use ccbridge_frame::{FrameConfig, FrameReader, ResponseWriter};
use ccbridge_transport::TcpBridgeListener;
use tracing::info;

use crate::connection::{Connection, LoopExit};
use crate::error::Result;

/// Summary of one served connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeReport {
    /// Address of the controller that connected.
    pub peer: SocketAddr,
    /// How the connection loop ended.
    pub exit: LoopExit,
    /// Commands dispatched before the loop ended.
    pub commands: u64,
}

/// Listens on a TCP address and serves exactly one controller.
pub struct BridgeServer {
    listener: TcpBridgeListener,
    frame_config: FrameConfig,
}

impl BridgeServer {
    /// Bind the listening socket.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpBridgeListener::bind(addr)?;
        Ok(Self {
            listener,
            frame_config: FrameConfig::default(),
        })
    }

    /// Override frame limits and socket timeouts.
    pub fn with_frame_config(mut self, config: FrameConfig) -> Self {
        self.frame_config = config;
        self
    }

    /// The bound address (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Accept one controller and serve it until it disconnects or tears down.
    ///
    /// The capability is released afterwards if the session left it
    /// initialized, whether the loop ended cleanly or not.
    pub fn serve_one<C: ConsoleControl>(&self, console: C) -> Result<ServeReport> {
        let (stream, peer) = self.listener.accept()?;
        info!(%peer, "controller connected");
        stream.set_nodelay(true)?;

        let write_half = stream.try_clone()?;
        let reader = FrameReader::with_config_stream(stream, self.frame_config.clone())?;
        let writer = ResponseWriter::with_config_stream(write_half, self.frame_config.clone())?;

        let mut connection = Connection::from_parts(reader, writer, console);
        let result = connection.run();
        connection.shutdown_console();

        let exit = result?;
        let commands = connection.session().commands_served();
        info!(%peer, ?exit, commands, "connection closed");
        Ok(ServeReport {
            peer,
            exit,
            commands,
        })
    }
}

impl std::fmt::Debug for BridgeServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeServer")
            .field("local_addr", &self.local_addr())
            .field("frame_config", &self.frame_config)
            .finish()
    }
}
