use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::BridgeStream;

/// TCP listener for the single controller connection.
///
/// The bridge binds a loopback address by default; the controller process
/// spawns it and connects to the port it was given.
pub struct TcpBridgeListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpBridgeListener {
    /// Bind and listen on `addr`.
    ///
    /// Port `0` asks the OS for an ephemeral port; use
    /// [`local_addr`](Self::local_addr) to find out which one.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(%local_addr, "listening for controller");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<(BridgeStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok((BridgeStream::from_tcp(stream), peer))
    }

    /// Connect to a listening bridge (blocking).
    pub fn connect(addr: SocketAddr) -> Result<BridgeStream> {
        let stream =
            TcpStream::connect(addr).map_err(|source| TransportError::Connect { addr, source })?;
        debug!(%addr, "connected to bridge");
        Ok(BridgeStream::from_tcp(stream))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{IpAddr, Ipv4Addr};
    use std::thread;

    use super::*;

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[test]
    fn bind_reports_ephemeral_port() {
        let listener = TcpBridgeListener::bind(loopback()).unwrap();
        assert_ne!(listener.local_addr().port(), 0);
    }

    #[test]
    fn accept_and_exchange_bytes() {
        let listener = TcpBridgeListener::bind(loopback()).unwrap();
        let addr = listener.local_addr();

        let server = thread::spawn(move || {
            let (mut stream, _peer) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&buf).unwrap();
        });

        let mut client = TcpBridgeListener::connect(addr).unwrap();
        client.write_all(b"ping").unwrap();
        let mut echoed = [0u8; 4];
        client.read_exact(&mut echoed).unwrap();
        assert_eq!(&echoed, b"ping");

        server.join().unwrap();
    }

    #[test]
    fn cloned_halves_share_connection() {
        let listener = TcpBridgeListener::bind(loopback()).unwrap();
        let addr = listener.local_addr();

        let server = thread::spawn(move || {
            let (stream, _peer) = listener.accept().unwrap();
            let mut reader = stream.try_clone().unwrap();
            let mut writer = stream;
            let mut buf = [0u8; 3];
            reader.read_exact(&mut buf).unwrap();
            writer.write_all(&buf).unwrap();
        });

        let mut client = TcpBridgeListener::connect(addr).unwrap();
        client.write_all(b"abc").unwrap();
        let mut echoed = [0u8; 3];
        client.read_exact(&mut echoed).unwrap();
        assert_eq!(&echoed, b"abc");

        server.join().unwrap();
    }

    #[test]
    fn connect_to_closed_port_fails() {
        let addr = {
            let listener = TcpBridgeListener::bind(loopback()).unwrap();
            listener.local_addr()
        };

        let err = TcpBridgeListener::connect(addr).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
