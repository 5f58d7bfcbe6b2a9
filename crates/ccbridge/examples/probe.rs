//! Minimal controller: runs a few commands against a bridge and prints the
//! replies.
//!
//! Run with:
//!   cargo run -- 28012 --profile crates/ccbridge/profiles/demo.json
//!
//! In another terminal:
//!   cargo run --example probe -- 127.0.0.1:28012

use std::io::{Read, Write};
use std::net::SocketAddr;

use bytes::BytesMut;
use ccbridge::frame::encode_request;
use ccbridge::transport::{BridgeStream, TcpBridgeListener};

type BoxResult<T> = Result<T, Box<dyn std::error::Error>>;

fn send(stream: &mut BridgeStream, command_id: i32, payload: &[u8]) -> BoxResult<()> {
    let mut buf = BytesMut::new();
    encode_request(command_id, payload, &mut buf)?;
    stream.write_all(&buf)?;
    Ok(())
}

fn read_array<const N: usize>(stream: &mut BridgeStream) -> BoxResult<[u8; N]> {
    let mut buf = [0u8; N];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_string(stream: &mut BridgeStream) -> BoxResult<String> {
    let len = i32::from_le_bytes(read_array(stream)?);
    let mut buf = vec![0u8; usize::try_from(len)?];
    stream.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn main() -> BoxResult<()> {
    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:28012".to_string())
        .parse()?;

    let mut stream = TcpBridgeListener::connect(addr)?;
    eprintln!("Connected to {addr}");

    send(&mut stream, 1, &[])?;
    let [_, ready] = read_array::<2>(&mut stream)?;
    eprintln!("init: {}", if ready == 1 { "ok" } else { "failed" });

    let ip = b"127.0.0.1";
    let mut payload = (ip.len() as u16).to_le_bytes().to_vec();
    payload.extend_from_slice(ip);
    send(&mut stream, 4, &payload)?;
    let reply = read_array::<5>(&mut stream)?;
    eprintln!(
        "connect: status {}",
        i32::from_le_bytes([reply[1], reply[2], reply[3], reply[4]])
    );

    send(&mut stream, 24, &[])?;
    let [count] = read_array::<1>(&mut stream)?;
    for _ in 0..count {
        let pid = u32::from_le_bytes(read_array(&mut stream)?);
        let name = read_string(&mut stream)?;
        println!("{pid:#010x}  {name}");
    }

    send(&mut stream, 2, &[])?;
    read_array::<1>(&mut stream)?;
    eprintln!("Bridge torn down");
    Ok(())
}
