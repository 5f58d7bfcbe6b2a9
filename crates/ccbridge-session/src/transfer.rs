//! Chunked memory transfers.
//!
//! A logical read of any size is split into reads of at most
//! [`CHUNK_CEILING`] bytes against the console, each streamed to the
//! controller as soon as it completes:
//!
//! ```text
//! ┌───────────┬────────────┬───────┬────────────┬───────┬─────┐
//! │ count (1) │ len (2B LE)│ bytes │ len (2B LE)│ bytes │ ... │
//! │ always 1  │ ≤ 0x7FFF   │       │ or 0x8000  │       │     │
//! └───────────┴────────────┴───────┴────────────┴───────┴─────┘
//! ```
//!
//! A `0x8000` length ends the stream early: everything sent before it is
//! valid, nothing after the faulting address is.

use std::io::Write;

use ccbridge_console::{ConsoleControl, ConsoleError, MAX_TRANSFER, STATUS_OK};
use ccbridge_frame::ResponseWriter;
use tracing::{trace, warn};

use crate::error::{Result, SessionError};

/// Largest single read requested from the console.
pub const CHUNK_CEILING: u32 = MAX_TRANSFER as u32;

/// One bounded piece of a logical transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub address: u64,
    pub length: u32,
}

/// Splits `[address, address + length)` into ascending, contiguous chunks.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    next_address: u64,
    remaining: u32,
    ceiling: u32,
}

impl ChunkPlan {
    /// Plan a transfer using [`CHUNK_CEILING`].
    pub fn new(address: u64, length: u32) -> Self {
        Self::with_ceiling(address, length, CHUNK_CEILING)
    }

    /// Plan a transfer with an explicit non-zero chunk ceiling.
    pub fn with_ceiling(address: u64, length: u32, ceiling: u32) -> Self {
        Self {
            next_address: address,
            remaining: length,
            ceiling: ceiling.max(1),
        }
    }

    /// Size of the largest chunk this plan yields.
    pub fn max_chunk_len(&self) -> u32 {
        self.remaining.min(self.ceiling)
    }
}

impl Iterator for ChunkPlan {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining == 0 {
            return None;
        }
        let length = self.remaining.min(self.ceiling);
        let chunk = Chunk {
            address: self.next_address,
            length,
        };
        self.next_address += u64::from(length);
        self.remaining -= length;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.div_ceil(self.ceiling) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChunkPlan {}

/// How a streamed read ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Every chunk was read and sent.
    Complete { chunks: usize, bytes: u64 },
    /// The console failed at `address`; the fault sentinel was sent.
    Faulted {
        chunks: usize,
        bytes: u64,
        address: u64,
        error: ConsoleError,
    },
}

/// Stream a read of `length` bytes at `address` of process `pid`.
///
/// Writes the whole response: a value count of 1, then one chunk per
/// successful console read, then either nothing more or the fault sentinel.
/// `console` is `None` while the capability is not initialized, which faults
/// the first chunk.
pub fn stream_read<C, W>(
    console: Option<&mut C>,
    pid: u32,
    address: u64,
    length: u32,
    out: &mut ResponseWriter<W>,
) -> Result<ReadOutcome>
where
    C: ConsoleControl + ?Sized,
    W: Write,
{
    let plan = ChunkPlan::new(address, length);
    let mut buf = alloc_transfer_buffer(plan.max_chunk_len() as usize)?;
    let mut console = console;

    out.value_count(1);

    let mut chunks = 0usize;
    let mut bytes = 0u64;
    for chunk in plan {
        let slice = &mut buf[..chunk.length as usize];
        let result = match console.as_deref_mut() {
            Some(console) => console.read_memory(pid, chunk.address, slice),
            None => Err(ConsoleError::NotInitialized),
        };

        if let Err(error) = result {
            warn!(
                pid,
                address = chunk.address,
                length = chunk.length,
                %error,
                "memory read faulted"
            );
            out.put_fault_sentinel();
            out.flush()?;
            return Ok(ReadOutcome::Faulted {
                chunks,
                bytes,
                address: chunk.address,
                error,
            });
        }

        out.put_chunk(slice)?;
        out.flush()?;
        chunks += 1;
        bytes += u64::from(chunk.length);
        trace!(address = chunk.address, length = chunk.length, "sent chunk");
    }

    out.flush()?;
    Ok(ReadOutcome::Complete { chunks, bytes })
}

/// Write `data` at `address` of process `pid` in one console call.
///
/// Returns the status code reported to the controller.
pub fn write_memory<C>(console: Option<&mut C>, pid: u32, address: u64, data: &[u8]) -> i32
where
    C: ConsoleControl + ?Sized,
{
    let result = match console {
        Some(console) => console.write_memory(pid, address, data),
        None => Err(ConsoleError::NotInitialized),
    };
    match result {
        Ok(()) => STATUS_OK,
        Err(error) => {
            warn!(pid, address, length = data.len(), %error, "memory write failed");
            error.status()
        }
    }
}

fn alloc_transfer_buffer(size: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| SessionError::Allocation { size })?;
    buf.resize(size, 0);
    Ok(buf)
}
