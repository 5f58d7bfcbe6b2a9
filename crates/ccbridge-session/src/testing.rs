//! Test doubles shared by the session crate's unit tests.

use ccbridge_console::{ConsoleControl, ConsoleError, ConsoleResult};

/// Scriptable console that records every call.
///
/// Memory reads return a deterministic pattern derived from the address, so
/// any window can be checked with [`MockConsole::expected`].
#[derive(Debug, Default)]
pub struct MockConsole {
    pub calls: Vec<&'static str>,
    pub init_error: Option<ConsoleError>,
    pub connect_error: Option<ConsoleError>,
    pub disconnect_error: Option<ConsoleError>,
    pub write_error: Option<ConsoleError>,
    pub list_error: Option<ConsoleError>,
    /// Address whose chunk read fails.
    pub fault_at: Option<u64>,
    /// Pids whose name lookup fails.
    pub bad_names: Vec<u32>,
    pub processes: Vec<(u32, String)>,
    pub connected_ip: Option<String>,
    pub reads: Vec<(u64, usize)>,
    pub writes: Vec<(u64, Vec<u8>)>,
    pub read_pids: Vec<u32>,
    pub names_resolved: usize,
}

impl MockConsole {
    pub fn with_processes(processes: &[(u32, &str)]) -> Self {
        Self {
            processes: processes
                .iter()
                .map(|(pid, name)| (*pid, name.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn pattern_byte(address: u64) -> u8 {
        (address ^ (address >> 8) ^ (address >> 16)) as u8
    }

    pub fn expected(address: u64, len: usize) -> Vec<u8> {
        (0..len as u64)
            .map(|i| Self::pattern_byte(address + i))
            .collect()
    }
}

impl ConsoleControl for MockConsole {
    fn init(&mut self) -> ConsoleResult<()> {
        self.calls.push("init");
        self.init_error.clone().map_or(Ok(()), Err)
    }

    fn teardown(&mut self) -> ConsoleResult<()> {
        self.calls.push("teardown");
        Ok(())
    }

    fn connect(&mut self, ip: &str) -> ConsoleResult<()> {
        self.calls.push("connect");
        self.connected_ip = Some(ip.to_string());
        self.connect_error.clone().map_or(Ok(()), Err)
    }

    fn disconnect(&mut self) -> ConsoleResult<()> {
        self.calls.push("disconnect");
        self.disconnect_error.clone().map_or(Ok(()), Err)
    }

    fn read_memory(&mut self, pid: u32, address: u64, buf: &mut [u8]) -> ConsoleResult<()> {
        self.calls.push("read_memory");
        self.reads.push((address, buf.len()));
        self.read_pids.push(pid);
        if let Some(fault) = self.fault_at {
            if fault >= address && fault < address + buf.len() as u64 {
                return Err(ConsoleError::Fault {
                    address,
                    length: buf.len(),
                });
            }
        }
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = Self::pattern_byte(address + i as u64);
        }
        Ok(())
    }

    fn write_memory(&mut self, _pid: u32, address: u64, data: &[u8]) -> ConsoleResult<()> {
        self.calls.push("write_memory");
        self.writes.push((address, data.to_vec()));
        self.write_error.clone().map_or(Ok(()), Err)
    }

    fn list_processes(&mut self) -> ConsoleResult<Vec<u32>> {
        self.calls.push("list_processes");
        if let Some(err) = self.list_error.clone() {
            return Err(err);
        }
        Ok(self
            .processes
            .iter()
            .take(ccbridge_console::MAX_PROCESSES)
            .map(|(pid, _)| *pid)
            .collect())
    }

    fn process_name(&mut self, pid: u32) -> ConsoleResult<String> {
        self.calls.push("process_name");
        self.names_resolved += 1;
        if self.bad_names.contains(&pid) {
            return Err(ConsoleError::UnknownProcess(pid));
        }
        self.processes
            .iter()
            .find(|(p, _)| *p == pid)
            .map(|(_, name)| name.clone())
            .ok_or(ConsoleError::UnknownProcess(pid))
    }
}

/// Little-endian reader over a captured response.
pub struct ResponseCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ResponseCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn bytes(&mut self, n: usize) -> &'a [u8] {
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        out
    }

    pub fn u8(&mut self) -> u8 {
        self.bytes(1)[0]
    }

    pub fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.bytes(2).try_into().unwrap())
    }

    pub fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.bytes(4).try_into().unwrap())
    }

    pub fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.bytes(4).try_into().unwrap())
    }

    /// An `i32`-length-prefixed buffer value.
    pub fn tagged(&mut self) -> &'a [u8] {
        let len = self.i32();
        self.bytes(len as usize)
    }

    pub fn string(&mut self) -> String {
        String::from_utf8(self.tagged().to_vec()).unwrap()
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }
}
