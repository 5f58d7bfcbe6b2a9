use crate::error::ConsoleResult;

/// Most process ids a single listing returns.
pub const MAX_PROCESSES: usize = 32;

/// Most bytes a single memory read may request.
pub const MAX_TRANSFER: usize = 0x7FFF;

/// Process id in effect before any process has been attached.
pub const UNATTACHED_PID: u32 = 0xFFFF_FFFF;

/// Name fragment that marks a system (non-game) process.
pub const GAME_PROCESS_EXCLUDE: &str = "dev_flash";

/// Console control primitives the bridge fronts.
///
/// Calls are never retried by the bridge. Any failure is reported back to the
/// controller and the connection keeps serving.
pub trait ConsoleControl {
    /// Locate and bind the control library. Calling it again once bound is a no-op.
    fn init(&mut self) -> ConsoleResult<()>;

    /// Release the control library.
    fn teardown(&mut self) -> ConsoleResult<()>;

    /// Connect to the console at `ip`.
    fn connect(&mut self, ip: &str) -> ConsoleResult<()>;

    /// Disconnect from the current console.
    fn disconnect(&mut self) -> ConsoleResult<()>;

    /// Fill `buf` with memory of process `pid` starting at `address`.
    fn read_memory(&mut self, pid: u32, address: u64, buf: &mut [u8]) -> ConsoleResult<()>;

    /// Write `data` into memory of process `pid` starting at `address`.
    fn write_memory(&mut self, pid: u32, address: u64, data: &[u8]) -> ConsoleResult<()>;

    /// List running process ids, at most [`MAX_PROCESSES`].
    fn list_processes(&mut self) -> ConsoleResult<Vec<u32>>;

    /// Resolve the name of process `pid`.
    fn process_name(&mut self, pid: u32) -> ConsoleResult<String>;
}

impl<C: ConsoleControl + ?Sized> ConsoleControl for &mut C {
    fn init(&mut self) -> ConsoleResult<()> {
        (**self).init()
    }

    fn teardown(&mut self) -> ConsoleResult<()> {
        (**self).teardown()
    }

    fn connect(&mut self, ip: &str) -> ConsoleResult<()> {
        (**self).connect(ip)
    }

    fn disconnect(&mut self) -> ConsoleResult<()> {
        (**self).disconnect()
    }

    fn read_memory(&mut self, pid: u32, address: u64, buf: &mut [u8]) -> ConsoleResult<()> {
        (**self).read_memory(pid, address, buf)
    }

    fn write_memory(&mut self, pid: u32, address: u64, data: &[u8]) -> ConsoleResult<()> {
        (**self).write_memory(pid, address, data)
    }

    fn list_processes(&mut self) -> ConsoleResult<Vec<u32>> {
        (**self).list_processes()
    }

    fn process_name(&mut self, pid: u32) -> ConsoleResult<String> {
        (**self).process_name(pid)
    }
}

impl<C: ConsoleControl + ?Sized> ConsoleControl for Box<C> {
    fn init(&mut self) -> ConsoleResult<()> {
        (**self).init()
    }

    fn teardown(&mut self) -> ConsoleResult<()> {
        (**self).teardown()
    }

    fn connect(&mut self, ip: &str) -> ConsoleResult<()> {
        (**self).connect(ip)
    }

    fn disconnect(&mut self) -> ConsoleResult<()> {
        (**self).disconnect()
    }

    fn read_memory(&mut self, pid: u32, address: u64, buf: &mut [u8]) -> ConsoleResult<()> {
        (**self).read_memory(pid, address, buf)
    }

    fn write_memory(&mut self, pid: u32, address: u64, data: &[u8]) -> ConsoleResult<()> {
        (**self).write_memory(pid, address, data)
    }

    fn list_processes(&mut self) -> ConsoleResult<Vec<u32>> {
        (**self).list_processes()
    }

    fn process_name(&mut self, pid: u32) -> ConsoleResult<String> {
        (**self).process_name(pid)
    }
}
