use tracing::debug;

use crate::control::{ConsoleControl, MAX_PROCESSES, MAX_TRANSFER};
use crate::error::{ConsoleError, ConsoleResult};
use crate::profile::ConsoleProfile;

/// An in-memory console.
///
/// Behaves like the native control library as seen through the bridge:
/// `init` must succeed before anything else works, a console must be
/// connected before process or memory access, memory accesses fault unless
/// they fall entirely inside one mapped region, and single reads are limited
/// to [`MAX_TRANSFER`] bytes.
#[derive(Debug, Clone)]
pub struct SimulatedConsole {
    library_available: bool,
    bound: bool,
    connected: Option<String>,
    processes: Vec<SimProcess>,
}

#[derive(Debug, Clone)]
struct SimProcess {
    pid: u32,
    name: String,
    regions: Vec<Region>,
}

#[derive(Debug, Clone)]
struct Region {
    base: u64,
    bytes: Vec<u8>,
}

impl Region {
    /// Byte range inside this region covering `[address, address + len)`.
    fn span(&self, address: u64, len: usize) -> Option<std::ops::Range<usize>> {
        let start = address.checked_sub(self.base)?;
        let start = usize::try_from(start).ok()?;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

impl SimulatedConsole {
    /// Build a console from a profile.
    pub fn new(profile: ConsoleProfile) -> Self {
        let processes = profile
            .processes
            .into_iter()
            .map(|p| SimProcess {
                pid: p.pid,
                name: p.name,
                regions: p
                    .regions
                    .into_iter()
                    .map(|r| Region {
                        base: r.base,
                        bytes: vec![r.fill; r.size],
                    })
                    .collect(),
            })
            .collect();

        Self {
            library_available: profile.library_available,
            bound: false,
            connected: None,
            processes,
        }
    }

    /// Whether `init` has bound the (simulated) library.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Address of the connected console, if any.
    pub fn connected_to(&self) -> Option<&str> {
        self.connected.as_deref()
    }

    fn ensure_bound(&self) -> ConsoleResult<()> {
        if self.bound {
            Ok(())
        } else {
            Err(ConsoleError::NotInitialized)
        }
    }

    fn ensure_connected(&self) -> ConsoleResult<()> {
        self.ensure_bound()?;
        if self.connected.is_some() {
            Ok(())
        } else {
            Err(ConsoleError::NotConnected)
        }
    }

    fn process_mut(&mut self, pid: u32) -> ConsoleResult<&mut SimProcess> {
        self.processes
            .iter_mut()
            .find(|p| p.pid == pid)
            .ok_or(ConsoleError::UnknownProcess(pid))
    }

    fn region_mut(
        &mut self,
        pid: u32,
        address: u64,
        len: usize,
    ) -> ConsoleResult<(&mut Region, std::ops::Range<usize>)> {
        let process = self.process_mut(pid)?;
        process
            .regions
            .iter_mut()
            .find_map(|region| {
                let span = region.span(address, len)?;
                Some((region, span))
            })
            .ok_or(ConsoleError::Fault {
                address,
                length: len,
            })
    }
}

impl Default for SimulatedConsole {
    fn default() -> Self {
        Self::new(ConsoleProfile::default())
    }
}

impl ConsoleControl for SimulatedConsole {
    fn init(&mut self) -> ConsoleResult<()> {
        if !self.library_available {
            return Err(ConsoleError::LibraryUnavailable);
        }
        self.bound = true;
        Ok(())
    }

    fn teardown(&mut self) -> ConsoleResult<()> {
        self.bound = false;
        self.connected = None;
        Ok(())
    }

    fn connect(&mut self, ip: &str) -> ConsoleResult<()> {
        self.ensure_bound()?;
        if ip.is_empty() {
            return Err(ConsoleError::Status(-2));
        }
        debug!(ip, "simulated console connected");
        self.connected = Some(ip.to_string());
        Ok(())
    }

    fn disconnect(&mut self) -> ConsoleResult<()> {
        self.ensure_bound()?;
        if self.connected.take().is_none() {
            return Err(ConsoleError::NotConnected);
        }
        Ok(())
    }

    fn read_memory(&mut self, pid: u32, address: u64, buf: &mut [u8]) -> ConsoleResult<()> {
        self.ensure_connected()?;
        if buf.len() > MAX_TRANSFER {
            return Err(ConsoleError::Status(-3));
        }
        let (region, span) = self.region_mut(pid, address, buf.len())?;
        buf.copy_from_slice(&region.bytes[span]);
        Ok(())
    }

    fn write_memory(&mut self, pid: u32, address: u64, data: &[u8]) -> ConsoleResult<()> {
        self.ensure_connected()?;
        let (region, span) = self.region_mut(pid, address, data.len())?;
        region.bytes[span].copy_from_slice(data);
        Ok(())
    }

    fn list_processes(&mut self) -> ConsoleResult<Vec<u32>> {
        self.ensure_connected()?;
        Ok(self
            .processes
            .iter()
            .take(MAX_PROCESSES)
            .map(|p| p.pid)
            .collect())
    }

    fn process_name(&mut self, pid: u32) -> ConsoleResult<String> {
        self.ensure_connected()?;
        Ok(self.process_mut(pid)?.name.clone())
    }
}
