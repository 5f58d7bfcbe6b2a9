//! Command dispatch.
//!
//! Maps one decoded [`Request`] to capability calls and writes the matching
//! response. Capability failures become response data; only I/O errors and
//! allocation failures escape as [`SessionError`](crate::SessionError).

use std::io::Write;

use ccbridge_console::{ConsoleControl, ConsoleError, ConsoleResult, STATUS_OK};
use ccbridge_frame::ResponseWriter;
use tracing::{debug, info, warn};

use crate::command::Request;
use crate::error::Result;
use crate::process::{find_game_process, list_named_processes};
use crate::session::Session;
use crate::transfer::{self, ReadOutcome};

/// Fixed string returned by the self-test command.
pub const SELF_TEST_STRING: &str = "This is param 1!!!";

/// Fixed integer returned by the self-test command.
pub const SELF_TEST_VALUE: i32 = 1_234_567;

/// What the connection loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Wait for the next frame.
    Continue,
    /// Stop serving; the controller asked for teardown.
    Terminate,
}

/// Executes requests against a console capability.
#[derive(Debug)]
pub struct Dispatcher<C> {
    console: C,
}

impl<C: ConsoleControl> Dispatcher<C> {
    pub fn new(console: C) -> Self {
        Self { console }
    }

    /// Borrow the capability.
    pub fn console(&self) -> &C {
        &self.console
    }

    /// Give back the capability.
    pub fn into_console(self) -> C {
        self.console
    }

    /// The capability, if it has been initialized for this session.
    fn capability(&mut self, session: &Session) -> Option<&mut C> {
        session
            .is_capability_ready()
            .then_some(&mut self.console)
    }

    /// Execute `request` and write its complete response to `out`.
    pub fn dispatch<W: Write>(
        &mut self,
        session: &mut Session,
        request: Request<'_>,
        out: &mut ResponseWriter<W>,
    ) -> Result<Flow> {
        let command = request.command_id();
        session.record_command();
        debug!(command = command.name(), "dispatching");

        match request {
            Request::Init => {
                let ready = match self.console.init() {
                    Ok(()) => {
                        session.set_capability_ready(true);
                        info!("console capability initialized");
                        true
                    }
                    Err(error) => {
                        warn!(%error, "console capability init failed");
                        false
                    }
                };
                out.value_count(1);
                out.put_u8(u8::from(ready));
            }

            Request::Teardown => {
                self.release(session);
                out.value_count(0);
                out.flush()?;
                return Ok(Flow::Terminate);
            }

            Request::SelfTest { echo } => {
                match echo {
                    Some(echo) => {
                        out.value_count(3);
                        out.put_tagged(&echo)?;
                    }
                    None => out.value_count(2),
                }
                out.put_str(SELF_TEST_STRING)?;
                out.put_i32(SELF_TEST_VALUE);
            }

            Request::Connect { ip } => {
                let result = match self.capability(session) {
                    Some(console) => console.connect(&ip),
                    None => Err(ConsoleError::NotInitialized),
                };
                if result.is_ok() {
                    info!(ip = %ip, "connected to console");
                }
                out.value_count(1);
                out.put_i32(status("connect", result));
            }

            Request::Disconnect => {
                let result = match self.capability(session) {
                    Some(console) => console.disconnect(),
                    None => Err(ConsoleError::NotInitialized),
                };
                out.value_count(1);
                out.put_i32(status("disconnect", result));
            }

            Request::WriteMemory { address, data } => {
                let pid = session.attached_pid();
                let code =
                    transfer::write_memory(self.capability(session), pid, address.into(), data);
                out.value_count(1);
                out.put_i32(code);
            }

            Request::ReadMemory { address, length } => {
                let pid = session.attached_pid();
                let console = self.capability(session);
                let outcome = transfer::stream_read(console, pid, address.into(), length, out)?;
                match outcome {
                    ReadOutcome::Complete { chunks, bytes } => {
                        debug!(pid, address, bytes, chunks, "read complete");
                    }
                    ReadOutcome::Faulted { bytes, address, .. } => {
                        debug!(pid, address, bytes, "read truncated");
                    }
                }
                return Ok(Flow::Continue);
            }

            Request::AttachProcess { pid } => {
                let previous = session.attach(pid);
                debug!(pid, previous, "attached process");
                out.value_count(1);
                out.put_u32(previous);
            }

            Request::FindGameProcess => {
                let found = find_game_process(self.capability(session));
                match &found.name {
                    Some(name) => {
                        out.value_count(2);
                        out.put_u32(found.pid);
                        out.put_str(name)?;
                    }
                    None => {
                        out.value_count(1);
                        out.put_u32(found.pid);
                    }
                }
            }

            Request::ProcessList => match list_named_processes(self.capability(session)) {
                Ok(processes) => {
                    // Bounded by MAX_PROCESSES, so the count always fits.
                    out.value_count(processes.len() as u8);
                    for process in &processes {
                        out.put_u32(process.pid);
                        out.put_str(&process.name)?;
                    }
                }
                Err(error) => {
                    warn!(%error, "process listing failed");
                    out.value_count(0);
                }
            },
        }

        out.flush()?;
        Ok(Flow::Continue)
    }

    /// Tear the capability down if this session initialized it.
    ///
    /// Returns whether a teardown was issued.
    pub fn release(&mut self, session: &mut Session) -> bool {
        if !session.is_capability_ready() {
            return false;
        }
        if let Err(error) = self.console.teardown() {
            warn!(%error, "console capability teardown failed");
        }
        session.set_capability_ready(false);
        info!("console capability released");
        true
    }
}

fn status(op: &'static str, result: ConsoleResult<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(error) => {
            warn!(op, %error, "console operation failed");
            error.status()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ccbridge_console::{SimulatedConsole, STATUS_ERROR, UNATTACHED_PID};

    use super::*;
    use crate::testing::{MockConsole, ResponseCursor};

    struct Harness<C> {
        dispatcher: Dispatcher<C>,
        session: Session,
    }

    impl<C: ConsoleControl> Harness<C> {
        fn new(console: C) -> Self {
            Self {
                dispatcher: Dispatcher::new(console),
                session: Session::new(),
            }
        }

        fn run(&mut self, request: Request<'_>) -> (Flow, Vec<u8>) {
            let mut out = ResponseWriter::new(Cursor::new(Vec::new()));
            let flow = self
                .dispatcher
                .dispatch(&mut self.session, request, &mut out)
                .unwrap();
            (flow, out.into_inner().into_inner())
        }

        fn ready(console: C) -> Self {
            let mut harness = Self::new(console);
            let (_, wire) = harness.run(Request::Init);
            assert_eq!(wire, vec![1, 1]);
            harness
        }
    }

    #[test]
    fn init_reports_success_and_marks_ready() {
        let mut h = Harness::new(MockConsole::default());
        let (flow, wire) = h.run(Request::Init);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(wire, vec![1, 1]);
        assert!(h.session.is_capability_ready());
    }

    #[test]
    fn init_failure_reports_zero() {
        let mut h = Harness::new(MockConsole {
            init_error: Some(ConsoleError::LibraryUnavailable),
            ..MockConsole::default()
        });
        let (_, wire) = h.run(Request::Init);
        assert_eq!(wire, vec![1, 0]);
        assert!(!h.session.is_capability_ready());
    }

    #[test]
    fn init_twice_stays_ready() {
        let mut h = Harness::ready(SimulatedConsole::default());
        let (_, wire) = h.run(Request::Init);
        assert_eq!(wire, vec![1, 1]);
        assert!(h.session.is_capability_ready());
    }

    #[test]
    fn teardown_terminates_with_empty_response() {
        let mut h = Harness::ready(MockConsole::default());
        let (flow, wire) = h.run(Request::Teardown);
        assert_eq!(flow, Flow::Terminate);
        assert_eq!(wire, vec![0]);
        assert!(!h.session.is_capability_ready());
        assert_eq!(h.dispatcher.console().calls, vec!["init", "teardown"]);
    }

    #[test]
    fn teardown_without_init_skips_capability() {
        let mut h = Harness::new(MockConsole::default());
        let (flow, wire) = h.run(Request::Teardown);
        assert_eq!(flow, Flow::Terminate);
        assert_eq!(wire, vec![0]);
        assert!(h.dispatcher.console().calls.is_empty());
    }

    #[test]
    fn self_test_without_echo() {
        let mut h = Harness::new(MockConsole::default());
        let (_, wire) = h.run(Request::SelfTest { echo: None });
        let mut r = ResponseCursor::new(&wire);
        assert_eq!(r.u8(), 2);
        assert_eq!(r.string(), SELF_TEST_STRING);
        assert_eq!(r.i32(), 1234567);
        assert!(r.is_empty());
    }

    #[test]
    fn self_test_echoes_first() {
        let mut h = Harness::new(MockConsole::default());
        let (_, wire) = h.run(Request::SelfTest {
            echo: Some(b"ping \x00 bytes".to_vec()),
        });
        let mut r = ResponseCursor::new(&wire);
        assert_eq!(r.u8(), 3);
        assert_eq!(r.tagged(), b"ping \x00 bytes");
        assert_eq!(r.string(), SELF_TEST_STRING);
        assert_eq!(r.i32(), SELF_TEST_VALUE);
        assert!(r.is_empty());
    }

    #[test]
    fn capability_calls_require_init() {
        let mut h = Harness::new(MockConsole::default());
        let (_, wire) = h.run(Request::Connect {
            ip: "10.0.0.5".to_string(),
        });
        assert_eq!(wire[0], 1);
        assert_eq!(ResponseCursor::new(&wire[1..]).i32(), STATUS_ERROR);

        let (_, wire) = h.run(Request::WriteMemory {
            address: 0x10,
            data: &[1],
        });
        assert_eq!(wire, [&[1u8][..], &STATUS_ERROR.to_le_bytes()[..]].concat());
        assert!(h.dispatcher.console().calls.is_empty());
    }

    #[test]
    fn connect_passes_ip_and_status() {
        let mut h = Harness::ready(MockConsole {
            connect_error: Some(ConsoleError::Status(-9)),
            ..MockConsole::default()
        });
        let (_, wire) = h.run(Request::Connect {
            ip: "192.168.1.20".to_string(),
        });
        let mut r = ResponseCursor::new(&wire);
        assert_eq!(r.u8(), 1);
        assert_eq!(r.i32(), -9);
        assert_eq!(
            h.dispatcher.console().connected_ip.as_deref(),
            Some("192.168.1.20")
        );
    }

    #[test]
    fn disconnect_reports_status() {
        let mut h = Harness::ready(MockConsole::default());
        let (_, wire) = h.run(Request::Disconnect);
        assert_eq!(wire, vec![1, 0, 0, 0, 0]);
    }

    #[test]
    fn attach_returns_previous_pid() {
        let mut h = Harness::new(MockConsole::default());
        let (_, wire) = h.run(Request::AttachProcess { pid: 0x0101_0200 });
        let mut r = ResponseCursor::new(&wire);
        assert_eq!(r.u8(), 1);
        assert_eq!(r.u32(), UNATTACHED_PID);

        let (_, wire) = h.run(Request::AttachProcess { pid: 5 });
        assert_eq!(ResponseCursor::new(&wire[1..]).u32(), 0x0101_0200);
        assert_eq!(h.session.attached_pid(), 5);
    }

    #[test]
    fn memory_commands_use_attached_pid() {
        let mut h = Harness::ready(MockConsole::default());
        h.run(Request::ReadMemory {
            address: 0x100,
            length: 4,
        });
        h.run(Request::AttachProcess { pid: 77 });
        let (_, wire) = h.run(Request::ReadMemory {
            address: 0x100,
            length: 4,
        });

        assert_eq!(h.dispatcher.console().read_pids, vec![UNATTACHED_PID, 77]);
        let mut r = ResponseCursor::new(&wire);
        assert_eq!(r.u8(), 1);
        assert_eq!(r.u16(), 4);
        assert_eq!(r.bytes(4), MockConsole::expected(0x100, 4));
        assert!(r.is_empty());
    }

    #[test]
    fn write_against_simulated_console() {
        let mut h = Harness::ready(SimulatedConsole::default());
        h.run(Request::Connect {
            ip: "127.0.0.1".to_string(),
        });
        h.run(Request::AttachProcess { pid: 0x0101_0200 });

        let (_, wire) = h.run(Request::WriteMemory {
            address: 0x0001_0000,
            data: &[9, 8, 7],
        });
        assert_eq!(wire, vec![1, 0, 0, 0, 0]);

        let (_, wire) = h.run(Request::ReadMemory {
            address: 0x0001_0000,
            length: 3,
        });
        assert_eq!(wire, vec![1, 3, 0, 9, 8, 7]);

        let (_, wire) = h.run(Request::WriteMemory {
            address: 0x10,
            data: &[1],
        });
        assert_eq!(ResponseCursor::new(&wire[1..]).i32(), STATUS_ERROR);
    }

    #[test]
    fn find_game_with_name() {
        let mut h = Harness::ready(MockConsole::with_processes(&[
            (1, "dev_flash/vsh/module/vsh.self"),
            (2, "/dev_hdd0/game/X/EBOOT.BIN"),
        ]));
        let (_, wire) = h.run(Request::FindGameProcess);
        let mut r = ResponseCursor::new(&wire);
        assert_eq!(r.u8(), 2);
        assert_eq!(r.u32(), 2);
        assert_eq!(r.string(), "/dev_hdd0/game/X/EBOOT.BIN");
        assert!(r.is_empty());
    }

    #[test]
    fn find_game_none_found() {
        let mut h = Harness::ready(MockConsole::with_processes(&[(1, "dev_flash/a")]));
        let (_, wire) = h.run(Request::FindGameProcess);
        assert_eq!(wire, vec![1, 0, 0, 0, 0]);
    }

    #[test]
    fn process_list_pairs_in_order() {
        let mut h = Harness::ready(MockConsole::with_processes(&[(10, "a"), (20, "bb")]));
        let (_, wire) = h.run(Request::ProcessList);
        let mut r = ResponseCursor::new(&wire);
        assert_eq!(r.u8(), 2);
        assert_eq!(r.u32(), 10);
        assert_eq!(r.string(), "a");
        assert_eq!(r.u32(), 20);
        assert_eq!(r.string(), "bb");
        assert!(r.is_empty());
    }

    #[test]
    fn process_list_empty_and_failed() {
        let mut h = Harness::ready(MockConsole::default());
        let (_, wire) = h.run(Request::ProcessList);
        assert_eq!(wire, vec![0]);

        let mut console = MockConsole::with_processes(&[(10, "a"), (20, "bb")]);
        console.bad_names.push(20);
        let mut h = Harness::ready(console);
        let (flow, wire) = h.run(Request::ProcessList);
        assert_eq!(flow, Flow::Continue);
        assert_eq!(wire, vec![0]);
    }

    #[test]
    fn commands_are_counted() {
        let mut h = Harness::new(MockConsole::default());
        h.run(Request::SelfTest { echo: None });
        h.run(Request::AttachProcess { pid: 1 });
        assert_eq!(h.session.commands_served(), 2);
    }
}
