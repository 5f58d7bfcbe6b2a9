//! Command identifiers and request decoding.

use ccbridge_frame::{decode_tagged_field, decode_tagged_string, get_u32_le, Frame};

use crate::error::{Result, SessionError};

/// Protocol command identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CommandId {
    Init = 1,
    Teardown = 2,
    SelfTest = 3,
    Connect = 4,
    Disconnect = 5,
    WriteMemory = 9,
    ReadMemory = 10,
    AttachProcess = 22,
    FindGameProcess = 23,
    ProcessList = 24,
}

impl CommandId {
    /// Human-readable command name for logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            CommandId::Init => "init",
            CommandId::Teardown => "teardown",
            CommandId::SelfTest => "self_test",
            CommandId::Connect => "connect",
            CommandId::Disconnect => "disconnect",
            CommandId::WriteMemory => "write_memory",
            CommandId::ReadMemory => "read_memory",
            CommandId::AttachProcess => "attach_process",
            CommandId::FindGameProcess => "find_game_process",
            CommandId::ProcessList => "process_list",
        }
    }
}

impl TryFrom<i32> for CommandId {
    type Error = SessionError;

    fn try_from(id: i32) -> Result<Self> {
        Ok(match id {
            1 => CommandId::Init,
            2 => CommandId::Teardown,
            3 => CommandId::SelfTest,
            4 => CommandId::Connect,
            5 => CommandId::Disconnect,
            9 => CommandId::WriteMemory,
            10 => CommandId::ReadMemory,
            22 => CommandId::AttachProcess,
            23 => CommandId::FindGameProcess,
            24 => CommandId::ProcessList,
            other => return Err(SessionError::UnknownCommand(other)),
        })
    }
}

/// A decoded request, borrowing bulk data from the frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request<'a> {
    /// Initialize the console capability.
    Init,
    /// Release the capability and end the connection.
    Teardown,
    /// Echo test; carries the string to echo back when one was sent.
    SelfTest { echo: Option<Vec<u8>> },
    /// Connect to the console at `ip`.
    Connect { ip: String },
    /// Disconnect from the console.
    Disconnect,
    /// Write `data` at `address` in the attached process.
    WriteMemory { address: u32, data: &'a [u8] },
    /// Read `length` bytes at `address` in the attached process.
    ReadMemory { address: u32, length: u32 },
    /// Attach memory commands to process `pid`.
    AttachProcess { pid: u32 },
    /// Find the running game's process id.
    FindGameProcess,
    /// List processes with their names.
    ProcessList,
}

impl<'a> Request<'a> {
    /// Decode a frame into a request, validating the payload shape.
    pub fn decode(frame: Frame<'a>) -> Result<Self> {
        let command = CommandId::try_from(frame.command_id)?;
        let payload = frame.payload;

        let request = match command {
            CommandId::Init => Request::Init,
            CommandId::Teardown => Request::Teardown,
            CommandId::SelfTest => {
                let echo = if payload.is_empty() {
                    None
                } else {
                    Some(decode_tagged_field(payload, 0)?.0)
                };
                Request::SelfTest { echo }
            }
            CommandId::Connect => {
                expect_len(command, payload, "at least 2", |len| len >= 2)?;
                let (ip, _) = decode_tagged_string(payload, 0)?;
                Request::Connect { ip }
            }
            CommandId::Disconnect => Request::Disconnect,
            CommandId::WriteMemory => {
                expect_len(command, payload, "at least 4", |len| len >= 4)?;
                Request::WriteMemory {
                    address: get_u32_le(payload, 0)?,
                    data: &payload[4..],
                }
            }
            CommandId::ReadMemory => {
                expect_len(command, payload, "exactly 8", |len| len == 8)?;
                Request::ReadMemory {
                    address: get_u32_le(payload, 0)?,
                    length: get_u32_le(payload, 4)?,
                }
            }
            CommandId::AttachProcess => {
                expect_len(command, payload, "exactly 4", |len| len == 4)?;
                Request::AttachProcess {
                    pid: get_u32_le(payload, 0)?,
                }
            }
            CommandId::FindGameProcess => Request::FindGameProcess,
            CommandId::ProcessList => Request::ProcessList,
        };

        Ok(request)
    }

    /// The command this request belongs to.
    pub fn command_id(&self) -> CommandId {
        match self {
            Request::Init => CommandId::Init,
            Request::Teardown => CommandId::Teardown,
            Request::SelfTest { .. } => CommandId::SelfTest,
            Request::Connect { .. } => CommandId::Connect,
            Request::Disconnect => CommandId::Disconnect,
            Request::WriteMemory { .. } => CommandId::WriteMemory,
            Request::ReadMemory { .. } => CommandId::ReadMemory,
            Request::AttachProcess { .. } => CommandId::AttachProcess,
            Request::FindGameProcess => CommandId::FindGameProcess,
            Request::ProcessList => CommandId::ProcessList,
        }
    }
}

fn expect_len(
    command: CommandId,
    payload: &[u8],
    expected: &'static str,
    ok: impl Fn(usize) -> bool,
) -> Result<()> {
    if ok(payload.len()) {
        Ok(())
    } else {
        Err(SessionError::InvalidPayload {
            command: command.name(),
            expected,
            actual: payload.len(),
        })
    }
}
