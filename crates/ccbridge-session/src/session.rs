//! Per-connection state.

use ccbridge_console::UNATTACHED_PID;

/// State that lives for one controller connection.
///
/// Owned by the connection loop and handed to the dispatcher for each
/// command; nothing here outlives the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Process memory commands operate on.
    attached_pid: u32,
    /// Whether the console capability has been initialized.
    capability_ready: bool,
    /// Commands dispatched so far.
    commands_served: u64,
}

impl Session {
    /// A fresh session: nothing attached, capability not initialized.
    pub fn new() -> Self {
        Self {
            attached_pid: UNATTACHED_PID,
            capability_ready: false,
            commands_served: 0,
        }
    }

    /// Currently attached process id ([`UNATTACHED_PID`] until set).
    pub fn attached_pid(&self) -> u32 {
        self.attached_pid
    }

    /// Attach to `pid`, returning the previously attached id.
    pub fn attach(&mut self, pid: u32) -> u32 {
        std::mem::replace(&mut self.attached_pid, pid)
    }

    /// Whether the console capability has been initialized.
    pub fn is_capability_ready(&self) -> bool {
        self.capability_ready
    }

    /// Record the capability's initialization state.
    pub fn set_capability_ready(&mut self, ready: bool) {
        self.capability_ready = ready;
    }

    /// Number of commands dispatched on this connection.
    pub fn commands_served(&self) -> u64 {
        self.commands_served
    }

    pub(crate) fn record_command(&mut self) {
        self.commands_served = self.commands_served.saturating_add(1);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unattached_and_uninitialized() {
        let session = Session::new();
        assert_eq!(session.attached_pid(), 0xFFFF_FFFF);
        assert!(!session.is_capability_ready());
        assert_eq!(session.commands_served(), 0);
    }

    #[test]
    fn attach_returns_previous() {
        let mut session = Session::new();
        assert_eq!(session.attach(0x0101_0200), UNATTACHED_PID);
        assert_eq!(session.attach(7), 0x0101_0200);
        assert_eq!(session.attached_pid(), 7);
    }
}
