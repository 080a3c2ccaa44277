//! Process-liveness probing.
//!
//! Used for exactly one thing: when overwriting a plugin file fails with a
//! sharing violation, check whether the host mascot application is running so
//! the advisory can say "close SSP" instead of a generic "close the
//! application". Behind a trait so engine tests don't enumerate real
//! processes.

use sysinfo::System;

/// Reports whether a process with a given executable name is running.
pub trait ProcessProbe {
    /// Case-insensitive match against running process names.
    fn is_running(&self, name: &str) -> bool;
}

/// [`ProcessProbe`] backed by a live process listing.
#[derive(Debug, Default)]
pub struct SystemProbe;

impl ProcessProbe for SystemProbe {
    fn is_running(&self, name: &str) -> bool {
        let mut system = System::new();
        system.refresh_processes();
        system
            .processes()
            .values()
            .any(|process| process.name().eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonexistent_process_is_not_running() {
        let probe = SystemProbe;
        assert!(!probe.is_running("definitely-not-a-real-process-name.exe"));
    }
}
