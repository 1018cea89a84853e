//! Terminal capability probe and raw-mode lifecycle guard. Grounded on the
//! `Hide`/`Show`-bracketed `run_before_event_loop`/`run_after_event_loop`
//! pair and the `return_if_not_interactive_terminal!` macro
//! (`choose_impl/event_loop.rs`), generalized into a `Drop`-guarded type
//! that also runs from the signal-triggered exit path — collapsing the C
//! source's `atexit`-plus-signal-handler teardown duplication into one
//! place.

pub mod signals;

use std::fs::{File, OpenOptions};
use std::io::Write;

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::error::TermError;

/// Required capabilities: portable cursor movement and save/restore.
/// `crossterm` always emits these as plain ANSI sequences, so the only
/// real gate left is "is this actually an interactive terminal".
pub fn is_interactive_terminal() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stdin()) && std::io::IsTerminal::is_terminal(&std::io::stdout())
}

pub fn probe_capabilities() -> Result<(), TermError> {
    if !is_interactive_terminal() {
        return Err(TermError::NotInteractive);
    }
    Ok(())
}

/// Owns the `/dev/tty` handle used for interactive I/O and the raw-mode
/// lifecycle; its `Drop` impl restores everything even on an early return
/// or panic unwind, and `teardown()` lets the signal-polling path run the
/// same restoration before calling `std::process::exit`.
pub struct TerminalGuard {
    pub tty: File,
    active: bool,
}

impl TerminalGuard {
    pub fn open() -> Result<Self, TermError> {
        let tty = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .map_err(TermError::CannotOpenTty)?;
        enable_raw_mode()?;
        execute!(std::io::stdout(), Hide)?;
        Ok(TerminalGuard { tty, active: true })
    }

    /// Restore raw-mode state and cursor visibility. Idempotent; safe to
    /// call from both the normal exit path and a signal handler's polled
    /// flag.
    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let _ = execute!(std::io::stdout(), Show);
        let _ = disable_raw_mode();
        let _ = writeln!(std::io::stdout());
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.teardown();
    }
}
