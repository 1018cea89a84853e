//! Asynchronous signal flags, polled at the top of the main loop. Signal
//! handlers themselves do nothing but set an atomic bool — the Rust
//! equivalent of the source's `sig_atomic_t` globals. Grounded on the
//! Unix-only `signal-hook`/`signal-hook-mio` dependency section used for
//! `DirectToAnsi`'s SIGWINCH handling (`tui/Cargo.toml`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SignalFlags {
    pub winch: Arc<AtomicBool>,
    pub int: Arc<AtomicBool>,
    pub term: Arc<AtomicBool>,
    pub hup: Arc<AtomicBool>,
}

impl SignalFlags {
    pub fn new() -> Self {
        SignalFlags::default()
    }

    #[cfg(unix)]
    pub fn install(&self) -> Result<(), std::io::Error> {
        signal_hook::flag::register(signal_hook::consts::SIGWINCH, self.winch.clone())?;
        signal_hook::flag::register(signal_hook::consts::SIGINT, self.int.clone())?;
        signal_hook::flag::register(signal_hook::consts::SIGTERM, self.term.clone())?;
        signal_hook::flag::register(signal_hook::consts::SIGHUP, self.hup.clone())?;
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn install(&self) -> Result<(), std::io::Error> {
        Ok(())
    }

    pub fn take_winch(&self) -> bool {
        self.winch.swap(false, Ordering::Relaxed)
    }

    pub fn take_int(&self) -> bool {
        self.int.swap(false, Ordering::Relaxed)
    }

    pub fn take_term(&self) -> bool {
        self.term.swap(false, Ordering::Relaxed)
    }

    pub fn take_hup(&self) -> bool {
        self.hup.swap(false, Ordering::Relaxed)
    }

    pub fn any_fatal(&self) -> Option<i32> {
        // POSIX signal numbers; stable across the Unix targets this crate
        // supports, so no need to reach into `signal_hook::consts` here.
        const SIGHUP: i32 = 1;
        const SIGINT: i32 = 2;
        const SIGTERM: i32 = 15;
        if self.term.load(Ordering::Relaxed) {
            Some(SIGTERM)
        } else if self.hup.load(Ordering::Relaxed) {
            Some(SIGHUP)
        } else if self.int.load(Ordering::Relaxed) {
            Some(SIGINT)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_start_clear() {
        let f = SignalFlags::new();
        assert!(!f.take_winch());
        assert!(!f.take_int());
    }

    #[test]
    fn take_resets_the_flag() {
        let f = SignalFlags::new();
        f.winch.store(true, Ordering::Relaxed);
        assert!(f.take_winch());
        assert!(!f.take_winch());
    }
}
