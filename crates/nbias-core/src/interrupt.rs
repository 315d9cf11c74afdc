//! Termination-signal handling for edit sessions.
//!
//! The installed handlers do nothing but record the signal number. The
//! session polls [`pending`] between states and the editor collaborator
//! polls it while waiting, so an interruption unwinds through ordinary
//! `Result` propagation and every scratch handle and key is dropped on the
//! way out.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::error::{NbiasError, Result};

static PENDING: AtomicI32 = AtomicI32::new(0);

/// Signals that end a session early.
#[cfg(unix)]
pub const HANDLED_SIGNALS: [i32; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

/// Signal recorded since the last [`take`], if any.
pub fn pending() -> Option<i32> {
    match PENDING.load(Ordering::SeqCst) {
        0 => None,
        signal => Some(signal),
    }
}

/// Return and clear the recorded signal.
pub fn take() -> Option<i32> {
    match PENDING.swap(0, Ordering::SeqCst) {
        0 => None,
        signal => Some(signal),
    }
}

/// Whether `signal` is one a terminal sends to the whole foreground process
/// group (Ctrl-C, Ctrl-\), and so also reaches a running editor.
pub fn is_keyboard(signal: i32) -> bool {
    #[cfg(unix)]
    {
        signal == libc::SIGINT || signal == libc::SIGQUIT
    }
    #[cfg(not(unix))]
    {
        let _ = signal;
        false
    }
}

/// `Err(Interrupted)` if a signal is pending.
pub fn check() -> Result<()> {
    match pending() {
        Some(signal) => Err(NbiasError::Interrupted(signal)),
        None => Ok(()),
    }
}

/// Scoped installation of the recording handlers.
///
/// Dropping the guard restores whatever handlers were in place before.
pub struct InterruptGuard {
    #[cfg(unix)]
    previous: Vec<(libc::c_int, libc::sigaction)>,
}

#[cfg(unix)]
extern "C" fn record(signal: libc::c_int) {
    PENDING.store(signal, Ordering::SeqCst);
}

impl InterruptGuard {
    #[cfg(unix)]
    pub fn install() -> Result<Self> {
        let mut guard = Self {
            previous: Vec::with_capacity(HANDLED_SIGNALS.len()),
        };
        for signal in HANDLED_SIGNALS {
            // SAFETY: both sigaction structs are fully initialised before the
            // call, and the handler only performs an atomic store.
            let previous = unsafe {
                let mut action: libc::sigaction = std::mem::zeroed();
                action.sa_sigaction = record as extern "C" fn(libc::c_int) as libc::sighandler_t;
                libc::sigemptyset(&mut action.sa_mask);
                action.sa_flags = 0;

                let mut previous: libc::sigaction = std::mem::zeroed();
                if libc::sigaction(signal, &action, &mut previous) != 0 {
                    let err = std::io::Error::last_os_error();
                    // `guard` drops here and restores what was already replaced.
                    return Err(NbiasError::io("install signal handler", err));
                }
                previous
            };
            guard.previous.push((signal, previous));
        }
        tracing::debug!("interrupt handlers installed");
        Ok(guard)
    }

    #[cfg(not(unix))]
    pub fn install() -> Result<Self> {
        Ok(Self {})
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        for (signal, previous) in self.previous.drain(..).rev() {
            // SAFETY: `previous` was filled in by a successful sigaction call.
            unsafe {
                libc::sigaction(signal, &previous, std::ptr::null_mut());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_and_restore() {
        let first = InterruptGuard::install().unwrap();
        let nested = InterruptGuard::install().unwrap();
        drop(nested);
        drop(first);
    }

    #[cfg(unix)]
    #[test]
    fn test_keyboard_signals() {
        assert!(is_keyboard(libc::SIGINT));
        assert!(is_keyboard(libc::SIGQUIT));
        assert!(!is_keyboard(libc::SIGTERM));
        assert!(!is_keyboard(libc::SIGHUP));
    }

    #[test]
    fn test_check_is_ok_without_signal() {
        assert!(check().is_ok());
        assert_eq!(pending(), None);
    }
}
