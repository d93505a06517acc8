#![forbid(unsafe_code)]

//! Signal handling for the UI thread.
//!
//! A dedicated watcher thread (the `signal-hook` iterator idiom) turns
//! SIGWINCH into a message on the UI channel plus the shared
//! `got_winch` flag, and SIGCONT into the resume flag the suspend
//! rendez-vous polls. SIGTSTP is never *received* here - the UI thread
//! raises it itself after tearing the terminal down.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use signal_hook::consts::signal::{SIGCONT, SIGWINCH};
use signal_hook::iterator::Signals;

use crate::bridge::UiMessage;

/// Owns the signal watcher thread; closing the handle ends it.
#[derive(Debug)]
pub(crate) struct SignalWatcher {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SignalWatcher {
    pub(crate) fn start(
        tx: Sender<UiMessage>,
        got_winch: Arc<AtomicBool>,
        cont_flag: Arc<AtomicBool>,
    ) -> io::Result<Self> {
        let mut signals = Signals::new([SIGWINCH, SIGCONT]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("quill-signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    match signal {
                        SIGWINCH => {
                            tracing::debug!("SIGWINCH");
                            got_winch.store(true, Ordering::Relaxed);
                            if tx.send(UiMessage::Winch).is_err() {
                                break;
                            }
                        }
                        SIGCONT => {
                            tracing::debug!("SIGCONT");
                            cont_flag.store(true, Ordering::Relaxed);
                        }
                        _ => {}
                    }
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for SignalWatcher {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Stop our own process group, as the interactive stop key would.
pub(crate) fn raise_stop_signal() {
    // pid 0: the whole process group, so a wrapping shell job gets
    // suspended consistently.
    let _ = nix::sys::signal::kill(nix::unistd::Pid::from_raw(0), nix::sys::signal::Signal::SIGTSTP);
}
