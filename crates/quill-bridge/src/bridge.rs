#![forbid(unsafe_code)]

//! The cross-thread UI bridge.
//!
//! The editor core runs on its own thread and must never block on the
//! terminal. [`Bridge`] gives it the full [`UserInterface`] surface:
//! every call becomes a [`UiCommand`] on an MPSC channel consumed by
//! the UI thread, which owns the renderer, the input decoder, and the
//! signal watcher. Scheduling order is execution order.
//!
//! Three calls are not fire-and-forget and use a mutex/condvar
//! handshake instead:
//!
//! - **attach** - the caller blocks until the UI thread reports ready;
//! - **suspend** - the caller blocks through the SIGTSTP/SIGCONT
//!   rendez-vous until the terminal is restored;
//! - **stop** - the caller polls for the stopped flag with short
//!   timeouts, then joins the thread.
//!
//! # Back-pressure
//!
//! Draw commands can be produced far faster than a terminal drains
//! bytes. When a `flush` arrives with more than [`TOO_MANY_EVENTS`]
//! commands still queued, the queue is purged unexecuted and the busy
//! flag cleared so the cursor comes back; the core's next full redraw
//! repairs the screen. Draining millions of stale draw commands would
//! lock the user out for minutes instead.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use quill_grid::Attrs;
use quill_input::{Event, InputDecoder, KeyFix, verase};
use quill_render::{ModeEntry, RenderOptions, Renderer};
use quill_term::{BackspaceFix, NumCap, TermDb, TermEnv};

use crate::size;
use crate::ui::{UiCommand, UserInterface, dispatch};

/// Queued-command count above which a flush purges instead of drains.
pub const TOO_MANY_EVENTS: usize = 1_000_000;

/// Receives decoded input on the core side.
pub type InputCallback = Box<dyn FnMut(Event) + Send>;

/// Startup configuration for the terminal UI.
#[derive(Debug, Clone, Default)]
pub struct TuiOptions {
    /// Emit 24-bit color SGR; colors from the core are packed RGB.
    pub rgb: bool,
    /// Explicit column count, overriding every size probe.
    pub columns: Option<u16>,
    /// Explicit row count, overriding every size probe.
    pub rows: Option<u16>,
}

/// Messages consumed by the UI thread's loop.
pub(crate) enum UiMessage {
    /// A scheduled draw command from the core.
    Cmd(UiCommand),
    /// A decoded input event from the pump, bound for the core.
    Input(Event),
    /// SIGWINCH fired; re-probe the size and tell the core.
    Winch,
}

#[derive(Debug, Default)]
struct HandoffState {
    ready: bool,
    stopped: bool,
}

/// The attach/suspend/stop rendez-vous. Protects only the two booleans
/// and is never held across blocking work other than the wait itself.
#[derive(Debug, Default)]
struct Handoff {
    state: Mutex<HandoffState>,
    cond: Condvar,
}

impl Handoff {
    fn lock(&self) -> MutexGuard<'_, HandoffState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_ready(&self) {
        self.lock().ready = true;
        self.cond.notify_all();
    }

    fn clear_ready(&self) {
        self.lock().ready = false;
    }

    fn set_stopped(&self) {
        self.lock().stopped = true;
        self.cond.notify_all();
    }

    /// Block until `ready`, bailing out if the UI thread died first.
    fn wait_ready(&self, thread: &JoinHandle<()>) {
        let mut state = self.lock();
        while !state.ready {
            if thread.is_finished() {
                return;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(state, Duration::from_millis(10))
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// One bounded wait for `stopped`; the caller loops.
    fn stopped_within(&self, timeout: Duration) -> bool {
        let state = self.lock();
        if state.stopped {
            return true;
        }
        let (state, _) = self
            .cond
            .wait_timeout(state, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        state.stopped
    }
}

/// Core-side handle to the UI thread.
///
/// Implements [`UserInterface`]; dropping it stops the UI thread if
/// [`UserInterface::stop`] was never called.
pub struct Bridge {
    tx: Sender<UiMessage>,
    depth: Arc<AtomicUsize>,
    handoff: Arc<Handoff>,
    thread: Option<JoinHandle<()>>,
}

impl Bridge {
    /// Spawn the terminal UI thread and block until it is ready.
    ///
    /// The UI thread builds the capability database, applies the
    /// VERASE fix, probes the size, enters the alternate screen, and
    /// starts the input pump and signal watcher before signalling.
    pub fn attach(options: TuiOptions, input_cb: InputCallback) -> io::Result<Self> {
        let (tx, rx) = channel();
        let depth = Arc::new(AtomicUsize::new(0));
        let handoff = Arc::new(Handoff::default());

        let thread = {
            let tx = tx.clone();
            let depth = Arc::clone(&depth);
            let handoff = Arc::clone(&handoff);
            std::thread::Builder::new()
                .name("quill-ui".into())
                .spawn(move || terminal_main(options, rx, tx, depth, handoff, input_cb))?
        };

        handoff.wait_ready(&thread);
        Ok(Self {
            tx,
            depth,
            handoff,
            thread: Some(thread),
        })
    }

    /// Spawn a UI thread around an arbitrary [`UserInterface`].
    ///
    /// Used by tests and by embedders with their own front end; the
    /// terminal-specific input pump and signal watcher are not started.
    pub fn attach_ui<U, F>(factory: F, input_cb: InputCallback) -> io::Result<Self>
    where
        U: UserInterface + 'static,
        F: FnOnce() -> U + Send + 'static,
    {
        let (tx, rx) = channel();
        let depth = Arc::new(AtomicUsize::new(0));
        let handoff = Arc::new(Handoff::default());

        let thread = {
            let depth = Arc::clone(&depth);
            let handoff = Arc::clone(&handoff);
            std::thread::Builder::new()
                .name("quill-ui".into())
                .spawn(move || {
                    let ui = factory();
                    run_ui_loop(ui, rx, depth, handoff, input_cb, |_, _| {});
                })?
        };

        handoff.wait_ready(&thread);
        Ok(Self {
            tx,
            depth,
            handoff,
            thread: Some(thread),
        })
    }

    /// Commands scheduled but not yet executed.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Inject a synthesized input event into the UI→core path, as the
    /// signal watcher does for resize.
    pub fn notify_input(&self, event: Event) {
        let _ = self.tx.send(UiMessage::Input(event));
    }

    fn send(&self, cmd: UiCommand) {
        self.depth.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(UiMessage::Cmd(cmd)).is_err() {
            self.depth.fetch_sub(1, Ordering::Relaxed);
            tracing::warn!("UI thread gone, dropping command");
        }
    }

    fn suspend_rendezvous(&self) {
        let Some(thread) = self.thread.as_ref() else {
            return;
        };
        // Clear first: the UI side sets it back once the terminal is
        // restored, and only then may this thread continue.
        self.handoff.clear_ready();
        self.send(UiCommand::Suspend);
        self.handoff.wait_ready(thread);
    }

    fn stop_and_join(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.send(UiCommand::Stop);
        while !self.handoff.stopped_within(Duration::from_millis(10)) {
            if thread.is_finished() {
                break;
            }
        }
        let _ = thread.join();
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl UserInterface for Bridge {
    fn resize(&mut self, width: usize, height: usize) {
        self.send(UiCommand::Resize { width, height });
    }

    fn clear(&mut self) {
        self.send(UiCommand::Clear);
    }

    fn eol_clear(&mut self) {
        self.send(UiCommand::EolClear);
    }

    fn cursor_goto(&mut self, row: usize, col: usize) {
        self.send(UiCommand::CursorGoto { row, col });
    }

    fn mode_info_set(&mut self, enabled: bool, entries: &[ModeEntry]) {
        self.send(UiCommand::ModeInfoSet {
            enabled,
            entries: entries.to_vec(),
        });
    }

    fn update_menu(&mut self) {
        self.send(UiCommand::UpdateMenu);
    }

    fn busy_start(&mut self) {
        self.send(UiCommand::BusyStart);
    }

    fn busy_stop(&mut self) {
        self.send(UiCommand::BusyStop);
    }

    fn mouse_on(&mut self) {
        self.send(UiCommand::MouseOn);
    }

    fn mouse_off(&mut self) {
        self.send(UiCommand::MouseOff);
    }

    fn mode_change(&mut self, name: &str, idx: usize) {
        self.send(UiCommand::ModeChange {
            name: name.to_string(),
            idx,
        });
    }

    fn set_scroll_region(&mut self, top: usize, bot: usize, left: usize, right: usize) {
        self.send(UiCommand::SetScrollRegion {
            top,
            bot,
            left,
            right,
        });
    }

    fn scroll(&mut self, count: i64) {
        self.send(UiCommand::Scroll { count });
    }

    fn highlight_set(&mut self, attrs: Attrs) {
        self.send(UiCommand::HighlightSet { attrs });
    }

    fn put(&mut self, text: &[u8]) {
        self.send(UiCommand::Put {
            text: text.to_vec(),
        });
    }

    fn bell(&mut self) {
        self.send(UiCommand::Bell);
    }

    fn visual_bell(&mut self) {
        self.send(UiCommand::VisualBell);
    }

    fn update_fg(&mut self, fg: i32) {
        self.send(UiCommand::UpdateFg { fg });
    }

    fn update_bg(&mut self, bg: i32) {
        self.send(UiCommand::UpdateBg { bg });
    }

    fn update_sp(&mut self, sp: i32) {
        self.send(UiCommand::UpdateSp { sp });
    }

    fn flush(&mut self) {
        self.send(UiCommand::Flush);
    }

    fn suspend(&mut self) {
        self.suspend_rendezvous();
    }

    fn set_title(&mut self, title: &str) {
        self.send(UiCommand::SetTitle {
            title: title.to_string(),
        });
    }

    fn set_icon(&mut self, icon: &str) {
        self.send(UiCommand::SetIcon {
            icon: icon.to_string(),
        });
    }

    fn stop(&mut self) {
        self.stop_and_join();
    }
}

// ── UI thread internals ──────────────────────────────────────────────

/// The UI thread's event loop. FIFO over one channel: draw commands,
/// decoded input, and winch notifications interleave in arrival order.
fn run_ui_loop<U: UserInterface>(
    mut ui: U,
    rx: Receiver<UiMessage>,
    depth: Arc<AtomicUsize>,
    handoff: Arc<Handoff>,
    mut input_cb: InputCallback,
    mut on_winch: impl FnMut(&mut U, &mut InputCallback),
) {
    handoff.set_ready();

    while let Ok(message) = rx.recv() {
        match message {
            UiMessage::Cmd(cmd) => {
                depth.fetch_sub(1, Ordering::Relaxed);
                match cmd {
                    UiCommand::Flush => {
                        let queued = depth.load(Ordering::Relaxed);
                        let mut purged = PurgeOutcome::default();
                        if queued > TOO_MANY_EVENTS {
                            tracing::warn!(queued, "UI event queue flooded, purging");
                            purged = purge(&rx, &depth);
                            // The purge may have eaten a busy_stop.
                            ui.busy_stop();
                        }
                        ui.flush();
                        // Rendez-vous commands must keep their promise
                        // even when the flood around them was dropped:
                        // the core is (or will be) parked on the
                        // condvar for each of them.
                        for _ in 0..purged.suspends {
                            ui.suspend();
                            handoff.set_ready();
                        }
                        if purged.stop {
                            ui.stop();
                            break;
                        }
                    }
                    UiCommand::Suspend => {
                        ui.suspend();
                        // CONTINUE: release the core thread.
                        handoff.set_ready();
                    }
                    UiCommand::Stop => {
                        ui.stop();
                        break;
                    }
                    other => dispatch(&mut ui, other),
                }
            }
            UiMessage::Input(event) => input_cb(event),
            UiMessage::Winch => on_winch(&mut ui, &mut input_cb),
        }
    }

    handoff.set_stopped();
}

/// What a purge swallowed that cannot simply vanish.
#[derive(Debug, Default)]
struct PurgeOutcome {
    suspends: usize,
    stop: bool,
}

/// Drop everything still queued without executing it, except that
/// suspend/stop are reported back so the loop can honor them.
fn purge(rx: &Receiver<UiMessage>, depth: &AtomicUsize) -> PurgeOutcome {
    let mut outcome = PurgeOutcome::default();
    let mut dropped = 0usize;
    while let Ok(message) = rx.try_recv() {
        if let UiMessage::Cmd(cmd) = message {
            depth.fetch_sub(1, Ordering::Relaxed);
            match cmd {
                UiCommand::Suspend => outcome.suspends += 1,
                UiCommand::Stop => outcome.stop = true,
                _ => {}
            }
        }
        dropped += 1;
    }
    tracing::warn!(dropped, "dropped queued UI events");
    outcome
}

/// The real terminal UI: the renderer plus the suspend context.
struct TerminalUi {
    renderer: Renderer<io::Stdout>,
    cont_flag: Arc<AtomicBool>,
    env: TermEnv,
    options: TuiOptions,
}

impl TerminalUi {
    fn handle_winch(&mut self, notify: &mut InputCallback) {
        let (width, height) = size::probe(&self.options, &self.env, self.renderer.db());
        notify(Event::Resize { width, height });
    }
}

impl UserInterface for TerminalUi {
    fn resize(&mut self, width: usize, height: usize) {
        self.renderer.resize(width, height);
    }

    fn clear(&mut self) {
        self.renderer.clear();
    }

    fn eol_clear(&mut self) {
        self.renderer.eol_clear();
    }

    fn cursor_goto(&mut self, row: usize, col: usize) {
        self.renderer.cursor_goto(row, col);
    }

    fn mode_info_set(&mut self, enabled: bool, entries: &[ModeEntry]) {
        self.renderer.mode_info_set(enabled, entries);
    }

    fn update_menu(&mut self) {
        self.renderer.update_menu();
    }

    fn busy_start(&mut self) {
        self.renderer.busy_start();
    }

    fn busy_stop(&mut self) {
        self.renderer.busy_stop();
    }

    fn mouse_on(&mut self) {
        self.renderer.mouse_on();
    }

    fn mouse_off(&mut self) {
        self.renderer.mouse_off();
    }

    fn mode_change(&mut self, name: &str, idx: usize) {
        self.renderer.mode_change(name, idx);
    }

    fn set_scroll_region(&mut self, top: usize, bot: usize, left: usize, right: usize) {
        self.renderer.set_scroll_region(top, bot, left, right);
    }

    fn scroll(&mut self, count: i64) {
        self.renderer.scroll(count);
    }

    fn highlight_set(&mut self, attrs: Attrs) {
        self.renderer.highlight_set(attrs);
    }

    fn put(&mut self, text: &[u8]) {
        self.renderer.put(text);
    }

    fn bell(&mut self) {
        self.renderer.bell();
    }

    fn visual_bell(&mut self) {
        self.renderer.visual_bell();
    }

    fn update_fg(&mut self, fg: i32) {
        self.renderer.update_fg(fg);
    }

    fn update_bg(&mut self, bg: i32) {
        self.renderer.update_bg(bg);
    }

    fn update_sp(&mut self, sp: i32) {
        self.renderer.update_sp(sp);
    }

    fn flush(&mut self) {
        self.renderer.flush();
    }

    fn set_title(&mut self, title: &str) {
        self.renderer.set_title(title);
    }

    fn set_icon(&mut self, icon: &str) {
        self.renderer.set_icon(icon);
    }

    /// The two-phase suspend. Runs on the UI thread; the core thread is
    /// parked on the handoff condvar until the loop signals ready after
    /// this returns.
    #[cfg(unix)]
    fn suspend(&mut self) {
        let mouse_was_on = self.renderer.mouse_enabled();

        // Phase one: restore the terminal and stop ourselves.
        self.renderer.stop();
        self.cont_flag.store(false, Ordering::Relaxed);
        let _ = quill_input::set_stdin_blocking(true);
        crate::signals::raise_stop_signal();

        // The process group is stopped here until SIGCONT.
        while !self.cont_flag.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_millis(10));
        }

        // Phase two: re-initialise.
        self.renderer.start();
        if mouse_was_on {
            self.renderer.mouse_on();
        }
        let _ = quill_input::set_stdin_blocking(false);
    }

    #[cfg(not(unix))]
    fn suspend(&mut self) {}

    fn stop(&mut self) {
        self.renderer.stop();
    }
}

/// Entry point of the real UI thread.
fn terminal_main(
    options: TuiOptions,
    rx: Receiver<UiMessage>,
    tx: Sender<UiMessage>,
    depth: Arc<AtomicUsize>,
    handoff: Arc<Handoff>,
    input_cb: InputCallback,
) {
    let env = TermEnv::from_env();
    let mut db = TermDb::from_term_env(&env);

    // Reconcile Backspace/Delete with the tty driver before freezing
    // the database, and hand the decoder the same remap.
    let fix = BackspaceFix::for_db(&db, verase());
    fix.apply(&mut db);

    let (width, height) = size::probe(&options, &env, &db);
    db.set_num(NumCap::Columns, i32::from(width));
    db.set_num(NumCap::Lines, i32::from(height));

    let render_options = RenderOptions {
        rgb: options.rgb,
        vte_version: env.vte_version(),
    };
    let mut renderer = Renderer::new(db, io::stdout(), render_options);
    let got_winch = renderer.winch_flag();
    let cont_flag = Arc::new(AtomicBool::new(false));

    let mut decoder = InputDecoder::new();
    decoder.set_key_fix(KeyFix::from_fix(&fix));
    let pump_running = Arc::new(AtomicBool::new(true));
    let pump = {
        let tx = tx.clone();
        let running = Arc::clone(&pump_running);
        std::thread::Builder::new()
            .name("quill-input".into())
            .spawn(move || input_pump(decoder, tx, running))
            .ok()
    };

    #[cfg(unix)]
    let signals = match crate::signals::SignalWatcher::start(
        tx.clone(),
        Arc::clone(&got_winch),
        Arc::clone(&cont_flag),
    ) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            tracing::warn!(%err, "signal watcher unavailable");
            None
        }
    };
    #[cfg(not(unix))]
    let _ = &got_winch;

    renderer.start();
    // Tell the core the probed size before any draw command executes.
    let _ = tx.send(UiMessage::Winch);

    let ui = TerminalUi {
        renderer,
        cont_flag,
        env,
        options,
    };
    run_ui_loop(ui, rx, depth, handoff, input_cb, TerminalUi::handle_winch);

    pump_running.store(false, Ordering::Relaxed);
    if let Some(pump) = pump {
        let _ = pump.join();
    }
    #[cfg(unix)]
    drop(signals);
}

/// Reads decoded events off the terminal and forwards them to the UI
/// loop, which relays them to the core. Exits when the loop goes away
/// or the input stream dies.
fn input_pump(mut decoder: InputDecoder, tx: Sender<UiMessage>, running: Arc<AtomicBool>) {
    let mut events = Vec::new();
    while running.load(Ordering::Relaxed) {
        match decoder.poll(Duration::from_millis(100)) {
            Ok(false) => {}
            Ok(true) => {
                if let Err(err) = decoder.read_into(&mut events) {
                    tracing::warn!(%err, "input read failed");
                    break;
                }
                for event in events.drain(..) {
                    if tx.send(UiMessage::Input(event)).is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%err, "input poll failed");
                break;
            }
        }
    }
}
