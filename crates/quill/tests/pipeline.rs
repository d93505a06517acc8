//! End-to-end wiring: decoded input flows from the UI thread through
//! the bridge callback into the core's multi-level queue.
//!
//! The callback runs on the UI thread and must be `Send`, so the core
//! relays through a channel into the queue it owns - the queue itself
//! is single-threaded by design.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use quill::{
    Attrs, Bridge, Event, KeyCode, KeyEvent, ModeEntry, MultiQueue, UserInterface,
};

/// A do-nothing UI so the test needs no terminal.
struct NullUi;

impl UserInterface for NullUi {
    fn resize(&mut self, _: usize, _: usize) {}
    fn clear(&mut self) {}
    fn eol_clear(&mut self) {}
    fn cursor_goto(&mut self, _: usize, _: usize) {}
    fn mode_info_set(&mut self, _: bool, _: &[ModeEntry]) {}
    fn update_menu(&mut self) {}
    fn busy_start(&mut self) {}
    fn busy_stop(&mut self) {}
    fn mouse_on(&mut self) {}
    fn mouse_off(&mut self) {}
    fn mode_change(&mut self, _: &str, _: usize) {}
    fn set_scroll_region(&mut self, _: usize, _: usize, _: usize, _: usize) {}
    fn scroll(&mut self, _: i64) {}
    fn highlight_set(&mut self, _: Attrs) {}
    fn put(&mut self, _: &[u8]) {}
    fn bell(&mut self) {}
    fn visual_bell(&mut self) {}
    fn update_fg(&mut self, _: i32) {}
    fn update_bg(&mut self, _: i32) {}
    fn update_sp(&mut self, _: i32) {}
    fn flush(&mut self) {}
    fn suspend(&mut self) {}
    fn set_title(&mut self, _: &str) {}
    fn set_icon(&mut self, _: &str) {}
    fn stop(&mut self) {}
}

#[test]
fn input_lands_in_the_core_queue() {
    let (relay_tx, relay_rx) = mpsc::channel();

    let bridge = Bridge::attach_ui(
        || NullUi,
        Box::new(move |event| {
            let _ = relay_tx.send(event);
        }),
    )
    .expect("spawn UI thread");

    // The core's main loop: a root queue with one child per emitter;
    // terminal input gets its own child.
    let main_queue: MultiQueue<Event> = MultiQueue::new();
    let input_queue = main_queue.new_child();

    bridge.notify_input(Event::Key(KeyEvent::new(KeyCode::Char('i'))));
    bridge.notify_input(Event::Resize {
        width: 120,
        height: 40,
    });

    // Core side: drain the relay into the input child queue.
    let deadline = Instant::now() + Duration::from_secs(5);
    while main_queue.len() < 2 && Instant::now() < deadline {
        if let Ok(event) = relay_rx.recv_timeout(Duration::from_millis(50)) {
            input_queue.push(event);
        }
    }

    assert_eq!(main_queue.len(), 2);
    assert_eq!(input_queue.len(), 2);

    // Draining through the root consumes the child's entries in order.
    assert_eq!(
        main_queue.pop(),
        Some(Event::Key(KeyEvent::new(KeyCode::Char('i'))))
    );
    assert_eq!(
        main_queue.pop(),
        Some(Event::Resize {
            width: 120,
            height: 40
        })
    );
    assert!(input_queue.is_empty());

    drop(bridge);
}

#[test]
fn draw_commands_and_input_share_the_bridge() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);

    struct CountingUi(Arc<Mutex<Vec<&'static str>>>);
    impl UserInterface for CountingUi {
        fn resize(&mut self, _: usize, _: usize) {
            self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push("resize");
        }
        fn clear(&mut self) {}
        fn eol_clear(&mut self) {}
        fn cursor_goto(&mut self, _: usize, _: usize) {}
        fn mode_info_set(&mut self, _: bool, _: &[ModeEntry]) {}
        fn update_menu(&mut self) {}
        fn busy_start(&mut self) {}
        fn busy_stop(&mut self) {}
        fn mouse_on(&mut self) {}
        fn mouse_off(&mut self) {}
        fn mode_change(&mut self, _: &str, _: usize) {}
        fn set_scroll_region(&mut self, _: usize, _: usize, _: usize, _: usize) {}
        fn scroll(&mut self, _: i64) {}
        fn highlight_set(&mut self, _: Attrs) {}
        fn put(&mut self, _: &[u8]) {
            self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push("put");
        }
        fn bell(&mut self) {}
        fn visual_bell(&mut self) {}
        fn update_fg(&mut self, _: i32) {}
        fn update_bg(&mut self, _: i32) {}
        fn update_sp(&mut self, _: i32) {}
        fn flush(&mut self) {
            self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push("flush");
        }
        fn suspend(&mut self) {}
        fn set_title(&mut self, _: &str) {}
        fn set_icon(&mut self, _: &str) {}
        fn stop(&mut self) {}
    }

    let (event_tx, event_rx) = mpsc::channel();
    let mut bridge = Bridge::attach_ui(
        move || CountingUi(seen_cb),
        Box::new(move |event| {
            let _ = event_tx.send(event);
        }),
    )
    .expect("spawn UI thread");

    bridge.resize(80, 24);
    bridge.put(b"x");
    bridge.notify_input(Event::FocusGained);
    bridge.flush();
    bridge.stop();

    assert_eq!(
        *seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner),
        vec!["resize", "put", "flush"]
    );
    assert_eq!(
        event_rx.recv_timeout(Duration::from_secs(5)),
        Ok(Event::FocusGained)
    );
}
