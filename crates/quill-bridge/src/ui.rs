#![forbid(unsafe_code)]

//! The UI surface and its wire form.
//!
//! [`UserInterface`] is the contract between the editor core and any
//! UI: one method per draw command. The renderer implements it
//! directly; [`crate::Bridge`] implements it by enqueueing a
//! [`UiCommand`] - the owned, typed form of the same calls - onto the
//! UI thread's channel. The core only ever sees the trait.

use quill_grid::Attrs;
use quill_render::ModeEntry;

/// The draw-command surface the editor core programs against.
///
/// All calls are fire-and-forget; `suspend` and `stop` are the two
/// exceptions, documented on the bridge, where the caller blocks until
/// the UI side completes the transition.
pub trait UserInterface {
    fn resize(&mut self, width: usize, height: usize);
    fn clear(&mut self);
    fn eol_clear(&mut self);
    fn cursor_goto(&mut self, row: usize, col: usize);
    fn mode_info_set(&mut self, enabled: bool, entries: &[ModeEntry]);
    fn update_menu(&mut self);
    fn busy_start(&mut self);
    fn busy_stop(&mut self);
    fn mouse_on(&mut self);
    fn mouse_off(&mut self);
    fn mode_change(&mut self, name: &str, idx: usize);
    fn set_scroll_region(&mut self, top: usize, bot: usize, left: usize, right: usize);
    fn scroll(&mut self, count: i64);
    fn highlight_set(&mut self, attrs: Attrs);
    fn put(&mut self, text: &[u8]);
    fn bell(&mut self);
    fn visual_bell(&mut self);
    fn update_fg(&mut self, fg: i32);
    fn update_bg(&mut self, bg: i32);
    fn update_sp(&mut self, sp: i32);
    fn flush(&mut self);
    fn suspend(&mut self);
    fn set_title(&mut self, title: &str);
    fn set_icon(&mut self, icon: &str);
    fn stop(&mut self);
}

/// One scheduled draw command, arguments owned for the channel hop.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    Resize { width: usize, height: usize },
    Clear,
    EolClear,
    CursorGoto { row: usize, col: usize },
    ModeInfoSet { enabled: bool, entries: Vec<ModeEntry> },
    UpdateMenu,
    BusyStart,
    BusyStop,
    MouseOn,
    MouseOff,
    ModeChange { name: String, idx: usize },
    SetScrollRegion { top: usize, bot: usize, left: usize, right: usize },
    Scroll { count: i64 },
    HighlightSet { attrs: Attrs },
    Put { text: Vec<u8> },
    Bell,
    VisualBell,
    UpdateFg { fg: i32 },
    UpdateBg { bg: i32 },
    UpdateSp { sp: i32 },
    Flush,
    Suspend,
    SetTitle { title: String },
    SetIcon { icon: String },
    Stop,
}

/// Forward a command to the matching trait method.
///
/// `Flush`, `Suspend` and `Stop` are not handled here: the event loop
/// owns them (flood check, rendez-vous, shutdown).
pub(crate) fn dispatch<U: UserInterface>(ui: &mut U, cmd: UiCommand) {
    match cmd {
        UiCommand::Resize { width, height } => ui.resize(width, height),
        UiCommand::Clear => ui.clear(),
        UiCommand::EolClear => ui.eol_clear(),
        UiCommand::CursorGoto { row, col } => ui.cursor_goto(row, col),
        UiCommand::ModeInfoSet { enabled, entries } => ui.mode_info_set(enabled, &entries),
        UiCommand::UpdateMenu => ui.update_menu(),
        UiCommand::BusyStart => ui.busy_start(),
        UiCommand::BusyStop => ui.busy_stop(),
        UiCommand::MouseOn => ui.mouse_on(),
        UiCommand::MouseOff => ui.mouse_off(),
        UiCommand::ModeChange { name, idx } => ui.mode_change(&name, idx),
        UiCommand::SetScrollRegion {
            top,
            bot,
            left,
            right,
        } => ui.set_scroll_region(top, bot, left, right),
        UiCommand::Scroll { count } => ui.scroll(count),
        UiCommand::HighlightSet { attrs } => ui.highlight_set(attrs),
        UiCommand::Put { text } => ui.put(&text),
        UiCommand::Bell => ui.bell(),
        UiCommand::VisualBell => ui.visual_bell(),
        UiCommand::UpdateFg { fg } => ui.update_fg(fg),
        UiCommand::UpdateBg { bg } => ui.update_bg(bg),
        UiCommand::UpdateSp { sp } => ui.update_sp(sp),
        UiCommand::SetTitle { title } => ui.set_title(&title),
        UiCommand::SetIcon { icon } => ui.set_icon(&icon),
        UiCommand::Flush | UiCommand::Suspend | UiCommand::Stop => {
            debug_assert!(false, "loop-owned command reached dispatch");
        }
    }
}
