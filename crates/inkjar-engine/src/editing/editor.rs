//! The editor instance: owns the surface, the options and the history, and
//! turns host events into commands.
//!
//! Events arrive through [`Editor::dispatch`]. Deferred work (the 30 ms
//! re-highlight and the 300 ms history commit) is held in two [`Debounce`]
//! slots that the host loop drains with [`Editor::run_due_timers`], using
//! [`Editor::next_deadline`] to decide how long it may sleep.

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use crate::dom::Surface;
use crate::editing::commands;
use crate::editing::debounce::Debounce;
use crate::editing::events::{ClipboardEvent, EditorEvent, EventKind, KeyEvent};
use crate::editing::history::History;
use crate::editing::position;
use crate::editing::{EditorError, Highlighter, Options, OptionsPatch, Position};

pub const HIGHLIGHT_DELAY: Duration = Duration::from_millis(30);
pub const HISTORY_DELAY: Duration = Duration::from_millis(300);

const ALL_EVENTS: [EventKind; 6] = [
    EventKind::KeyDown,
    EventKind::KeyUp,
    EventKind::Focus,
    EventKind::Blur,
    EventKind::Paste,
    EventKind::Cut,
];

type UpdateCallback = Box<dyn FnMut(&str)>;

pub struct Editor {
    surface: Surface,
    highlighter: Box<dyn Highlighter>,
    options: Options,
    listeners: HashSet<EventKind>,
    history: History,
    focus: bool,
    /// Set by the first qualifying keydown of a burst, cleared by the
    /// debounced commit.
    recording: bool,
    on_update: Option<UpdateCallback>,
    /// Text as of the last keydown.
    prev: String,
    legacy: bool,
    highlight_timer: Debounce<Editor, ()>,
    history_timer: Debounce<Editor, KeyEvent>,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("options", &self.options)
            .field("history", &self.history.len())
            .field("focus", &self.focus)
            .field("recording", &self.recording)
            .field("legacy", &self.legacy)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.surface.text_content())
    }
}

impl Editor {
    /// Attach an editor to `surface`. The surface is marked editable, the
    /// host capability is probed once and the current content is highlighted.
    pub fn new(
        surface: Surface,
        highlighter: impl Highlighter + 'static,
        patch: OptionsPatch,
    ) -> Self {
        let options = Options::from_patch(patch);
        let legacy = !options.host.supports_plaintext_only();
        let mut editor = Self {
            surface,
            highlighter: Box::new(highlighter),
            options,
            listeners: ALL_EVENTS.into_iter().collect(),
            history: History::new(),
            focus: false,
            recording: false,
            on_update: None,
            prev: String::new(),
            legacy,
            highlight_timer: Debounce::new(HIGHLIGHT_DELAY, Editor::debounced_highlight),
            history_timer: Debounce::new(HISTORY_DELAY, Editor::debounced_history),
        };

        let root = editor.surface.root();
        let editable = if legacy { "true" } else { "plaintext-only" };
        editor.surface.set_attribute(root, "contenteditable", editable);
        editor.apply_spellcheck();
        if legacy {
            log::debug!("host lacks plain-text caret support, running in legacy mode");
        }

        editor.highlighter.highlight(&mut editor.surface, None);
        editor.prev = editor.surface.text_content();
        log::debug!("editor attached: {:?}", editor.options);
        editor
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Direct access for host default actions and external mutations.
    /// Callers that move text around should bracket the change with
    /// [`save`](Editor::save) and [`restore`](Editor::restore).
    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn has_focus(&self) -> bool {
        self.focus
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    pub fn is_listening(&self, kind: EventKind) -> bool {
        self.listeners.contains(&kind)
    }

    /// Current logical text.
    pub fn text(&self) -> String {
        self.surface.text_content()
    }

    /// Route a host event to its handler. Events without a registered
    /// listener (everything, after [`destroy`](Editor::destroy)) are ignored.
    pub fn dispatch(&mut self, event: &mut EditorEvent) -> Result<(), EditorError> {
        let kind = event.kind();
        if !self.listeners.contains(&kind) {
            log::trace!("no listener for {kind:?}");
            return Ok(());
        }
        log::trace!("dispatch {kind:?}");

        match event {
            EditorEvent::KeyDown(key) => self.key_down(key),
            EditorEvent::KeyUp(key) => {
                self.key_up(key);
                Ok(())
            }
            EditorEvent::Focus => {
                self.focus = true;
                Ok(())
            }
            EditorEvent::Blur => {
                self.focus = false;
                Ok(())
            }
            EditorEvent::Paste(clipboard) => self.paste(clipboard),
            EditorEvent::Cut(clipboard) => self.cut(clipboard),
        }
    }

    fn key_down(&mut self, event: &mut KeyEvent) -> Result<(), EditorError> {
        if event.default_prevented() {
            return Ok(());
        }
        self.prev = self.surface.text_content();

        if self.options.preserve_indent {
            commands::handle_newline(&mut self.surface, &self.options, self.legacy, event)?;
        } else {
            commands::legacy_newline_fix(&mut self.surface, self.legacy, event)?;
        }
        if self.options.catch_tab {
            commands::handle_tab(&mut self.surface, &self.options, self.legacy, event)?;
        }
        if self.options.add_closing {
            commands::handle_self_closing(&mut self.surface, event)?;
        }
        if self.options.history {
            commands::handle_undo_redo(&mut self.surface, &mut self.history, event)?;
            if event.is_qualifying() && !self.recording {
                self.record_history()?;
                self.recording = true;
            }
        }
        if self.legacy && !event.is_copy() {
            let pos = position::save(&mut self.surface)?;
            position::restore(&mut self.surface, pos);
        }
        Ok(())
    }

    fn key_up(&mut self, event: &KeyEvent) {
        if event.default_prevented() || event.is_composing {
            return;
        }
        let now = self.options.host.now();
        let text = self.surface.text_content();
        if text != self.prev {
            self.highlight_timer.schedule(now, ());
        }
        self.history_timer.schedule(now, event.clone());
        self.notify(&text);
    }

    fn paste(&mut self, event: &mut ClipboardEvent) -> Result<(), EditorError> {
        self.record_history()?;
        commands::handle_paste(&mut self.surface, self.highlighter.as_mut(), event)?;
        self.record_history()?;
        self.notify_current();
        Ok(())
    }

    fn cut(&mut self, event: &mut ClipboardEvent) -> Result<(), EditorError> {
        self.record_history()?;
        commands::handle_cut(&mut self.surface, self.highlighter.as_mut(), event)?;
        self.record_history()?;
        self.notify_current();
        Ok(())
    }

    fn debounced_highlight(&mut self, _: ()) {
        match position::save(&mut self.surface) {
            Ok(pos) => {
                self.highlighter.highlight(&mut self.surface, Some(pos));
                position::restore(&mut self.surface, pos);
            }
            Err(err) => log::warn!("skipping highlight pass: {err}"),
        }
    }

    fn debounced_history(&mut self, event: KeyEvent) {
        if !event.is_qualifying() {
            return;
        }
        if let Err(err) = self.record_history() {
            log::warn!("history commit failed: {err}");
        }
        self.recording = false;
    }

    /// Run every debounced action whose window has elapsed. Returns how many
    /// ran.
    pub fn run_due_timers(&mut self) -> usize {
        let now = self.options.host.now();
        let mut ran = 0;
        if let Some((action, arg)) = self.highlight_timer.take_due(now) {
            log::trace!("highlight timer fired");
            action(self, arg);
            ran += 1;
        }
        if let Some((action, arg)) = self.history_timer.take_due(now) {
            log::trace!("history timer fired");
            action(self, arg);
            ran += 1;
        }
        ran
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.highlight_timer.deadline(), self.history_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn update_options(&mut self, patch: OptionsPatch) {
        self.options.merge(patch);
        self.apply_spellcheck();
        log::debug!("options updated: {:?}", self.options);
    }

    /// Replace the content, highlight it and notify the update callback.
    pub fn update_code(&mut self, code: &str) {
        self.set_code(code);
        self.notify(code);
    }

    /// Replace the content and highlight it without notifying.
    pub fn set_code(&mut self, code: &str) {
        self.surface.set_text_content(code);
        self.highlighter.highlight(&mut self.surface, None);
    }

    /// Register the callback invoked with the full text after every change,
    /// replacing any previous one.
    pub fn on_update(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_update = Some(Box::new(callback));
    }

    pub fn save(&mut self) -> Result<Position, EditorError> {
        position::save(&mut self.surface)
    }

    pub fn restore(&mut self, pos: Position) {
        position::restore(&mut self.surface, pos);
    }

    /// Checkpoint the current markup and caret. Does nothing without focus.
    pub fn record_history(&mut self) -> Result<(), EditorError> {
        if !self.focus {
            return Ok(());
        }
        let html = self.surface.inner_html();
        let pos = position::save(&mut self.surface)?;
        if !self.history.record(html, pos) {
            log::trace!("history unchanged, snapshot skipped");
        }
        Ok(())
    }

    /// Unregister every listener and drop pending timers.
    pub fn destroy(&mut self) {
        self.listeners.clear();
        self.highlight_timer.cancel();
        self.history_timer.cancel();
        log::debug!("editor destroyed");
    }

    fn apply_spellcheck(&mut self) {
        let root = self.surface.root();
        let value = if self.options.spellcheck { "true" } else { "false" };
        self.surface.set_attribute(root, "spellcheck", value);
    }

    fn notify_current(&mut self) {
        let text = self.surface.text_content();
        self.notify(&text);
    }

    fn notify(&mut self, text: &str) {
        if let Some(callback) = self.on_update.as_mut() {
            callback(text);
        }
    }
}
