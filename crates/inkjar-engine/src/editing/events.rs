//! Input events the editor listens to.

/// Logical key of a keyboard event, independent of layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Character(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Shift,
    Control,
    Alt,
    Meta,
    Other(String),
}

impl Key {
    /// A key that only modifies others when pressed on its own.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::Meta)
    }

    pub fn is_arrow(&self) -> bool {
        matches!(
            self,
            Key::ArrowLeft | Key::ArrowRight | Key::ArrowUp | Key::ArrowDown
        )
    }

    /// The character for a character key, uppercased for shortcut matching.
    fn shortcut_letter(&self) -> Option<char> {
        match self {
            Key::Character(c) => Some(c.to_ascii_uppercase()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        ..Self::NONE
    };
    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A keydown or keyup event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Part of an IME composition still in progress.
    pub is_composing: bool,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::NONE)
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            is_composing: false,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(Key::Character(c))
    }

    pub fn composing(mut self) -> Self {
        self.is_composing = true;
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Ctrl/Cmd+Z.
    pub fn is_undo(&self) -> bool {
        self.modifiers.is_command() && !self.modifiers.shift && self.key.shortcut_letter() == Some('Z')
    }

    /// Ctrl/Cmd+Shift+Z.
    pub fn is_redo(&self) -> bool {
        self.modifiers.is_command() && self.modifiers.shift && self.key.shortcut_letter() == Some('Z')
    }

    /// Ctrl/Cmd+C.
    pub fn is_copy(&self) -> bool {
        self.modifiers.is_command() && self.key.shortcut_letter() == Some('C')
    }

    /// Whether this keystroke should produce a history checkpoint: anything
    /// but lone modifiers, arrow navigation and the undo/redo shortcuts.
    pub fn is_qualifying(&self) -> bool {
        !self.is_undo() && !self.is_redo() && !self.key.is_modifier() && !self.key.is_arrow()
    }
}

/// A paste or cut event carrying the plain-text clipboard payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardEvent {
    data: String,
    default_prevented: bool,
}

impl ClipboardEvent {
    /// A paste event carrying `text`.
    pub fn paste(text: impl Into<String>) -> Self {
        Self {
            data: text.into(),
            default_prevented: false,
        }
    }

    /// A cut event with an empty clipboard slot for the editor to fill.
    pub fn cut() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Every event the editor registers a listener for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    Focus,
    Blur,
    Paste(ClipboardEvent),
    Cut(ClipboardEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyDown,
    KeyUp,
    Focus,
    Blur,
    Paste,
    Cut,
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::KeyDown(_) => EventKind::KeyDown,
            EditorEvent::KeyUp(_) => EventKind::KeyUp,
            EditorEvent::Focus => EventKind::Focus,
            EditorEvent::Blur => EventKind::Blur,
            EditorEvent::Paste(_) => EventKind::Paste,
            EditorEvent::Cut(_) => EventKind::Cut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(KeyEvent::with_modifiers(Key::Character('z'), Modifiers::CTRL), true, false)]
    #[case(KeyEvent::with_modifiers(Key::Character('Z'), Modifiers::META), true, false)]
    #[case(KeyEvent::with_modifiers(Key::Character('Z'), Modifiers::CTRL_SHIFT), false, true)]
    #[case(KeyEvent::char('z'), false, false)]
    #[case(KeyEvent::with_modifiers(Key::Character('y'), Modifiers::CTRL), false, false)]
    fn test_undo_redo_shortcuts(#[case] event: KeyEvent, #[case] undo: bool, #[case] redo: bool) {
        assert_eq!(event.is_undo(), undo);
        assert_eq!(event.is_redo(), redo);
    }

    #[rstest]
    #[case(KeyEvent::char('a'), true)]
    #[case(KeyEvent::new(Key::Enter), true)]
    #[case(KeyEvent::new(Key::Backspace), true)]
    #[case(KeyEvent::new(Key::Shift), false)]
    #[case(KeyEvent::new(Key::Meta), false)]
    #[case(KeyEvent::new(Key::ArrowDown), false)]
    #[case(KeyEvent::with_modifiers(Key::Character('z'), Modifiers::CTRL), false)]
    #[case(KeyEvent::with_modifiers(Key::Character('z'), Modifiers::CTRL_SHIFT), false)]
    fn test_qualifying_keystrokes(#[case] event: KeyEvent, #[case] expected: bool) {
        assert_eq!(event.is_qualifying(), expected);
    }

    #[test]
    fn test_copy_shortcut() {
        assert!(KeyEvent::with_modifiers(Key::Character('c'), Modifiers::CTRL).is_copy());
        assert!(!KeyEvent::char('c').is_copy());
    }
}
