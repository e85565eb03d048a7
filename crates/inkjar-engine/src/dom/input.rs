//! What the host does with a key press nobody intercepted.
//!
//! Front-ends and tests call [`Surface::apply_default_key`] after the editor
//! has seen the keydown, mirroring a browser's native editing behaviour for
//! the keys the editor leaves alone.

use super::{Surface, line_bounds};
use crate::editing::events::{Key, KeyEvent};

impl Surface {
    /// Apply the native behaviour for `event` unless its default was
    /// prevented. Does nothing without a selection.
    pub fn apply_default_key(&mut self, event: &KeyEvent) {
        if event.default_prevented() || event.is_composing {
            return;
        }
        let Some((anchor, focus)) = self.selection_offsets() else {
            return;
        };
        let extend = event.modifiers.shift;
        let len = self.text_len(self.root);

        match &event.key {
            Key::Character(c) if !event.modifiers.is_command() && !event.modifiers.alt => {
                let mut buf = [0u8; 4];
                self.insert_text(c.encode_utf8(&mut buf));
            }
            Key::Enter => self.insert_text("\n"),
            Key::Backspace => {
                if !self.delete_selection() && focus > 0 {
                    let caret = self.delete_range(focus - 1..focus);
                    self.collapse(caret);
                }
            }
            Key::Delete => {
                if !self.delete_selection() && focus < len {
                    let caret = self.delete_range(focus..focus + 1);
                    self.collapse(caret);
                }
            }
            Key::ArrowLeft => {
                let target = if !extend && anchor != focus {
                    anchor.min(focus)
                } else {
                    focus.saturating_sub(1)
                };
                self.move_focus(anchor, target, extend);
            }
            Key::ArrowRight => {
                let target = if !extend && anchor != focus {
                    anchor.max(focus)
                } else {
                    (focus + 1).min(len)
                };
                self.move_focus(anchor, target, extend);
            }
            Key::ArrowUp | Key::ArrowDown => {
                let text = self.text_content();
                let line = line_bounds(&text, focus);
                let column = focus - line.start;
                let target = if event.key == Key::ArrowUp {
                    if line.start == 0 {
                        0
                    } else {
                        let above = line_bounds(&text, line.start - 1);
                        above.start + column.min(above.len())
                    }
                } else if line.end >= len {
                    len
                } else {
                    let below = line_bounds(&text, line.end + 1);
                    below.start + column.min(below.len())
                };
                self.move_focus(anchor, target, extend);
            }
            Key::Home | Key::End => {
                let line = line_bounds(&self.text_content(), focus);
                let target = if event.key == Key::Home {
                    line.start
                } else {
                    line.end
                };
                self.move_focus(anchor, target, extend);
            }
            _ => {}
        }
    }

    fn move_focus(&mut self, anchor: usize, target: usize, extend: bool) {
        let focus = self.point_at(target);
        let anchor = if extend { self.point_at(anchor) } else { focus };
        self.set_selection(anchor, focus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Point;
    use crate::editing::events::Modifiers;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn surface_at(text: &str, offset: usize) -> Surface {
        let mut surface = Surface::with_text(text);
        let caret = surface.point_at(offset);
        surface.collapse(caret);
        surface
    }

    #[test]
    fn test_typing_inserts_at_caret() {
        let mut surface = surface_at("ac", 1);
        surface.apply_default_key(&KeyEvent::char('b'));
        assert_eq!(surface.text_content(), "abc");
        assert_eq!(surface.selection_offsets(), Some((2, 2)));
    }

    #[test]
    fn test_prevented_event_is_ignored() {
        let mut surface = surface_at("ac", 1);
        let mut event = KeyEvent::char('b');
        event.prevent_default();
        surface.apply_default_key(&event);
        assert_eq!(surface.text_content(), "ac");
    }

    #[test]
    fn test_command_chords_do_not_insert() {
        let mut surface = surface_at("ac", 1);
        surface.apply_default_key(&KeyEvent::with_modifiers(
            Key::Character('z'),
            Modifiers::CTRL,
        ));
        assert_eq!(surface.text_content(), "ac");
    }

    #[rstest]
    #[case(Key::Backspace, 2, "ac", 1)]
    #[case(Key::Backspace, 0, "abc", 0)]
    #[case(Key::Delete, 1, "ac", 1)]
    #[case(Key::Delete, 3, "abc", 3)]
    fn test_deletion_keys(
        #[case] key: Key,
        #[case] caret: usize,
        #[case] expected: &str,
        #[case] expected_caret: usize,
    ) {
        let mut surface = surface_at("abc", caret);
        surface.apply_default_key(&KeyEvent::new(key));
        assert_eq!(surface.text_content(), expected);
        assert_eq!(
            surface.selection_offsets(),
            Some((expected_caret, expected_caret))
        );
    }

    #[rstest]
    #[case(Key::ArrowUp, 6, 1)]
    #[case(Key::ArrowDown, 1, 6)]
    #[case(Key::ArrowDown, 3, 8)]
    #[case(Key::ArrowUp, 1, 0)]
    #[case(Key::Home, 7, 5)]
    #[case(Key::End, 5, 8)]
    #[case(Key::ArrowLeft, 0, 0)]
    #[case(Key::ArrowRight, 4, 5)]
    fn test_caret_movement(#[case] key: Key, #[case] from: usize, #[case] to: usize) {
        // Lines: "abcd" (0..4), "xyz" (5..8), "" (9..9)
        let mut surface = surface_at("abcd\nxyz\n", from);
        surface.apply_default_key(&KeyEvent::new(key));
        assert_eq!(surface.selection_offsets(), Some((to, to)));
    }

    #[test]
    fn test_shift_arrow_extends_from_anchor() {
        let mut surface = surface_at("abcd", 1);
        let shift_right = KeyEvent::with_modifiers(Key::ArrowRight, Modifiers::SHIFT);
        surface.apply_default_key(&shift_right);
        surface.apply_default_key(&shift_right);
        assert_eq!(surface.selection_offsets(), Some((1, 3)));
        assert_eq!(surface.selected_text(), "bc");
    }

    #[test]
    fn test_plain_arrow_collapses_range() {
        let mut surface = Surface::with_text("abcd");
        let leaf = surface.leaves()[0];
        surface.set_selection(Point::new(leaf, 3), Point::new(leaf, 1));
        surface.apply_default_key(&KeyEvent::new(Key::ArrowRight));
        assert_eq!(surface.selection_offsets(), Some((3, 3)));
    }
}
