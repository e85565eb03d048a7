use std::cell::RefCell;
use std::rc::Rc;

use inkjar_engine::editing::{HISTORY_DELAY, MAX_HISTORY};
use inkjar_engine::{
    ClipboardEvent, Direction, Editor, EditorEvent, Host, Key, KeyEvent, ManualHost, Modifiers,
    OptionsPatch, Position, Surface,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Rebuilds the whole tree on every pass, wrapping brackets in spans.
fn highlight_brackets(surface: &mut Surface, _pos: Option<Position>) {
    let mut html = String::new();
    for c in surface.text_content().chars() {
        if "(){}[]".contains(c) {
            html.push_str(&format!(r#"<span class="punct">{c}</span>"#));
        } else {
            html.push_str(&html_escape::encode_text(&c.to_string()));
        }
    }
    surface
        .set_inner_html(&html)
        .expect("highlighter emits valid markup");
}

struct Harness {
    host: Rc<ManualHost>,
    editor: Editor,
    highlighted: Rc<RefCell<Vec<String>>>,
}

impl Harness {
    fn new(text: &str, patch: OptionsPatch) -> Self {
        Self::with_host(ManualHost::new(), text, patch)
    }

    fn with_host(host: ManualHost, text: &str, patch: OptionsPatch) -> Self {
        let host = Rc::new(host);
        let highlighted = Rc::new(RefCell::new(Vec::new()));
        let inputs = highlighted.clone();
        let shared: Rc<dyn Host> = host.clone();
        let mut editor = Editor::new(
            Surface::new(),
            move |surface: &mut Surface, pos: Option<Position>| {
                inputs.borrow_mut().push(surface.text_content());
                highlight_brackets(surface, pos);
            },
            OptionsPatch {
                host: Some(shared),
                ..patch
            },
        );
        editor.dispatch(&mut EditorEvent::Focus).unwrap();
        editor.set_code(text);
        editor.restore(Position::caret(text.chars().count()));
        Self {
            host,
            editor,
            highlighted,
        }
    }

    /// Keydown, the host default action if nobody prevented it, keyup.
    fn press(&mut self, event: KeyEvent) {
        let mut down = EditorEvent::KeyDown(event.clone());
        self.editor.dispatch(&mut down).unwrap();
        if let EditorEvent::KeyDown(handled) = &down {
            self.editor.surface_mut().apply_default_key(handled);
        }
        self.editor
            .dispatch(&mut EditorEvent::KeyUp(event))
            .unwrap();
    }

    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyEvent::char(c));
        }
    }

    fn undo(&mut self) {
        self.press(KeyEvent::with_modifiers(Key::Character('z'), Modifiers::CTRL));
    }

    fn redo(&mut self) {
        self.press(KeyEvent::with_modifiers(
            Key::Character('z'),
            Modifiers::CTRL_SHIFT,
        ));
    }

    /// Let every debounce window elapse.
    fn settle(&mut self) {
        self.host.advance(HISTORY_DELAY);
        self.editor.run_due_timers();
    }

    fn text(&self) -> String {
        self.editor.to_string()
    }

    fn selection(&self) -> (usize, usize) {
        self.editor.surface().selection_offsets().unwrap()
    }
}

#[rstest]
#[case(0, 0)]
#[case(3, 3)]
#[case(2, 9)]
#[case(9, 2)]
#[case(0, 11)]
#[case(11, 11)]
fn test_restore_of_save_keeps_selection(#[case] anchor: usize, #[case] focus: usize) {
    let mut harness = Harness::new("hello world", OptionsPatch::default());
    let surface = harness.editor.surface_mut();
    let (a, f) = (surface.point_at(anchor), surface.point_at(focus));
    surface.set_selection(a, f);
    let before = harness.selection();

    let pos = harness.editor.save().unwrap();
    harness.editor.restore(pos);
    assert_eq!(harness.selection(), before);
    assert_eq!(before, (anchor, focus));
}

#[test]
fn test_selection_survives_debounced_rebuild() {
    let mut harness = Harness::new("f(a[0])", OptionsPatch::default());
    harness.type_text("x");
    let passes = harness.highlighted.borrow().len();
    harness.editor.restore(Position::new(5, 2, Direction::Backward));

    harness.settle();
    assert_eq!(harness.highlighted.borrow().len(), passes + 1);
    assert_eq!(harness.selection(), (5, 2));
}

#[test]
fn test_update_code_twice_is_idempotent() {
    let mut harness = Harness::new("", OptionsPatch::default());
    harness.editor.update_code("let v = [1, 2];");
    let first_html = harness.editor.surface().inner_html();
    harness.editor.update_code("let v = [1, 2];");

    assert_eq!(harness.text(), "let v = [1, 2];");
    assert_eq!(harness.editor.surface().inner_html(), first_html);
    let inputs = harness.highlighted.borrow();
    let last_two = &inputs[inputs.len() - 2..];
    assert_eq!(last_two[0], last_two[1]);
}

#[test]
fn test_history_keeps_the_newest_records_only() {
    let mut harness = Harness::new("", OptionsPatch::default());
    let edits = MAX_HISTORY + 50;
    for _ in 0..edits {
        harness.press(KeyEvent::char('a'));
        harness.settle();
    }
    assert_eq!(harness.editor.history().len(), MAX_HISTORY);

    for _ in 0..MAX_HISTORY {
        harness.undo();
    }
    // Buffer states run from 0 to `edits` chars; the oldest retained one
    // holds `edits + 1 - MAX_HISTORY` chars.
    assert_eq!(harness.text(), "a".repeat(edits + 1 - MAX_HISTORY));
    assert_eq!(harness.editor.history().at(), Some(0));
}

#[test]
fn test_new_edit_after_undo_drops_redo() {
    let mut harness = Harness::new("", OptionsPatch::default());
    for c in ["a", "b", "c"] {
        harness.type_text(c);
        harness.settle();
    }
    harness.undo();
    harness.undo();
    assert_eq!(harness.text(), "a");

    harness.type_text("x");
    harness.settle();
    assert_eq!(harness.text(), "ax");

    harness.redo();
    assert_eq!(harness.text(), "ax");
    assert!(!harness.editor.history().can_redo());
}

#[test]
fn test_undo_then_redo_restores_caret() {
    let mut harness = Harness::new("f()", OptionsPatch::default());
    harness.type_text("x");
    harness.settle();
    assert_eq!(harness.text(), "f()x");

    harness.undo();
    assert_eq!((harness.text(), harness.selection()), ("f()".to_string(), (3, 3)));
    harness.redo();
    assert_eq!((harness.text(), harness.selection()), ("f()x".to_string(), (4, 4)));
}

#[test]
fn test_brackets_pair_and_type_through() {
    let mut harness = Harness::new("", OptionsPatch::default());
    harness.type_text("(");
    assert_eq!(harness.text(), "()");
    assert_eq!(harness.selection(), (1, 1));

    harness.type_text(")");
    assert_eq!(harness.text(), "()");
    assert_eq!(harness.selection(), (2, 2));
}

#[test]
fn test_quote_after_backslash_is_not_paired() {
    let mut harness = Harness::new("\\", OptionsPatch::default());
    harness.type_text("'");
    assert_eq!(harness.text(), "\\'");
    assert_eq!(harness.selection(), (2, 2));
}

#[rstest]
#[case("if (x) {", 8, "if (x) {\n\t", 10)]
#[case("if (x) {}", 8, "if (x) {\n\t\n}", 10)]
#[case("\tcall(x)", 8, "\tcall(x)\n\t", 10)]
fn test_enter_indents(
    #[case] text: &str,
    #[case] caret: usize,
    #[case] expected: &str,
    #[case] expected_caret: usize,
) {
    let mut harness = Harness::new(text, OptionsPatch::default());
    harness.editor.restore(Position::caret(caret));
    harness.press(KeyEvent::new(Key::Enter));
    assert_eq!(harness.text(), expected);
    assert_eq!(harness.selection(), (expected_caret, expected_caret));

    harness.settle();
    assert_eq!(harness.text(), expected);
    assert_eq!(harness.selection(), (expected_caret, expected_caret));
}

#[test]
fn test_tab_indents_selected_lines() {
    let mut harness = Harness::new(
        "foo\nbar",
        OptionsPatch {
            tab: Some("  ".to_string()),
            ..Default::default()
        },
    );
    harness.editor.restore(Position::new(0, 7, Direction::Forward));
    harness.press(KeyEvent::new(Key::Tab));
    assert_eq!(harness.text(), "  foo\n  bar");
    assert_eq!(harness.selection(), (0, 11));

    harness.press(KeyEvent::with_modifiers(Key::Tab, Modifiers::SHIFT));
    assert_eq!(harness.text(), "foo\nbar");
    assert_eq!(harness.selection(), (0, 7));
}

#[test]
fn test_legacy_host_skips_block_indent() {
    let mut harness = Harness::with_host(ManualHost::legacy(), "foo\nbar", OptionsPatch::default());
    harness.editor.restore(Position::new(0, 7, Direction::Forward));
    harness.press(KeyEvent::new(Key::Tab));
    assert_eq!(harness.text(), "\t");
}

#[test]
fn test_legacy_enter_at_end_leaves_room_for_caret() {
    let mut harness = Harness::with_host(ManualHost::legacy(), "x", OptionsPatch::default());
    harness.press(KeyEvent::new(Key::Enter));
    assert_eq!(harness.text(), "x\n ");
    assert_eq!(harness.selection(), (2, 2));
}

#[test]
fn test_disabled_features_fall_through_to_host() {
    let mut harness = Harness::new(
        "{",
        OptionsPatch {
            preserve_indent: Some(false),
            add_closing: Some(false),
            catch_tab: Some(false),
            ..Default::default()
        },
    );
    harness.type_text("(");
    harness.press(KeyEvent::new(Key::Enter));
    assert_eq!(harness.text(), "{(\n");
}

#[test]
fn test_paste_is_literal_and_undoes_in_one_step() {
    let mut harness = Harness::new("ab", OptionsPatch::default());
    harness.editor.restore(Position::caret(1));
    let mut paste = EditorEvent::Paste(ClipboardEvent::paste("<b>x</b>\r\ny"));
    harness.editor.dispatch(&mut paste).unwrap();

    assert_eq!(harness.text(), "a<b>x</b>\nyb");
    assert_eq!(harness.selection(), (11, 11));
    assert!(!harness.editor.surface().inner_html().contains("<b>"));

    harness.undo();
    assert_eq!(harness.text(), "ab");
    assert_eq!(harness.selection(), (1, 1));
}

#[test]
fn test_cut_fills_clipboard_and_notifies() {
    let mut harness = Harness::new("(abc)", OptionsPatch::default());
    let updates = Rc::new(RefCell::new(Vec::new()));
    let sink = updates.clone();
    harness
        .editor
        .on_update(move |text| sink.borrow_mut().push(text.to_string()));

    harness.editor.restore(Position::new(4, 1, Direction::Backward));
    let mut cut = EditorEvent::Cut(ClipboardEvent::cut());
    harness.editor.dispatch(&mut cut).unwrap();

    let EditorEvent::Cut(clipboard) = &cut else {
        unreachable!()
    };
    assert_eq!(clipboard.data(), "abc");
    assert_eq!(harness.text(), "()");
    assert_eq!(harness.selection(), (1, 1));
    assert_eq!(*updates.borrow(), vec!["()".to_string()]);
}

#[test]
fn test_keyup_reports_every_change() {
    let mut harness = Harness::new("", OptionsPatch::default());
    let updates = Rc::new(RefCell::new(Vec::new()));
    let sink = updates.clone();
    harness
        .editor
        .on_update(move |text| sink.borrow_mut().push(text.to_string()));

    harness.type_text("hi");
    assert_eq!(*updates.borrow(), vec!["h".to_string(), "hi".to_string()]);
}

#[test]
fn test_destroyed_editor_ignores_events_and_timers() {
    let mut harness = Harness::new("", OptionsPatch::default());
    harness.type_text("a");
    let passes = harness.highlighted.borrow().len();

    harness.editor.destroy();
    harness.settle();
    assert_eq!(harness.highlighted.borrow().len(), passes);

    harness.type_text("(");
    // The host still inserts the character; the editor no longer pairs it.
    assert_eq!(harness.text(), "a(");
}
