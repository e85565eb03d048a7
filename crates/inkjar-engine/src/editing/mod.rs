/*!
 * # Editing Core
 *
 * Everything between a host event and a change to the [`Surface`](crate::dom::Surface).
 *
 * ## Layers
 *
 * - **`position`**: `save`/`restore` between the live selection and linear
 *   offsets into the text. Highlighting rebuilds the tree on every pass, so
 *   offsets are the only caret state that survives it.
 * - **`history`**: bounded list of markup + caret snapshots with an undo cursor.
 * - **`commands`**: Enter, Tab, bracket pairing, undo/redo keys, paste and cut,
 *   all funnelled through the escaping `insert` primitive.
 * - **`editor`**: the [`Editor`] instance that owns the surface, wires events to
 *   commands and runs the debounced highlight and history passes.
 *
 * ## Usage Pattern
 *
 * ```rust
 * use inkjar_engine::dom::Surface;
 * use inkjar_engine::editing::*;
 *
 * let mut editor = Editor::new(Surface::new(), plain_text, OptionsPatch::default());
 * editor.dispatch(&mut EditorEvent::Focus).unwrap();
 * editor.update_code("if (x) {}");
 * editor.restore(Position::caret(8));
 *
 * let mut enter = EditorEvent::KeyDown(KeyEvent::new(Key::Enter));
 * editor.dispatch(&mut enter).unwrap();
 * assert_eq!(editor.to_string(), "if (x) {\n\t\n}");
 * ```
 */

pub mod commands;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod events;
pub mod highlight;
pub mod history;
pub mod host;
pub mod options;
pub mod position;

pub use debounce::Debounce;
pub use editor::{Editor, HIGHLIGHT_DELAY, HISTORY_DELAY};
pub use error::EditorError;
pub use events::{ClipboardEvent, EditorEvent, EventKind, Key, KeyEvent, Modifiers};
pub use highlight::{Highlighter, plain_text};
pub use history::{History, HistoryRecord, MAX_HISTORY};
pub use host::{Host, ManualHost, SystemHost};
pub use options::{Options, OptionsPatch};
pub use position::{Direction, Position};
