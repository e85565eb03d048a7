pub mod dom;
pub mod editing;

// Re-export key types for easier usage
pub use dom::{MarkupError, NodeId, Point, Selection, StyledRun, Surface};
pub use editing::{
    ClipboardEvent, Direction, Editor, EditorError, EditorEvent, Highlighter, Host, Key, KeyEvent,
    ManualHost, Modifiers, Options, OptionsPatch, Position, SystemHost,
};
