use crate::dom::Surface;
use crate::editing::Position;

/// Rewrites the surface's markup from its text.
///
/// Called with the saved caret on debounced passes and with `None` when the
/// editor highlights synchronously (paste, cut, content replacement). The
/// editor saves and restores the caret around every call, so implementations
/// are free to rebuild the whole tree.
pub trait Highlighter {
    fn highlight(&mut self, surface: &mut Surface, pos: Option<Position>);
}

impl<F> Highlighter for F
where
    F: FnMut(&mut Surface, Option<Position>),
{
    fn highlight(&mut self, surface: &mut Surface, pos: Option<Position>) {
        self(surface, pos)
    }
}

/// Leaves the markup untouched.
pub fn plain_text(_surface: &mut Surface, _pos: Option<Position>) {}
