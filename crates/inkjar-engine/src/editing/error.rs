use crate::dom::MarkupError;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Selection has no anchor or focus node")]
    NoSelection,
    #[error("Invalid markup: {0}")]
    Markup(#[from] MarkupError),
}
