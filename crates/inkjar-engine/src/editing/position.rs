//! Caret mapping between the surface tree and the logical text buffer.
//!
//! Highlighting throws the whole tree away on every pass, so no tree point
//! survives it. Linear offsets do. [`save`] turns the live selection into a
//! [`Position`] before a mutation and [`restore`] turns it back into tree
//! points afterwards.
//!
//! The walking logic is kept in [`measure`] and [`locate`], which only see a
//! document-order sequence of nodes and their text lengths.

use crate::dom::{NodeId, Point, Surface};
use crate::editing::EditorError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Anchor at or before focus (`->`).
    #[default]
    Forward,
    /// Anchor after focus (`<-`).
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "->",
            Direction::Backward => "<-",
        }
    }
}

/// A selection as linear offsets: `start` is the anchor, `end` the focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub start: usize,
    pub end: usize,
    pub dir: Direction,
}

impl Position {
    pub fn new(start: usize, end: usize, dir: Direction) -> Self {
        Self { start, end, dir }
    }

    /// Collapsed caret.
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset, Direction::Forward)
    }

    /// The ordered range `lo..hi` selected in `dir`.
    pub fn spanning(lo: usize, hi: usize, dir: Direction) -> Self {
        match dir {
            Direction::Forward => Self::new(lo, hi, dir),
            Direction::Backward => Self::new(hi, lo, dir),
        }
    }

    pub fn min(&self) -> usize {
        self.start.min(self.end)
    }

    pub fn max(&self) -> usize {
        self.start.max(self.end)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Both ends moved by `delta`, stopping at zero.
    pub fn shifted(self, delta: isize) -> Self {
        Self {
            start: self.start.saturating_add_signed(delta),
            end: self.end.saturating_add_signed(delta),
            dir: self.dir,
        }
    }
}

/// One step of a document-order walk: a node and, for text leaves, its
/// length in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub node: NodeId,
    pub text_len: Option<usize>,
}

/// Measure the linear offsets of `anchor` and `focus`, both of which must
/// be text points, over a document-order walk.
pub fn measure(walk: impl IntoIterator<Item = Visit>, anchor: Point, focus: Point) -> Position {
    let mut start = 0;
    let mut end = 0;
    let mut dir = None;

    for visit in walk {
        let node = visit.node;
        if node == anchor.node && node == focus.node {
            start += anchor.offset;
            end += focus.offset;
            dir = Some(if anchor.offset <= focus.offset {
                Direction::Forward
            } else {
                Direction::Backward
            });
            break;
        }
        if node == anchor.node {
            start += anchor.offset;
            if dir.is_some() {
                break;
            }
            dir = Some(Direction::Forward);
        } else if node == focus.node {
            end += focus.offset;
            if dir.is_some() {
                break;
            }
            dir = Some(Direction::Backward);
        }
        if let Some(len) = visit.text_len {
            if dir != Some(Direction::Forward) {
                start += len;
            }
            if dir != Some(Direction::Backward) {
                end += len;
            }
        }
    }

    Position::new(start, end, dir.unwrap_or_default())
}

/// Find the leaves holding offsets `start <= end`. A leaf holds an offset
/// when the offset falls strictly before its end, so a boundary between two
/// leaves resolves to the start of the second. Offsets past the last leaf
/// resolve to `None`.
pub fn locate(
    leaves: impl IntoIterator<Item = (NodeId, usize)>,
    start: usize,
    end: usize,
) -> (Option<Point>, Option<Point>) {
    let mut current = 0;
    let mut start_point = None;

    for (node, len) in leaves {
        if current + len > start {
            if start_point.is_none() {
                start_point = Some(Point::new(node, start - current));
            }
            if current + len > end {
                return (start_point, Some(Point::new(node, end - current)));
            }
        }
        current += len;
    }

    (start_point, None)
}

/// Capture the live selection as a [`Position`].
///
/// Element boundary points are first turned into text points by splicing an
/// empty text node in at the point; the surface is normalized afterwards,
/// which drops those nodes again.
pub fn save(surface: &mut Surface) -> Result<Position, EditorError> {
    let selection = surface.selection().ok_or(EditorError::NoSelection)?;
    let root = surface.root();

    if selection.anchor.node == root && selection.focus.node == root {
        let len = surface.text_len(root);
        let edge = |offset: usize| if offset > 0 && len > 0 { len } else { 0 };
        let dir = if selection.focus.offset >= selection.anchor.offset {
            Direction::Forward
        } else {
            Direction::Backward
        };
        return Ok(Position::new(
            edge(selection.anchor.offset),
            edge(selection.focus.offset),
            dir,
        ));
    }

    let anchor = text_point(surface, selection.anchor);
    let focus = if selection.focus == selection.anchor {
        anchor
    } else {
        // Splicing at the anchor may have shifted the focus.
        let live = surface.selection().map_or(selection.focus, |s| s.focus);
        text_point(surface, live)
    };

    let walk: Vec<Visit> = surface
        .descendants(root)
        .into_iter()
        .map(|node| Visit {
            node,
            text_len: surface.text(node).map(|t| t.chars().count()),
        })
        .collect();
    let pos = measure(walk, anchor, focus);

    surface.normalize();
    log::trace!("saved {} {} {}", pos.start, pos.dir.as_str(), pos.end);
    Ok(pos)
}

/// Put the live selection back at `pos`.
///
/// Never fails: offsets past the end of the buffer land after the root's
/// last child, and points inside a `contenteditable="false"` element are
/// moved onto a fresh empty text node just before it.
pub fn restore(surface: &mut Surface, pos: Position) {
    let root = surface.root();
    let (lo, hi) = (pos.min(), pos.max());

    let leaves: Vec<(NodeId, usize)> = surface
        .leaves()
        .into_iter()
        .map(|leaf| (leaf, surface.text_len(leaf)))
        .collect();
    let (lo_point, hi_point) = locate(leaves, lo, hi);
    let end_of_surface = Point::new(root, surface.child_count(root));
    let lo_point = lo_point.unwrap_or(end_of_surface);
    let hi_point = hi_point.unwrap_or(end_of_surface);

    let (anchor, focus) = if pos.start <= pos.end {
        (lo_point, hi_point)
    } else {
        (hi_point, lo_point)
    };
    let anchor = editable_point(surface, anchor);
    let focus = editable_point(surface, focus);

    surface.set_selection(anchor, focus);
    surface.normalize();
    log::trace!("restored {} {} {}", pos.start, pos.dir.as_str(), pos.end);
}

fn text_point(surface: &mut Surface, point: Point) -> Point {
    if surface.is_text(point.node) {
        return point;
    }
    let node = surface.create_text("");
    let reference = surface.children(point.node).get(point.offset).copied();
    surface.insert_before(point.node, node, reference);
    Point::new(node, 0)
}

fn editable_point(surface: &mut Surface, point: Point) -> Point {
    let Some(locked) = surface.uneditable_ancestor(point.node) else {
        return point;
    };
    let Some(parent) = surface.parent(locked) else {
        return point;
    };
    let node = surface.create_text("");
    surface.insert_before(parent, node, Some(locked));
    Point::new(node, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const HIGHLIGHTED: &str =
        r#"<span class="kw">fn</span> <span class="fn">main</span>() <span class="p">{<i>}</i></span>"#;

    fn highlighted() -> Surface {
        let mut surface = Surface::new();
        surface.set_inner_html(HIGHLIGHTED).unwrap();
        surface
    }

    fn select(surface: &mut Surface, anchor: usize, focus: usize) {
        let anchor = surface.point_at(anchor);
        let focus = surface.point_at(focus);
        surface.set_selection(anchor, focus);
    }

    #[test]
    fn test_save_without_selection_fails() {
        let mut surface = highlighted();
        select(&mut surface, 2, 5);
        surface.clear_selection();
        assert!(matches!(save(&mut surface), Err(EditorError::NoSelection)));
    }

    #[rstest]
    #[case(0, 0, Direction::Forward)]
    #[case(4, 4, Direction::Forward)]
    #[case(3, 7, Direction::Forward)]
    #[case(9, 1, Direction::Backward)]
    #[case(12, 12, Direction::Forward)]
    fn test_save_measures_text_points(
        #[case] anchor: usize,
        #[case] focus: usize,
        #[case] dir: Direction,
    ) {
        let mut surface = highlighted();
        select(&mut surface, anchor, focus);
        assert_eq!(save(&mut surface).unwrap(), Position::new(anchor, focus, dir));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(2, 2)]
    #[case(3, 9)]
    #[case(10, 1)]
    #[case(11, 11)]
    #[case(12, 12)]
    fn test_restore_then_save_round_trips(#[case] start: usize, #[case] end: usize) {
        let mut surface = highlighted();
        let dir = if start <= end {
            Direction::Forward
        } else {
            Direction::Backward
        };
        let pos = Position::new(start, end, dir);
        restore(&mut surface, pos);
        assert_eq!(save(&mut surface).unwrap(), pos);
        assert_eq!(surface.inner_html(), HIGHLIGHTED);
    }

    #[test]
    fn test_save_normalizes_element_points() {
        let mut surface = highlighted();
        let root = surface.root();
        // Between "fn" span and the following space.
        surface.set_selection(Point::new(root, 1), Point::new(root, 3));
        let pos = save(&mut surface).unwrap();
        assert_eq!(pos, Position::new(2, 7, Direction::Forward));
        assert_eq!(surface.inner_html(), HIGHLIGHTED);
    }

    #[test]
    fn test_save_collapsed_element_point() {
        let mut surface = highlighted();
        let root = surface.root();
        surface.collapse(Point::new(root, 2));
        let pos = save(&mut surface).unwrap();
        assert_eq!(pos, Position::caret(3));
        assert_eq!(surface.inner_html(), HIGHLIGHTED);
    }

    #[rstest]
    #[case(0, 0, 0, 0, Direction::Forward)]
    #[case(0, 5, 0, 12, Direction::Forward)]
    #[case(5, 0, 12, 0, Direction::Backward)]
    #[case(2, 2, 12, 12, Direction::Forward)]
    fn test_save_root_selection_is_edge_of_buffer(
        #[case] anchor: usize,
        #[case] focus: usize,
        #[case] start: usize,
        #[case] end: usize,
        #[case] dir: Direction,
    ) {
        let mut surface = highlighted();
        let root = surface.root();
        surface.set_selection(Point::new(root, anchor), Point::new(root, focus));
        assert_eq!(save(&mut surface).unwrap(), Position::new(start, end, dir));
    }

    #[test]
    fn test_save_root_selection_on_empty_surface() {
        let mut surface = Surface::new();
        let root = surface.root();
        surface.collapse(Point::new(root, 0));
        assert_eq!(save(&mut surface).unwrap(), Position::caret(0));
    }

    #[test]
    fn test_restore_boundary_resolves_into_next_leaf() {
        let mut surface = highlighted();
        restore(&mut surface, Position::caret(2));
        let focus = surface.selection().unwrap().focus;
        assert_eq!(surface.text(focus.node), Some(" "));
        assert_eq!(focus.offset, 0);
    }

    #[test]
    fn test_restore_past_end_falls_back_to_root() {
        let mut surface = highlighted();
        restore(&mut surface, Position::new(5, 500, Direction::Forward));
        let selection = surface.selection().unwrap();
        let root = surface.root();
        assert_eq!(selection.focus, Point::new(root, surface.child_count(root)));
        assert_eq!(surface.selection_offsets(), Some((5, 12)));
    }

    #[test]
    fn test_restore_keeps_direction() {
        let mut surface = highlighted();
        restore(&mut surface, Position::new(8, 3, Direction::Backward));
        assert_eq!(surface.selection_offsets(), Some((8, 3)));
    }

    #[test]
    fn test_restore_steps_out_of_uneditable_element() {
        let mut surface = Surface::new();
        surface
            .set_inner_html(r#"ab<span contenteditable="false">XY</span>cd"#)
            .unwrap();
        restore(&mut surface, Position::caret(3));
        let selection = surface.selection().unwrap();
        assert!(surface.uneditable_ancestor(selection.focus.node).is_none());
        assert_eq!(surface.selection_offsets(), Some((2, 2)));
        assert_eq!(surface.text_content(), "abXYcd");
    }

    #[test]
    fn test_shifted_saturates_at_zero() {
        let pos = Position::new(3, 1, Direction::Backward).shifted(-2);
        assert_eq!(pos, Position::new(1, 0, Direction::Backward));
    }

    #[test]
    fn test_spanning_orders_by_direction() {
        assert_eq!(
            Position::spanning(2, 5, Direction::Backward),
            Position::new(5, 2, Direction::Backward)
        );
    }

    #[test]
    fn test_locate_is_pure_over_leaf_lengths() {
        let surface = highlighted();
        let leaves: Vec<(NodeId, usize)> = surface
            .leaves()
            .into_iter()
            .map(|leaf| (leaf, surface.text_len(leaf)))
            .collect();
        let (start, end) = locate(leaves.clone(), 3, 7);
        assert_eq!(start, Some(Point::new(leaves[2].0, 0)));
        assert_eq!(end, Some(Point::new(leaves[3].0, 0)));
        let (start, end) = locate(leaves.clone(), 11, 12);
        assert_eq!(start, Some(Point::new(leaves[5].0, 0)));
        assert_eq!(end, None);
        assert_eq!(locate(leaves, 12, 12), (None, None));
    }
}
