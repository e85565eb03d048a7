/*!
 * # Editable Surface
 *
 * A headless stand-in for a `contenteditable` element: an element tree whose
 * leaves are text runs, plus the live [`Selection`] the host would normally
 * own.
 *
 * ## Invariants
 *
 * - The concatenation of all text leaves in document order is the logical
 *   text buffer ([`Surface::text_content`]).
 * - The selection, when present, always points at live nodes. Structural
 *   mutation adjusts boundary points the way DOM live ranges are adjusted:
 *   removing a node that contains a point moves the point to
 *   `(parent, index)`, and inserting or removing a child shifts element
 *   offsets past that index.
 * - Text offsets count `char`s, never bytes.
 *
 * Markup (de)serialization lives in [`markup`]; host default key handling
 * lives in [`input`].
 */

use std::ops::Range;

use slotmap::{SlotMap, new_key_type};

mod input;
mod markup;

pub use markup::MarkupError;
use markup::MarkupNode;

new_key_type! { pub struct NodeId; }

/// A DOM-style boundary point: a char offset inside a text node, or a child
/// index inside an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub node: NodeId,
    pub offset: usize,
}

impl Point {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Live selection on a surface. `anchor` is where the selection started,
/// `focus` is where it is being extended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }
}

/// A text leaf together with the class of its closest styled ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub class: Option<String>,
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// The editable surface: root element, node arena and live selection.
#[derive(Debug, Clone)]
pub struct Surface {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    selection: Option<Selection>,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// Create an empty surface rooted at a `<div>`.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node {
            parent: None,
            kind: NodeKind::Element(Element {
                tag: "div".to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
            }),
        });
        Self {
            nodes,
            root,
            selection: None,
        }
    }

    /// Create a surface holding a single text run.
    pub fn with_text(text: &str) -> Self {
        let mut surface = Self::new();
        surface.set_text_content(text);
        surface
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(id).map(|n| &n.kind),
            Some(NodeKind::Text(_))
        )
    }

    /// Text of a text node; `None` for elements and dead ids.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => Some(&element.tag),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of an element. Text nodes have none.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => &element.children,
            _ => &[],
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => element
                .attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeKind::Element(element)) = self.nodes.get_mut(id).map(|n| &mut n.kind) {
            match element
                .attributes
                .iter_mut()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
            {
                Some((_, existing)) => *existing = value.to_string(),
                None => element
                    .attributes
                    .push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.nodes.insert(Node {
            parent: None,
            kind: NodeKind::Text(text.into()),
        })
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.insert(Node {
            parent: None,
            kind: NodeKind::Element(Element {
                tag: tag.to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
            }),
        })
    }

    /// Insert `node` into `parent` before `reference`, or append when
    /// `reference` is `None` or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        let index = reference
            .and_then(|r| self.children(parent).iter().position(|&c| c == r))
            .unwrap_or_else(|| self.child_count(parent));
        self.insert_child(parent, index, node);
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) {
        let index = self.child_count(parent);
        self.insert_child(parent, index, node);
    }

    /// Detach `node` and free its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root || !self.contains(node) {
            return;
        }
        self.detach(node);
        for id in self.subtree(node) {
            self.nodes.remove(id);
        }
    }

    /// Replace the content of a text node, clamping points inside it.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        let text = text.into();
        let len = text.chars().count();
        if let Some(NodeKind::Text(existing)) = self.nodes.get_mut(id).map(|n| &mut n.kind) {
            *existing = text;
            self.map_points(|p| {
                if p.node == id && p.offset > len {
                    Point::new(id, len)
                } else {
                    p
                }
            });
        }
    }

    /// All nodes below `id` in document (pre-)order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Text leaves of the whole surface in document order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.is_text(id))
            .collect()
    }

    /// Char length of a text node, or of all text below an element.
    pub fn text_len(&self, id: NodeId) -> usize {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => text.chars().count(),
            Some(NodeKind::Element(_)) => self
                .descendants(id)
                .into_iter()
                .filter_map(|d| self.text(d))
                .map(|t| t.chars().count())
                .sum(),
            None => 0,
        }
    }

    /// The logical text buffer.
    pub fn text_content(&self) -> String {
        self.descendants(self.root)
            .into_iter()
            .filter_map(|id| self.text(id))
            .collect()
    }

    /// Replace every child of the root with a single text run.
    pub fn set_text_content(&mut self, text: &str) {
        self.clear_children(self.root);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(self.root, node);
        }
    }

    /// Serialized markup of the root's children.
    pub fn inner_html(&self) -> String {
        markup::serialize_children(self, self.root)
    }

    /// Replace the root's children with parsed markup. Leaves the surface
    /// untouched when the markup does not parse.
    pub fn set_inner_html(&mut self, html: &str) -> Result<(), MarkupError> {
        let fragment = markup::parse_fragment(html)?;
        self.clear_children(self.root);
        for node in fragment {
            let id = self.adopt(node);
            self.append_child(self.root, id);
        }
        Ok(())
    }

    /// Closest ancestor-or-self element marked `contenteditable="false"`.
    pub fn uneditable_ancestor(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return None;
            }
            if self.attribute(id, "contenteditable") == Some("false") {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// Merge adjacent text siblings and drop empty text nodes, remapping
    /// boundary points into the surviving nodes.
    pub fn normalize(&mut self) {
        self.normalize_element(self.root);
    }

    fn normalize_element(&mut self, element: NodeId) {
        let mut i = 0;
        while i < self.child_count(element) {
            let child = self.children(element)[i];
            if !self.is_text(child) {
                self.normalize_element(child);
                i += 1;
                continue;
            }

            let mut merged = self.text(child).unwrap_or_default().to_string();
            let mut merged_len = merged.chars().count();
            while let Some(&next) = self.children(element).get(i + 1) {
                let Some(next_text) = self.text(next).map(str::to_string) else {
                    break;
                };
                let base = merged_len;
                let next_index = i + 1;
                self.map_points(|p| {
                    if p.node == next {
                        Point::new(child, base + p.offset)
                    } else if p.node == element && p.offset == next_index {
                        Point::new(child, base)
                    } else {
                        p
                    }
                });
                self.remove(next);
                merged_len += next_text.chars().count();
                merged.push_str(&next_text);
            }

            if merged.is_empty() {
                self.remove(child);
            } else {
                if let Some(NodeKind::Text(text)) = self.nodes.get_mut(child).map(|n| &mut n.kind)
                {
                    *text = merged;
                }
                i += 1;
            }
        }
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Set anchor and focus (the host's `setBaseAndExtent`). Points are
    /// clamped to their node; points on dead nodes clear the selection.
    pub fn set_selection(&mut self, anchor: Point, focus: Point) {
        match (self.clamp_point(anchor), self.clamp_point(focus)) {
            (Some(anchor), Some(focus)) => self.selection = Some(Selection { anchor, focus }),
            _ => self.selection = None,
        }
    }

    pub fn collapse(&mut self, point: Point) {
        self.set_selection(point, point);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Linear offset of a boundary point in the logical text buffer.
    pub fn offset_of(&self, point: Point) -> usize {
        if let Some(text) = self.text(point.node) {
            return self.chars_before(point.node) + point.offset.min(text.chars().count());
        }
        match self.children(point.node).get(point.offset) {
            Some(&child) => self.chars_before(child),
            None => self.chars_before(point.node) + self.text_len(point.node),
        }
    }

    /// Boundary point for a linear offset, preferring the end of a leaf over
    /// the start of the next one.
    pub fn point_at(&self, offset: usize) -> Point {
        let mut current = 0;
        for leaf in self.leaves() {
            let len = self.text_len(leaf);
            if current + len >= offset {
                return Point::new(leaf, offset - current);
            }
            current += len;
        }
        Point::new(self.root, self.child_count(self.root))
    }

    /// Linear `(anchor, focus)` offsets of the live selection.
    pub fn selection_offsets(&self) -> Option<(usize, usize)> {
        self.selection
            .map(|s| (self.offset_of(s.anchor), self.offset_of(s.focus)))
    }

    /// The live selection as an ordered linear range.
    pub fn selection_range(&self) -> Option<Range<usize>> {
        self.selection_offsets()
            .map(|(anchor, focus)| anchor.min(focus)..anchor.max(focus))
    }

    pub fn is_collapsed(&self) -> bool {
        self.selection_range().is_none_or(|range| range.is_empty())
    }

    pub fn selected_text(&self) -> String {
        match self.selection_range() {
            Some(range) => char_slice(&self.text_content(), range).to_string(),
            None => String::new(),
        }
    }

    /// Text from the start of the surface to the start of the selection.
    pub fn text_before_selection(&self) -> String {
        let start = self.selection_range().map_or(0, |r| r.start);
        char_slice(&self.text_content(), 0..start).to_string()
    }

    /// Text from the end of the selection to the end of the surface.
    pub fn text_after_selection(&self) -> String {
        let text = self.text_content();
        let end = self.selection_range().map_or(0, |r| r.end);
        let len = text.chars().count();
        char_slice(&text, end..len).to_string()
    }

    /// Remove the chars in `range` from whichever leaves hold them and return
    /// the caret point where the range started.
    pub fn delete_range(&mut self, range: Range<usize>) -> Point {
        let mut current = 0;
        for leaf in self.leaves() {
            let len = self.text_len(leaf);
            let leaf_start = current;
            current += len;
            let lo = range.start.max(leaf_start);
            let hi = range.end.min(current);
            if lo >= hi {
                continue;
            }
            let (lo, hi) = (lo - leaf_start, hi - leaf_start);
            let text = self.text(leaf).unwrap_or_default();
            let remaining: String = text
                .chars()
                .take(lo)
                .chain(text.chars().skip(hi))
                .collect();
            if let Some(NodeKind::Text(existing)) = self.nodes.get_mut(leaf).map(|n| &mut n.kind) {
                *existing = remaining;
            }
            let removed = hi - lo;
            self.map_points(|p| {
                if p.node != leaf || p.offset <= lo {
                    p
                } else if p.offset >= hi {
                    Point::new(leaf, p.offset - removed)
                } else {
                    Point::new(leaf, lo)
                }
            });
        }
        self.point_at(range.start)
    }

    /// Delete a non-collapsed selection and collapse the caret where it
    /// started. Returns whether anything was deleted.
    pub fn delete_selection(&mut self) -> bool {
        match self.selection_range() {
            Some(range) if !range.is_empty() => {
                let caret = self.delete_range(range);
                self.collapse(caret);
                true
            }
            _ => false,
        }
    }

    /// Replace the selection with plain text and collapse the caret after it.
    /// Does nothing without a selection.
    pub fn insert_text(&mut self, text: &str) {
        self.delete_selection();
        let Some(selection) = self.selection else {
            return;
        };
        let caret = selection.focus;
        let inserted = text.chars().count();

        if let Some(existing) = self.text(caret.node) {
            let at = char_to_byte(existing, caret.offset);
            let mut updated = existing.to_string();
            updated.insert_str(at, text);
            if let Some(NodeKind::Text(slot)) = self.nodes.get_mut(caret.node).map(|n| &mut n.kind)
            {
                *slot = updated;
            }
            self.collapse(Point::new(caret.node, caret.offset + inserted));
        } else {
            let node = self.create_text(text);
            self.insert_child(caret.node, caret.offset, node);
            self.collapse(Point::new(node, inserted));
        }
    }

    /// Replace the selection with a markup fragment (the host's rich-text
    /// insertion command) and collapse the caret after the inserted nodes.
    pub fn insert_html(&mut self, html: &str) -> Result<(), MarkupError> {
        let fragment = markup::parse_fragment(html)?;
        if let [MarkupNode::Text(text)] = fragment.as_slice() {
            let text = text.clone();
            self.insert_text(&text);
            return Ok(());
        }

        self.delete_selection();
        let Some(selection) = self.selection else {
            return Ok(());
        };
        let caret = selection.focus;

        let (parent, mut index) = match self.text(caret.node).map(str::to_string) {
            Some(text) => {
                let at = char_to_byte(&text, caret.offset);
                let (head, tail) = text.split_at(at);
                let parent = self.parent(caret.node).unwrap_or(self.root);
                let index = self.index_in_parent(caret.node).map_or(0, |i| i + 1);
                if !tail.is_empty() {
                    let tail_node = self.create_text(tail);
                    self.set_text(caret.node, head);
                    self.insert_child(parent, index, tail_node);
                }
                (parent, index)
            }
            None => (caret.node, caret.offset),
        };

        let mut caret = Point::new(parent, index);
        for node in fragment {
            let id = self.adopt(node);
            self.insert_child(parent, index, id);
            index += 1;
            caret = match self.text(id) {
                Some(text) => Point::new(id, text.chars().count()),
                None => Point::new(parent, index),
            };
        }
        self.collapse(caret);
        Ok(())
    }

    /// Leaves paired with the `class` of their closest classed ancestor.
    pub fn styled_runs(&self) -> Vec<StyledRun> {
        self.leaves()
            .into_iter()
            .map(|leaf| {
                let mut class = None;
                let mut current = self.parent(leaf);
                while let Some(id) = current {
                    if id == self.root {
                        break;
                    }
                    if let Some(value) = self.attribute(id, "class") {
                        class = Some(value.to_string());
                        break;
                    }
                    current = self.parent(id);
                }
                StyledRun {
                    text: self.text(leaf).unwrap_or_default().to_string(),
                    class,
                }
            })
            .collect()
    }

    fn insert_child(&mut self, parent: NodeId, index: usize, node: NodeId) {
        if self.parent(node).is_some() {
            self.detach(node);
        }
        let Some(NodeKind::Element(element)) = self.nodes.get_mut(parent).map(|n| &mut n.kind)
        else {
            return;
        };
        let index = index.min(element.children.len());
        element.children.insert(index, node);
        if let Some(child) = self.nodes.get_mut(node) {
            child.parent = Some(parent);
        }
        self.map_points(|p| {
            if p.node == parent && p.offset > index {
                Point::new(parent, p.offset + 1)
            } else {
                p
            }
        });
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let Some(index) = self.index_in_parent(node) else {
            return;
        };
        if let Some(NodeKind::Element(element)) = self.nodes.get_mut(parent).map(|n| &mut n.kind) {
            element.children.remove(index);
        }
        if let Some(child) = self.nodes.get_mut(node) {
            child.parent = None;
        }

        let inside: Vec<NodeId> = self.subtree(node);
        self.map_points(|p| {
            if inside.contains(&p.node) {
                Point::new(parent, index)
            } else if p.node == parent && p.offset > index {
                Point::new(parent, p.offset - 1)
            } else {
                p
            }
        });
    }

    fn clear_children(&mut self, element: NodeId) {
        while let Some(&child) = self.children(element).last() {
            self.remove(child);
        }
    }

    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut ids = vec![node];
        ids.extend(self.descendants(node));
        ids
    }

    fn adopt(&mut self, node: MarkupNode) -> NodeId {
        match node {
            MarkupNode::Text(text) => self.create_text(text),
            MarkupNode::Element {
                tag,
                attributes,
                children,
            } => {
                let id = self.create_element(&tag);
                if let Some(NodeKind::Element(element)) = self.nodes.get_mut(id).map(|n| &mut n.kind)
                {
                    element.attributes = attributes;
                }
                for child in children {
                    let child_id = self.adopt(child);
                    self.append_child(id, child_id);
                }
                id
            }
        }
    }

    fn chars_before(&self, target: NodeId) -> usize {
        if target == self.root {
            return 0;
        }
        let mut total = 0;
        for id in self.descendants(self.root) {
            if id == target {
                break;
            }
            if let Some(text) = self.text(id) {
                total += text.chars().count();
            }
        }
        total
    }

    fn clamp_point(&self, point: Point) -> Option<Point> {
        let limit = match self.nodes.get(point.node)?.kind {
            NodeKind::Text(ref text) => text.chars().count(),
            NodeKind::Element(ref element) => element.children.len(),
        };
        Some(Point::new(point.node, point.offset.min(limit)))
    }

    fn map_points(&mut self, f: impl Fn(Point) -> Point) {
        if let Some(selection) = self.selection.as_mut() {
            selection.anchor = f(selection.anchor);
            selection.focus = f(selection.focus);
        }
    }
}

/// Byte index of the `index`-th char, or the string length past the end.
pub(crate) fn char_to_byte(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Char range of the line containing `offset`, excluding its newline.
pub(crate) fn line_bounds(text: &str, offset: usize) -> Range<usize> {
    let chars: Vec<char> = text.chars().collect();
    let offset = offset.min(chars.len());
    let start = chars[..offset]
        .iter()
        .rposition(|&c| c == '\n')
        .map_or(0, |i| i + 1);
    let end = chars[offset..]
        .iter()
        .position(|&c| c == '\n')
        .map_or(chars.len(), |i| offset + i);
    start..end
}

/// Slice a string by char range, clamping to its bounds.
pub(crate) fn char_slice(text: &str, range: Range<usize>) -> &str {
    let start = char_to_byte(text, range.start);
    let end = char_to_byte(text, range.end.max(range.start));
    &text[start..end]
}
