//! Markup serialization for surface subtrees.
//!
//! The serialized form is what history snapshots store and what highlighters
//! hand back, so `parse_fragment(serialize_children(..))` must rebuild the
//! same tree (empty text nodes aside).

use html_escape::{decode_html_entities, encode_double_quoted_attribute_to_string, encode_text_to_string};

use super::{NodeId, Surface};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "wbr"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("Unterminated tag starting at char {0}")]
    UnterminatedTag(usize),
    #[error("Malformed tag at char {0}")]
    MalformedTag(usize),
    #[error("Closing tag </{tag}> at char {position} has no open element")]
    UnexpectedClosingTag { tag: String, position: usize },
}

/// Parsed markup, not yet placed in a surface arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MarkupNode {
    Text(String),
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<MarkupNode>,
    },
}

struct Frame {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<MarkupNode>,
}

impl Frame {
    fn close(self) -> MarkupNode {
        MarkupNode::Element {
            tag: self.tag,
            attributes: self.attributes,
            children: self.children,
        }
    }
}

pub(crate) fn serialize_children(surface: &Surface, element: NodeId) -> String {
    let mut out = String::new();
    for &child in surface.children(element) {
        write_node(surface, child, &mut out);
    }
    out
}

fn write_node(surface: &Surface, id: NodeId, out: &mut String) {
    if let Some(text) = surface.text(id) {
        encode_text_to_string(text, out);
        return;
    }
    let Some(tag) = surface.tag(id) else {
        return;
    };
    out.push('<');
    out.push_str(tag);
    if let Some(super::NodeKind::Element(element)) = surface.nodes.get(id).map(|n| &n.kind) {
        for (name, value) in &element.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            encode_double_quoted_attribute_to_string(value, out);
            out.push('"');
        }
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&tag) {
        return;
    }
    for &child in surface.children(id) {
        write_node(surface, child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Parse a markup fragment. Elements still open at the end are closed
/// implicitly; a closing tag with no matching open element is an error.
pub(crate) fn parse_fragment(input: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut top: Vec<MarkupNode> = Vec::new();
    let mut cursor = Cursor::new(input);

    fn push(stack: &mut [Frame], top: &mut Vec<MarkupNode>, node: MarkupNode) {
        match stack.last_mut() {
            Some(frame) => frame.children.push(node),
            None => top.push(node),
        }
    }

    while !cursor.is_empty() {
        let position = cursor.position;
        let rest = cursor.rest;

        let Some(lt) = rest.find('<') else {
            push(&mut stack, &mut top, text_node(rest));
            break;
        };
        if lt > 0 {
            push(&mut stack, &mut top, text_node(&rest[..lt]));
            cursor.advance(lt);
            continue;
        }

        if let Some(comment) = rest.strip_prefix("<!--") {
            let end = comment
                .find("-->")
                .ok_or(MarkupError::UnterminatedTag(position))?;
            cursor.advance("<!--".len() + end + "-->".len());
            continue;
        }

        let close = tag_end(rest).ok_or(MarkupError::UnterminatedTag(position))?;
        let inner = &rest[1..close];
        cursor.advance(close + 1);

        if inner.starts_with('!') || inner.starts_with('?') {
            continue;
        }

        if let Some(name) = inner.strip_prefix('/') {
            let name = name.trim();
            let Some(depth) = stack.iter().rposition(|f| f.tag.eq_ignore_ascii_case(name)) else {
                return Err(MarkupError::UnexpectedClosingTag {
                    tag: name.to_string(),
                    position,
                });
            };
            while stack.len() > depth {
                let Some(frame) = stack.pop() else {
                    break;
                };
                push(&mut stack, &mut top, frame.close());
            }
            continue;
        }

        let self_closing = inner.ends_with('/');
        let body = inner.trim_end_matches('/');
        let name_end = body
            .find(|c: char| c.is_whitespace())
            .unwrap_or(body.len());
        let tag = &body[..name_end];
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(MarkupError::MalformedTag(position));
        }
        let attributes = parse_attributes(&body[name_end..], position)?;
        let frame = Frame {
            tag: tag.to_ascii_lowercase(),
            attributes,
            children: Vec::new(),
        };

        if self_closing || VOID_ELEMENTS.contains(&frame.tag.as_str()) {
            push(&mut stack, &mut top, frame.close());
        } else {
            stack.push(frame);
        }
    }

    while let Some(frame) = stack.pop() {
        push(&mut stack, &mut top, frame.close());
    }
    Ok(top)
}

/// Unparsed input plus the char offset of its first char.
struct Cursor<'a> {
    rest: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            rest: input,
            position: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Consume `bytes` bytes, counting only the chars being skipped.
    fn advance(&mut self, bytes: usize) {
        let (skipped, rest) = self.rest.split_at(bytes);
        self.position += skipped.chars().count();
        self.rest = rest;
    }
}

fn text_node(raw: &str) -> MarkupNode {
    MarkupNode::Text(decode_html_entities(raw).into_owned())
}

/// Byte index of the `>` closing the tag that starts `rest`, skipping over
/// quoted attribute values.
fn tag_end(rest: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in rest.char_indices().skip(1) {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_attributes(raw: &str, position: usize) -> Result<Vec<(String, String)>, MarkupError> {
    let mut attributes = Vec::new();
    let mut rest = raw.trim_start();

    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty() {
            return Err(MarkupError::MalformedTag(position));
        }
        rest = rest[name_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(q).ok_or(MarkupError::MalformedTag(position))?;
                    rest = &body[end + 1..];
                    decode_html_entities(&body[..end]).into_owned()
                }
                Some(_) => {
                    let end = after_eq
                        .find(char::is_whitespace)
                        .unwrap_or(after_eq.len());
                    rest = &after_eq[end..];
                    decode_html_entities(&after_eq[..end]).into_owned()
                }
                None => return Err(MarkupError::MalformedTag(position)),
            }
        } else {
            String::new()
        };

        attributes.push((name.to_ascii_lowercase(), value));
        rest = rest.trim_start();
    }

    Ok(attributes)
}
