//! Keystroke-triggered edits.
//!
//! Every command follows the same shape: read the text around the selection,
//! decide on a transformation, save the caret, mutate through [`insert`],
//! restore an adjusted caret. Commands only act on the key they own and
//! leave every other event untouched.

use html_escape::encode_safe;

use crate::dom::Surface;
use crate::editing::events::{ClipboardEvent, Key, KeyEvent};
use crate::editing::history::History;
use crate::editing::position::{restore, save};
use crate::editing::{Direction, EditorError, Highlighter, Options, Position};

const OPEN: [char; 5] = ['(', '[', '{', '\'', '"'];
const CLOSE: [char; 5] = [')', ']', '}', '\'', '"'];

/// Leading whitespace of the last line of `text`, with its char range.
pub fn find_padding(text: &str) -> (String, usize, usize) {
    let chars: Vec<char> = text.chars().collect();
    let start = chars
        .iter()
        .rposition(|c| *c == '\n')
        .map_or(0, |i| i + 1);
    let end = start
        + chars[start..]
            .iter()
            .take_while(|c| matches!(c, ' ' | '\t'))
            .count();
    (chars[start..end].iter().collect(), start, end)
}

/// Replace the selection with literal text. Markup-significant characters
/// are escaped before going through the surface's markup insertion, so the
/// text never becomes structure.
pub fn insert(surface: &mut Surface, text: &str) -> Result<(), EditorError> {
    if text.is_empty() {
        surface.delete_selection();
        return Ok(());
    }
    surface.insert_html(&encode_safe(text))?;
    Ok(())
}

/// Enter: carry the current line's padding onto the new line, one level
/// deeper after an opening token. When that splits an opening token from
/// its closing one, the closing token moves to its own line at the old
/// padding.
pub fn handle_newline(
    surface: &mut Surface,
    options: &Options,
    legacy: bool,
    event: &mut KeyEvent,
) -> Result<(), EditorError> {
    if event.key != Key::Enter {
        return Ok(());
    }

    let before = surface.text_before_selection();
    let after = surface.text_after_selection();
    let (padding, _, _) = find_padding(&before);
    let mut new_padding = padding.clone();
    if options.indent_on.is_match(&before) {
        new_padding.push_str(&options.tab);
    }

    if new_padding.is_empty() {
        legacy_newline_fix(surface, legacy, event)?;
    } else {
        event.prevent_default();
        event.stop_propagation();
        insert(surface, &format!("\n{new_padding}"))?;
    }

    if new_padding != padding && options.move_to_new_line.is_match(&after) {
        let pos = save(surface)?;
        insert(surface, &format!("\n{padding}"))?;
        restore(surface, pos);
    }
    Ok(())
}

/// Enter on hosts without precise caret placement. A newline at the very end
/// of the buffer gets a trailing space so the caret has a line to sit on.
pub fn legacy_newline_fix(
    surface: &mut Surface,
    legacy: bool,
    event: &mut KeyEvent,
) -> Result<(), EditorError> {
    if !legacy || event.key != Key::Enter {
        return Ok(());
    }
    event.prevent_default();
    event.stop_propagation();

    if surface.text_after_selection().is_empty() {
        insert(surface, "\n ")?;
        let pos = save(surface)?;
        let caret = pos.end.saturating_sub(1);
        restore(surface, Position::new(caret, caret, pos.dir));
    } else {
        insert(surface, "\n")?;
    }
    Ok(())
}

/// Tab and Shift-Tab. A selected range is indented or dedented line by line
/// when block mode is on; otherwise Tab inserts one indent unit and
/// Shift-Tab removes up to one from the start of the current line.
pub fn handle_tab(
    surface: &mut Surface,
    options: &Options,
    legacy: bool,
    event: &mut KeyEvent,
) -> Result<(), EditorError> {
    if event.key != Key::Tab {
        return Ok(());
    }
    event.prevent_default();

    let dedent = event.modifiers.shift;
    if options.multiline_tab && !legacy && !surface.is_collapsed() {
        return indent_block(surface, options, dedent);
    }
    if dedent {
        dedent_line(surface, options)
    } else {
        insert(surface, &options.tab)
    }
}

fn dedent_line(surface: &mut Surface, options: &Options) -> Result<(), EditorError> {
    let before = surface.text_before_selection();
    let (_, start, end) = find_padding(&before);
    if start == end {
        return Ok(());
    }

    let pos = save(surface)?;
    let len = options.tab.chars().count().min(end - start);
    restore(surface, Position::new(start, start + len, Direction::Forward));
    surface.delete_selection();

    let shift = |offset: usize| offset.saturating_sub(len).max(start);
    restore(surface, Position::new(shift(pos.start), shift(pos.end), pos.dir));
    Ok(())
}

fn indent_block(surface: &mut Surface, options: &Options, dedent: bool) -> Result<(), EditorError> {
    let pos = save(surface)?;
    let text: Vec<char> = surface.text_content().chars().collect();
    let lo = pos.min().min(text.len());
    let hi = pos.max().min(text.len());

    let block_start = text[..lo]
        .iter()
        .rposition(|c| *c == '\n')
        .map_or(0, |i| i + 1);
    // A selection ending just past a newline does not reach into the next line.
    let last = if hi > lo && text[hi - 1] == '\n' {
        hi - 1
    } else {
        hi
    };
    let block_end = text[last..]
        .iter()
        .position(|c| *c == '\n')
        .map_or(text.len(), |i| last + i);
    let block: String = text[block_start..block_end].iter().collect();

    let tab_len = options.tab.chars().count();
    let mut deltas: Vec<isize> = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    for line in block.split('\n') {
        if dedent {
            let strip = line
                .chars()
                .take_while(|c| matches!(c, ' ' | '\t'))
                .count()
                .min(tab_len);
            deltas.push(-(strip as isize));
            lines.push(line.chars().skip(strip).collect());
        } else {
            deltas.push(tab_len as isize);
            lines.push(format!("{}{line}", options.tab));
        }
    }

    restore(surface, Position::new(block_start, block_end, Direction::Forward));
    insert(surface, &lines.join("\n"))?;

    let first = deltas.first().copied().unwrap_or(0);
    let total: isize = deltas.iter().sum();
    let new_lo = if lo == block_start {
        lo
    } else {
        lo.saturating_add_signed(first).max(block_start)
    };
    let new_hi = hi.saturating_add_signed(total).max(new_lo);
    restore(surface, Position::spanning(new_lo, new_hi, pos.dir));
    log::trace!(
        "{} {} lines",
        if dedent { "dedented" } else { "indented" },
        deltas.len()
    );
    Ok(())
}

/// Bracket and quote pairing: type through a closing character that is
/// already next, and insert both halves of a pair around the selection.
/// Nothing happens right after a backslash.
pub fn handle_self_closing(surface: &mut Surface, event: &mut KeyEvent) -> Result<(), EditorError> {
    let Key::Character(typed) = event.key else {
        return Ok(());
    };
    if event.modifiers.is_command() || event.modifiers.alt {
        return Ok(());
    }

    let before = surface.text_before_selection();
    let after = surface.text_after_selection();
    let escaped = before.ends_with('\\');
    let next = after.chars().next();

    if CLOSE.contains(&typed) && next == Some(typed) && !escaped {
        let pos = save(surface)?;
        event.prevent_default();
        let caret = pos.max() + 1;
        restore(surface, Position::new(caret, caret, pos.dir));
    } else if let Some(index) = OPEN.iter().position(|c| *c == typed)
        && !escaped
        && (matches!(typed, '\'' | '"') || matches!(next, None | Some(' ' | '\n')))
    {
        event.prevent_default();
        let pos = save(surface)?;
        let wrapped = if pos.is_collapsed() {
            String::new()
        } else {
            surface.selected_text()
        };
        insert(surface, &format!("{typed}{wrapped}{}", CLOSE[index]))?;
        restore(surface, Position::caret(pos.max() + 1));
    }
    Ok(())
}

/// Ctrl/Cmd+Z and Ctrl/Cmd+Shift+Z: swap in the neighbouring snapshot.
pub fn handle_undo_redo(
    surface: &mut Surface,
    history: &mut History,
    event: &mut KeyEvent,
) -> Result<(), EditorError> {
    let record = if event.is_undo() {
        event.prevent_default();
        history.undo()
    } else if event.is_redo() {
        event.prevent_default();
        history.redo()
    } else {
        return Ok(());
    };

    if let Some(record) = record {
        let (html, pos) = (record.html.clone(), record.pos);
        if let Err(err) = surface.set_inner_html(&html) {
            log::warn!("history snapshot failed to parse: {err}");
            return Err(err.into());
        }
        restore(surface, pos);
        log::trace!("history moved to {:?}", history.at());
    }
    Ok(())
}

/// Insert the clipboard text literally, highlight at once and put the caret
/// after the pasted text.
pub fn handle_paste(
    surface: &mut Surface,
    highlighter: &mut dyn Highlighter,
    event: &mut ClipboardEvent,
) -> Result<(), EditorError> {
    if event.default_prevented() {
        return Ok(());
    }
    event.prevent_default();

    let text = event.data().replace("\r\n", "\n").replace('\r', "\n");
    let pos = save(surface)?;
    insert(surface, &text)?;
    highlighter.highlight(surface, None);
    let caret = pos.min() + text.chars().count();
    restore(surface, Position::new(caret, caret, Direction::Backward));
    Ok(())
}

/// Move the selected text into the clipboard event, delete it, highlight at
/// once and collapse the caret where the selection began.
pub fn handle_cut(
    surface: &mut Surface,
    highlighter: &mut dyn Highlighter,
    event: &mut ClipboardEvent,
) -> Result<(), EditorError> {
    let pos = save(surface)?;
    event.set_data(surface.selected_text());
    surface.delete_selection();
    highlighter.highlight(surface, None);
    restore(surface, Position::new(pos.min(), pos.min(), Direction::Backward));
    event.prevent_default();
    Ok(())
}
