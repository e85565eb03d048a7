use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

use crate::editing::host::{Host, SystemHost};

/// Editor configuration after defaults and overrides are merged.
#[derive(Clone)]
pub struct Options {
    /// One level of indentation.
    pub tab: String,
    /// Matched against the text before the caret; a match opens a new indent
    /// level on Enter.
    pub indent_on: Regex,
    /// Matched against the text after the caret; a match moves that text to
    /// its own dedented line when Enter opened a new indent level.
    pub move_to_new_line: Regex,
    pub spellcheck: bool,
    /// Intercept Tab / Shift-Tab.
    pub catch_tab: bool,
    /// Indent and dedent every selected line when a range is selected.
    pub multiline_tab: bool,
    /// Carry the previous line's padding onto new lines.
    pub preserve_indent: bool,
    /// Auto-close brackets and quotes.
    pub add_closing: bool,
    pub history: bool,
    pub host: Rc<dyn Host>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tab: "\t".to_string(),
            indent_on: default_indent_on(),
            move_to_new_line: default_move_to_new_line(),
            spellcheck: false,
            catch_tab: true,
            multiline_tab: true,
            preserve_indent: true,
            add_closing: true,
            history: true,
            host: Rc::new(SystemHost),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("tab", &self.tab)
            .field("indent_on", &self.indent_on.as_str())
            .field("move_to_new_line", &self.move_to_new_line.as_str())
            .field("spellcheck", &self.spellcheck)
            .field("catch_tab", &self.catch_tab)
            .field("multiline_tab", &self.multiline_tab)
            .field("preserve_indent", &self.preserve_indent)
            .field("add_closing", &self.add_closing)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl Options {
    pub fn from_patch(patch: OptionsPatch) -> Self {
        let mut options = Self::default();
        options.merge(patch);
        options
    }

    /// Overwrite every field the patch sets.
    pub fn merge(&mut self, patch: OptionsPatch) {
        let OptionsPatch {
            tab,
            indent_on,
            move_to_new_line,
            spellcheck,
            catch_tab,
            multiline_tab,
            preserve_indent,
            add_closing,
            history,
            host,
        } = patch;

        if let Some(tab) = tab {
            self.tab = tab;
        }
        if let Some(indent_on) = indent_on {
            self.indent_on = indent_on;
        }
        if let Some(move_to_new_line) = move_to_new_line {
            self.move_to_new_line = move_to_new_line;
        }
        if let Some(spellcheck) = spellcheck {
            self.spellcheck = spellcheck;
        }
        if let Some(catch_tab) = catch_tab {
            self.catch_tab = catch_tab;
        }
        if let Some(multiline_tab) = multiline_tab {
            self.multiline_tab = multiline_tab;
        }
        if let Some(preserve_indent) = preserve_indent {
            self.preserve_indent = preserve_indent;
        }
        if let Some(add_closing) = add_closing {
            self.add_closing = add_closing;
        }
        if let Some(history) = history {
            self.history = history;
        }
        if let Some(host) = host {
            self.host = host;
        }
    }
}

/// Partial configuration; unset fields keep their current value.
#[derive(Clone, Default)]
pub struct OptionsPatch {
    pub tab: Option<String>,
    pub indent_on: Option<Regex>,
    pub move_to_new_line: Option<Regex>,
    pub spellcheck: Option<bool>,
    pub catch_tab: Option<bool>,
    pub multiline_tab: Option<bool>,
    pub preserve_indent: Option<bool>,
    pub add_closing: Option<bool>,
    pub history: Option<bool>,
    pub host: Option<Rc<dyn Host>>,
}

impl fmt::Debug for OptionsPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsPatch")
            .field("tab", &self.tab)
            .field("indent_on", &self.indent_on.as_ref().map(Regex::as_str))
            .field(
                "move_to_new_line",
                &self.move_to_new_line.as_ref().map(Regex::as_str),
            )
            .field("spellcheck", &self.spellcheck)
            .field("catch_tab", &self.catch_tab)
            .field("multiline_tab", &self.multiline_tab)
            .field("preserve_indent", &self.preserve_indent)
            .field("add_closing", &self.add_closing)
            .field("history", &self.history)
            .field("host", &self.host.is_some())
            .finish()
    }
}

fn default_indent_on() -> Regex {
    static INDENT_ON: OnceLock<Regex> = OnceLock::new();
    INDENT_ON
        .get_or_init(|| Regex::new(r"[({\[]$").expect("Invalid indent regex"))
        .clone()
}

fn default_move_to_new_line() -> Regex {
    static MOVE_TO_NEW_LINE: OnceLock<Regex> = OnceLock::new();
    MOVE_TO_NEW_LINE
        .get_or_init(|| Regex::new(r"^[)}\]]").expect("Invalid closing-token regex"))
        .clone()
}
