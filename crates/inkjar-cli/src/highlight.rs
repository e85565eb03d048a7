//! Token highlighter: wraps comments, strings, numbers, keywords and
//! brackets in `<span class=...>` elements.

use std::sync::OnceLock;

use html_escape::encode_text_to_string;
use inkjar_engine::{Position, Surface};
use regex::Regex;

const CLASSES: [&str; 5] = ["comment", "string", "number", "keyword", "punct"];

fn token_pattern() -> &'static Regex {
    static TOKENS: OnceLock<Regex> = OnceLock::new();
    TOKENS.get_or_init(|| {
        Regex::new(concat!(
            r#"(?P<comment>//[^\n]*)"#,
            r#"|(?P<string>"(?:[^"\\\n]|\\.)*"?)"#,
            r#"|(?P<number>\b\d[\d_]*(?:\.\d+)?\b)"#,
            r#"|(?P<keyword>\b(?:fn|let|mut|if|else|for|while|loop|match|return|struct|enum|impl|trait|pub|use|mod|const|static|self|true|false)\b)"#,
            r#"|(?P<punct>[(){}\[\]])"#,
        ))
        .expect("Invalid token regex")
    })
}

/// Markup for `text` with every token wrapped in a classed span.
pub fn to_markup(text: &str) -> String {
    let mut html = String::with_capacity(text.len() * 2);
    let mut last = 0;
    for caps in token_pattern().captures_iter(text) {
        let Some(token) = caps.get(0) else {
            continue;
        };
        let class = CLASSES
            .into_iter()
            .find(|name| caps.name(name).is_some())
            .unwrap_or("token");
        encode_text_to_string(&text[last..token.start()], &mut html);
        html.push_str(r#"<span class=""#);
        html.push_str(class);
        html.push_str(r#"">"#);
        encode_text_to_string(token.as_str(), &mut html);
        html.push_str("</span>");
        last = token.end();
    }
    encode_text_to_string(&text[last..], &mut html);
    html
}

pub fn highlight(surface: &mut Surface, _pos: Option<Position>) {
    let html = to_markup(&surface.text_content());
    if let Err(err) = surface.set_inner_html(&html) {
        log::warn!("highlighter produced unparseable markup: {err}");
    }
}
