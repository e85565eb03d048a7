// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_highlighted_markup(lines: usize) -> String {
    let line = r#"<span class="keyword">let</span> value = <span class="function">compute</span>(<span class="number">42</span>, <span class="string">"text"</span>); <span class="comment">// note</span>"#;
    let mut html = String::new();
    for _ in 0..lines {
        html.push_str(line);
        html.push('\n');
    }
    html
}
