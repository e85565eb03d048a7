use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use inkjar_config::Config;
use inkjar_engine::{ClipboardEvent, Editor, EditorEvent, OptionsPatch, Position, Surface};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    cell::RefCell,
    env,
    io::{Stdout, stdout},
    ops::Range,
    path::PathBuf,
    process,
    rc::Rc,
    time::{Duration, Instant},
};

mod highlight;
mod keys;

const TAB_WIDTH: usize = 4;
const IDLE_POLL: Duration = Duration::from_millis(500);

struct App {
    path: PathBuf,
    editor: Editor,
    /// Latest text reported by the editor's update callback.
    latest: Rc<RefCell<String>>,
    saved: String,
    clipboard: String,
    status: String,
    scroll: usize,
}

impl App {
    fn new(path: PathBuf, content: String, patch: OptionsPatch) -> Result<Self> {
        let mut editor = Editor::new(Surface::new(), highlight::highlight, patch);
        editor.set_code(&content);
        editor.restore(Position::caret(0));
        editor.dispatch(&mut EditorEvent::Focus)?;

        let latest = Rc::new(RefCell::new(content.clone()));
        let sink = latest.clone();
        editor.on_update(move |text| *sink.borrow_mut() = text.to_string());

        Ok(Self {
            path,
            editor,
            latest,
            saved: content,
            clipboard: String::new(),
            status: "Ctrl+S save | Ctrl+Q quit | Ctrl+X/C/V cut/copy/paste".to_string(),
            scroll: 0,
        })
    }

    fn is_dirty(&self) -> bool {
        *self.latest.borrow() != self.saved
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Char('s') => {
                    self.save()?;
                    return Ok(false);
                }
                KeyCode::Char('x') => {
                    self.cut();
                    return Ok(false);
                }
                KeyCode::Char('v') => {
                    let text = self.clipboard.clone();
                    self.paste(text);
                    return Ok(false);
                }
                KeyCode::Char('c') => {
                    self.clipboard = self.editor.surface().selected_text();
                }
                _ => {}
            }
        }

        // Terminals report presses only, so every press is a full
        // keydown / default action / keyup cycle.
        let event = keys::to_key_event(&key);
        let mut down = EditorEvent::KeyDown(event.clone());
        self.dispatch(&mut down);
        if let EditorEvent::KeyDown(handled) = &down {
            self.editor.surface_mut().apply_default_key(handled);
        }
        self.dispatch(&mut EditorEvent::KeyUp(event));
        Ok(false)
    }

    fn paste(&mut self, text: String) {
        self.dispatch(&mut EditorEvent::Paste(ClipboardEvent::paste(text)));
    }

    fn cut(&mut self) {
        let mut cut = EditorEvent::Cut(ClipboardEvent::cut());
        self.dispatch(&mut cut);
        if let EditorEvent::Cut(clipboard) = cut {
            self.clipboard = clipboard.data().to_string();
        }
    }

    fn dispatch(&mut self, event: &mut EditorEvent) {
        if let Err(err) = self.editor.dispatch(event) {
            log::warn!("event {:?} failed: {err}", event.kind());
            self.status = format!("Error: {err}");
        }
    }

    fn save(&mut self) -> Result<()> {
        let text = self.latest.borrow().clone();
        std::fs::write(&self.path, &text)?;
        log::info!("saved {} ({} bytes)", self.path.display(), text.len());
        self.status = format!("Wrote {}", self.path.display());
        self.saved = text;
        Ok(())
    }

    /// Line and display column of the focus point.
    fn cursor(&self) -> (usize, usize) {
        let surface = self.editor.surface();
        let offset = surface
            .selection()
            .map_or(0, |selection| surface.offset_of(selection.focus));
        let text = surface.text_content();
        let mut line = 0;
        let mut column = 0;
        for c in text.chars().take(offset) {
            if c == '\n' {
                line += 1;
                column = 0;
            } else {
                column += char_width(c);
            }
        }
        (line, column)
    }
}

fn char_width(c: char) -> usize {
    if c == '\t' { TAB_WIDTH } else { 1 }
}

fn class_style(class: Option<&str>) -> Style {
    match class {
        Some("keyword") => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        Some("string") => Style::default().fg(Color::Green),
        Some("number") => Style::default().fg(Color::Yellow),
        Some("comment") => Style::default().fg(Color::DarkGray),
        Some("punct") => Style::default().fg(Color::Cyan),
        _ => Style::default(),
    }
}

/// Styled lines for the surface, with the selected range reversed.
fn render_lines(surface: &Surface, selected: Option<Range<usize>>) -> Vec<Line<'static>> {
    let selected = selected.filter(|range| !range.is_empty());
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut offset = 0;

    for run in surface.styled_runs() {
        let base = class_style(run.class.as_deref());
        let mut chunk = String::new();
        let mut chunk_style = base;
        for c in run.text.chars() {
            let style = match &selected {
                Some(range) if range.contains(&offset) => base.add_modifier(Modifier::REVERSED),
                _ => base,
            };
            offset += 1;
            if c == '\n' {
                if !chunk.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut chunk), chunk_style));
                }
                lines.push(Line::from(std::mem::take(&mut spans)));
                continue;
            }
            if style != chunk_style && !chunk.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut chunk), chunk_style));
            }
            chunk_style = style;
            if c == '\t' {
                chunk.push_str(&" ".repeat(TAB_WIDTH));
            } else {
                chunk.push(c);
            }
        }
        if !chunk.is_empty() {
            spans.push(Span::styled(chunk, chunk_style));
        }
    }
    lines.push(Line::from(spans));
    lines
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <file>", args[0]);
        process::exit(1);
    }

    let log_path = env::temp_dir().join("inkjar.log");
    let log_file = std::fs::File::create(&log_path)?;
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let arg_path = PathBuf::from(&args[1]);
    let path = Config::expand_path(&arg_path).unwrap_or(arg_path);

    let patch = match Config::load() {
        Ok(Some(config)) => match config.options_patch() {
            Ok(patch) => patch,
            Err(e) => {
                eprintln!(
                    "Error: Invalid config file '{}': {e}",
                    Config::config_path().display()
                );
                process::exit(1);
            }
        },
        Ok(None) => OptionsPatch::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let content = if path.exists() {
        std::fs::read_to_string(&path)?
    } else {
        String::new()
    };
    log::info!("inkjar starting on {}", path.display());

    // Create app
    let mut app = App::new(path, content, patch)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = app
            .editor
            .next_deadline()
            .map_or(IDLE_POLL, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            });
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if app.handle_key(key)? {
                        return Ok(());
                    }
                }
                Event::Paste(text) => app.paste(text),
                _ => {}
            }
        }
        app.editor.run_due_timers();
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)].as_ref())
        .split(f.area());

    let (line, column) = app.cursor();
    let height = chunks[0].height.saturating_sub(2) as usize;
    if line < app.scroll {
        app.scroll = line;
    } else if height > 0 && line >= app.scroll + height {
        app.scroll = line + 1 - height;
    }

    let surface = app.editor.surface();
    let title = format!(
        "{}{}",
        app.path.display(),
        if app.is_dirty() { " [+]" } else { "" }
    );
    let content = Paragraph::new(render_lines(surface, surface.selection_range()))
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((app.scroll as u16, 0));
    f.render_widget(content, chunks[0]);

    f.set_cursor_position((
        chunks[0].x + 1 + column as u16,
        chunks[0].y + 1 + (line - app.scroll) as u16,
    ));

    let history = app.editor.history();
    let status = Line::from(vec![
        Span::styled(
            format!(" Ln {}, Col {} ", line + 1, column + 1),
            Style::default().bg(Color::Blue).fg(Color::White),
        ),
        Span::raw(format!(
            " history {}/{} ",
            history.at().map_or(0, |at| at + 1),
            history.len()
        )),
        Span::raw(&app.status),
    ]);
    f.render_widget(Paragraph::new(vec![status]), chunks[1]);
}
