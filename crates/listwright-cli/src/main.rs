use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use listwright_config::Config;
use listwright_engine::{
    Cmd, ItemRange, LineKind, ListEditor, ListKind, ListPatch, NodeId, OutlineLine,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    fs::File,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

struct App {
    source: Option<PathBuf>,
    config: Config,
    editor: ListEditor,
    lines: Vec<OutlineLine>,
    line_state: ListState,
    status: String,
}

impl App {
    fn new(source: Option<PathBuf>, config: Config) -> Result<Self> {
        let markdown = match &source {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => String::new(),
        };
        let editor = ListEditor::from_markdown(&markdown, config.lists.clone());

        let mut app = Self {
            source,
            config,
            editor,
            lines: Vec::new(),
            line_state: ListState::default(),
            status: String::new(),
        };
        app.refresh(None);
        Ok(app)
    }

    fn selected_line(&self) -> Option<&OutlineLine> {
        self.line_state.selected().and_then(|i| self.lines.get(i))
    }

    fn next_line(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        let i = match self.line_state.selected() {
            Some(i) => (i + 1) % self.lines.len(),
            None => 0,
        };
        self.line_state.select(Some(i));
    }

    fn previous_line(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        let i = match self.line_state.selected() {
            Some(0) | None => self.lines.len() - 1,
            Some(i) => i - 1,
        };
        self.line_state.select(Some(i));
    }

    /// Re-read the outline and move the selection to `focus`, or keep the
    /// current row when there is none.
    fn refresh(&mut self, focus: Option<NodeId>) {
        let previous = self.line_state.selected().unwrap_or(0);
        self.lines = self.editor.outline();

        let focused = focus.and_then(|node| {
            self.lines
                .iter()
                .position(|line| line.node == node || line.block == node)
        });
        let selected = match focused {
            Some(i) => Some(i),
            None if self.lines.is_empty() => None,
            None => Some(previous.min(self.lines.len() - 1)),
        };
        self.line_state.select(selected);
    }

    fn is_item(line: &OutlineLine) -> bool {
        matches!(line.kind, LineKind::OrderedItem | LineKind::UnorderedItem)
    }

    /// The command a key stands for on the selected line.
    fn command_for(&self, code: KeyCode) -> Option<Cmd> {
        let toggle = |kind| Cmd::ToggleList {
            blocks: self.selected_line().map(|line| line.block).into_iter().collect(),
            kind,
        };
        // Toggling works on an empty document, everything else needs a line
        match code {
            KeyCode::Char('o') => return Some(toggle(ListKind::Ordered)),
            KeyCode::Char('u') => return Some(toggle(ListKind::Unordered)),
            _ => {}
        }

        let line = self.selected_line()?;
        match code {
            KeyCode::Tab if Self::is_item(line) => Some(Cmd::Indent {
                range: ItemRange::single(line.node),
            }),
            KeyCode::BackTab if Self::is_item(line) => Some(Cmd::Outdent {
                range: ItemRange::single(line.node),
            }),
            KeyCode::Enter if Self::is_item(line) => Some(Cmd::Enter {
                item: line.node,
                split: None,
            }),
            KeyCode::Backspace => Some(Cmd::Backspace { block: line.block }),
            KeyCode::Delete => Some(Cmd::Delete { block: line.block }),
            _ => None,
        }
    }

    fn apply(&mut self, cmd: Cmd) {
        match self.editor.apply(cmd) {
            Ok(patch) => self.after_patch(&patch),
            Err(e) => {
                log::warn!("command failed: {e}");
                self.status = format!("Error: {e}");
            }
        }
    }

    fn after_patch(&mut self, patch: &ListPatch) {
        self.status = if patch.is_noop() {
            "Nothing to do here".to_string()
        } else {
            format!(
                "v{}: {} labels created, {} updated, {} removed",
                patch.version,
                patch.labels.created.len(),
                patch.labels.updated.len(),
                patch.labels.removed.len()
            )
        };
        self.refresh(patch.focus);
    }

    fn save_html(&mut self) -> Result<PathBuf> {
        let source = self
            .source
            .clone()
            .unwrap_or_else(|| PathBuf::from("untitled.md"));
        let target = self.config.export_path(&source);
        std::fs::write(&target, self.editor.to_html())
            .with_context(|| format!("Failed to write {}", target.display()))?;
        log::info!("exported html to {}", target.display());
        Ok(target)
    }

    /// Handle one key press. Returns false when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return false,
            KeyCode::Down | KeyCode::Char('j') => self.next_line(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_line(),
            KeyCode::Char('s') => {
                self.status = match self.save_html() {
                    Ok(path) => format!("Saved {}", path.display()),
                    Err(e) => format!("Error: {e:#}"),
                };
            }
            code => {
                if let Some(cmd) = self.command_for(code) {
                    self.apply(cmd);
                }
            }
        }
        true
    }
}

fn render_line(line: &OutlineLine) -> String {
    let indent = "    ".repeat(line.depth);
    match line.kind {
        LineKind::Heading(level) => format!("{indent}{} {}", "#".repeat(level as usize), line.text),
        LineKind::OrderedItem => {
            format!("{indent}{} {}", line.label.as_deref().unwrap_or("?"), line.text)
        }
        LineKind::UnorderedItem => format!("{indent}• {}", line.text),
        LineKind::Paragraph | LineKind::Other => format!("{indent}{}", line.text),
    }
}

fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log::LevelFilter::Info);
    // The terminal belongs to the TUI, so log lines go to a file
    if let Ok(file) = File::create("listwright.log") {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();
    log::info!("listwright starting up");

    let args: Vec<String> = env::args().collect();
    let source = match args.len() {
        1 => None,
        2 => Some(PathBuf::from(&args[1])),
        _ => {
            eprintln!("Usage: {} [FILE.md]", args[0]);
            process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let mut app = match App::new(source, config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
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

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key.code)
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(f.area());

    let title = app
        .source
        .as_ref()
        .map_or_else(|| "untitled".to_string(), |path| path.display().to_string());

    let items: Vec<ListItem> = if app.lines.is_empty() {
        vec![ListItem::new("Empty document: press o or u to start a list")]
    } else {
        app.lines
            .iter()
            .map(|line| ListItem::new(vec![Line::from(vec![Span::raw(render_line(line))])]))
            .collect()
    };

    let outline = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(outline, chunks[0], &mut app.line_state);

    let status = Paragraph::new(Line::from(Span::raw(app.status.clone())));
    f.render_widget(status, chunks[1]);

    let help_text = Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑↓/kj: Move | "),
        Span::raw("Tab/S-Tab: Indent | "),
        Span::raw("Enter | Bksp/Del: Join | "),
        Span::raw("o/u: Toggle list | s: Save HTML"),
    ]);
    f.render_widget(Paragraph::new(vec![help_text]), chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn app_with(markdown: &str) -> (TempDir, App) {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("notes.md");
        std::fs::write(&source, markdown).unwrap();
        let app = App::new(Some(source), Config::default()).unwrap();
        (temp_dir, app)
    }

    fn rendered(app: &App) -> Vec<String> {
        app.lines.iter().map(render_line).collect()
    }

    #[test]
    fn test_outline_rendering() {
        let (_dir, app) = app_with("# Plan\n\n1. one\n   - detail\n2. two\n");

        assert_eq!(rendered(&app), vec!["# Plan", "1. one", "    • detail", "2. two"]);
        assert_eq!(app.line_state.selected(), Some(0));
    }

    #[test]
    fn test_keys_drive_commands() {
        let (_dir, mut app) = app_with("1. one\n2. two\n");

        // Given "two" is selected, Tab nests it under "one"
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Tab);
        assert_eq!(rendered(&app), vec!["1. one", "    1.1. two"]);

        // Shift-Tab brings it back
        app.handle_key(KeyCode::BackTab);
        assert_eq!(rendered(&app), vec!["1. one", "2. two"]);
        assert_eq!(app.editor.version(), 2);
    }

    #[test]
    fn test_enter_selects_new_item() {
        let (_dir, mut app) = app_with("1. one\n2. two\n");

        app.handle_key(KeyCode::Enter);

        assert_eq!(rendered(&app), vec!["1. one", "2. ", "3. two"]);
        assert_eq!(app.line_state.selected(), Some(1));
    }

    #[test]
    fn test_toggle_on_empty_document() {
        let mut app = App::new(None, Config::default()).unwrap();
        assert!(app.lines.is_empty());

        app.handle_key(KeyCode::Char('o'));

        assert_eq!(rendered(&app), vec!["1. "]);
        assert_eq!(app.line_state.selected(), Some(0));
    }

    #[test]
    fn test_save_writes_html_next_to_source() {
        let (dir, mut app) = app_with("- a\n");

        app.handle_key(KeyCode::Char('s'));

        let html = std::fs::read_to_string(dir.path().join("notes.html")).unwrap();
        insta::assert_snapshot!(html, @"<ul><li><p>a</p></li></ul>");
        assert!(app.status.starts_with("Saved"));
    }

    #[test]
    fn test_quit_key() {
        let (_dir, mut app) = app_with("text\n");

        assert!(app.handle_key(KeyCode::Char('j')));
        assert!(!app.handle_key(KeyCode::Char('q')));
    }
}
