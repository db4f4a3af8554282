use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use folio_config::Config;
use folio_engine::blocks::ids;
use folio_engine::commands::{
    BreakBlock, CommandError, ConvertBlock, DeleteNext, DeletePrevious, InsertText, MoveCaret,
    MoveVertically, Redo, SelectAll, ToggleStyle, Undo,
};
use folio_engine::{
    ActionStack, ContentBlockView, ContextualCommand, ContextualCommandWith, Document,
    EditorContext, StandardMergePolicy, StyleFlag, io,
};
use log::{debug, info, warn};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env, fs,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

mod view;

use view::TerminalView;

struct App {
    path: PathBuf,
    context: EditorContext,
    actions: ActionStack,
    view: TerminalView,
    saved_revision: u64,
    status: String,
}

impl App {
    fn new(path: PathBuf, config: &Config) -> Result<Self> {
        let document = if path.exists() {
            io::read_document(&path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?
        } else {
            info!("{} does not exist yet, starting empty", path.display());
            Document::new()
        };
        let saved_revision = document.revision();
        let actions = ActionStack::new()
            .with_policy(StandardMergePolicy::new(config.undo.merge_window()))
            .with_capacity(config.undo.max_depth);

        Ok(Self {
            path,
            context: EditorContext::new(document)?,
            actions,
            view: TerminalView::new(80),
            saved_revision,
            status: String::from("Ctrl-S save | Ctrl-Q quit | Ctrl-Z/Y undo/redo"),
        })
    }

    fn is_dirty(&self) -> bool {
        self.context.document.revision() != self.saved_revision
    }

    fn save(&mut self) -> Result<()> {
        io::write_document(&self.path, &self.context.document)?;
        self.saved_revision = self.context.document.revision();
        self.status = format!("Saved {}", self.path.display());
        Ok(())
    }

    fn run(&mut self, command: &dyn ContextualCommand) {
        let result = command.activate(&mut self.context, &mut self.actions);
        self.report(command.name(), result);
    }

    fn report(&mut self, name: &str, result: Result<(), CommandError>) {
        match result {
            Ok(()) => {}
            Err(CommandError::NotActive(_)) => debug!("{name} is not active here"),
            Err(e) => {
                warn!("{name} failed: {e}");
                self.status = format!("{name}: {e}");
            }
        }
    }

    fn type_text(&mut self, text: String) {
        let result = InsertText.activate(&mut self.context, &mut self.actions, text);
        self.report("insert-text", result);
    }

    fn move_vertically(&mut self, command: MoveVertically) {
        let view: &dyn ContentBlockView = &self.view;
        let result = command.activate(&mut self.context, &mut self.actions, view);
        self.report("move-vertically", result);
    }

    /// Returns false when the editor should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let extend = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Char('q') if ctrl => return false,
            KeyCode::Char('s') if ctrl => {
                if let Err(e) = self.save() {
                    self.status = format!("Save failed: {e:#}");
                }
            }
            KeyCode::Char('z') if ctrl => self.run(&Undo),
            KeyCode::Char('y') if ctrl => self.run(&Redo),
            KeyCode::Char('a') if ctrl => self.run(&SelectAll),
            KeyCode::Char('b') if ctrl => self.run(&ToggleStyle(StyleFlag::Bold)),
            KeyCode::Char('e') if ctrl => self.run(&ToggleStyle(StyleFlag::Italic)),
            KeyCode::Char('u') if ctrl => self.run(&ToggleStyle(StyleFlag::Underline)),
            KeyCode::Char('0') if alt => self.run(&ConvertBlock::new(ids::PARAGRAPH)),
            KeyCode::Char('c') if alt => self.run(&ConvertBlock::new(ids::CODE)),
            KeyCode::Char(digit @ '1'..='6') if alt => {
                let command = ConvertBlock::new(ids::HEADING)
                    .with_attribute("level", &digit.to_string());
                self.run(&command);
            }
            KeyCode::Char(c) if !ctrl && !alt => self.type_text(c.to_string()),
            KeyCode::Enter => self.run(&BreakBlock),
            KeyCode::Backspace => self.run(&DeletePrevious),
            KeyCode::Delete => self.run(&DeleteNext),
            KeyCode::Left => {
                let command = MoveCaret::backward();
                self.run(&if extend { command.extending() } else { command });
            }
            KeyCode::Right => {
                let command = MoveCaret::forward();
                self.run(&if extend { command.extending() } else { command });
            }
            KeyCode::Up => self.move_vertically(MoveVertically { up: true, extend }),
            KeyCode::Down => self.move_vertically(MoveVertically { up: false, extend }),
            _ => {}
        }
        true
    }
}

fn init_logging() {
    // The terminal belongs to the editor, so log lines go to a file.
    let log_path = env::temp_dir().join("folio.log");
    let mut builder = env_logger::Builder::from_default_env();
    if let Ok(file) = fs::File::create(&log_path) {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let path = match args.as_slice() {
        [_, path] => PathBuf::from(path),
        [_] => match config.default_document.clone() {
            Some(path) => path,
            None => {
                eprintln!("Error: No document provided and no default_document configured");
                eprintln!("Usage: {} <document>", args[0]);
                eprintln!("Or set default_document in {}", config_path.display());
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: {} [document]", args[0]);
            process::exit(1);
        }
    };

    let mut app = App::new(path, &config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    if app.is_dirty() {
        println!("Unsaved changes to {} were discarded", app.path.display());
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key)
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let [body, status] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(f.area());

    // Borders take one column on each side.
    app.view.set_width(body.width.saturating_sub(2) as usize);
    let rendered = app.view.render(&app.context);

    let title = format!(
        " {}{} ",
        app.path.display(),
        if app.is_dirty() { " *" } else { "" }
    );
    let scroll = rendered.scroll_to(body.height.saturating_sub(2));
    let document = Paragraph::new(rendered.lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((scroll, 0));
    f.render_widget(document, body);

    if let Some((x, y)) = rendered.cursor {
        let top = scroll;
        f.set_cursor_position(Position::new(
            body.x + 1 + x,
            body.y + 1 + y.saturating_sub(top),
        ));
    }

    let history = format!(
        "undo {} | redo {} ",
        app.actions.undo_len(),
        app.actions.redo_len()
    );
    let status_line = Line::from(vec![
        Span::styled(history, Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            app.status.clone(),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    f.render_widget(Paragraph::new(status_line), status);
}
