use std::io;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};

use typist::app::{App, Startup};
use typist::config::{self, Config};
use typist::definitions::{DefinitionSource, Loader};
use typist::error::DefinitionKind;
use typist::event::{AppEvent, EventHandler};
use typist::keyboard::layout::LayoutRef;
use typist::keyboard::model::Shape;
use typist::logging;
use typist::session::input::{FieldAction, field_action};
use typist::store::settings::SettingsStore;
use typist::ui;
use typist::ui::components::keyboard_diagram::KeyboardDiagram;
use typist::ui::components::prompt_area::PromptArea;
use typist::ui::components::selector::{SelectorKind, SelectorView};
use typist::ui::components::status_bar::StatusBar;
use typist::ui::layout::AppLayout;
use typist::ui::line_input::InputResult;

#[derive(Parser)]
#[command(name = "typist", version, about = "Terminal touch-typing tutor")]
struct Cli {
    #[arg(short, long, help = "Layout reference, e.g. qwerty or qwerty-gb")]
    layout: Option<String>,

    #[arg(long, help = "Lesson name, e.g. english")]
    lesson: Option<String>,

    #[arg(long, help = "Lesson level (1-based)")]
    level: Option<usize>,

    #[arg(long, help = "Keyboard shape (pc104 or pc105)")]
    shape: Option<String>,

    #[arg(long, help = "Hide finger hints")]
    no_hints: bool,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "List available layouts, lessons and themes, then exit")]
    list: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config: {e}");
        Config::default()
    });
    if let Some(theme) = cli.theme.clone() {
        config.theme = theme;
    }

    let source = DefinitionSource::from_config(&config);
    if cli.list {
        print_available(&source);
        return Ok(());
    }

    let startup = Startup {
        layout: cli.layout.as_deref().map(str::parse::<LayoutRef>).transpose()?,
        lesson: cli.lesson,
        level: cli.level.map(|level| level.saturating_sub(1)),
        shape: cli.shape.as_deref().map(Shape::from_setting),
        no_hints: cli.no_hints,
    };

    let _log_guard = match logging::init(&config::data_dir(), &config.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting");

    // First run: write the defaults out so there is a file to edit.
    if !Config::config_path().exists() {
        if let Err(e) = Config::default().save() {
            tracing::warn!(error = %e, "could not write default config");
        }
    }

    let events = EventHandler::new(config.tick_rate());
    let loader = Loader::new(Arc::new(source), events.sender());
    let mut app = App::new(
        config,
        SettingsStore::open_default(),
        loader,
        SmallRng::from_entropy(),
    );
    app.start(startup);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = ?err, "exiting on error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn print_available(source: &DefinitionSource) {
    println!("Layouts:");
    for name in source.available(DefinitionKind::Layout) {
        match source.load_layout(&name) {
            Ok(doc) => {
                for (id, label) in doc.variant_options() {
                    let linked = LayoutRef::new(&name, Some(id)).to_string();
                    println!("  {linked:<20} {label}");
                }
            }
            Err(e) => println!("  {name:<20} ({e})"),
        }
    }
    println!("Lessons:");
    for name in source.available(DefinitionKind::Lesson) {
        match source.load_lesson(&name) {
            Ok(doc) => println!("  {name:<20} {} ({} levels)", doc.title, doc.levels.len()),
            Err(e) => println!("  {name:<20} ({e})"),
        }
    }
    println!("Themes:");
    for name in ui::theme::Theme::available_themes() {
        println!("  {name}");
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.on_tick(Instant::now()),
            AppEvent::Resize(_, _) => {}
            AppEvent::Loaded(loaded) => app.handle_loaded(loaded, Instant::now()),
        }

        if app.should_quit {
            tracing::info!("quitting");
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        app.should_quit = true;
        return;
    }

    if app.jump.is_some() {
        handle_jump_key(app, key);
        return;
    }
    if app.selector.is_some() {
        handle_selector_key(app, key);
        return;
    }

    let now = Instant::now();
    match key.code {
        KeyCode::F(2) => app.open_selector(SelectorKind::Layout),
        KeyCode::F(3) => app.open_selector(SelectorKind::Variant),
        KeyCode::F(4) => app.open_selector(SelectorKind::Lesson),
        KeyCode::F(5) => app.open_selector(SelectorKind::Level),
        KeyCode::F(6) => app.open_selector(SelectorKind::Shape),
        KeyCode::F(7) => app.toggle_hints(),
        KeyCode::F(8) => app.open_jump(),
        KeyCode::Char('l') if ctrl => app.open_jump(),
        KeyCode::Esc => app.message = None,
        _ => match field_action(&key) {
            FieldAction::Type(ch) => {
                app.type_char(ch, now);
            }
            FieldAction::Clear => app.clear_input(now),
            FieldAction::Ignore => {}
        },
    }
}

fn handle_selector_key(app: &mut App, key: KeyEvent) {
    let Some(selector) = app.selector.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.selector = None,
        KeyCode::Up => selector.prev(),
        KeyCode::Down | KeyCode::Tab => selector.next(),
        KeyCode::Enter => app.apply_selector(Instant::now()),
        _ => {}
    }
}

fn handle_jump_key(app: &mut App, key: KeyEvent) {
    let Some(input) = app.jump.as_mut() else {
        return;
    };
    match input.handle(key) {
        InputResult::Continue => {}
        InputResult::Submit => app.submit_jump(Instant::now()),
        InputResult::Cancel => app.jump = None,
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let now = Instant::now();

    frame.render_widget(Block::default().style(Style::default().bg(colors.bg())), area);

    let model = app.layouts.model();
    let keyboard_height = KeyboardDiagram::inner_height(model, app.hints) + 2;
    let layout = AppLayout::new(area, keyboard_height);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " typist ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            app.header_text(),
            Style::default()
                .fg(colors.text_pending())
                .bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout.header);

    frame.render_widget(PromptArea::new(&app.session, now, &app.theme), layout.prompt);

    if let Some(keyboard_area) = layout.keyboard {
        let keyboard = KeyboardDiagram::new(
            model,
            app.layouts.keymap(),
            &app.highlight,
            app.hints,
            &app.theme,
        );
        frame.render_widget(keyboard, keyboard_area);
    }

    frame.render_widget(
        StatusBar::new(app.session.last_metrics(), app.session.mistakes(), &app.theme),
        layout.status,
    );

    let footer_text = match app.message {
        Some(ref message) => format!(" {message}  [Esc] dismiss"),
        None => ui::layout::pack_hint_lines(
            &[
                "[F2] Layout",
                "[F3] Variant",
                "[F4] Lesson",
                "[F5] Level",
                "[F6] Shape",
                "[F7] Hints",
                "[F8] Go to layout",
                "[^U] Restart line",
                "[^Q] Quit",
            ],
            layout.footer.width as usize,
        )
        .into_iter()
        .next()
        .unwrap_or_default(),
    };
    let footer_style = if app.message.is_some() {
        Style::default().fg(colors.warning())
    } else {
        Style::default().fg(colors.text_pending())
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(footer_text, footer_style))),
        layout.footer,
    );

    if let Some(ref selector) = app.selector {
        let popup = ui::layout::centered_rect(40, 60, area);
        frame.render_widget(SelectorView::new(selector, &app.theme), popup);
    }

    if let Some(ref input) = app.jump {
        let popup = ui::layout::centered_rect(50, 10, area);
        let popup = ratatui::layout::Rect::new(popup.x, popup.y, popup.width, 3.min(area.height));
        frame.render_widget(Clear, popup);
        let (before, cursor, after) = input.render_parts();
        let line = Line::from(vec![
            Span::styled("#", Style::default().fg(colors.accent())),
            Span::styled(before.to_string(), Style::default().fg(colors.fg())),
            Span::styled(
                cursor.map_or(" ".to_string(), |c| c.to_string()),
                Style::default()
                    .fg(colors.text_cursor_fg())
                    .bg(colors.text_cursor_bg()),
            ),
            Span::styled(after.to_string(), Style::default().fg(colors.fg())),
        ]);
        let block = Block::bordered()
            .title(" Go to layout (Tab completes) ")
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        frame.render_widget(Paragraph::new(line).block(block), popup);
    }
}
