mod app;
mod cli;
mod components;
mod draw;
mod html;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::cli::{CliArgs, CliCommand, OutputMode};
use crate::state::app_settings::AppSettings;
use crate::state::messages::{Action, UiEvent};
use crate::state::network::{Loader, LoadingState};
use crate::state::refresher::PeriodicRefresher;
use anyhow::Context;
use chrono::Utc;
use crossterm::event::{self as crossterm_event, Event, KeyEventKind};
use crossterm::{cursor, execute, terminal};
use std::io::Stdout;
use std::time::{Duration, Instant};
use std::{io, panic};
use tui::{Terminal, backend::CrosstermBackend};
use wa_timetable_api::view::build_view;
use wa_timetable_api::{TimetableApi, TimetableConfig};

/// Input poll interval; also how often live badges are re-evaluated.
const TICK: Duration = Duration::from_millis(1000);

fn main() -> anyhow::Result<()> {
    let Some(args) = handle_cli_args() else {
        return Ok(());
    };

    let mut settings = AppSettings::load(args.config.as_deref())?;
    if let Some(file) = args.file {
        settings.timetable.source_file = Some(file);
    }

    match args.mode {
        OutputMode::Terminal => run_terminal(settings),
        OutputMode::Html => print_html(&settings.timetable),
        OutputMode::Json => print_json(&settings.timetable),
    }
}

fn handle_cli_args() -> Option<CliArgs> {
    match cli::parse_args(std::env::args().skip(1)) {
        Ok(CliCommand::Run(args)) => Some(args),
        Ok(CliCommand::Help) => {
            println!("{}", cli::usage_text());
            None
        }
        Ok(CliCommand::Version) => {
            println!("wa-timetable {}", env!("CARGO_PKG_VERSION"));
            None
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", cli::usage_text());
            std::process::exit(2);
        }
    }
}

/// Load errors become the inline error block, so the page embedding this
/// output never breaks.
fn print_html(config: &TimetableConfig) -> anyhow::Result<()> {
    let result = TimetableApi::new(config).and_then(|api| api.fetch_timetable(config));
    let output = match result {
        Ok(timetable) => html::render(&build_view(&timetable, config, Utc::now())),
        Err(e) => html::render_error(&e),
    };
    println!("{output}");
    Ok(())
}

fn print_json(config: &TimetableConfig) -> anyhow::Result<()> {
    let api = TimetableApi::new(config)?;
    let timetable = api.fetch_timetable(config)?;
    let view = build_view(&timetable, config, Utc::now());
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn run_terminal(settings: AppSettings) -> anyhow::Result<()> {
    better_panic::install();

    let loader = Loader::new(settings.timetable.clone())?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal().context("could not set up terminal")?;

    tui_logger::init_logger(log::LevelFilter::Debug)?;
    tui_logger::set_default_level(log::LevelFilter::Info);

    let mut app = App::new(settings);
    let result = main_ui_loop(&mut terminal, &mut app, &loader);

    cleanup_terminal()?;
    result
}

fn main_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    loader: &Loader,
) -> anyhow::Result<()> {
    let mut refresher = PeriodicRefresher::new(app.settings.refresh_secs, Instant::now());
    let mut loading = reload(terminal, app, loader)?;
    refresher.reset(Instant::now());

    loop {
        match next_event()? {
            UiEvent::KeyPressed(key_event) => match keys::handle_key_bindings(key_event, app) {
                Action::Quit => return Ok(()),
                Action::Refresh => {
                    loading = reload(terminal, app, loader)?;
                    refresher.reset(Instant::now());
                }
                Action::None => {}
            },
            UiEvent::Resize => {}
            UiEvent::Tick => {
                if refresher.is_due(Instant::now()) {
                    loading = reload(terminal, app, loader)?;
                    refresher.reset(Instant::now());
                }
                app.refresh_view(Utc::now());
            }
        }
        draw::draw(terminal, app, loading)?;
    }
}

/// Run the pipeline once. The spinner is drawn before the fetch blocks.
fn reload(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    loader: &Loader,
) -> anyhow::Result<LoadingState> {
    draw::draw(terminal, app, LoadingState::started())?;

    let loading = match loader.load() {
        Ok(timetable) => {
            app.on_timetable_loaded(timetable, Utc::now());
            LoadingState::finished(true)
        }
        Err(e) => {
            app.on_error(e.to_string());
            LoadingState::finished(false)
        }
    };
    draw::draw(terminal, app, loading)?;
    Ok(loading)
}

fn next_event() -> io::Result<UiEvent> {
    if !crossterm_event::poll(TICK)? {
        return Ok(UiEvent::Tick);
    }
    let ui_event = match crossterm_event::read()? {
        Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
            UiEvent::KeyPressed(key_event)
        }
        Event::Resize(_, _) => UiEvent::Resize,
        _ => UiEvent::Tick,
    };
    Ok(ui_event)
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

pub fn cleanup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::MoveTo(0, 0))?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    execute!(stdout, terminal::LeaveAlternateScreen)?;
    execute!(stdout, cursor::Show)?;
    terminal::disable_raw_mode()
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        let _ = cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
