//! Tetris Trainer - NES-style practice Tetris for the terminal
//!
//! The core game advances in discrete ticks driven by a fixed 60 Hz
//! scheduler here in the main loop; the game itself never looks at the
//! clock.

mod board;
mod game;
mod input;
mod loader;
mod menu;
mod piece;
mod score;
mod selector;
mod settings;
mod tetromino;
mod ui;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use game::{Game, Phase};
use input::{Action, InputHandler};
use loader::{BoardLoader, EmptyLoader, GarbageLoader};
use menu::StartScreen;
use ratatui::{Terminal, backend::CrosstermBackend};
use selector::{BagSelector, ClassicSelector, PieceSelector};
use settings::Settings;
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};

/// One tick at the nominal 60 Hz cadence
const TICK_DURATION: Duration = Duration::from_micros(16_667);

/// Cap on catch-up ticks after a stall, so a suspended terminal doesn't
/// fast-forward the game
const MAX_CATCHUP_TICKS: u32 = 4;

/// Get the trainer temp directory, creating it if needed
fn trainer_temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("tetris-trainer");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> io::Result<()> {
    // Per-session log file so runs don't clobber each other
    let session_id: u32 = rand::random();
    let log_dir = trainer_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tetris_trainer=debug".parse().unwrap()),
        )
        .with_ansi(false)
        .init();
    tracing::info!(
        "tetris-trainer starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = Settings::load();

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &settings);

    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    // Write the settings file on first run so it can be edited
    if let Err(e) = settings.save() {
        tracing::warn!("could not save settings: {}", e);
    }

    if let Ok(game) = &result {
        println!("Final score: {}", game.score());
        println!("Lines: {} | Level: {}", game.lines(), game.level());
    }

    result.map(|_| ())
}

/// Build a game wired up with the configured collaborators
fn build_game(settings: &Settings) -> Game {
    let selector: Box<dyn PieceSelector> = match settings.gameplay.selector.as_str() {
        "bag" => Box::new(BagSelector::new()),
        _ => Box::new(ClassicSelector::new()),
    };
    let loader: Box<dyn BoardLoader> = if settings.gameplay.garbage_rows > 0 {
        Box::new(GarbageLoader::new(settings.gameplay.garbage_rows))
    } else {
        Box::new(EmptyLoader)
    };
    Game::new(selector, loader)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &Settings,
) -> io::Result<Game> {
    let mut game = build_game(settings);
    let mut handler = InputHandler::from_settings(settings);
    let mut start_screen = StartScreen::new();
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| ui::render(frame, &game, &start_screen, settings))?;

        let timeout = TICK_DURATION.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    handler.key_up(key);
                } else if game.phase() == Phase::StartScreen {
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(game);
                        }
                        KeyCode::Char(c) if c.is_ascii_digit() => start_screen.push_digit(c),
                        KeyCode::Backspace => start_screen.backspace(),
                        KeyCode::Up => start_screen.adjust(1),
                        KeyCode::Down => start_screen.adjust(-1),
                        KeyCode::Enter => {
                            handler.clear();
                            game.start(start_screen.level());
                        }
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(game),
                        _ => {}
                    }
                } else {
                    for action in handler.key_down(key) {
                        if apply_action(&mut game, &mut handler, action) {
                            return Ok(game);
                        }
                    }
                }
            }
        }

        // Held-key repeats (DAS/ARR)
        for action in handler.update() {
            if apply_action(&mut game, &mut handler, action) {
                return Ok(game);
            }
        }
        game.set_soft_drop(handler.soft_drop_held());

        // Fixed-tick scheduling: the core sees "one tick elapsed", never
        // wall-clock time
        let mut ticked = 0;
        while last_tick.elapsed() >= TICK_DURATION {
            game.tick();
            last_tick += TICK_DURATION;
            ticked += 1;
            if ticked >= MAX_CATCHUP_TICKS {
                last_tick = Instant::now();
                break;
            }
        }
    }
}

/// Dispatch one decoded action to the game. Returns true when the app
/// should exit.
fn apply_action(game: &mut Game, handler: &mut InputHandler, action: Action) -> bool {
    match action {
        Action::MoveLeft => {
            game.move_left();
        }
        Action::MoveRight => {
            game.move_right();
        }
        Action::SoftDrop => {
            game.move_down();
        }
        Action::RotateCw => {
            game.rotate(true);
        }
        Action::RotateCcw => {
            game.rotate(false);
        }
        Action::Pause => {
            game.toggle_pause();
            handler.clear();
        }
        Action::Restart => {
            game.reset();
            handler.clear();
        }
        Action::Quit => return true,
    }
    false
}
