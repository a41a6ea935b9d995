//! Live terminal view of a running city.
//!
//! Feature-gated behind `tui`. Launch with `--tui` on the CLI.

mod controls;
mod layout;
/// Application state wrapping the engine.
pub mod runtime;
mod style;

use std::io::{self, Stdout};
use std::time::Instant;

use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::warn;

use crate::config::ScenarioConfig;
use runtime::App;

type CityTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Raw-mode alternate screen that is handed back to the shell when dropped,
/// including when the city loop bails out with an error.
struct CityScreen {
    terminal: CityTerminal,
}

impl CityScreen {
    fn open() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                Err(e)
            }
        }
    }
}

impl Drop for CityScreen {
    fn drop(&mut self) {
        let restored = disable_raw_mode()
            .and_then(|()| execute!(self.terminal.backend_mut(), LeaveAlternateScreen))
            .and_then(|()| self.terminal.show_cursor());
        if let Err(e) = restored {
            warn!(error = %e, "terminal not fully restored");
        }
    }
}

/// Opens the city view for `scenario` and plays it until the user quits.
///
/// `label` names the scenario in the header until a preset key swaps it.
///
/// # Errors
///
/// Any I/O error from opening the screen, drawing a frame, or reading input.
/// The terminal is restored before the error is returned.
pub fn run(scenario: ScenarioConfig, label: &str) -> io::Result<()> {
    let mut screen = CityScreen::open()?;
    let mut app = App::new(scenario, label);
    play(&mut screen.terminal, &mut app)
}

/// Whether the engine owes a tick at `now`.
fn tick_due(app: &App, now: Instant) -> bool {
    !app.is_paused()
        && !app.is_finished()
        && now.saturating_duration_since(app.last_tick) >= app.tick_interval()
}

/// Draws the city, handles keys, and advances the engine on its own clock.
fn play(terminal: &mut CityTerminal, app: &mut App) -> io::Result<()> {
    while !app.quit {
        terminal.draw(|frame| layout::render(frame, app))?;

        let deadline = app.last_tick + app.tick_interval();
        if event::poll(deadline.saturating_duration_since(Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                controls::handle_key(app, key);
            }
        }

        let now = Instant::now();
        if tick_due(app, now) {
            app.tick();
            app.last_tick = now;
        }
    }
    // final frame so the last keypress is reflected before teardown
    terminal.draw(|frame| layout::render(frame, app))?;
    Ok(())
}
