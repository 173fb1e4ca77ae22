//! Interactive results window.
//!
//! Search events arrive over an mpsc channel and are drained once per frame.
//! Closing the window disposes the search; its release is waited for after
//! the terminal has been restored.

mod app;
mod ui;

use crate::engine::SearchEngine;
use crate::search::SearchParameters;
use anyhow::Result;
use app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::sync::Arc;
use std::time::Duration;

pub fn run(engine: Arc<dyn SearchEngine>, parameters: SearchParameters) -> Result<()> {
    // Start before touching the terminal so validation errors print normally
    let mut app = App::start(engine, parameters)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    for task in app.close() {
        task.wait();
    }

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_events();

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for events with timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            // Only handle key press events, not release or repeat
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if app.mode == app::Mode::Help {
                    // Any key closes help
                    app.hide_help();
                    continue;
                }

                match (key.modifiers, key.code) {
                    (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(()),
                    (_, KeyCode::Esc) | (_, KeyCode::Char('q')) => return Ok(()),
                    (_, KeyCode::Char('c')) => app.cancel(),
                    (_, KeyCode::Down) | (_, KeyCode::Char('j')) => app.select_next(),
                    (_, KeyCode::Up) | (_, KeyCode::Char('k')) => app.select_prev(),
                    (_, KeyCode::PageDown) => app.select_page_down(),
                    (_, KeyCode::PageUp) => app.select_page_up(),
                    (_, KeyCode::Home) | (_, KeyCode::Char('g')) => app.select_first(),
                    (_, KeyCode::End) | (_, KeyCode::Char('G')) => app.select_last(),
                    (_, KeyCode::Char('?')) | (_, KeyCode::F(1)) => app.show_help(),
                    _ => {}
                }
            }
        }
    }
}
