use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::warn;

use crate::app::{App, InputMode, MoveDir};
use crate::export;
use crate::ui;

pub fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, mut app: App) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    loop {
        terminal.draw(|f| ui::ui(f, &mut app))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => {
                    if !handle_key(&mut app, key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                _ => {}
            }
        }
    }
}

/// Applies one key press. Returns `false` when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    match app.input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Up => app.move_cursor(MoveDir::Up),
            KeyCode::Down => app.move_cursor(MoveDir::Down),
            KeyCode::Left => app.move_cursor(MoveDir::Left),
            KeyCode::Right => app.move_cursor(MoveDir::Right),
            KeyCode::Enter => app.toggle_select_hovered(),
            KeyCode::Esc => app.deselect(),
            KeyCode::Char('/') => app.start_search(),
            KeyCode::Char('r') => app.start_filter(),
            KeyCode::Char('c') => app.clear_filter(),
            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
            KeyCode::Char('-') => app.zoom_out(),
            KeyCode::Char('h') => app.pan(MoveDir::Left),
            KeyCode::Char('j') => app.pan(MoveDir::Down),
            KeyCode::Char('k') => app.pan(MoveDir::Up),
            KeyCode::Char('l') => app.pan(MoveDir::Right),
            KeyCode::Char('0') => app.reset_view(),
            KeyCode::Char('t') => app.toggle_theme(),
            KeyCode::Char('b') => app.toggle_labels(),
            KeyCode::Char('?') => app.open_help(),
            KeyCode::Char('e') => match export::export_csv(app) {
                Ok(path) => app.set_status(format!("SAVED {path}")),
                Err(err) => {
                    warn!("csv export failed: {err:#}");
                    app.set_status(format!("Export failed: {err}"));
                }
            },
            KeyCode::Char('E') => match export::export_json(app) {
                Ok(path) => app.set_status(format!("SAVED {path}")),
                Err(err) => {
                    warn!("json export failed: {err:#}");
                    app.set_status(format!("Export failed: {err}"));
                }
            },
            _ => {}
        },
        InputMode::Search => match key.code {
            KeyCode::Enter | KeyCode::Esc => app.close_search(),
            KeyCode::Backspace => app.backspace_search(),
            KeyCode::Char(ch) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if ch == 'u' {
                    app.clear_search();
                }
            }
            KeyCode::Char(ch) => app.push_search_char(ch),
            _ => {}
        },
        InputMode::Filter => match key.code {
            KeyCode::Enter => app.apply_filter(),
            KeyCode::Esc => app.cancel_filter(),
            KeyCode::Backspace => app.backspace_filter(),
            KeyCode::Char(ch) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if ch == 'u' {
                    app.filter_edit.clear();
                }
            }
            KeyCode::Char(ch) => app.push_filter_char(ch),
            _ => {}
        },
        InputMode::Help => match key.code {
            KeyCode::Esc | KeyCode::Char('?') => app.close_help(),
            _ => {}
        },
    }
    true
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.input_mode != InputMode::Normal {
        return;
    }
    match mouse.kind {
        MouseEventKind::Moved => app.hover_at(mouse.column, mouse.row),
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(idx) = app.airport_at(mouse.column, mouse.row) {
                app.toggle_select(idx);
            }
        }
        MouseEventKind::ScrollUp => app.zoom_in(),
        MouseEventKind::ScrollDown => app.zoom_out(),
        _ => {}
    }
}
