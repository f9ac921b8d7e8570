use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, InputMode, ThemeMode};
use crate::geo::round_km;
use crate::graph::{AirportGraph, AirportIdx};
use crate::map::{self, MapTheme};

/// Width of the info panel to the right of the map.
const SIDE_PANEL_WIDTH: u16 = 34;

struct Theme {
    accent: Color,
    warn: Color,
    dim: Color,
    highlight: Color,
    selected: Color,
    header_bg: Color,
    panel_bg: Color,
    sizes: [Color; 4],
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let size = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(size);

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(SIDE_PANEL_WIDTH)])
        .split(chunks[1]);
    render_map(f, body[0], app);
    render_side_panel(f, body[1], app);

    render_footer(f, chunks[2], app);

    if app.input_mode == InputMode::Help {
        render_help_menu(f, size, app);
    }
}

fn render_map(f: &mut Frame, area: Rect, app: &mut App) {
    let theme = theme(app.theme_mode);
    let map_theme = MapTheme {
        accent: theme.accent,
        dim: theme.dim,
        highlight: theme.highlight,
        selected: theme.selected,
        panel_bg: theme.panel_bg,
        sizes: theme.sizes,
    };
    map::render(f, area, app, map_theme);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let range = app.view.filter();
    let filter_text = if app.view.filter_active() {
        format!("{}-{}", range.min, range.max)
    } else {
        "OFF".to_string()
    };
    let selected = app
        .view
        .selected()
        .map(|idx| app.graph.airport(idx).name.clone())
        .unwrap_or_else(|| "--".to_string());

    let line_top = Line::from(vec![
        Span::styled(
            "AIRLINE MAP",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("AIRPORTS {}", app.graph.airports.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::raw(format!("ROUTES {}", app.graph.flights.len())),
        Span::raw(" | "),
        Span::styled(
            format!("MAX {}", app.graph.max_flights),
            Style::default().fg(theme.dim),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("SRC {}", short_source(&app.source)),
            Style::default().fg(theme.dim),
        ),
    ]);

    let line_bottom = Line::from(vec![
        Span::raw(format!("ZOOM x{:.2}", app.zoom())),
        Span::raw(" | "),
        Span::styled(
            format!("FILTER {filter_text}"),
            if app.view.filter_active() {
                Style::default().fg(theme.warn)
            } else {
                Style::default().fg(theme.dim)
            },
        ),
        Span::raw(" | "),
        Span::styled(
            format!("SEL {selected}"),
            Style::default()
                .fg(theme.selected)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::raw(format!("LABELS {}", if app.labels { "ON" } else { "OFF" })),
        Span::raw(" | "),
        Span::raw(format!("THEME {}", app.theme_mode.label())),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title("NETWORK");
    let paragraph = Paragraph::new(vec![line_top, line_bottom])
        .block(block)
        .style(Style::default().bg(theme.header_bg));
    f.render_widget(paragraph, area);
}

fn render_side_panel(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(3)])
        .split(area);

    let info = match app.focus() {
        Some(idx) => {
            let mut lines = airport_info_lines(&app.graph, idx, &theme);
            if let Some(url) = route_link(app) {
                lines.push(Line::from(Span::styled(url, Style::default().fg(theme.highlight))));
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            "Hover or select an airport",
            Style::default().fg(theme.dim),
        ))],
    };
    let title = if app.view.selected().is_some() {
        "SELECTED"
    } else {
        "AIRPORT"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title);
    let paragraph = Paragraph::new(info)
        .block(block)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(theme.panel_bg));
    f.render_widget(paragraph, chunks[0]);

    render_list(f, chunks[1], app, &theme);
}

fn airport_info_lines(graph: &AirportGraph, idx: AirportIdx, theme: &Theme) -> Vec<Line<'static>> {
    let airport = graph.airport(idx);
    vec![
        Line::from(Span::styled(
            airport.name.clone(),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("ID      {}", airport.id)),
        Line::from(format!("POS     {}", fmt_coord(airport.lat, airport.lon))),
        Line::from(format!("FLIGHTS {}", airport.flight_count())),
        Line::from(format!(
            "TOTAL   {} km",
            round_km(airport.total_flights_distance_m)
        )),
    ]
}

/// Fare search link for the route between the selected airport and the
/// hovered destination.
fn route_link(app: &App) -> Option<String> {
    let selected = app.view.selected()?;
    let hovered = app.view.hovered()?;
    let flight = app.graph.find_flight_to(selected, hovered)?;
    Some(app.graph.flight_search_url(flight))
}

/// Search matches while a query is present, otherwise the destinations of the
/// focused airport.
fn render_list(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let rows = area.height.saturating_sub(2) as usize;
    let (title, lines) = if app.input_mode == InputMode::Search || !app.search_edit.is_empty() {
        let title = format!("MATCHES {}", app.search_result.matches.len());
        let lines: Vec<Line> = app
            .search_result
            .matches
            .iter()
            .take(rows)
            .map(|&idx| {
                let airport = app.graph.airport(idx);
                let style = if app.view.selected() == Some(idx) {
                    Style::default().fg(theme.selected)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(
                    format!("{:<8} {:>4} flights", airport.name, airport.flight_count()),
                    style,
                ))
            })
            .collect();
        (title, lines)
    } else if let Some(idx) = app.focus() {
        let destinations = app.graph.destinations_by_name(idx);
        let title = format!("DESTINATIONS {}", destinations.len());
        let lines = destination_lines(&app.graph, &destinations, rows, theme);
        (title, lines)
    } else {
        ("DESTINATIONS".to_string(), Vec::new())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(theme.panel_bg));
    f.render_widget(paragraph, area);
}

fn destination_lines(
    graph: &AirportGraph,
    destinations: &[(AirportIdx, usize)],
    rows: usize,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = destinations
        .iter()
        .take(rows)
        .map(|&(dest, flight)| {
            let km = round_km(graph.flight(flight).distance_m);
            Line::from(vec![
                Span::raw(format!("{:<8}", graph.airport(dest).name)),
                Span::styled(format!("{km:>7} km"), Style::default().fg(theme.dim)),
            ])
        })
        .collect();
    if destinations.len() > rows && rows > 0 {
        lines.pop();
        lines.push(Line::from(Span::styled(
            format!("... {} more", destinations.len() - rows + 1),
            Style::default().fg(theme.dim),
        )));
    }
    lines
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let mut spans = match app.input_mode {
        InputMode::Search => vec![
            Span::styled("SEARCH ", Style::default().fg(theme.accent)),
            Span::raw(app.search_edit.clone()),
            Span::styled("_", Style::default().fg(theme.accent)),
            Span::styled(
                "  Enter/Esc done  Ctrl+U clear",
                Style::default().fg(theme.dim),
            ),
        ],
        InputMode::Filter => vec![
            Span::styled("FLIGHTS ", Style::default().fg(theme.accent)),
            Span::raw(app.filter_edit.clone()),
            Span::styled("_", Style::default().fg(theme.accent)),
            Span::styled(
                format!("  min-max of 0-{}  Enter apply  Esc cancel", app.graph.max_flights),
                Style::default().fg(theme.dim),
            ),
        ],
        InputMode::Normal | InputMode::Help => vec![Span::styled(
            "q quit  arrows move  Enter select  / search  r range  c clear  +/- zoom  hjkl pan  0 home  b labels  t theme  e export  ? help",
            Style::default().fg(theme.dim),
        )],
    };

    if let Some(message) = app.current_status() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            message.to_string(),
            Style::default().fg(theme.warn).add_modifier(Modifier::BOLD),
        ));
    }
    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.panel_bg));
    f.render_widget(paragraph, area);
}

fn render_help_menu(f: &mut Frame, area: Rect, app: &App) {
    let theme = theme(app.theme_mode);
    let popup = centered_rect(60, 24, area);

    f.render_widget(Clear, popup);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default().fg(theme.dim).add_modifier(Modifier::BOLD),
        ))
    };
    let lines = vec![
        Line::from(Span::styled(
            "HELP",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        section("Map"),
        Line::from("  Arrows     Move cursor to next airport"),
        Line::from("  h j k l    Pan"),
        Line::from("  + / -      Zoom in / out (or scroll)"),
        Line::from("  0          Reset view"),
        Line::from("  Mouse      Hover to inspect, click to select"),
        Line::from(""),
        section("Selection"),
        Line::from("  Enter      Select hovered (again to deselect)"),
        Line::from("  Esc        Deselect"),
        Line::from("  /          Search by name (Ctrl+U clear)"),
        Line::from(""),
        section("Filter"),
        Line::from("  r          Flight count range, e.g. 10-50"),
        Line::from("  c          Clear range"),
        Line::from(""),
        section("Display & Export"),
        Line::from("  b          Toggle labels"),
        Line::from("  t          Toggle theme"),
        Line::from("  e / E      Export CSV / JSON"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().fg(theme.dim),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title("HELP");
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(theme.panel_bg));
    f.render_widget(paragraph, popup);
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height.saturating_sub(2)).max(3);
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(height),
            Constraint::Min(1),
        ])
        .split(area);
    let vertical = popup_layout[1];
    let width = (vertical.width * percent_x / 100).max(20);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(width),
            Constraint::Min(1),
        ])
        .split(vertical);
    horizontal[1]
}

fn fmt_coord(lat: f64, lon: f64) -> String {
    let ns = if lat < 0.0 { 'S' } else { 'N' };
    let ew = if lon < 0.0 { 'W' } else { 'E' };
    format!("{:.2}{ns} {:.2}{ew}", lat.abs(), lon.abs())
}

fn short_source(source: &str) -> String {
    let trimmed = source
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    truncate(if name.is_empty() { trimmed } else { name }, 28)
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(1)).collect();
    out.push('~');
    out
}

fn theme(mode: ThemeMode) -> Theme {
    match mode {
        ThemeMode::Default => Theme {
            accent: Color::Yellow,
            warn: Color::LightRed,
            dim: Color::DarkGray,
            highlight: Color::LightCyan,
            selected: Color::Yellow,
            header_bg: Color::Rgb(24, 24, 28),
            panel_bg: Color::Rgb(18, 18, 22),
            sizes: [
                Color::Rgb(90, 90, 110),
                Color::Rgb(120, 150, 200),
                Color::Rgb(150, 200, 255),
                Color::White,
            ],
        },
        ThemeMode::Amber => Theme {
            accent: Color::Rgb(255, 191, 0),
            warn: Color::LightRed,
            dim: Color::Rgb(140, 110, 40),
            highlight: Color::Rgb(255, 220, 120),
            selected: Color::Rgb(255, 191, 0),
            header_bg: Color::Rgb(32, 24, 14),
            panel_bg: Color::Rgb(24, 18, 10),
            sizes: [
                Color::Rgb(110, 85, 30),
                Color::Rgb(170, 130, 40),
                Color::Rgb(220, 170, 60),
                Color::Rgb(255, 230, 160),
            ],
        },
        ThemeMode::Ocean => Theme {
            accent: Color::Rgb(0, 200, 220),
            warn: Color::LightYellow,
            dim: Color::Rgb(80, 120, 130),
            highlight: Color::LightYellow,
            selected: Color::Rgb(0, 200, 220),
            header_bg: Color::Rgb(12, 24, 30),
            panel_bg: Color::Rgb(10, 18, 24),
            sizes: [
                Color::Rgb(40, 80, 100),
                Color::Rgb(40, 130, 160),
                Color::Rgb(60, 180, 210),
                Color::Rgb(180, 240, 250),
            ],
        },
        ThemeMode::Matrix => Theme {
            accent: Color::Green,
            warn: Color::LightGreen,
            dim: Color::Rgb(0, 120, 0),
            highlight: Color::LightGreen,
            selected: Color::White,
            header_bg: Color::Rgb(0, 22, 0),
            panel_bg: Color::Rgb(0, 16, 0),
            sizes: [
                Color::Rgb(0, 80, 0),
                Color::Rgb(0, 140, 0),
                Color::Rgb(0, 200, 0),
                Color::Rgb(160, 255, 160),
            ],
        },
        ThemeMode::Monochrome => Theme {
            accent: Color::White,
            warn: Color::White,
            dim: Color::DarkGray,
            highlight: Color::White,
            selected: Color::White,
            header_bg: Color::Black,
            panel_bg: Color::Black,
            sizes: [Color::DarkGray, Color::Gray, Color::Gray, Color::White],
        },
    }
}
