use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::graph::AirportGraph;
use crate::view::ViewState;

/// Airports at or above this size get a permanent label when labels are on.
pub const LABEL_MIN_SIZE: f64 = 0.5;

#[derive(Clone, Copy)]
pub struct MapTheme {
    pub accent: Color,
    pub dim: Color,
    pub highlight: Color,
    pub selected: Color,
    pub panel_bg: Color,
    pub sizes: [Color; 4],
}

/// Mapping between lon/lat and terminal cells for the last drawn map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub inner: Rect,
}

impl Projection {
    pub fn to_cell(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if lon < x0 || lon > x1 || lat < y0 || lat > y1 {
            return None;
        }
        let w = self.inner.width.max(1) as f64;
        let h = self.inner.height.max(1) as f64;
        let col = self.inner.x as f64 + (lon - x0) / (x1 - x0) * w;
        let row = self.inner.y as f64 + (y1 - lat) / (y1 - y0) * h;
        Some((col, row))
    }

    pub fn from_cell(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        let inner = self.inner;
        if col < inner.x
            || row < inner.y
            || col >= inner.x + inner.width
            || row >= inner.y + inner.height
        {
            return None;
        }
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        let fx = (col - inner.x) as f64 + 0.5;
        let fy = (row - inner.y) as f64 + 0.5;
        let lon = x0 + fx / inner.width as f64 * (x1 - x0);
        let lat = y1 - fy / inner.height as f64 * (y1 - y0);
        Some((lon, lat))
    }
}

pub fn size_band(size: f64) -> usize {
    match size {
        s if s >= 0.5 => 3,
        s if s >= 0.2 => 2,
        s if s >= 0.05 => 1,
        _ => 0,
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &mut App, theme: MapTheme) {
    if app.graph.airports.is_empty() {
        render_empty(f, area, theme);
        return;
    }

    let (x_bounds, y_bounds) = app.map_bounds();
    let inner = Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    app.set_projection(Projection {
        x_bounds,
        y_bounds,
        inner,
    });

    let title = format!(
        "MAP x{:.2}  {} airports  {} routes",
        app.view.zoom_level(),
        app.view.visible_airport_count(),
        app.view.visible_flight_count()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .title(title);

    let graph = &app.graph;
    let view = &app.view;
    let labels = app.labels;
    let canvas = Canvas::default()
        .block(block)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .background_color(theme.panel_bg)
        .marker(Marker::Braille)
        .paint(|ctx| {
            draw_flights(ctx, graph, view, theme);
            ctx.layer();
            draw_airports(ctx, graph, view, theme);
            ctx.layer();
            draw_labels(ctx, graph, view, theme, labels);
        });
    f.render_widget(canvas, area);
}

fn render_empty(f: &mut Frame, area: Rect, theme: MapTheme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .title("MAP");
    let paragraph = Paragraph::new(vec![TextLine::from(Span::styled(
        "No airports loaded",
        Style::default().fg(theme.dim),
    ))])
    .block(block)
    .wrap(Wrap { trim: true })
    .style(Style::default().bg(theme.panel_bg));
    f.render_widget(paragraph, area);
}

// Hidden flights are skipped before any highlight colour is considered.
fn flight_color(view: &ViewState, idx: usize, theme: MapTheme) -> Option<Color> {
    if !view.is_flight_visible(idx) {
        return None;
    }
    if view.is_flight_highlighted(idx) {
        Some(theme.highlight)
    } else if view.is_flight_emphasized(idx) {
        Some(theme.selected)
    } else {
        Some(theme.dim)
    }
}

fn draw_flights(ctx: &mut Context, graph: &AirportGraph, view: &ViewState, theme: MapTheme) {
    // Plain routes first so emphasised and highlighted ones end up on top.
    let mut order: Vec<usize> = (0..graph.flights.len()).collect();
    order.sort_by_key(|&idx| (view.is_flight_highlighted(idx), view.is_flight_emphasized(idx)));
    for idx in order {
        let Some(color) = flight_color(view, idx, theme) else {
            continue;
        };
        let flight = graph.flight(idx);
        let a = graph.airport(flight.airport1);
        let b = graph.airport(flight.airport2);
        ctx.draw(&CanvasLine {
            x1: a.lon,
            y1: a.lat,
            x2: b.lon,
            y2: b.lat,
            color,
        });
    }
}

fn draw_airports(ctx: &mut Context, graph: &AirportGraph, view: &ViewState, theme: MapTheme) {
    let mut bands: [Vec<(f64, f64)>; 4] = Default::default();
    let mut highlighted = Vec::new();
    let mut selected = Vec::new();

    for idx in view.visible_airports() {
        let airport = graph.airport(idx);
        let coord = (airport.lon, airport.lat);
        if view.selected() == Some(idx) {
            selected.push(coord);
        } else if view.is_airport_highlighted(idx) {
            highlighted.push(coord);
        } else {
            bands[size_band(airport.size)].push(coord);
        }
    }

    for (band, coords) in bands.iter().enumerate() {
        if !coords.is_empty() {
            ctx.draw(&Points {
                coords,
                color: theme.sizes[band],
            });
        }
    }
    if !highlighted.is_empty() {
        ctx.draw(&Points {
            coords: &highlighted,
            color: theme.highlight,
        });
    }
    if !selected.is_empty() {
        ctx.draw(&Points {
            coords: &selected,
            color: theme.selected,
        });
    }
}

fn draw_labels(
    ctx: &mut Context,
    graph: &AirportGraph,
    view: &ViewState,
    theme: MapTheme,
    labels: bool,
) {
    for idx in view.visible_airports() {
        let airport = graph.airport(idx);
        let is_focus = view.selected() == Some(idx) || view.hovered() == Some(idx);
        if is_focus || (labels && airport.size >= LABEL_MIN_SIZE) {
            let color = if is_focus { theme.accent } else { theme.dim };
            ctx.print(
                airport.lon,
                airport.lat,
                TextLine::from(Span::styled(
                    format!(" {}", airport.name),
                    Style::default().fg(color),
                )),
            );
        }
    }
    // The tooltip stays on the hovered airport even when it is hidden.
    if let Some(idx) = view.hovered() {
        if !view.is_airport_visible(idx) {
            let airport = graph.airport(idx);
            ctx.print(
                airport.lon,
                airport.lat,
                TextLine::from(Span::styled(
                    format!(" {}", airport.name),
                    Style::default().fg(theme.dim),
                )),
            );
        }
    }
}
