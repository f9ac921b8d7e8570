use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use crate::config::Config;
use crate::geo::Bounds;
use crate::graph::{AirportGraph, AirportIdx};
use crate::map::Projection;
use crate::search::{self, SearchResult};
use crate::view::{ViewState, DEFAULT_ZOOM};

/// Pointer hover snaps to an airport within this many cells.
const HOVER_RADIUS_CELLS: f64 = 2.5;
/// Fraction of the visible span moved by one pan step.
const PAN_FRACTION: f64 = 0.1;
/// Padding added around the dataset extent, as a fraction of the span.
const HOME_PADDING: f64 = 0.05;
const STATUS_TTL: Duration = Duration::from_secs(6);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Filter,
    Help,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    Default,
    Amber,
    Ocean,
    Matrix,
    Monochrome,
}

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            ThemeMode::Default => ThemeMode::Amber,
            ThemeMode::Amber => ThemeMode::Ocean,
            ThemeMode::Ocean => ThemeMode::Matrix,
            ThemeMode::Matrix => ThemeMode::Monochrome,
            ThemeMode::Monochrome => ThemeMode::Default,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Default => "DEFAULT",
            ThemeMode::Amber => "AMBER",
            ThemeMode::Ocean => "OCEAN",
            ThemeMode::Matrix => "MATRIX",
            ThemeMode::Monochrome => "MONO",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "amber" | "gold" => ThemeMode::Amber,
            "ocean" | "blue" => ThemeMode::Ocean,
            "matrix" | "green" => ThemeMode::Matrix,
            "mono" | "monochrome" | "bw" | "grayscale" => ThemeMode::Monochrome,
            _ => ThemeMode::Default,
        }
    }
}

pub struct App {
    pub graph: AirportGraph,
    pub view: ViewState,
    pub source: String,
    pub input_mode: InputMode,
    pub theme_mode: ThemeMode,
    pub labels: bool,
    pub search_edit: String,
    pub search_result: SearchResult,
    pub filter_edit: String,
    pub export_dir: PathBuf,
    pub status: Option<(String, SystemTime)>,
    zoom_step: f64,
    max_zoom: f64,
    home: Bounds,
    center: (f64, f64),
    projection: Option<Projection>,
}

impl App {
    pub fn new(graph: AirportGraph, config: &Config) -> Self {
        let view = ViewState::new(&graph);
        let home = home_bounds(&graph);
        let mut app = App {
            graph,
            view,
            source: config.data.clone(),
            input_mode: InputMode::Normal,
            theme_mode: ThemeMode::from_str(&config.theme),
            labels: config.labels,
            search_edit: String::new(),
            search_result: SearchResult::default(),
            filter_edit: String::new(),
            export_dir: PathBuf::from(&config.export_dir),
            status: None,
            zoom_step: config.zoom_step,
            max_zoom: config.max_zoom.max(DEFAULT_ZOOM),
            home,
            center: home.center(),
            projection: None,
        };

        if config.filter_min.is_some() || config.filter_max.is_some() {
            let min = config.filter_min.unwrap_or(0);
            let max = config.filter_max.unwrap_or(app.graph.max_flights);
            app.view.set_filter_range(&app.graph, min, max);
        }
        if let Some(name) = config.select.as_deref() {
            let wanted = search::normalize_query(name);
            match app.graph.airport_by_name(&wanted) {
                Some(idx) => app.view.select_airport(&app.graph, Some(idx)),
                None => app.set_status(format!("No airport named {wanted}")),
            }
        }
        app
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom_level()
    }

    /// Canvas bounds `([lon_min, lon_max], [lat_min, lat_max])` for the current
    /// pan and zoom.
    pub fn map_bounds(&self) -> ([f64; 2], [f64; 2]) {
        let (span_lon, span_lat) = self.home.span();
        let half_lon = span_lon / 2.0 / self.zoom();
        let half_lat = span_lat / 2.0 / self.zoom();
        let (lon, lat) = self.center;
        ([lon - half_lon, lon + half_lon], [lat - half_lat, lat + half_lat])
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = Some(projection);
    }

    fn set_zoom(&mut self, level: f64) {
        let level = level.clamp(DEFAULT_ZOOM, self.max_zoom);
        self.view.notify_zoom(&self.graph, level);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom() * self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom() / self.zoom_step);
    }

    pub fn reset_view(&mut self) {
        self.center = self.home.center();
        self.set_zoom(DEFAULT_ZOOM);
        debug!("view reset");
    }

    pub fn pan(&mut self, dir: MoveDir) {
        let ([x0, x1], [y0, y1]) = self.map_bounds();
        let dx = (x1 - x0) * PAN_FRACTION;
        let dy = (y1 - y0) * PAN_FRACTION;
        match dir {
            MoveDir::Up => self.center.1 += dy,
            MoveDir::Down => self.center.1 -= dy,
            MoveDir::Left => self.center.0 -= dx,
            MoveDir::Right => self.center.0 += dx,
        }
    }

    /// Moves the hover cursor to the closest visible airport in `dir`, starting
    /// from the current hover or from the map centre.
    pub fn move_cursor(&mut self, dir: MoveDir) {
        let origin = match self.view.hovered() {
            Some(idx) => {
                let a = self.graph.airport(idx);
                (a.lon, a.lat)
            }
            None => self.center,
        };
        let next = self
            .view
            .visible_airports()
            .filter(|&idx| Some(idx) != self.view.hovered())
            .filter_map(|idx| {
                let a = self.graph.airport(idx);
                let dx = a.lon - origin.0;
                let dy = a.lat - origin.1;
                let (ahead, side) = match dir {
                    MoveDir::Up => (dy, dx),
                    MoveDir::Down => (-dy, dx),
                    MoveDir::Left => (-dx, dy),
                    MoveDir::Right => (dx, dy),
                };
                (ahead > 0.0).then_some((idx, ahead + 2.0 * side.abs()))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx);

        if let Some(idx) = next {
            self.hover(Some(idx));
            self.keep_in_view(idx);
        }
    }

    fn keep_in_view(&mut self, idx: AirportIdx) {
        let ([x0, x1], [y0, y1]) = self.map_bounds();
        let a = self.graph.airport(idx);
        if a.lon < x0 || a.lon > x1 || a.lat < y0 || a.lat > y1 {
            self.center = (a.lon, a.lat);
        }
    }

    pub fn hover(&mut self, airport: Option<AirportIdx>) {
        if airport != self.view.hovered() {
            self.view.hover(&self.graph, airport);
        }
    }

    /// Hovers the visible airport nearest to a terminal cell, or clears the
    /// hover when none is close enough.
    pub fn hover_at(&mut self, col: u16, row: u16) {
        let target = self.airport_at(col, row);
        self.hover(target);
    }

    pub fn airport_at(&self, col: u16, row: u16) -> Option<AirportIdx> {
        let projection = self.projection?;
        projection.from_cell(col, row)?;
        let (pc, pr) = (col as f64 + 0.5, row as f64 + 0.5);
        self.view
            .visible_airports()
            .filter_map(|idx| {
                let a = self.graph.airport(idx);
                let (c, r) = projection.to_cell(a.lon, a.lat)?;
                // Cells are roughly twice as tall as they are wide.
                let d = ((c - pc).powi(2) + (2.0 * (r - pr)).powi(2)).sqrt();
                (d <= HOVER_RADIUS_CELLS).then_some((idx, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)
    }

    /// Click policy: picking the selected airport again deselects it.
    pub fn toggle_select(&mut self, airport: AirportIdx) {
        if self.view.selected() == Some(airport) {
            self.deselect();
        } else {
            self.select(airport);
        }
    }

    pub fn toggle_select_hovered(&mut self) {
        if let Some(idx) = self.view.hovered() {
            self.toggle_select(idx);
        }
    }

    pub fn select(&mut self, airport: AirportIdx) {
        self.view.select_airport(&self.graph, Some(airport));
        info!("selected {}", self.graph.airport(airport).name);
    }

    pub fn deselect(&mut self) {
        if self.view.selected().is_some() {
            self.view.select_airport(&self.graph, None);
        }
    }

    pub fn start_search(&mut self) {
        self.search_edit.clear();
        self.search_result = SearchResult::default();
        self.input_mode = InputMode::Search;
        debug!("search start");
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search_edit.push(ch);
        self.run_search();
    }

    pub fn backspace_search(&mut self) {
        self.search_edit.pop();
        self.run_search();
    }

    pub fn clear_search(&mut self) {
        self.search_edit.clear();
        self.run_search();
    }

    pub fn close_search(&mut self) {
        self.input_mode = InputMode::Normal;
        debug!("search closed len={}", self.search_edit.len());
    }

    fn run_search(&mut self) {
        self.search_result = search::search(&self.graph, &self.search_edit);
        if let Some(idx) = self.search_result.unique() {
            if self.view.selected() != Some(idx) {
                self.select(idx);
                self.keep_in_view(idx);
            }
        }
    }

    pub fn start_filter(&mut self) {
        let range = self.view.filter();
        self.filter_edit = if self.view.filter_active() {
            format!("{}-{}", range.min, range.max)
        } else {
            String::new()
        };
        self.input_mode = InputMode::Filter;
        debug!("filter edit start");
    }

    pub fn push_filter_char(&mut self, ch: char) {
        if ch.is_ascii_digit() || ch == '-' || ch == ' ' {
            self.filter_edit.push(ch);
        }
    }

    pub fn backspace_filter(&mut self) {
        self.filter_edit.pop();
    }

    pub fn cancel_filter(&mut self) {
        self.filter_edit.clear();
        self.input_mode = InputMode::Normal;
        debug!("filter edit cancel");
    }

    pub fn apply_filter(&mut self) {
        match parse_range(&self.filter_edit, self.graph.max_flights) {
            Ok(Some((min, max))) => {
                self.view.set_filter_range(&self.graph, min, max);
                self.input_mode = InputMode::Normal;
            }
            Ok(None) => {
                self.clear_filter();
                self.input_mode = InputMode::Normal;
            }
            Err(message) => self.set_status(message),
        }
    }

    pub fn clear_filter(&mut self) {
        self.view.clear_filter(&self.graph);
        debug!("filter cleared");
    }

    pub fn toggle_theme(&mut self) {
        self.theme_mode = self.theme_mode.toggle();
    }

    pub fn toggle_labels(&mut self) {
        self.labels = !self.labels;
    }

    pub fn open_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn close_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn set_status(&mut self, message: String) {
        debug!("status: {message}");
        self.status = Some((message, SystemTime::now()));
    }

    pub fn current_status(&self) -> Option<&str> {
        let (message, at) = self.status.as_ref()?;
        let age = SystemTime::now().duration_since(*at).ok()?;
        (age <= STATUS_TTL).then_some(message.as_str())
    }

    /// The airport the info panel describes: the selection, else the hover.
    pub fn focus(&self) -> Option<AirportIdx> {
        self.view.selected().or(self.view.hovered())
    }
}

fn home_bounds(graph: &AirportGraph) -> Bounds {
    let Some(bounds) = graph.bounds() else {
        return Bounds {
            min_lat: -90.0,
            max_lat: 90.0,
            min_lon: -180.0,
            max_lon: 180.0,
        };
    };
    let (span_lon, span_lat) = bounds.span();
    let pad_lon = span_lon * HOME_PADDING;
    let pad_lat = span_lat * HOME_PADDING;
    Bounds {
        min_lat: bounds.min_lat - pad_lat,
        max_lat: bounds.max_lat + pad_lat,
        min_lon: bounds.min_lon - pad_lon,
        max_lon: bounds.max_lon + pad_lon,
    }
}

/// Parses filter input: `min-max`, `min`, `min-`, `-max`, or empty to clear.
pub fn parse_range(raw: &str, max_flights: usize) -> Result<Option<(usize, usize)>, String> {
    let text: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if text.is_empty() {
        return Ok(None);
    }
    let parse = |part: &str, default: usize| -> Result<usize, String> {
        if part.is_empty() {
            Ok(default)
        } else {
            part.parse::<usize>()
                .map_err(|_| format!("Invalid flight count: {part}"))
        }
    };
    match text.split_once('-') {
        Some((lo, hi)) => Ok(Some((parse(lo, 0)?, parse(hi, max_flights)?))),
        None => Ok(Some((parse(&text, 0)?, max_flights))),
    }
}
