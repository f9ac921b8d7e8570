//! Selection, route-count filtering and zoom thresholds over an [`AirportGraph`].
//!
//! Visibility follows a fixed precedence: an active selection decides
//! everything, otherwise an active range filter does, otherwise the zoom
//! threshold does. Hover highlighting is tracked separately and never changes
//! visibility.

use serde::Serialize;
use tracing::{debug, trace};

use crate::graph::{AirportGraph, AirportIdx};

/// `(zoom breakpoint, minimum airport size)` pairs.
pub const ZOOM_THRESHOLDS: [(f64, f64); 4] = [(1.0, 0.1), (1.5, 0.05), (2.0, 0.005), (2.5, 0.0)];

pub const DEFAULT_ZOOM: f64 = 1.0;

/// Size threshold for a zoom level: the entry of the highest breakpoint the
/// zoom strictly exceeds, or the lowest breakpoint's entry below all of them.
pub fn zoom_threshold(zoom: f64) -> f64 {
    let mut bands = ZOOM_THRESHOLDS;
    bands.sort_by(|a, b| b.0.total_cmp(&a.0));
    bands
        .iter()
        .find(|(key, _)| zoom > *key)
        .or_else(|| bands.last())
        .map(|(_, threshold)| *threshold)
        .unwrap_or(0.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FilterRange {
    pub min: usize,
    pub max: usize,
}

#[derive(Clone, Debug)]
pub struct ViewState {
    selected: Option<AirportIdx>,
    hovered: Option<AirportIdx>,
    filter: FilterRange,
    filter_active: bool,
    zoom_level: f64,
    filtered_out: Vec<bool>,
    airport_visible: Vec<bool>,
    flight_visible: Vec<bool>,
    flight_emphasized: Vec<bool>,
    airport_highlight: Vec<bool>,
    flight_highlight: Vec<bool>,
}

impl ViewState {
    pub fn new(graph: &AirportGraph) -> Self {
        let airports = graph.airports.len();
        let flights = graph.flights.len();
        let mut view = ViewState {
            selected: None,
            hovered: None,
            filter: FilterRange {
                min: 0,
                max: graph.max_flights,
            },
            filter_active: false,
            zoom_level: DEFAULT_ZOOM,
            filtered_out: vec![false; airports],
            airport_visible: vec![true; airports],
            flight_visible: vec![true; flights],
            flight_emphasized: vec![false; flights],
            airport_highlight: vec![false; airports],
            flight_highlight: vec![false; flights],
        };
        view.refresh(graph);
        view
    }

    pub fn selected(&self) -> Option<AirportIdx> {
        self.selected
    }

    pub fn hovered(&self) -> Option<AirportIdx> {
        self.hovered
    }

    pub fn filter(&self) -> FilterRange {
        self.filter
    }

    pub fn filter_active(&self) -> bool {
        self.filter_active
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn is_filtered_out(&self, airport: AirportIdx) -> bool {
        self.filtered_out[airport]
    }

    pub fn is_airport_visible(&self, airport: AirportIdx) -> bool {
        self.airport_visible[airport]
    }

    pub fn is_flight_visible(&self, flight: usize) -> bool {
        self.flight_visible[flight]
    }

    pub fn is_flight_emphasized(&self, flight: usize) -> bool {
        self.flight_emphasized[flight]
    }

    pub fn is_airport_highlighted(&self, airport: AirportIdx) -> bool {
        self.airport_highlight[airport]
    }

    pub fn is_flight_highlighted(&self, flight: usize) -> bool {
        self.flight_highlight[flight]
    }

    pub fn visible_airport_count(&self) -> usize {
        self.airport_visible.iter().filter(|v| **v).count()
    }

    pub fn visible_flight_count(&self) -> usize {
        self.flight_visible.iter().filter(|v| **v).count()
    }

    pub fn visible_airports(&self) -> impl Iterator<Item = AirportIdx> + '_ {
        self.airport_visible
            .iter()
            .enumerate()
            .filter_map(|(idx, visible)| visible.then_some(idx))
    }

    /// Sets or clears the selection. Selecting the already selected airport is
    /// a no-op here; toggling is left to the caller.
    pub fn select_airport(&mut self, graph: &AirportGraph, airport: Option<AirportIdx>) {
        self.selected = airport;
        match airport {
            Some(idx) => debug!("selected airport {}", graph.airport(idx).name),
            None => debug!("selection cleared"),
        }
        self.refresh(graph);
    }

    /// Applies an inclusive route-count range exactly as given: an empty range
    /// (`min > max`) or one starting above `max_flights` filters out every
    /// airport. While an airport is selected the flags are updated but
    /// visibility stays with the selection.
    pub fn set_filter_range(&mut self, graph: &AirportGraph, min: usize, max: usize) {
        self.filter = FilterRange { min, max };

        for (idx, airport) in graph.airports.iter().enumerate() {
            let count = airport.flight_count();
            self.filtered_out[idx] = count < min || count > max;
        }
        self.filter_active = min > 0 || max < graph.max_flights;
        debug!(
            "filter range {min}..={max} active={} filtered_out={}",
            self.filter_active,
            self.filtered_out.iter().filter(|v| **v).count()
        );

        if self.selected.is_none() {
            self.refresh(graph);
        }
    }

    pub fn clear_filter(&mut self, graph: &AirportGraph) {
        self.set_filter_range(graph, 0, graph.max_flights);
    }

    pub fn notify_zoom(&mut self, graph: &AirportGraph, level: f64) {
        if level == self.zoom_level {
            return;
        }
        self.zoom_level = level;
        trace!("zoom level {level:.3} threshold {}", zoom_threshold(level));
        if self.selected.is_none() && !self.filter_active {
            self.refresh(graph);
        }
    }

    /// Highlights `airport`, its direct destinations and its flights, replacing
    /// any previous highlight. `None` clears all highlights.
    pub fn hover(&mut self, graph: &AirportGraph, airport: Option<AirportIdx>) {
        self.hovered = airport;
        self.airport_highlight.fill(false);
        self.flight_highlight.fill(false);
        let Some(idx) = airport else {
            return;
        };
        self.airport_highlight[idx] = true;
        for dest in graph.destinations(idx) {
            self.airport_highlight[dest] = true;
        }
        for &flight in &graph.airport(idx).flights {
            self.flight_highlight[flight] = true;
        }
    }

    fn refresh(&mut self, graph: &AirportGraph) {
        self.flight_emphasized.fill(false);
        if let Some(selected) = self.selected {
            self.show_selection(graph, selected);
        } else if self.filter_active {
            self.show_filtered(graph);
        } else {
            self.show_zoom_band(graph);
        }
    }

    fn show_selection(&mut self, graph: &AirportGraph, selected: AirportIdx) {
        for idx in 0..graph.airports.len() {
            self.airport_visible[idx] =
                idx == selected || graph.has_direct_flight_connection(idx, selected);
        }
        for (idx, flight) in graph.flights.iter().enumerate() {
            let touches = flight.touches(selected);
            self.flight_visible[idx] = touches;
            self.flight_emphasized[idx] = touches;
        }
    }

    fn show_filtered(&mut self, graph: &AirportGraph) {
        for idx in 0..graph.airports.len() {
            self.airport_visible[idx] = !self.filtered_out[idx];
        }
        for (idx, flight) in graph.flights.iter().enumerate() {
            self.flight_visible[idx] =
                !(self.filtered_out[flight.airport1] && self.filtered_out[flight.airport2]);
        }
    }

    fn show_zoom_band(&mut self, graph: &AirportGraph) {
        let threshold = zoom_threshold(self.zoom_level);
        for (idx, airport) in graph.airports.iter().enumerate() {
            self.airport_visible[idx] = airport.size >= threshold;
        }
        for (idx, flight) in graph.flights.iter().enumerate() {
            self.flight_visible[idx] =
                self.airport_visible[flight.airport1] && self.airport_visible[flight.airport2];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{zoom_threshold, ViewState};
    use crate::graph::tests::{both_ways, node, sample_graph};
    use crate::graph::AirportGraph;

    fn visibility(view: &ViewState, graph: &AirportGraph) -> (Vec<bool>, Vec<bool>) {
        (
            (0..graph.airports.len())
                .map(|i| view.is_airport_visible(i))
                .collect(),
            (0..graph.flights.len())
                .map(|i| view.is_flight_visible(i))
                .collect(),
        )
    }

    #[test]
    fn zoom_bands() {
        assert_eq!(zoom_threshold(0.5), 0.1);
        assert_eq!(zoom_threshold(1.0), 0.1);
        assert_eq!(zoom_threshold(1.2), 0.1);
        assert_eq!(zoom_threshold(1.5), 0.1);
        assert_eq!(zoom_threshold(1.6), 0.05);
        assert_eq!(zoom_threshold(2.1), 0.005);
        assert_eq!(zoom_threshold(2.5), 0.005);
        assert_eq!(zoom_threshold(8.0), 0.0);
    }

    #[test]
    fn zoom_threshold_never_rises_when_zooming_in() {
        let mut last = f64::INFINITY;
        let mut zoom = 0.25;
        while zoom < 6.0 {
            let threshold = zoom_threshold(zoom);
            assert!(threshold <= last, "zoom {zoom}");
            last = threshold;
            zoom += 0.05;
        }
    }

    #[test]
    fn full_range_is_no_filter() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        view.set_filter_range(&graph, 1, 2);
        assert!(view.filter_active());
        view.set_filter_range(&graph, 0, graph.max_flights);
        assert!(!view.filter_active());
        assert!((0..graph.airports.len()).all(|i| !view.is_filtered_out(i)));
    }

    #[test]
    fn filter_scenario() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        let c = graph.by_id(3).unwrap();
        view.set_filter_range(&graph, 1, 3);
        assert!(view.filter_active());
        assert!(view.is_filtered_out(c));
        assert!(!view.is_airport_visible(c));
        assert_eq!(view.visible_airport_count(), 4);
        assert_eq!(view.visible_flight_count(), 3);
    }

    #[test]
    fn filter_hides_flights_only_between_filtered_airports() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        // Only the hub (3 routes) passes; every route still has the hub as an end.
        view.set_filter_range(&graph, 2, 3);
        assert_eq!(view.visible_airport_count(), 1);
        assert_eq!(view.visible_flight_count(), 3);
        // Only the leaves pass; no route is between two filtered airports.
        view.set_filter_range(&graph, 0, 1);
        assert!(view.is_filtered_out(graph.by_id(1).unwrap()));
        assert_eq!(view.visible_flight_count(), 3);
    }

    #[test]
    fn range_above_busiest_airport_filters_everything() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        view.set_filter_range(&graph, 5, 10);
        assert_eq!(view.filter().min, 5);
        assert_eq!(view.filter().max, 10);
        assert!(view.filter_active());
        assert!((0..graph.airports.len()).all(|i| view.is_filtered_out(i)));
        assert_eq!(view.visible_airport_count(), 0);
        assert_eq!(view.visible_flight_count(), 0);
    }

    #[test]
    fn inverted_range_filters_everything() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        view.set_filter_range(&graph, 3, 1);
        assert!(view.filter_active());
        assert!((0..graph.airports.len()).all(|i| view.is_filtered_out(i)));
        assert_eq!(view.visible_airport_count(), 0);
        assert_eq!(view.visible_flight_count(), 0);
    }

    #[test]
    fn selection_shows_only_neighbourhood() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        let b = graph.by_id(2).unwrap();
        let a = graph.by_id(1).unwrap();
        view.select_airport(&graph, Some(b));
        assert!(view.is_airport_visible(b));
        assert!(view.is_airport_visible(a));
        assert_eq!(view.visible_airport_count(), 2);
        assert_eq!(view.visible_flight_count(), 1);
        for (idx, flight) in graph.flights.iter().enumerate() {
            assert_eq!(view.is_flight_emphasized(idx), flight.touches(b));
        }
    }

    #[test]
    fn reselecting_is_idempotent() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        let a = graph.by_id(1).unwrap();
        view.select_airport(&graph, Some(a));
        let first = visibility(&view, &graph);
        view.select_airport(&graph, Some(a));
        assert_eq!(view.selected(), Some(a));
        assert_eq!(visibility(&view, &graph), first);
    }

    #[test]
    fn deselect_restores_filter_visibility() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        view.set_filter_range(&graph, 1, 3);
        let filtered = visibility(&view, &graph);

        let a = graph.by_id(1).unwrap();
        view.select_airport(&graph, Some(a));
        assert!(!view.is_airport_visible(graph.by_id(3).unwrap()));
        view.select_airport(&graph, None);
        assert_eq!(visibility(&view, &graph), filtered);
        assert!((0..graph.flights.len()).all(|f| !view.is_flight_emphasized(f)));
    }

    #[test]
    fn deselect_restores_zoom_visibility() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        let zoomed = visibility(&view, &graph);
        view.select_airport(&graph, Some(graph.by_id(2).unwrap()));
        view.select_airport(&graph, None);
        assert_eq!(visibility(&view, &graph), zoomed);
    }

    #[test]
    fn filter_change_during_selection_is_deferred() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        let a = graph.by_id(1).unwrap();
        view.select_airport(&graph, Some(a));
        let selected = visibility(&view, &graph);

        view.set_filter_range(&graph, 2, 3);
        assert_eq!(visibility(&view, &graph), selected);
        assert!(view.is_filtered_out(graph.by_id(2).unwrap()));

        view.select_airport(&graph, None);
        assert_eq!(view.visible_airport_count(), 1);
        assert!(view.is_airport_visible(a));
    }

    fn ladder_graph() -> AirportGraph {
        // Hub with 20 spokes plus a chain so sizes span several zoom bands.
        let mut nodes = vec![node(1, "HUB", 0.0, 0.0)];
        let mut edges = Vec::new();
        for id in 2..=22 {
            nodes.push(node(id, "SPK", id as f64, 1.0));
            edges.extend(both_ways(1, id));
        }
        nodes.push(node(100, "LONE", 50.0, 50.0));
        for id in 2..=4 {
            edges.extend(both_ways(id, id + 1));
        }
        AirportGraph::build(&nodes, &edges).unwrap()
    }

    #[test]
    fn zoom_changes_visibility_without_filter_or_selection() {
        let graph = ladder_graph();
        let mut view = ViewState::new(&graph);
        let lone = graph.by_id(100).unwrap();
        // Spokes with 1 route are below 0.1 but above 0.005.
        let at_default = view.visible_airport_count();
        assert!(!view.is_airport_visible(lone));

        view.notify_zoom(&graph, 2.2);
        assert!(view.visible_airport_count() > at_default);
        assert!(!view.is_airport_visible(lone));

        view.notify_zoom(&graph, 3.0);
        assert_eq!(view.visible_airport_count(), graph.airports.len());
        assert!(view.is_airport_visible(lone));
    }

    #[test]
    fn zooming_out_never_reveals_more_airports() {
        let graph = ladder_graph();
        let mut view = ViewState::new(&graph);
        let mut previous = usize::MAX;
        for zoom in [3.0, 2.6, 2.2, 1.8, 1.4, 1.0, 0.6] {
            view.notify_zoom(&graph, zoom);
            let count = view.visible_airport_count();
            assert!(count <= previous, "zoom {zoom}");
            previous = count;
        }
    }

    #[test]
    fn zoom_is_ignored_while_filtering_or_selecting() {
        let graph = ladder_graph();
        let mut view = ViewState::new(&graph);
        view.set_filter_range(&graph, 1, 2);
        let filtered = visibility(&view, &graph);
        view.notify_zoom(&graph, 3.0);
        assert_eq!(view.zoom_level(), 3.0);
        assert_eq!(visibility(&view, &graph), filtered);

        view.clear_filter(&graph);
        assert_eq!(view.visible_airport_count(), graph.airports.len());

        view.select_airport(&graph, Some(graph.by_id(1).unwrap()));
        let selected = visibility(&view, &graph);
        view.notify_zoom(&graph, 1.0);
        assert_eq!(visibility(&view, &graph), selected);
    }

    #[test]
    fn hover_highlight_is_exclusive() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        let a = graph.by_id(1).unwrap();
        let b = graph.by_id(2).unwrap();
        let c = graph.by_id(3).unwrap();

        view.hover(&graph, Some(a));
        assert!(view.is_airport_highlighted(a));
        assert!(view.is_airport_highlighted(b));
        assert!(!view.is_airport_highlighted(c));
        assert!((0..graph.flights.len()).all(|f| view.is_flight_highlighted(f)));

        view.hover(&graph, Some(b));
        assert!(view.is_airport_highlighted(b));
        assert!(view.is_airport_highlighted(a));
        assert!(!view.is_airport_highlighted(graph.by_id(4).unwrap()));
        assert_eq!(
            (0..graph.flights.len())
                .filter(|f| view.is_flight_highlighted(*f))
                .count(),
            1
        );

        view.hover(&graph, None);
        assert!((0..graph.airports.len()).all(|i| !view.is_airport_highlighted(i)));
        assert!((0..graph.flights.len()).all(|f| !view.is_flight_highlighted(f)));
    }

    #[test]
    fn hover_does_not_touch_visibility() {
        let graph = sample_graph();
        let mut view = ViewState::new(&graph);
        view.set_filter_range(&graph, 1, 3);
        let before = visibility(&view, &graph);
        view.hover(&graph, Some(graph.by_id(3).unwrap()));
        assert_eq!(visibility(&view, &graph), before);
        assert!(view.is_airport_highlighted(graph.by_id(3).unwrap()));
    }
}
