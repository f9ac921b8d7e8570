// tests/integration_tests.rs

use std::fs;
use std::path::Path;

use airline_map::geo::round_km;
use airline_map::graph::AirportGraph;
use airline_map::loader::parse_graphml;
use airline_map::model::ParseError;
use airline_map::search::search;
use airline_map::view::ViewState;

const SAMPLE: &str = include_str!("fixtures/sample.graphml");

fn sample() -> AirportGraph {
    let (nodes, edges) = parse_graphml(SAMPLE).expect("fixture parses");
    AirportGraph::build(&nodes, &edges).expect("fixture builds")
}

fn idx(graph: &AirportGraph, name: &str) -> usize {
    graph
        .airport_by_name(name)
        .unwrap_or_else(|| panic!("{name} missing"))
}

#[test]
fn test_fixture_builds_graph() {
    let graph = sample();
    assert_eq!(graph.airports.len(), 6);
    assert_eq!(graph.flights.len(), 5);
    assert_eq!(graph.max_flights, 3);

    let ord = idx(&graph, "ORD");
    let den = idx(&graph, "DEN");
    assert_eq!(graph.airport(ord).id, 1);
    assert_eq!(graph.airport(ord).flight_count(), 3);
    assert!((graph.airport(ord).size - 1.0).abs() < 1e-9);
    assert_eq!(graph.airport(den).flight_count(), 0);
    assert_eq!(graph.airport(den).size, 0.0);
}

#[test]
fn test_direct_connections_are_symmetric() {
    let graph = sample();
    let ord = idx(&graph, "ORD");
    let jfk = idx(&graph, "JFK");
    let sea = idx(&graph, "SEA");
    assert!(graph.has_direct_flight_connection(ord, jfk));
    assert!(graph.has_direct_flight_connection(jfk, ord));
    assert!(!graph.has_direct_flight_connection(ord, sea));

    let names: Vec<&str> = graph
        .destinations_by_name(ord)
        .iter()
        .map(|(dest, _)| graph.airport(*dest).name.as_str())
        .collect();
    assert_eq!(names, vec!["ATL", "JFK", "LAX"]);

    let flight = graph.find_flight_to(ord, jfk).expect("ORD-JFK");
    let km = round_km(graph.flight(flight).distance_m);
    assert!((1150..1250).contains(&km), "ORD-JFK {km} km");
}

#[test]
fn test_default_view_hides_unconnected_airport() {
    let graph = sample();
    let view = ViewState::new(&graph);
    assert_eq!(view.visible_airport_count(), 5);
    assert_eq!(view.visible_flight_count(), 5);
    assert!(!view.is_airport_visible(idx(&graph, "DEN")));
}

#[test]
fn test_selection_overrides_filter_until_cleared() {
    let graph = sample();
    let mut view = ViewState::new(&graph);
    let sea = idx(&graph, "SEA");
    let lax = idx(&graph, "LAX");

    view.select_airport(&graph, Some(sea));
    assert_eq!(view.visible_airport_count(), 2);
    assert!(view.is_airport_visible(lax));
    assert_eq!(view.visible_flight_count(), 1);

    view.set_filter_range(&graph, 0, 1);
    assert_eq!(view.visible_airport_count(), 2);
    assert!(view.is_airport_visible(lax));

    view.select_airport(&graph, None);
    let visible: Vec<&str> = view
        .visible_airports()
        .map(|i| graph.airport(i).name.as_str())
        .collect();
    assert_eq!(visible, vec!["DEN", "SEA"]);
    assert_eq!(view.visible_flight_count(), 1);

    view.clear_filter(&graph);
    assert!(!view.filter_active());
    assert_eq!(view.visible_airport_count(), 5);
}

#[test]
fn test_hover_highlights_neighbours_without_changing_visibility() {
    let graph = sample();
    let mut view = ViewState::new(&graph);
    let ord = idx(&graph, "ORD");
    view.hover(&graph, Some(ord));
    for name in ["ORD", "LAX", "JFK", "ATL"] {
        assert!(view.is_airport_highlighted(idx(&graph, name)), "{name}");
    }
    assert!(!view.is_airport_highlighted(idx(&graph, "SEA")));
    assert_eq!(view.visible_airport_count(), 5);

    view.hover(&graph, None);
    assert!(!view.is_airport_highlighted(ord));
}

#[test]
fn test_search_matches_by_substring() {
    let graph = sample();
    let names = |raw: &str| -> Vec<String> {
        search(&graph, raw)
            .matches
            .iter()
            .map(|i| graph.airport(*i).name.clone())
            .collect()
    };
    assert_eq!(names("a"), vec!["ATL", "LAX", "SEA"]);
    assert_eq!(search(&graph, " jf ").unique(), Some(idx(&graph, "JFK")));
    assert!(search(&graph, "").matches.is_empty());
}

#[test]
fn test_unknown_edge_endpoint_aborts_load() {
    let broken = SAMPLE.replace(r#"target="n6""#, r#"target="n9""#);
    let (nodes, edges) = parse_graphml(&broken).expect("still well-formed xml");
    let err = AirportGraph::build(&nodes, &edges).unwrap_err();
    assert_eq!(err, ParseError::UnknownEndpoint { from: 2, to: 9 });
}

#[test]
fn test_malformed_tooltip_aborts_load() {
    let broken = SAMPLE.replace("DEN(lngx=", "DEN[lngx=");
    let (nodes, edges) = parse_graphml(&broken).expect("still well-formed xml");
    assert!(matches!(
        AirportGraph::build(&nodes, &edges),
        Err(ParseError::TooltipPattern { node: 3, .. })
    ));
}

#[test]
fn test_bundled_dataset_loads() {
    let text = fs::read_to_string("res/airlines.graphml").expect("bundled dataset");
    let (nodes, edges) = parse_graphml(&text).expect("bundled dataset parses");
    let graph = AirportGraph::build(&nodes, &edges).expect("bundled dataset builds");
    assert!(graph.airports.len() > 10);
    assert!(graph.max_flights > 0);

    // Each route is kept once, in ascending id order.
    for flight in &graph.flights {
        assert!(
            graph.airport(flight.airport1).id < graph.airport(flight.airport2).id,
            "{} -> {}",
            graph.airport(flight.airport1).name,
            graph.airport(flight.airport2).name
        );
    }

    for (idx, airport) in graph.airports.iter().enumerate() {
        let touching = graph.flights.iter().filter(|f| f.touches(idx)).count();
        assert_eq!(airport.flight_count(), touching, "{}", airport.name);
        assert!((0.0..=1.0).contains(&airport.size), "{}", airport.name);
    }
    assert!(graph.airports.iter().any(|a| a.size == 1.0));
    assert_eq!(
        graph.airports.iter().map(|a| a.flight_count()).max(),
        Some(graph.max_flights)
    );
}

#[test]
fn test_project_structure() {
    let expected_files = vec![
        "src/main.rs",
        "src/lib.rs",
        "src/app.rs",
        "src/ui.rs",
        "src/map.rs",
        "src/config.rs",
        "src/graph.rs",
        "src/view.rs",
        "Cargo.toml",
        "README.md",
    ];

    for file in expected_files {
        assert!(Path::new(file).exists(), "Expected file {} not found", file);
    }
}

#[test]
fn test_cargo_toml_metadata() {
    let cargo_content = fs::read_to_string("Cargo.toml").expect("Failed to read Cargo.toml");

    assert!(
        cargo_content.contains("name = \"airline-map\""),
        "Missing package name"
    );
    assert!(cargo_content.contains("description ="), "Missing description");
    assert!(cargo_content.contains("license ="), "Missing license");
    assert!(cargo_content.contains("readme ="), "Missing readme");
}
