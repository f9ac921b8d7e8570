use std::collections::HashMap;

use tracing::{debug, info};

use crate::geo::{great_circle_m, Bounds};
use crate::model::{parse_tooltip, EdgeRecord, NodeRecord, ParseError};

const FLIGHT_SEARCH_URL: &str = "https://www.google.com/travel/flights?q=";

/// Position of an airport in [`AirportGraph::airports`].
pub type AirportIdx = usize;
/// Position of a flight in [`AirportGraph::flights`].
pub type FlightIdx = usize;

#[derive(Clone, Debug)]
pub struct Airport {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Incident flights in edge-record order.
    pub flights: Vec<FlightIdx>,
    /// `flights.len() / max_flights`, in `[0, 1]`.
    pub size: f64,
    pub total_flights_distance_m: f64,
}

impl Airport {
    pub fn flight_count(&self) -> usize {
        self.flights.len()
    }
}

/// An undirected route. `airport1` always has the smaller dataset id.
#[derive(Clone, Debug)]
pub struct Flight {
    pub airport1: AirportIdx,
    pub airport2: AirportIdx,
    pub distance_m: f64,
}

impl Flight {
    pub fn touches(&self, airport: AirportIdx) -> bool {
        self.airport1 == airport || self.airport2 == airport
    }

    /// The endpoint that is not `from`, or `None` when `from` is not an endpoint.
    pub fn other_end(&self, from: AirportIdx) -> Option<AirportIdx> {
        if self.airport1 == from {
            Some(self.airport2)
        } else if self.airport2 == from {
            Some(self.airport1)
        } else {
            None
        }
    }
}

// Ordered endpoint comparison: (a, b) != (b, a). Construction always stores the
// lower id first so this never matters in practice.
impl PartialEq for Flight {
    fn eq(&self, other: &Self) -> bool {
        self.airport1 == other.airport1 && self.airport2 == other.airport2
    }
}

#[derive(Clone, Debug, Default)]
pub struct AirportGraph {
    pub airports: Vec<Airport>,
    pub flights: Vec<Flight>,
    pub max_flights: usize,
    index_by_id: HashMap<i64, AirportIdx>,
}

impl AirportGraph {
    /// Builds the graph from loader records. The first malformed record aborts
    /// the whole load.
    pub fn build(nodes: &[NodeRecord], edges: &[EdgeRecord]) -> Result<Self, ParseError> {
        let mut graph = AirportGraph::default();

        for node in nodes {
            let tip = parse_tooltip(node.id, &node.tooltip)?;
            if graph.index_by_id.contains_key(&node.id) {
                return Err(ParseError::DuplicateId(node.id));
            }
            graph.index_by_id.insert(node.id, graph.airports.len());
            graph.airports.push(Airport {
                id: node.id,
                name: tip.name,
                lat: tip.lat,
                lon: tip.lon,
                flights: Vec::new(),
                size: 0.0,
                total_flights_distance_m: 0.0,
            });
        }

        let mut skipped = 0usize;
        for edge in edges {
            // Each route appears once per direction; keep the ascending one.
            if edge.source >= edge.target {
                skipped += 1;
                continue;
            }
            let (Some(from), Some(to)) = (graph.by_id(edge.source), graph.by_id(edge.target))
            else {
                return Err(ParseError::UnknownEndpoint {
                    from: edge.source,
                    to: edge.target,
                });
            };

            let a = &graph.airports[from];
            let b = &graph.airports[to];
            let distance_m = great_circle_m(a.lat, a.lon, b.lat, b.lon);

            let flight_idx = graph.flights.len();
            graph.flights.push(Flight {
                airport1: from,
                airport2: to,
                distance_m,
            });
            graph.airports[from].flights.push(flight_idx);
            graph.airports[to].flights.push(flight_idx);
        }

        graph.compute_metrics();
        info!(
            "graph built: {} airports, {} flights, max flights {}",
            graph.airports.len(),
            graph.flights.len(),
            graph.max_flights
        );
        debug!("skipped {skipped} reverse-direction edges");
        Ok(graph)
    }

    fn compute_metrics(&mut self) {
        self.max_flights = self
            .airports
            .iter()
            .map(Airport::flight_count)
            .max()
            .unwrap_or(0);

        let max = self.max_flights;
        for airport in &mut self.airports {
            airport.size = if max == 0 {
                0.0
            } else {
                airport.flights.len() as f64 / max as f64
            };
        }

        for idx in 0..self.airports.len() {
            let total = self.airports[idx]
                .flights
                .iter()
                .map(|&f| self.flights[f].distance_m)
                .sum();
            self.airports[idx].total_flights_distance_m = total;
        }
    }

    pub fn airport(&self, idx: AirportIdx) -> &Airport {
        &self.airports[idx]
    }

    pub fn flight(&self, idx: FlightIdx) -> &Flight {
        &self.flights[idx]
    }

    pub fn by_id(&self, id: i64) -> Option<AirportIdx> {
        self.index_by_id.get(&id).copied()
    }

    pub fn airport_by_name(&self, name: &str) -> Option<AirportIdx> {
        self.airports.iter().position(|a| a.name == name)
    }

    pub fn has_direct_flight_connection(&self, a: AirportIdx, b: AirportIdx) -> bool {
        self.airports[a]
            .flights
            .iter()
            .any(|&f| self.flights[f].other_end(a) == Some(b))
    }

    /// One entry per incident flight, in the airport's flight order.
    pub fn destinations(&self, a: AirportIdx) -> Vec<AirportIdx> {
        self.airports[a]
            .flights
            .iter()
            .filter_map(|&f| self.flights[f].other_end(a))
            .collect()
    }

    pub fn find_flight_to(&self, a: AirportIdx, b: AirportIdx) -> Option<FlightIdx> {
        self.airports[a]
            .flights
            .iter()
            .copied()
            .find(|&f| self.flights[f].other_end(a) == Some(b))
    }

    /// Destinations of `a` sorted by name, each with the connecting flight.
    pub fn destinations_by_name(&self, a: AirportIdx) -> Vec<(AirportIdx, FlightIdx)> {
        let mut list: Vec<(AirportIdx, FlightIdx)> = self
            .destinations(a)
            .into_iter()
            .filter_map(|b| self.find_flight_to(a, b).map(|f| (b, f)))
            .collect();
        list.sort_by(|x, y| self.airports[x.0].name.cmp(&self.airports[y.0].name));
        list
    }

    pub fn sorted_by_name(&self) -> Vec<AirportIdx> {
        let mut ids: Vec<AirportIdx> = (0..self.airports.len()).collect();
        ids.sort_by(|a, b| {
            self.airports[*a]
                .name
                .cmp(&self.airports[*b].name)
                .then_with(|| self.airports[*a].id.cmp(&self.airports[*b].id))
        });
        ids
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.airports.first()?;
        let mut bounds = Bounds {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lon: first.lon,
            max_lon: first.lon,
        };
        for airport in &self.airports[1..] {
            bounds.min_lat = bounds.min_lat.min(airport.lat);
            bounds.max_lat = bounds.max_lat.max(airport.lat);
            bounds.min_lon = bounds.min_lon.min(airport.lon);
            bounds.max_lon = bounds.max_lon.max(airport.lon);
        }
        Some(bounds)
    }

    /// Fare search link for a route, endpoints in stored order.
    pub fn flight_search_url(&self, flight: FlightIdx) -> String {
        let f = &self.flights[flight];
        format!(
            "{FLIGHT_SEARCH_URL}{}+{}",
            self.airports[f.airport1].name, self.airports[f.airport2].name
        )
    }
}
