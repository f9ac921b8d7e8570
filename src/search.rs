use crate::graph::{AirportGraph, AirportIdx};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Matching airports in name order.
    pub matches: Vec<AirportIdx>,
}

impl SearchResult {
    /// The airport to select: only when the query matched exactly one name.
    pub fn unique(&self) -> Option<AirportIdx> {
        match self.matches.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Substring match of the normalized query against airport names. An empty
/// query matches nothing.
pub fn search(graph: &AirportGraph, raw: &str) -> SearchResult {
    let query = normalize_query(raw);
    if query.is_empty() {
        return SearchResult::default();
    }
    let matches = graph
        .sorted_by_name()
        .into_iter()
        .filter(|&idx| graph.airport(idx).name.contains(&query))
        .collect();
    SearchResult { matches }
}
