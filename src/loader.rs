use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use roxmltree::{Document, Node};
use tracing::{debug, error, info};

use crate::graph::AirportGraph;
use crate::model::{EdgeRecord, NodeRecord, ParseError};

const TOOLTIP_ATTR: &str = "tooltip";

#[derive(Clone, Debug)]
pub struct FetchSettings {
    pub insecure: bool,
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            insecure: false,
            timeout: Duration::from_secs(10),
        }
    }
}

pub fn is_remote(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Reads the dataset text from a local path or an http(s) URL.
pub fn read_source(source: &str, settings: &FetchSettings) -> Result<String> {
    let source = source.trim();
    if is_remote(source) {
        return fetch_remote(source, settings);
    }
    let path = Path::new(source);
    fs::read_to_string(path).with_context(|| format!("Failed to read dataset: {}", path.display()))
}

fn fetch_remote(url: &str, settings: &FetchSettings) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .danger_accept_invalid_certs(settings.insecure)
        .timeout(settings.timeout)
        .build()
        .map_err(|err| {
            error!("client error: {err}");
            anyhow!("Client error: {err}")
        })?;

    debug!("fetching dataset from {url}");
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to fetch dataset: {url}"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("HTTP {} fetching {url}", status));
    }
    resp.text()
        .with_context(|| format!("Failed to read dataset body: {url}"))
}

/// Extracts node and edge records from a GraphML document.
pub fn parse_graphml(text: &str) -> Result<(Vec<NodeRecord>, Vec<EdgeRecord>), ParseError> {
    let doc = Document::parse(text).map_err(|err| ParseError::Document(err.to_string()))?;
    let root = doc.root_element();
    let graph = root
        .descendants()
        .find(|n| n.has_tag_name("graph"))
        .ok_or_else(|| ParseError::Document("no <graph> element".to_string()))?;

    let tooltip_key = tooltip_key(root);

    let mut nodes = Vec::new();
    for node in graph.descendants().filter(|n| n.has_tag_name("node")) {
        let id = parse_id("node", node.attribute("id").unwrap_or(""))?;
        let tooltip = node
            .children()
            .find(|c| c.has_tag_name("data") && c.attribute("key") == Some(tooltip_key.as_str()))
            .map(|c| c.text().unwrap_or("").trim().to_string())
            .ok_or(ParseError::MissingTooltip { node: id })?;
        nodes.push(NodeRecord { id, tooltip });
    }

    let mut edges = Vec::new();
    for edge in graph.descendants().filter(|n| n.has_tag_name("edge")) {
        let source = parse_id("edge source", edge.attribute("source").unwrap_or(""))?;
        let target = parse_id("edge target", edge.attribute("target").unwrap_or(""))?;
        edges.push(EdgeRecord { source, target });
    }

    debug!("graphml: {} nodes, {} edges", nodes.len(), edges.len());
    Ok((nodes, edges))
}

/// The `<data key=..>` used for tooltips: the id of the node key declared with
/// `attr.name="tooltip"`, or the literal `tooltip`.
fn tooltip_key(root: Node) -> String {
    root.descendants()
        .filter(|n| n.has_tag_name("key"))
        .find(|n| {
            n.attribute("attr.name") == Some(TOOLTIP_ATTR)
                && n.attribute("for").map_or(true, |f| f == "node" || f == "all")
        })
        .and_then(|n| n.attribute("id"))
        .unwrap_or(TOOLTIP_ATTR)
        .to_string()
}

fn parse_id(element: &'static str, raw: &str) -> Result<i64, ParseError> {
    let trimmed = raw.trim();
    let digits = trimmed.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    digits.parse::<i64>().map_err(|_| ParseError::InvalidId {
        element,
        value: raw.to_string(),
    })
}

pub fn load_graph(source: &str, settings: &FetchSettings) -> Result<AirportGraph> {
    let text = read_source(source, settings)?;
    let (nodes, edges) =
        parse_graphml(&text).with_context(|| format!("Failed to parse dataset: {source}"))?;
    let graph = AirportGraph::build(&nodes, &edges)
        .with_context(|| format!("Failed to build graph from {source}"))?;
    info!("loaded {} airports from {source}", graph.airports.len());
    Ok(graph)
}
