use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `<node>` element as delivered by the loader, before the tooltip is decoded.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct NodeRecord {
    pub id: i64,
    pub tooltip: String,
}

/// A `<edge>` element. The dataset lists every route in both directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EdgeRecord {
    pub source: i64,
    pub target: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("node {node}: tooltip {tooltip:?} does not look like NAME(lngx=LON,laty=LAT)")]
    TooltipPattern { node: i64, tooltip: String },
    #[error("node {node}: {field} value {value:?} is not a number")]
    InvalidCoordinate {
        node: i64,
        field: &'static str,
        value: String,
    },
    #[error("node {node} has no tooltip data")]
    MissingTooltip { node: i64 },
    #[error("{element} id {value:?} is not an integer")]
    InvalidId {
        element: &'static str,
        value: String,
    },
    #[error("duplicate airport id {0}")]
    DuplicateId(i64),
    #[error("edge {from}->{to} references an unknown airport")]
    UnknownEndpoint { from: i64, to: i64 },
    #[error("malformed graph document: {0}")]
    Document(String),
}

fn tooltip_pattern() -> &'static Regex {
    static RE_TOOLTIP: OnceLock<Regex> = OnceLock::new();
    RE_TOOLTIP.get_or_init(|| {
        Regex::new(r"([A-Z]+)\(lngx=(.+),laty=(.+)\)").expect("tooltip pattern is valid")
    })
}

pub fn parse_tooltip(node: i64, tooltip: &str) -> Result<Tooltip, ParseError> {
    let caps = tooltip_pattern()
        .captures(tooltip)
        .ok_or_else(|| ParseError::TooltipPattern {
            node,
            tooltip: tooltip.to_string(),
        })?;

    let lon = parse_coordinate(node, "lngx", &caps[2])?;
    let lat = parse_coordinate(node, "laty", &caps[3])?;

    Ok(Tooltip {
        name: caps[1].to_string(),
        lon,
        lat,
    })
}

fn parse_coordinate(node: i64, field: &'static str, raw: &str) -> Result<f64, ParseError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidCoordinate {
            node,
            field,
            value: raw.to_string(),
        })
}
