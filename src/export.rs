use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::App;
use crate::geo::round_km;
use crate::graph::AirportGraph;
use crate::view::{FilterRange, ViewState};

#[derive(Debug, Serialize)]
struct ViewSnapshot<'a> {
    source: &'a str,
    exported_at: String,
    zoom_level: f64,
    filter: FilterRange,
    filter_active: bool,
    selected: Option<&'a str>,
    max_flights: usize,
    airports: Vec<AirportRow<'a>>,
    flights: Vec<FlightRow<'a>>,
}

#[derive(Debug, Serialize)]
struct AirportRow<'a> {
    id: i64,
    name: &'a str,
    lat: f64,
    lon: f64,
    flights: usize,
    size: f64,
    filtered_out: bool,
}

#[derive(Debug, Serialize)]
struct FlightRow<'a> {
    from: &'a str,
    to: &'a str,
    distance_km: i64,
    emphasized: bool,
    search_url: String,
}

pub fn export_csv(app: &App) -> Result<String> {
    let filename = format!("airline-map-{}.csv", Local::now().format("%Y%m%d-%H%M%S"));
    let path = export_path(&app.export_dir, &filename)?;
    fs::write(&path, airports_csv(&app.graph, &app.view))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path.to_string_lossy().to_string())
}

pub fn export_json(app: &App) -> Result<String> {
    let filename = format!("airline-map-{}.json", Local::now().format("%Y%m%d-%H%M%S"));
    let path = export_path(&app.export_dir, &filename)?;
    let snapshot = snapshot(&app.source, &app.graph, &app.view);
    let payload = serde_json::to_string_pretty(&snapshot)?;
    fs::write(&path, payload).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path.to_string_lossy().to_string())
}

/// Visible airports, one row each, in dataset order.
fn airports_csv(graph: &AirportGraph, view: &ViewState) -> String {
    let mut lines = Vec::new();
    lines.push("id,name,lat,lon,flights,size,filtered_out,selected".to_string());
    for idx in view.visible_airports() {
        let a = graph.airport(idx);
        lines.push(format!(
            "{},{},{:.4},{:.4},{},{:.4},{},{}",
            a.id,
            csv_field(&a.name),
            a.lat,
            a.lon,
            a.flight_count(),
            a.size,
            view.is_filtered_out(idx),
            view.selected() == Some(idx)
        ));
    }
    lines.join("\n")
}

fn snapshot<'a>(source: &'a str, graph: &'a AirportGraph, view: &ViewState) -> ViewSnapshot<'a> {
    let airports = view
        .visible_airports()
        .map(|idx| {
            let a = graph.airport(idx);
            AirportRow {
                id: a.id,
                name: &a.name,
                lat: a.lat,
                lon: a.lon,
                flights: a.flight_count(),
                size: a.size,
                filtered_out: view.is_filtered_out(idx),
            }
        })
        .collect();
    let flights = graph
        .flights
        .iter()
        .enumerate()
        .filter(|(idx, _)| view.is_flight_visible(*idx))
        .map(|(idx, f)| FlightRow {
            from: &graph.airport(f.airport1).name,
            to: &graph.airport(f.airport2).name,
            distance_km: round_km(f.distance_m),
            emphasized: view.is_flight_emphasized(idx),
            search_url: graph.flight_search_url(idx),
        })
        .collect();

    ViewSnapshot {
        source,
        exported_at: Local::now().to_rfc3339(),
        zoom_level: view.zoom_level(),
        filter: view.filter(),
        filter_active: view.filter_active(),
        selected: view.selected().map(|idx| graph.airport(idx).name.as_str()),
        max_flights: graph.max_flights,
        airports,
        flights,
    }
}

fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn export_path(dir: &Path, filename: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(filename);
    Ok(if path.exists() { unique_path(&path) } else { path })
}

fn unique_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let mut i = 1;
    loop {
        let name = if ext.is_empty() {
            format!("{stem}-{i}")
        } else {
            format!("{stem}-{i}.{ext}")
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}
