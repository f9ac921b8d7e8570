//! Airport and flight network model with an interactive terminal map.
//!
//! The graph is loaded once from GraphML ([`loader`]), kept immutable
//! ([`graph`]), and everything that changes while exploring it lives in
//! [`view::ViewState`].

pub mod app;
pub mod config;
pub mod export;
pub mod geo;
pub mod graph;
pub mod loader;
pub mod logging;
pub mod map;
pub mod model;
pub mod runtime;
pub mod search;
pub mod ui;
pub mod view;
