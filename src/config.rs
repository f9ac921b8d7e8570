use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATA: &str = "res/airlines.graphml";
pub const DEFAULT_CONFIG_FILE: &str = "airline-map.toml";
pub const DEFAULT_ALLOW_HTTP: bool = false;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_FILE: &str = "airline-map.log";
pub const DEFAULT_THEME: &str = "default";
pub const DEFAULT_ZOOM_STEP: f64 = 1.25;
pub const MIN_ZOOM_STEP: f64 = 1.05;
pub const DEFAULT_MAX_ZOOM: f64 = 16.0;
pub const DEFAULT_LABELS: bool = false;
pub const DEFAULT_EXPORT_DIR: &str = "exports";

#[derive(Debug, Clone)]
pub struct Config {
    pub data: String,
    pub config_path: PathBuf,
    pub insecure: bool,
    pub allow_http: bool,
    pub allow_insecure: bool,
    pub fetch_timeout: Duration,
    pub log_enabled: bool,
    pub log_level: String,
    pub log_file: String,
    pub theme: String,
    pub zoom_step: f64,
    pub max_zoom: f64,
    pub labels: bool,
    pub filter_min: Option<usize>,
    pub filter_max: Option<usize>,
    pub select: Option<String>,
    pub export_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DEFAULT_DATA.to_string(),
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            insecure: false,
            allow_http: DEFAULT_ALLOW_HTTP,
            allow_insecure: false,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            log_enabled: false,
            log_level: "info".to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            theme: DEFAULT_THEME.to_string(),
            zoom_step: DEFAULT_ZOOM_STEP,
            max_zoom: DEFAULT_MAX_ZOOM,
            labels: DEFAULT_LABELS,
            filter_min: None,
            filter_max: None,
            select: None,
            export_dir: DEFAULT_EXPORT_DIR.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    data: Option<String>,
    insecure: Option<bool>,
    allow_http: Option<bool>,
    allow_insecure: Option<bool>,
    fetch_timeout_secs: Option<u64>,
    log_enabled: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
    theme: Option<String>,
    zoom_step: Option<f64>,
    max_zoom: Option<f64>,
    labels: Option<bool>,
    filter_min: Option<usize>,
    filter_max: Option<usize>,
    select: Option<String>,
    export_dir: Option<String>,
}

pub fn parse_args() -> Result<Config> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_from(&args)
}

fn parse_from(args: &[String]) -> Result<Config> {
    let mut explicit_config: Option<PathBuf> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("--config needs a value"))?;
            explicit_config = Some(PathBuf::from(value));
        }
    }

    let env_config = env::var("AIRMAP_CONFIG").ok().map(PathBuf::from);
    let config_path = explicit_config
        .clone()
        .or(env_config)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = Config {
        config_path: config_path.clone(),
        ..Config::default()
    };

    if config_path.exists() {
        if let Some(file_config) = load_file_config(&config_path)? {
            apply_file_config(&mut config, file_config);
        }
    } else if explicit_config.is_some() {
        return Err(anyhow!("Config file not found: {}", config_path.display()));
    }

    apply_env(&mut config);
    apply_cli(&mut config, args)?;
    validate(&config)?;
    Ok(config)
}

fn env_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "yes" | "on")
}

fn apply_env(config: &mut Config) {
    if let Ok(value) = env::var("AIRMAP_DATA") {
        config.data = value;
    }
    if let Ok(value) = env::var("AIRMAP_INSECURE") {
        config.insecure = env_flag(&value);
    }
    if let Ok(value) = env::var("AIRMAP_ALLOW_HTTP") {
        config.allow_http = env_flag(&value);
    }
    if let Ok(value) = env::var("AIRMAP_ALLOW_INSECURE") {
        config.allow_insecure = env_flag(&value);
    }
    if let Ok(value) = env::var("AIRMAP_FETCH_TIMEOUT") {
        if let Ok(secs) = value.parse::<u64>() {
            config.fetch_timeout = Duration::from_secs(secs.max(1));
        }
    }
    if let Ok(value) = env::var("AIRMAP_LOG_ENABLED") {
        config.log_enabled = env_flag(&value);
    }
    if let Ok(value) = env::var("AIRMAP_LOG_LEVEL") {
        config.log_level = value;
    }
    if let Ok(value) = env::var("AIRMAP_LOG_FILE") {
        config.log_file = value;
    }
    if let Ok(value) = env::var("AIRMAP_THEME") {
        config.theme = value;
    }
    if let Ok(value) = env::var("AIRMAP_ZOOM_STEP") {
        if let Ok(val) = value.parse::<f64>() {
            config.zoom_step = val.max(MIN_ZOOM_STEP);
        }
    }
    if let Ok(value) = env::var("AIRMAP_LABELS") {
        config.labels = env_flag(&value);
    }
    if let Ok(value) = env::var("AIRMAP_FILTER_MIN") {
        if let Ok(val) = value.parse::<usize>() {
            config.filter_min = Some(val);
        }
    }
    if let Ok(value) = env::var("AIRMAP_FILTER_MAX") {
        if let Ok(val) = value.parse::<usize>() {
            config.filter_max = Some(val);
        }
    }
    if let Ok(value) = env::var("AIRMAP_EXPORT_DIR") {
        config.export_dir = value;
    }
}

fn apply_cli(config: &mut Config, args: &[String]) -> Result<()> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                iter.next();
            }
            "--data" => {
                config.data = next_value(&mut iter, "--data")?;
            }
            "--insecure" => config.insecure = true,
            "--allow-http" => config.allow_http = true,
            "--allow-insecure" => config.allow_insecure = true,
            "--fetch-timeout" => {
                let secs: u64 = next_parsed(&mut iter, "--fetch-timeout")?;
                config.fetch_timeout = Duration::from_secs(secs.max(1));
            }
            "--log" => config.log_enabled = true,
            "--no-log" => config.log_enabled = false,
            "--log-level" => {
                config.log_level = next_value(&mut iter, "--log-level")?;
            }
            "--log-file" => {
                config.log_file = next_value(&mut iter, "--log-file")?;
            }
            "--theme" => {
                config.theme = next_value(&mut iter, "--theme")?;
            }
            "--zoom-step" => {
                let step: f64 = next_parsed(&mut iter, "--zoom-step")?;
                config.zoom_step = step.max(MIN_ZOOM_STEP);
            }
            "--max-zoom" => {
                let max: f64 = next_parsed(&mut iter, "--max-zoom")?;
                config.max_zoom = max.max(1.0);
            }
            "--labels" => config.labels = true,
            "--no-labels" => config.labels = false,
            "--min-flights" => {
                config.filter_min = Some(next_parsed(&mut iter, "--min-flights")?);
            }
            "--max-flights" => {
                config.filter_max = Some(next_parsed(&mut iter, "--max-flights")?);
            }
            "--select" => {
                config.select = Some(next_value(&mut iter, "--select")?);
            }
            "--export-dir" => {
                config.export_dir = next_value(&mut iter, "--export-dir")?;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                return Err(anyhow!("Unknown argument: {other}"));
            }
        }
    }
    Ok(())
}

fn next_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| anyhow!("{flag} needs a value"))
}

fn next_parsed<'a, T: std::str::FromStr>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<T> {
    let value = next_value(iter, flag)?;
    value
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow!("{flag} got invalid value {value:?}"))
}

fn load_file_config(path: &Path) -> Result<Option<FileConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let cfg: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(Some(cfg))
}

fn apply_file_config(target: &mut Config, file: FileConfig) {
    if let Some(data) = file.data {
        target.data = data;
    }
    if let Some(insecure) = file.insecure {
        target.insecure = insecure;
    }
    if let Some(allow_http) = file.allow_http {
        target.allow_http = allow_http;
    }
    if let Some(allow_insecure) = file.allow_insecure {
        target.allow_insecure = allow_insecure;
    }
    if let Some(secs) = file.fetch_timeout_secs {
        target.fetch_timeout = Duration::from_secs(secs.max(1));
    }
    if let Some(log_enabled) = file.log_enabled {
        target.log_enabled = log_enabled;
    }
    if let Some(log_level) = file.log_level {
        target.log_level = log_level;
    }
    if let Some(log_file) = file.log_file {
        target.log_file = log_file;
    }
    if let Some(theme) = file.theme {
        target.theme = theme;
    }
    if let Some(zoom_step) = file.zoom_step {
        target.zoom_step = zoom_step.max(MIN_ZOOM_STEP);
    }
    if let Some(max_zoom) = file.max_zoom {
        target.max_zoom = max_zoom.max(1.0);
    }
    if let Some(labels) = file.labels {
        target.labels = labels;
    }
    if let Some(filter_min) = file.filter_min {
        target.filter_min = Some(filter_min);
    }
    if let Some(filter_max) = file.filter_max {
        target.filter_max = Some(filter_max);
    }
    if let Some(select) = file.select {
        target.select = Some(select);
    }
    if let Some(export_dir) = file.export_dir {
        target.export_dir = export_dir;
    }
}

fn print_help() {
    println!("airline-map");
    println!("Usage: airline-map [--data PATH|URL] [--config PATH]");
    println!("       [--insecure] [--allow-http] [--allow-insecure] [--fetch-timeout SECS]");
    println!("       [--log] [--no-log] [--log-level LEVEL] [--log-file PATH]");
    println!("       [--theme default|amber|ocean|matrix|mono]");
    println!("       [--zoom-step FACTOR] [--max-zoom FACTOR] [--labels] [--no-labels]");
    println!("       [--min-flights N] [--max-flights N] [--select NAME]");
    println!("       [--export-dir PATH]");
    println!("Environment: AIRMAP_DATA sets the dataset path or URL");
    println!("Environment: AIRMAP_CONFIG overrides config path");
    println!("Environment: AIRMAP_INSECURE=1 enables invalid TLS certs");
    println!("Environment: AIRMAP_ALLOW_HTTP=1 allows http:// URLs");
    println!("Environment: AIRMAP_ALLOW_INSECURE=1 allows --insecure");
    println!("Environment: AIRMAP_LOG_ENABLED/LEVEL/FILE configure logging");
    println!("Environment: AIRMAP_THEME AIRMAP_ZOOM_STEP AIRMAP_LABELS control display");
    println!("Environment: AIRMAP_FILTER_MIN/MAX set the initial route-count filter");
    println!("Environment: AIRMAP_EXPORT_DIR sets where snapshots are written");
    println!("Keys: q quit | arrows move | enter select | esc deselect | / search");
    println!("      r range filter | c clear filter | +/- zoom | hjkl pan | 0 reset");
    println!("      t theme | b labels | e export csv | E export json | ? help");
}

fn validate(config: &Config) -> Result<()> {
    let data = config.data.trim();
    if data.is_empty() {
        return Err(anyhow!("No dataset configured (use --data or AIRMAP_DATA)"));
    }
    if data.to_ascii_lowercase().starts_with("http://") && !config.allow_http {
        return Err(anyhow!(
            "Refusing insecure http URL (set allow_http=true or AIRMAP_ALLOW_HTTP=1 to override)"
        ));
    }
    if config.insecure && !config.allow_insecure {
        return Err(anyhow!(
            "Refusing --insecure without explicit allow_insecure=true or AIRMAP_ALLOW_INSECURE=1"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        dir.push(format!("airline-map-config-test-{suffix}"));
        let _ = fs::create_dir_all(&dir);
        dir.push(name);
        dir
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn default_local_dataset_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn http_url_rejected_unless_allowed() {
        let mut cfg = Config {
            data: "http://example.test/airlines.graphml".to_string(),
            ..Config::default()
        };
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("Refusing insecure http URL"));
        cfg.allow_http = true;
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn insecure_requires_opt_in() {
        let mut cfg = Config {
            insecure: true,
            ..Config::default()
        };
        assert!(validate(&cfg).is_err());
        cfg.allow_insecure = true;
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn load_file_config_parses_values() {
        let path = temp_file("config.toml");
        let content = r#"
data = "data/routes.graphml"
log_enabled = true
log_level = "debug"
theme = "amber"
zoom_step = 1.5
labels = true
filter_min = 2
filter_max = 40
select = "ORD"
"#;
        fs::write(&path, content).unwrap();
        let cfg = load_file_config(&path).unwrap().unwrap();
        assert_eq!(cfg.data.as_deref(), Some("data/routes.graphml"));
        assert_eq!(cfg.log_enabled, Some(true));
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.theme.as_deref(), Some("amber"));
        assert_eq!(cfg.zoom_step, Some(1.5));
        assert_eq!(cfg.labels, Some(true));
        assert_eq!(cfg.filter_min, Some(2));
        assert_eq!(cfg.filter_max, Some(40));
        assert_eq!(cfg.select.as_deref(), Some("ORD"));
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn apply_file_config_overrides_and_clamps() {
        let mut cfg = Config::default();
        let file = FileConfig {
            zoom_step: Some(1.0),
            max_zoom: Some(0.5),
            fetch_timeout_secs: Some(0),
            export_dir: Some("snapshots".to_string()),
            ..Default::default()
        };
        apply_file_config(&mut cfg, file);
        assert_eq!(cfg.zoom_step, MIN_ZOOM_STEP);
        assert_eq!(cfg.max_zoom, 1.0);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(1));
        assert_eq!(cfg.export_dir, "snapshots");
    }

    #[test]
    fn cli_flags_apply() {
        let mut cfg = Config::default();
        apply_cli(
            &mut cfg,
            &args(&[
                "--data",
                "other.graphml",
                "--min-flights",
                "3",
                "--select",
                "JFK",
                "--labels",
                "--zoom-step",
                "2",
            ]),
        )
        .unwrap();
        assert_eq!(cfg.data, "other.graphml");
        assert_eq!(cfg.filter_min, Some(3));
        assert_eq!(cfg.select.as_deref(), Some("JFK"));
        assert!(cfg.labels);
        assert_eq!(cfg.zoom_step, 2.0);
    }

    #[test]
    fn cli_rejects_unknown_and_incomplete_flags() {
        let mut cfg = Config::default();
        assert!(apply_cli(&mut cfg, &args(&["--bogus"])).is_err());
        let err = apply_cli(&mut cfg, &args(&["--min-flights", "many"])).unwrap_err();
        assert!(err.to_string().contains("--min-flights"));
        assert!(apply_cli(&mut cfg, &args(&["--data"])).is_err());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let err = parse_from(&args(&["--config", "/nonexistent/airline-map.toml"])).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
