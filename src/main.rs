use anyhow::Result;
use tracing::{debug, info, warn};

use airline_map::app::App;
use airline_map::config::parse_args;
use airline_map::loader::{load_graph, FetchSettings};
use airline_map::logging::init as init_logging;
use airline_map::runtime::{init_terminal, restore_terminal, run_app};

fn main() -> Result<()> {
    let config = parse_args()?;
    let _log_guard = init_logging(&config);
    info!("airline-map starting");
    debug!("config path: {}", config.config_path.display());

    let settings = FetchSettings {
        insecure: config.insecure,
        timeout: config.fetch_timeout,
    };
    // Loading happens before the terminal is taken over so errors print plainly.
    let graph = load_graph(&config.data, &settings)?;
    let app = App::new(graph, &config);

    let mut terminal = init_terminal()?;
    let res = run_app(&mut terminal, app);
    restore_terminal(&mut terminal)?;

    if let Err(err) = res {
        warn!("runtime error: {err}");
        eprintln!("{err}");
    }

    info!("airline-map exited");
    Ok(())
}
