//! Waygate host: loads portal data, then drives the registry from stdin.
#![forbid(unsafe_code)]

mod config;
mod console;
mod watchers;

use std::io;
use std::path::PathBuf;

use clap::Parser;
use waygate_edit::EditStore;
use waygate_io::JsonFileStore;
use waygate_portals::Portals;
use waygate_world::WorldList;

use crate::config::HostConfig;
use crate::console::Console;

#[derive(Parser, Debug)]
#[command(name = "waygate")]
#[command(about = "Portal linking host with an operator console")]
struct Args {
    /// Host config file
    #[arg(long, value_name = "PATH", default_value = "waygate.toml")]
    config: PathBuf,

    /// Reload styles.toml when it changes
    #[arg(long)]
    watch_styles: bool,

    /// Portal data file (overrides the config)
    #[arg(long, value_name = "PATH")]
    data: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = HostConfig::load(&args.config)?;
    if let Some(data) = args.data {
        cfg.data = data;
    }

    let mut catalog = cfg.load_catalog();
    let styles = cfg.load_styles(&mut catalog);
    let mut worlds = WorldList::new();
    for name in &cfg.worlds {
        worlds.load(name);
    }

    let backend = JsonFileStore::new(cfg.data.clone());
    let mut portals = Portals::new(catalog, Some(styles), EditStore::new());
    let report = portals.load_from(&backend)?;
    log::info!(
        "{} portal(s) ready from {} ({} skipped)",
        report.loaded,
        cfg.data.display(),
        report.skipped
    );
    let portals = portals.into_shared();

    if args.watch_styles || cfg.watch_styles {
        watchers::spawn_style_watcher(cfg.styles.clone(), portals.clone());
    }

    let mut console = Console::new(portals, worlds, Box::new(backend));
    console.run(io::stdin().lock(), &mut io::stdout())?;
    log::info!("bye");
    Ok(())
}
