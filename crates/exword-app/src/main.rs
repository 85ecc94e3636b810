//! Interactive shell for CASIO EX-word dictionaries.
//!
//! Talks to the built-in simulated dictionary; its model and SD card are set
//! in `exword.toml`. Type `help` for the command list.

mod history;

use anyhow::{Context, Result};

use exword_device::SimulatedConnector;
use exword_terminal::{CommandRegistry, Options, Session, Shell, register_builtins};
use exword_types::ExwordConfig;

use history::ReadlineSource;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = ExwordConfig::load().context("loading exword.toml")?;
    log::info!(
        "simulated {} (sd card: {})",
        config.simulator.model,
        config.simulator.sd_card
    );

    let connector = SimulatedConnector::from_config(&config.simulator);
    let session = Session::new(Box::new(connector), Options {
        debug: config.debug,
        auto_mkdir: config.mkdir,
    });
    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry);

    let mut input = ReadlineSource::new(config.history_path(), config.history_size)
        .context("initialising line editor")?;
    let mut shell = Shell::new(registry, session);
    let stdout = std::io::stdout();
    shell.run(&mut input, &mut stdout.lock())?;
    Ok(())
}
