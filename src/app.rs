//! Shared state handed to every command.

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    /// Print machine-readable JSON instead of human output.
    pub json: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        Ok(Self {
            config,
            json: cli.json,
        })
    }

    pub const fn new(config: Config, json: bool) -> Self {
        Self { config, json }
    }
}
