//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crs_text::config::Settings;
use crs_text::defaults::{DATABASE_ENV_VAR, SETTINGS_ENV_VAR};

use crate::commands;

/// crs-text - Convert and inspect coordinate reference system definitions
#[derive(Parser, Debug)]
#[command(name = "crs-text")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Settings file (YAML)
    #[arg(long, global = true, value_name = "FILE", env = SETTINGS_ENV_VAR)]
    config: Option<PathBuf>,

    /// Metadata repository (JSON), overriding the settings file
    #[arg(long, global = true, value_name = "FILE", env = DATABASE_ENV_VAR)]
    database: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a CRS or operation between WKT and pipeline strings
    Convert(commands::convert::ConvertArgs),

    /// Detect the WKT dialect of a text
    Dialect(commands::dialect::DialectArgs),

    /// List coordinate operations between two CRSs
    Operations(commands::operations::OperationsArgs),

    /// Show information about the metadata repository or an object
    Info(commands::info::InfoArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // A second initialization only happens in tests; ignore it.
        let _ = env_logger::Builder::new()
            .parse_filters(&self.log_level)
            .format_timestamp(None)
            .try_init();

        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(database) = self.database {
            settings.database.path = Some(database);
        }

        match self.command {
            Commands::Convert(args) => commands::convert::execute(args, &settings),
            Commands::Dialect(args) => commands::dialect::execute(args, &settings),
            Commands::Operations(args) => commands::operations::execute(args, &settings),
            Commands::Info(args) => commands::info::execute(args, &settings),
        }
    }
}
