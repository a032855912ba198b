use calf_core::{Config, Error, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

mod session;

use session::Session;

#[derive(Parser)]
#[command(name = "calfbook")]
#[command(about = "Hanwoo calf record keeping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a record-keeping session (default)
    Session {
        /// Read commands from a file instead of stdin
        #[arg(long)]
        script: Option<PathBuf>,

        /// Fixed clock for the session (YYYY-MM-DDTHH:MM)
        #[arg(long, value_parser = session::parse_timestamp)]
        now: Option<chrono::NaiveDateTime>,
    },

    /// Write a config file with default values
    InitConfig {
        /// Destination (defaults to the standard config path)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The config file may not exist yet when writing one
    if let Some(Commands::InitConfig { path, force }) = cli.command {
        calf_core::logging::init();
        return cmd_init_config(path.or(cli.config), force);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    calf_core::logging::init_with_level(&config.logging.level);

    match cli.command {
        Some(Commands::Session { script, now }) => cmd_session(config, script, now),
        _ => cmd_session(config, None, None),
    }
}

fn cmd_session(
    config: Config,
    script: Option<PathBuf>,
    now: Option<chrono::NaiveDateTime>,
) -> Result<()> {
    let mut session = Session::new(config, now);

    match script {
        Some(path) => {
            let file = File::open(&path)?;
            tracing::info!("Running session script {:?}", path);
            session.run(BufReader::new(file), false)
        }
        None => {
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            session.run(stdin.lock(), interactive)
        }
    }
}

fn cmd_init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path
        .or_else(Config::default_config_path)
        .ok_or_else(|| Error::Config("no config directory on this platform".into()))?;

    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save_to(&path)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}
