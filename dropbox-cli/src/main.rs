use std::{path::PathBuf, process};

use clap::Parser;
use dropbox::path::Root;
use dropbox_cli::{
    commands::{self, Command},
    settings::Settings,
    CliResult,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Command-line access to Dropbox. Prints JSON.
#[derive(Debug, Parser)]
#[command(name = "dropbox", version, about, long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(short, long, global = true, env = "DROPBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Access token (overrides `DROPBOX_ACCESS_TOKEN`)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Root that paths are resolved against: sandbox, dropbox or auto
    #[arg(long, global = true)]
    root: Option<Root>,

    /// Locale for translated messages
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Print compact JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn settings(&self) -> CliResult<Settings> {
        let settings = match self.config {
            Some(ref path) => Settings::from_file(path)?,
            None => Settings::default(),
        };

        let mut settings = settings.with_env()?;

        if let Some(ref token) = self.token {
            settings.access_token = Some(token.clone());
        }

        if let Some(root) = self.root {
            settings.root = root;
        }

        if let Some(ref locale) = self.locale {
            settings.locale = Some(locale.clone());
        }

        Ok(settings)
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let value = match commands::run_offline(&cli.command) {
        Some(value) => value,
        None => {
            let settings = cli.settings()?;
            let client = settings.to_client()?;

            commands::run(&client, &settings, cli.command).await?
        }
    };

    if value.is_null() {
        return Ok(());
    }

    let out = if cli.compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };

    println!("{out}");

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{e}");
        process::exit(e.exit_code());
    }
}
