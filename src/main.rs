use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use switchbot_rs::{report, Credentials, Result, SwitchBotClient, API_BASE};

/// Print the status of the first device on a SwitchBot account.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Account token
    #[arg(long, env = "SWITCHBOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Account secret used to sign requests
    #[arg(long, env = "SWITCHBOT_API_KEY", hide_env_values = true)]
    secret: Option<String>,

    /// Base url of the API
    #[arg(long, default_value = API_BASE)]
    base_url: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        println!("Error: {}", e);
    }
}

fn run(cli: Cli) -> Result<()> {
    let credentials = Credentials::new(cli.token, cli.secret)?;
    let client = SwitchBotClient::new(&cli.base_url, credentials)?;

    let stdout = io::stdout();
    report::run(&client, &mut stdout.lock())?;
    Ok(())
}
