use clap::{Command, CommandFactory, FromArgMatches, Parser};
use envy_core::{ClapOverlay, Environment, ProcessEnv};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const ENV_PREFIX: &str = "EXAMPLE";

#[derive(Debug, Parser, Serialize)]
#[command(name = "envy-example")]
#[command(about = "Print options resolved from defaults, EXAMPLE_* variables and flags")]
#[serde(rename_all = "PascalCase")]
struct Example {
    /// set the url
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    url: String,
    /// perform the thing once and exit
    #[arg(long)]
    once: bool,
    /// a standard count
    #[arg(long, default_value_t = 13)]
    count: i64,
    /// a fancy count
    #[arg(long, default_value_t = 7)]
    count_fancy: i64,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), String> {
    let command = build_command(&ProcessEnv).map_err(|err| err.to_string())?;
    let matches = command.get_matches();
    let opts = Example::from_arg_matches(&matches).map_err(|err| err.to_string())?;
    debug!(?opts, "resolved options");

    let json = serde_json::to_string_pretty(&opts)
        .map_err(|err| format!("JSON serialization failed: {err}"))?;
    println!("{json}");
    Ok(())
}

/// Builds the clap command with `EXAMPLE_*` overrides applied. `once` and
/// `count-fancy` only come from the command line.
fn build_command<E: Environment + ?Sized>(env: &E) -> envy_core::Result<Command> {
    let mut overlay = ClapOverlay::new(Example::command());
    overlay.disable("once")?;
    overlay.disable("count-fancy")?;
    debug!(prefix = ENV_PREFIX, "resolving environment overrides");
    overlay.resolve(ENV_PREFIX, env)
}
