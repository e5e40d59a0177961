use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "typefx", version, about = "Typed-text visual effects engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which rules a line fires
    Match(commands::matching::MatchArgs),
    /// Feed lines into an engine on a virtual clock and print its events
    Simulate(commands::simulate::SimulateArgs),
    /// Read lines from stdin and run effects in real time
    Live(commands::live::LiveArgs),
    /// Rule table inspection
    Rules {
        #[command(subcommand)]
        action: commands::rules::RulesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .with_env_var("TYPEFX_LOG")
        .from_env_lossy();

    // stdout carries JSON; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Match(args) => commands::matching::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Live(args) => commands::live::run(args),
        Commands::Rules { action } => commands::rules::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
