use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "reveille", version, about = "Reveille alarm clock CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alarm management
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Per-date override management
    Override {
        #[command(subcommand)]
        action: commands::override_cmd::OverrideAction,
    },
    /// Show current time, ringing state, and the next alarm
    Status,
    /// Show the next scheduled alarm occurrence
    Next,
    /// Alarm sound library
    Sounds {
        #[command(subcommand)]
        action: commands::sounds::SoundsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the alarm engine in the foreground until ctrl-c
    Run,
}

fn main() {
    // Logs go to stderr so command output stays parseable JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Alarm { action } => commands::alarm::run(action),
        Commands::Override { action } => commands::override_cmd::run(action),
        Commands::Status => commands::status::run_status(),
        Commands::Next => commands::status::run_next(),
        Commands::Sounds { action } => commands::sounds::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Run => commands::run::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
