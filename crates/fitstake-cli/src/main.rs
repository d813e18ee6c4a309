use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "fitstake-cli", version, about = "Fitstake CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Challenge management
    Challenge {
        #[command(subcommand)]
        action: commands::challenge::ChallengeAction,
    },
    /// Participant joining and onboarding
    Member {
        #[command(subcommand)]
        action: commands::member::MemberAction,
    },
    /// Stake payments
    Payment {
        #[command(subcommand)]
        action: commands::payment::PaymentAction,
    },
    /// Bank holder election
    Election {
        #[command(subcommand)]
        action: commands::election::ElectionAction,
    },
    /// Check-in submission
    Checkin {
        #[command(subcommand)]
        action: commands::checkin::CheckinAction,
    },
    /// Time-driven job runner
    Tick {
        #[command(subcommand)]
        action: commands::tick::TickAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Challenge { action } => commands::challenge::run(action),
        Commands::Member { action } => commands::member::run(action),
        Commands::Payment { action } => commands::payment::run(action),
        Commands::Election { action } => commands::election::run(action),
        Commands::Checkin { action } => commands::checkin::run(action),
        Commands::Tick { action } => commands::tick::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
