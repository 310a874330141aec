use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizlobby-cli", version, about = "Quizlobby CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Popup sequence inspection and simulation
    Popups {
        #[command(subcommand)]
        action: commands::popups::PopupsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Popups { action } => commands::popups::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
