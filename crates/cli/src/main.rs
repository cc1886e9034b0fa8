mod commands;

use clap::{Parser, Subcommand};
use commands::config::ConfigCommands;
use commands::utils::print_error;

#[derive(Parser)]
#[command(name = "ember", about = "Operator CLI for the Ember cache service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of a running admin server
    #[arg(long, global = true, default_value = "http://127.0.0.1:8090")]
    admin_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and validate configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show cache and poller status of a running server
    Status,

    /// Show the health report of a running server
    Health,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config { command } => commands::config::handle_config_command(command),
        Commands::Status => commands::status::show_status(&cli.admin_url).await,
        Commands::Health => commands::status::show_health(&cli.admin_url).await,
    };

    if let Err(error) = result {
        print_error(&error.to_string());
        std::process::exit(1);
    }
}
