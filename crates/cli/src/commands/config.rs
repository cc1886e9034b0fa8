use clap::Subcommand;
use ember_core::config::AppConfig;
use std::path::Path;

use super::utils::{print_info, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = "ember.toml")]
        file: String,
    },

    /// Show the effective configuration
    Show {
        /// Path to config file
        #[arg(short, long, default_value = "ember.toml")]
        file: String,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "ember.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file } => show_config(&file),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = AppConfig::load_from(file).map_err(|e| CliError::Config(e.to_string()))?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!(
        "  Admin server: {}:{}",
        config.server.bind_address, config.server.bind_port
    );
    println!("  RPC endpoint: {}", config.chain.rpc_url);
    println!("  Poll interval: {}s", config.chain.poll_interval_seconds);
    println!("  Cursor file: {}", config.cursor.path);
    println!("  Namespaces: {}", config.cache.namespaces.len());
    let watched = [
        ("heroes", &config.chain.contracts.heroes),
        ("marketplace", &config.chain.contracts.marketplace),
        ("essence", &config.chain.contracts.essence),
        ("activity", &config.chain.contracts.activity),
    ];
    for (name, address) in watched {
        match address {
            Some(address) => println!("  Contract {name}: {address}"),
            None => println!("  Contract {name}: (unwatched)"),
        }
    }

    Ok(())
}

fn show_config(file: &str) -> CliResult<()> {
    let config = AppConfig::load_from(file).map_err(|e| CliError::Config(e.to_string()))?;
    let rendered = toml::to_string_pretty(&config).map_err(|e| CliError::General(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    std::fs::write(output, SAMPLE_CONFIG)?;
    print_success(&format!("Sample configuration generated: {output}"));
    print_info("Set chain.rpc_url and the contract addresses for your deployment");
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# Ember cache service configuration
# Values may be overridden with EMBER__-prefixed environment variables,
# e.g. EMBER__CHAIN__RPC_URL.

[server]
bind_address = "127.0.0.1"
bind_port = 8090

[chain]
rpc_url = "http://localhost:8545"
poll_interval_seconds = 10
fetch_timeout_seconds = 5

[chain.contracts]
heroes = "0x0000000000000000000000000000000000000000"
marketplace = "0x0000000000000000000000000000000000000000"
essence = "0x0000000000000000000000000000000000000000"
activity = "0x0000000000000000000000000000000000000000"

[cursor]
path = "data/cursor.json"

[logging]
level = "info"
format = "pretty"

# Namespace overrides are optional; the built-in set covers metadata,
# listings, heroes, stats, activity and essence.
#
# [[cache.namespaces]]
# name = "metadata"
# ttl_ms = 1800000
# max_size = 500
# strategy = "hybrid"
# invalidate_on = ["hero-evolved"]
"#;
