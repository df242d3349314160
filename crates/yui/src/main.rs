// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Yui - a conversational companion agent with long-term memory.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod serve;
mod shell;
mod stats;

/// Yui - a conversational companion agent with long-term memory.
#[derive(Parser, Debug)]
#[command(name = "yui", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch an interactive chat session (default).
    Shell,
    /// Start the web gateway server.
    Serve,
    /// Show aggregate statistics for a user.
    Stats {
        /// User name to report on.
        user: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match yui_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            yui_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.agent.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Stats { user }) => stats::run_stats(config, &user).await,
        Some(Commands::Shell) | None => shell::run_shell(config).await,
    };

    if let Err(e) = result {
        eprintln!("yui: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Advancing the epoch only works under jemalloc; the system
        // allocator would fail here.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn default_config_is_loadable() {
        let config = yui_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, "yui");
    }
}
