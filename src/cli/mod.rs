//! CLI module for the avalanche gateway
//!
//! - `serve`: run the HTTP server

pub mod serve;

use clap::{Parser, Subcommand};

/// Avalanche Gateway - caching layer in front of the portal upstreams
#[derive(Parser)]
#[command(name = "avalanche-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["avalanche-gateway", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["avalanche-gateway", "ui"]).is_err());
    }
}
