//! Command-line interface for the tender proxy.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cyber50 - cybersecurity tender aggregator
/// Caching proxy in front of the tender scraping service
#[derive(Parser)]
#[command(name = "cyber50")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the caching proxy (default)
    #[command(alias = "server")]
    Serve {
        /// Listen on this port instead of the configured one
        #[arg(long)]
        port: Option<u16>,
    },

    /// Fetch tenders once and print them
    #[command(alias = "f")]
    Fetch {
        /// Case-insensitive text matched against title, number and contact
        #[arg(long, short)]
        search: Option<String>,

        /// Only show tenders with this status ("all" for every status)
        #[arg(long)]
        status: Option<String>,

        /// Print the matching tender records as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// List the configured search keywords
    #[command(alias = "kw")]
    Keywords,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
