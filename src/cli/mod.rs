//! CLI interface for quote-consolidator
//!
//! A single command: consolidate the given feed files, stream top of book
//! changes to stdout, then print per-symbol statistics.

mod run;

pub use run::RunArgs;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "quote-consolidator")]
#[command(about = "Consolidates time-ordered quote feeds into per-symbol composite top of book")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}
