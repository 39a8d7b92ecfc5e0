use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    name = "ideaflow",
    version,
    about = "Personal notes with tags, categories and a shared community view"
)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Directory holding notes.json and categories.json
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the ideaflow application
    #[clap(subcommand)]
    pub command: Commands,
}
