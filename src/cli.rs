use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// File containing the grammar
    pub file: PathBuf,

    /// Check the grammar and report problems without printing it back
    #[arg(short, long)]
    pub check: bool,

    /// Merge rules and linearizations that share a body into one line
    #[arg(short, long)]
    pub grouped: bool
}
