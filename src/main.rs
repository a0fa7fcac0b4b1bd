//! subwatch - subscription signal extraction and parsing CLI

use clap::Parser;

use subwatch::cli::{Cli, Commands};
use subwatch::error::Result;

mod commands;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        if let Some(hint) = e.hint() {
            eprintln!("\n{}", hint);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            text,
            image,
            no_delegate,
            json,
        } => commands::cmd_parse(text, image, no_delegate, json),

        Commands::Scan {
            file,
            url,
            title,
            json,
        } => commands::cmd_scan(file, url, title, json),

        Commands::Observe { json } => commands::cmd_observe(json),

        Commands::Pending { take, json } => commands::cmd_pending(take, json),

        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
