//! Miscellaneous commands: pending, completions

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;

use subwatch::cli::{Cli, CompletionShell};
use subwatch::error::Result;
use subwatch::slot::DraftSlot;

/// Show (or consume) the pending subscription draft
pub fn cmd_pending(take: bool, json: bool) -> Result<()> {
    let slot = DraftSlot::open_default()?;
    let draft = if take { slot.take()? } else { slot.load()? };

    match draft {
        Some(normalized) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&normalized)?);
            } else {
                let status = if normalized.success {
                    "complete".green().to_string()
                } else {
                    "needs manual completion".yellow().to_string()
                };
                println!("\n{} {}", "Pending draft:".bold(), status);
                super::print_draft(&normalized.draft);
                if take {
                    println!("(slot cleared)");
                }
            }
        }
        None => {
            if json {
                println!("null");
            } else {
                println!("No pending draft.");
            }
        }
    }
    Ok(())
}

pub fn cmd_completions(shell: CompletionShell) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => Shell::Bash,
        CompletionShell::Zsh => Shell::Zsh,
        CompletionShell::Fish => Shell::Fish,
        CompletionShell::Powershell => Shell::PowerShell,
    };
    generate(shell, &mut cmd, "subwatch", &mut io::stdout());
    Ok(())
}
