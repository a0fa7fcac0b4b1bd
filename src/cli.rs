use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Parser)]
#[command(name = "subwatch")]
#[command(author, version, about = "Turn page signals and free text into subscription drafts", long_about = None)]
#[command(after_help = r#"Examples:
  subwatch parse "netflix for $15.49/month"            Parse a description
  subwatch parse "添加amazon prime 服务 一个月6.99"     Bilingual input works too
  subwatch scan page.html --url https://netflix.com/signup
  cat events.jsonl | subwatch observe                  Feed observer messages
  subwatch pending                                     Show the pending draft

Quick Start:
  1. subwatch parse "spotify premium 11.99"
  2. subwatch pending --take
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a free-text description into a subscription draft
    #[command(after_help = r#"Examples:
  subwatch parse "netflix for $15.49/month"
  subwatch parse "添加amazon prime 服务 一个月6.99 前三个月免费"
  subwatch parse "some unknown service 4.99" --no-delegate
  subwatch parse "see receipt" --image receipt.png
  subwatch parse "disney plus yearly $99.99" --json
"#)]
    Parse {
        /// Natural-language description of the subscription
        #[arg(value_name = "TEXT")]
        text: String,

        /// Image file to attach for multimodal delegate input
        #[arg(long)]
        image: Option<PathBuf>,

        /// Skip the remote delegate on a pattern miss
        #[arg(long)]
        no_delegate: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Scan a saved page snapshot for subscription signals
    #[command(after_help = r#"Examples:
  subwatch scan page.html --url https://netflix.com/signup
  subwatch scan pricing.html --url https://example.com/pricing --title "Plans"
  subwatch scan page.html --url https://example.com --json
"#)]
    Scan {
        /// HTML snapshot file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// URL the snapshot was captured from
        #[arg(long)]
        url: String,

        /// Page title (extracted from the HTML if omitted)
        #[arg(long)]
        title: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Read observer messages from stdin and run them through the coordinator
    #[command(after_help = r#"Examples:
  cat events.jsonl | subwatch observe
  tail -f events.jsonl | subwatch observe --json

One JSON message per line:
  {"action": "subscriptionPageDetected",
   "data": {"pageTitle": "Netflix", "url": "https://netflix.com/signup",
            "prices": ["$15.49/month"]}}
"#)]
    Observe {
        /// Print each normalized draft as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show (or consume) the pending subscription draft
    Pending {
        /// Clear the slot after reading
        #[arg(long)]
        take: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}
