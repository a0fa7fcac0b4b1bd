//! Parse command: free text → normalized draft

use std::path::PathBuf;

use base64::Engine as _;
use colored::Colorize;

use subwatch::config::Config;
use subwatch::delegate::DelegateClient;
use subwatch::draft::SubscriptionDraft;
use subwatch::error::Result;
use subwatch::matchers::MatcherRegistry;
use subwatch::parse::{ParseRequest, Pipeline};
use subwatch::slot::DraftSlot;

pub fn cmd_parse(text: String, image: Option<PathBuf>, no_delegate: bool, json: bool) -> Result<()> {
    let config = Config::load()?;

    let image_payload = match image {
        Some(path) => {
            let bytes = std::fs::read(&path)?;
            Some(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        None => None,
    };

    let delegate = if no_delegate {
        None
    } else {
        Some(DelegateClient::new(&config.delegate))
    };

    let pipeline = Pipeline::new(MatcherRegistry::builtin(), delegate);
    let request = ParseRequest {
        text,
        image: image_payload,
    };
    let outcome = pipeline.parse(&request);

    // Hand the draft off through the pending slot either way; an
    // unsuccessful draft is what the manual-completion UI picks up.
    let slot = DraftSlot::open_default()?;
    slot.store(&subwatch::normalize::normalize_now(
        outcome.parsed_data.to_fields(),
    ))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if outcome.success {
        println!("{} {}", "✓".green(), outcome.message);
    } else {
        println!("{} {}", "!".yellow(), outcome.message);
    }
    print_draft(&outcome.parsed_data);
    Ok(())
}

pub(crate) fn print_draft(draft: &SubscriptionDraft) {
    let name = draft.service_name.as_deref().unwrap_or("(unresolved)");
    println!("\n  {}: {} ({})", "Service".bold(), name, draft.service_category);
    match draft.monthly_cost {
        Some(cost) => println!("  {}: {}", "Monthly".bold(), format!("{:.2}", cost).cyan()),
        None => println!("  {}: (unresolved)", "Monthly".bold()),
    }
    println!("  {}: {}", "Account".bold(), draft.account);
    println!("  {}: {}", "Next payment".bold(), draft.payment_date);
    if draft.is_trial {
        let window = match (draft.trial_start_date, draft.trial_end_date) {
            (Some(start), Some(end)) => format!(" ({} → {})", start, end),
            _ => String::new(),
        };
        println!(
            "  {}: {} days{}",
            "Trial".bold(),
            draft.trial_duration_days,
            window
        );
    }
    println!();
}
