//! Scan command: HTML snapshot → signals, classification, draft

use std::path::PathBuf;

use colored::Colorize;

use subwatch::classify;
use subwatch::config::Config;
use subwatch::error::Result;
use subwatch::signals::{self, SignalKind};
use subwatch::slot::DraftSlot;
use subwatch::watcher::{PageEvent, PageSession};

pub fn cmd_scan(file: PathBuf, url: String, title: Option<String>, json: bool) -> Result<()> {
    let config = Config::load()?;
    let html = std::fs::read_to_string(&file)?;

    let title = title
        .or_else(|| signals::extract_title(&html))
        .unwrap_or_default();

    let text = page_text(&html, config.scan_text_limit);

    let mut session = PageSession::new(url, title);
    let detection = session.handle(PageEvent::Loaded {
        text,
        html: html.clone(),
    });

    let result = classify::classify(session.signals());

    // A candidate page produces a draft and hands it off through the slot
    let normalized = detection
        .as_ref()
        .map(|_| subwatch::normalize::normalize_now(session.draft()));
    if let Some(ref n) = normalized {
        DraftSlot::open_default()?.store(n)?;
    }

    if json {
        let output = serde_json::json!({
            "classification": result,
            "signals": session.signals(),
            "draft": normalized,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "\n{} {} (confidence {})",
        "Scan:".bold(),
        if result.is_candidate {
            "subscription candidate".green().to_string()
        } else {
            "no match".to_string()
        },
        result.confidence.to_string().cyan()
    );

    for signal in &session.signals().signals {
        let kind = match signal.kind {
            SignalKind::UrlKeyword => "url",
            SignalKind::ContentKeyword => "keyword",
            SignalKind::PriceToken => "price",
            SignalKind::FormPresence => "form",
        };
        println!("  [{}] {}", kind.cyan(), signal.value);
    }

    if let Some(normalized) = normalized {
        super::print_draft(&normalized.draft);
        if !normalized.success {
            if let Some(reason) = normalized.failure {
                println!("  {} {}", "!".yellow(), reason);
            }
        }
    } else {
        println!();
    }

    Ok(())
}

/// Visible text of the snapshot, bounded by the configured limit
fn page_text(html: &str, limit: usize) -> String {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);
    let Ok(body) = Selector::parse("body") else {
        return String::new();
    };
    let text = document
        .select(&body)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    text.chars().take(limit).collect()
}
