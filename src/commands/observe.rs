//! Observe command: stdin observer messages → coordinator → pending slot

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;

use subwatch::coordinator::{self, Coordinator, ObserverMessage};
use subwatch::error::Result;
use subwatch::slot::DraftSlot;

pub fn cmd_observe(json: bool) -> Result<()> {
    let slot = DraftSlot::open_default()?;
    // In --json mode messages are processed inline so each draft can be
    // echoed; otherwise they go through the coordinator actor.
    let coordinator = (!json).then(|| Coordinator::spawn(slot.clone()));

    let running = Arc::new(AtomicBool::new(true));
    let running_flag = running.clone();
    let _ = ctrlc::set_handler(move || {
        running_flag.store(false, Ordering::SeqCst);
    });

    let stdin = std::io::stdin();
    let mut delivered = 0usize;
    let mut skipped = 0usize;

    for line in stdin.lock().lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ObserverMessage>(&line) {
            Ok(message) => {
                match &coordinator {
                    Some(actor) => actor.deliver(message),
                    None => match coordinator::process(&slot, &message) {
                        Ok(normalized) => println!("{}", serde_json::to_string(&normalized)?),
                        Err(e) => eprintln!("{} {}", "!".yellow(), e),
                    },
                }
                delivered += 1;
            }
            Err(e) => {
                skipped += 1;
                eprintln!("{} skipping malformed message: {}", "!".yellow(), e);
            }
        }
    }

    if let Some(actor) = coordinator {
        actor.shutdown();
    }

    if !json {
        println!(
            "\nProcessed {} message(s), skipped {}.",
            delivered.to_string().cyan(),
            skipped
        );
        println!("Pending draft slot: {}", slot.path().display());
    }
    Ok(())
}
