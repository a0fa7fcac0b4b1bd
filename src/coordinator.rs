//! Observer → coordinator messaging.
//!
//! Each detected page/DOM event becomes one discrete message with a
//! correlation id. The coordinator is a single-consumer actor draining an
//! in-order channel; delivery is fire-and-forget with no acknowledgement
//! beyond best-effort, and no ordering is guaranteed across distinct page
//! sessions.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::TriggerType;
use crate::draft::{BillingCycle, DraftFields};
use crate::error::Result;
use crate::normalize::{self, NormalizedDraft};
use crate::price;
use crate::slot::DraftSlot;
use crate::watcher::{Detection, PageSession};

/// Event payload carried by one observer message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverPayload {
    #[serde(default)]
    pub page_title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<TriggerType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyword_matches: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prices: Vec<String>,
}

/// One message per detected event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverMessage {
    pub action: String,
    #[serde(default = "Uuid::new_v4")]
    pub correlation_id: Uuid,
    pub data: ObserverPayload,
}

impl ObserverMessage {
    /// Build the wire message for a detection fired by a page session
    pub fn from_detection(session: &PageSession, detection: &Detection) -> Self {
        let signals = session.signals();
        Self {
            action: action_for(detection.trigger).to_string(),
            correlation_id: Uuid::new_v4(),
            data: ObserverPayload {
                page_title: session.title().to_string(),
                url: session.url().to_string(),
                content: String::new(),
                trigger_type: Some(detection.trigger),
                keyword_matches: signals.keyword_matches(),
                prices: signals.prices(),
            },
        }
    }
}

fn action_for(trigger: TriggerType) -> &'static str {
    match trigger {
        TriggerType::PageDetected => "subscriptionPageDetected",
        TriggerType::PaymentLink | TriggerType::PaymentForm | TriggerType::PaymentButton => {
            "paymentActionDetected"
        }
        TriggerType::SubscriptionAction
        | TriggerType::PlanSelection
        | TriggerType::BillingCycleChange => "subscriptionActionDetected",
    }
}

/// Single-consumer actor processing observer messages in arrival order
pub struct Coordinator {
    tx: Sender<ObserverMessage>,
    handle: JoinHandle<()>,
}

impl Coordinator {
    /// Spawn the consumer thread. Each processed message overwrites the
    /// pending-draft slot.
    pub fn spawn(slot: DraftSlot) -> Self {
        let (tx, rx) = mpsc::channel::<ObserverMessage>();
        let handle = thread::spawn(move || {
            for message in rx {
                // Best-effort: a message that fails to store is dropped
                let _ = process(&slot, &message);
            }
        });
        Self { tx, handle }
    }

    /// A cloneable sender for page-observer sides
    pub fn sender(&self) -> Sender<ObserverMessage> {
        self.tx.clone()
    }

    /// Fire-and-forget delivery
    pub fn deliver(&self, message: ObserverMessage) {
        let _ = self.tx.send(message);
    }

    /// Close the channel and wait for the consumer to drain
    pub fn shutdown(self) {
        drop(self.tx);
        let _ = self.handle.join();
    }
}

/// Turn one observer message into a normalized draft and hand it off through
/// the pending slot
pub fn process(slot: &DraftSlot, message: &ObserverMessage) -> Result<NormalizedDraft> {
    let normalized = normalize::normalize_now(draft_fields(&message.data));
    slot.store(&normalized)?;
    Ok(normalized)
}

/// Loose draft fields from an observer payload. The page title stands in for
/// the service name; the first reported price sets the cost.
pub fn draft_fields(payload: &ObserverPayload) -> DraftFields {
    let name = crate::watcher::clean_title(&payload.page_title);

    let monthly_cost = payload
        .prices
        .iter()
        .find_map(|raw| price::scan_price_tokens(raw).into_iter().next())
        .or_else(|| price::scan_price_tokens(&payload.content).into_iter().next())
        .map(|token| {
            let cycle: BillingCycle = token.period.map(Into::into).unwrap_or_default();
            cycle.monthly_cost(token.amount)
        })
        .and_then(|c| serde_json::Number::from_f64(c).map(serde_json::Value::Number));

    let is_trial = payload
        .keyword_matches
        .iter()
        .any(|kw| kw == "free trial" || kw == "免费试用");

    DraftFields {
        service_name: if name.is_empty() { None } else { Some(name) },
        monthly_cost,
        is_trial: Some(is_trial),
        ..DraftFields::default()
    }
}
