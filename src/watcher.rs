//! Page-lifetime event watching.
//!
//! A [`PageSession`] is the per-tab context object: it owns the scan state
//! machine, the one-shot detection latches, and the signal set for one page
//! load. Nothing here is shared across pages and nothing is retried — a
//! missed event is simply not observed.

use serde::Serialize;
use url::Url;

use crate::classify::{self, TriggerType};
use crate::draft::{BillingCycle, DraftFields};
use crate::price;
use crate::signals::{self, Signal, SignalSet};

/// Button/link texts and classes that indicate a payment attempt
const PAYMENT_ACTION_KEYWORDS: &[&str] = &[
    "pay", "buy", "purchase", "checkout", "place order", "order now", "支付", "付款", "购买", "下单",
];

/// Texts that indicate a subscription action (signing up, joining)
const SUBSCRIPTION_ACTION_KEYWORDS: &[&str] =
    &["subscribe", "start membership", "join now", "订阅", "开通会员", "加入会员"];

/// Texts that indicate picking a plan tier
const PLAN_KEYWORDS: &[&str] = &["choose plan", "select plan", "get plan", "选择套餐", "plan"];

/// Texts that indicate toggling the billing cycle
const CYCLE_KEYWORDS: &[&str] =
    &["monthly", "yearly", "annually", "annual", "按月", "按年", "每月", "每年"];

/// Form action substrings treated as payment forms
const PAYMENT_FORM_MARKERS: &[&str] = &["checkout", "payment", "billing", "subscribe", "pay"];

/// A known checkout-provider URL pattern
struct ProviderPattern {
    host: &'static str,
    path_prefix: Option<&'static str>,
}

impl ProviderPattern {
    fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host_ok = host == self.host || host.ends_with(&format!(".{}", self.host));
        let path_ok = self
            .path_prefix
            .map_or(true, |prefix| url.path().starts_with(prefix));
        host_ok && path_ok
    }
}

/// Fixed list of known checkout-provider domains/paths; first match wins
const CHECKOUT_PROVIDERS: &[ProviderPattern] = &[
    ProviderPattern { host: "checkout.stripe.com", path_prefix: None },
    ProviderPattern { host: "pay.stripe.com", path_prefix: None },
    ProviderPattern { host: "paypal.com", path_prefix: Some("/checkoutnow") },
    ProviderPattern { host: "paypal.com", path_prefix: Some("/webapps/hermes") },
    ProviderPattern { host: "pay.google.com", path_prefix: None },
    ProviderPattern { host: "buy.itunes.apple.com", path_prefix: None },
    ProviderPattern { host: "checkout.paddle.com", path_prefix: None },
    ProviderPattern { host: "lemonsqueezy.com", path_prefix: Some("/checkout") },
    ProviderPattern { host: "checkout.shopify.com", path_prefix: None },
    ProviderPattern { host: "excashier.alipay.com", path_prefix: None },
];

/// Scan state for one page load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Scanning,
    NoMatch,
    Candidate,
}

/// A page/DOM event delivered to the session
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// Page finished loading; carries the text and DOM snapshot
    Loaded { text: String, html: String },
    /// A link or button was clicked
    Clicked {
        text: String,
        class: String,
        nearby_price: Option<String>,
    },
    /// A form was submitted
    FormSubmitted {
        action: String,
        button_text: Option<String>,
    },
    /// The page URL changed without a full load (SPA navigation, redirects)
    UrlChanged { url: String },
}

/// Action-specific context attached to a detection
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearby_price: Option<String>,
}

/// An emitted detection, tagged with what fired it
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub trigger: TriggerType,
    pub confidence: u8,
    pub signals: Vec<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ActionContext>,
}

/// Per-page-lifetime watcher context
#[derive(Debug)]
pub struct PageSession {
    url: String,
    title: String,
    state: ScanState,
    // One-shot latches: each flips to true at most once per page load to
    // suppress duplicate notifications.
    payment_detected: bool,
    subscription_action_detected: bool,
    signals: SignalSet,
}

impl PageSession {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            state: ScanState::Idle,
            payment_detected: false,
            subscription_action_detected: false,
            signals: SignalSet::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn signals(&self) -> &SignalSet {
        &self.signals
    }

    /// Feed one event through the session. Returns a detection when a
    /// transition fires; a missed or duplicate event returns `None`.
    pub fn handle(&mut self, event: PageEvent) -> Option<Detection> {
        match event {
            PageEvent::Loaded { text, html } => self.on_loaded(&text, &html),
            PageEvent::Clicked {
                text,
                class,
                nearby_price,
            } => self.on_clicked(&text, &class, nearby_price),
            PageEvent::FormSubmitted {
                action,
                button_text,
            } => self.on_form_submitted(&action, button_text),
            PageEvent::UrlChanged { url } => self.on_url_changed(url),
        }
    }

    fn on_loaded(&mut self, text: &str, html: &str) -> Option<Detection> {
        self.state = ScanState::Scanning;
        self.signals = signals::scan_page(&self.url, &self.title, text, html);
        let result = classify::classify(&self.signals);

        if result.is_candidate {
            self.state = ScanState::Candidate;
            Some(Detection {
                trigger: TriggerType::PageDetected,
                confidence: result.confidence,
                signals: self.signals.signals.clone(),
                context: None,
            })
        } else {
            // No signals is not an error; no event is emitted
            self.state = ScanState::NoMatch;
            None
        }
    }

    fn on_clicked(
        &mut self,
        text: &str,
        class: &str,
        nearby_price: Option<String>,
    ) -> Option<Detection> {
        let haystack = format!("{} {}", text, class).to_lowercase();

        let trigger = if contains_any(&haystack, CYCLE_KEYWORDS) {
            TriggerType::BillingCycleChange
        } else if contains_any(&haystack, PLAN_KEYWORDS) {
            TriggerType::PlanSelection
        } else if contains_any(&haystack, PAYMENT_ACTION_KEYWORDS) {
            TriggerType::PaymentButton
        } else if contains_any(&haystack, SUBSCRIPTION_ACTION_KEYWORDS) {
            TriggerType::SubscriptionAction
        } else {
            return None;
        };

        let context = ActionContext {
            element_text: Some(text.to_string()),
            element_class: if class.is_empty() {
                None
            } else {
                Some(class.to_string())
            },
            nearby_price,
        };
        self.emit(trigger, context)
    }

    fn on_form_submitted(&mut self, action: &str, button_text: Option<String>) -> Option<Detection> {
        let lower = action.to_lowercase();
        if !contains_any(&lower, PAYMENT_FORM_MARKERS) {
            return None;
        }
        let context = ActionContext {
            element_text: button_text,
            element_class: None,
            nearby_price: None,
        };
        self.emit(TriggerType::PaymentForm, context)
    }

    fn on_url_changed(&mut self, url: String) -> Option<Detection> {
        let parsed = Url::parse(&url).ok();
        self.url = url;

        let parsed = parsed?;
        if !CHECKOUT_PROVIDERS.iter().any(|p| p.matches(&parsed)) {
            return None;
        }
        let context = ActionContext {
            element_text: Some(self.url.clone()),
            element_class: None,
            nearby_price: None,
        };
        self.emit(TriggerType::PaymentLink, context)
    }

    /// Apply the one-shot latch for the trigger's family, then emit
    fn emit(&mut self, trigger: TriggerType, context: ActionContext) -> Option<Detection> {
        let latch = match trigger {
            TriggerType::PaymentLink | TriggerType::PaymentForm | TriggerType::PaymentButton => {
                &mut self.payment_detected
            }
            _ => &mut self.subscription_action_detected,
        };
        if *latch {
            return None;
        }
        *latch = true;

        let confidence = classify::classify(&self.signals).confidence;
        Some(Detection {
            trigger,
            confidence,
            signals: self.signals.signals.clone(),
            context: Some(context),
        })
    }

    /// Turn the page-level evidence into loose draft fields for the
    /// normalizer. The page title stands in for the service name.
    pub fn draft(&self) -> DraftFields {
        let name = clean_title(&self.title);

        let monthly_cost = self
            .signals
            .prices()
            .first()
            .and_then(|raw| price::scan_price_tokens(raw).into_iter().next())
            .map(|token| {
                let cycle: BillingCycle = token.period.map(Into::into).unwrap_or_default();
                cycle.monthly_cost(token.amount)
            })
            .and_then(|c| serde_json::Number::from_f64(c).map(serde_json::Value::Number));

        let is_trial = self
            .signals
            .keyword_matches()
            .iter()
            .any(|kw| kw == "free trial" || kw == "免费试用");

        DraftFields {
            service_name: if name.is_empty() { None } else { Some(name) },
            monthly_cost,
            is_trial: Some(is_trial),
            ..DraftFields::default()
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Strip trailing site-name segments from a page title
pub(crate) fn clean_title(title: &str) -> String {
    let mut head = title;
    for sep in [" - ", " | ", " – ", " — "] {
        if let Some((before, _)) = head.split_once(sep) {
            head = before;
        }
    }
    head.trim().chars().take(60).collect()
}
