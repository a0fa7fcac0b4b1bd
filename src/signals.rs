use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::price;

/// Page text is truncated to this many characters before scanning
pub const SCAN_TEXT_LIMIT: usize = 5_000;

/// URL keywords checked as a single boolean signal
const URL_KEYWORDS: &[&str] = &[
    "subscribe", "signup", "billing", "checkout", "pricing", "plans", "payment", "premium", "pro",
];

/// Bilingual content keywords; distinct hits are counted
const CONTENT_KEYWORDS: &[&str] = &[
    "subscribe",
    "subscription",
    "billing",
    "upgrade",
    "purchase",
    "checkout",
    "membership",
    "free trial",
    "renew",
    "plan",
    "订阅",
    "账单",
    "升级",
    "购买",
    "会员",
    "免费试用",
    "续费",
    "套餐",
    "支付",
    "结算",
];

/// Selectors associated with subscribe/checkout/billing forms and buttons
const FORM_SELECTORS: &[&str] = &[
    "form[action*='subscribe']",
    "form[action*='checkout']",
    "form[action*='billing']",
    "form[action*='payment']",
    "button[class*='subscribe']",
    "button[class*='checkout']",
    "button[id*='subscribe']",
    "button[id*='checkout']",
    "a[href*='checkout']",
    "a[class*='subscribe']",
    "[data-testid*='subscribe']",
    "input[name*='card-number']",
    "input[name*='cardnumber']",
];

/// Maximum price-token signals recorded per scan
const MAX_PRICE_SIGNALS: usize = 5;

/// Kind of evidence a signal carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    UrlKeyword,
    ContentKeyword,
    PriceToken,
    FormPresence,
}

/// One observed piece of evidence. Ephemeral: generated per page-scan,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// The bounded signal set produced by one page scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalSet {
    pub signals: Vec<Signal>,
}

impl SignalSet {
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// URL keyword signal (boolean, recorded at most once)
    pub fn url_keyword(&self) -> bool {
        self.has_kind(SignalKind::UrlKeyword)
    }

    /// Number of distinct content-keyword hits
    pub fn content_keyword_count(&self) -> usize {
        self.signals
            .iter()
            .filter(|s| s.kind == SignalKind::ContentKeyword)
            .count()
    }

    pub fn price_token(&self) -> bool {
        self.has_kind(SignalKind::PriceToken)
    }

    pub fn form_presence(&self) -> bool {
        self.has_kind(SignalKind::FormPresence)
    }

    /// Values of the content-keyword signals, for the observer wire message
    pub fn keyword_matches(&self) -> Vec<String> {
        self.by_kind(SignalKind::ContentKeyword)
    }

    /// Raw price tokens found on the page
    pub fn prices(&self) -> Vec<String> {
        self.by_kind(SignalKind::PriceToken)
    }

    fn has_kind(&self, kind: SignalKind) -> bool {
        self.signals.iter().any(|s| s.kind == kind)
    }

    fn by_kind(&self, kind: SignalKind) -> Vec<String> {
        self.signals
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.value.clone())
            .collect()
    }
}

/// Scan a page snapshot for subscription/payment evidence.
///
/// Pure and total: no I/O, always returns, never fails. The text is
/// truncated to [`SCAN_TEXT_LIMIT`] characters before scanning.
pub fn scan_page(url: &str, title: &str, text: &str, html: &str) -> SignalSet {
    let truncated: String = text.chars().take(SCAN_TEXT_LIMIT).collect();
    let mut signals = Vec::new();

    scan_url(url, &mut signals);
    scan_content(title, &truncated, &mut signals);
    scan_prices(&truncated, &mut signals);
    scan_forms(html, &mut signals);

    SignalSet { signals }
}

fn scan_url(url: &str, signals: &mut Vec<Signal>) {
    let lower = url.to_lowercase();
    // Substring match, so "pro" also fires on product/profile URLs; accepted
    // as a bounded false-positive source.
    if let Some(kw) = URL_KEYWORDS.iter().find(|kw| lower.contains(*kw)) {
        signals.push(Signal {
            kind: SignalKind::UrlKeyword,
            value: (*kw).to_string(),
            context: Some(url.to_string()),
        });
    }
}

fn scan_content(title: &str, text: &str, signals: &mut Vec<Signal>) {
    let haystack = format!("{} {}", title, text).to_lowercase();
    for kw in CONTENT_KEYWORDS {
        if let Some(pos) = haystack.find(kw) {
            signals.push(Signal {
                kind: SignalKind::ContentKeyword,
                value: (*kw).to_string(),
                context: Some(snippet(&haystack, pos, kw.len())),
            });
        }
    }
}

fn scan_prices(text: &str, signals: &mut Vec<Signal>) {
    for token in price::scan_price_tokens(text).into_iter().take(MAX_PRICE_SIGNALS) {
        signals.push(Signal {
            kind: SignalKind::PriceToken,
            value: token.raw,
            context: None,
        });
    }
}

fn scan_forms(html: &str, signals: &mut Vec<Signal>) {
    if html.trim().is_empty() {
        return;
    }
    let document = Html::parse_document(html);
    for selector_str in FORM_SELECTORS {
        // Presence is boolean: record the first matching selector and stop
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text: String = element.text().collect::<Vec<_>>().join(" ");
                let trimmed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                signals.push(Signal {
                    kind: SignalKind::FormPresence,
                    value: (*selector_str).to_string(),
                    context: if trimmed.is_empty() {
                        None
                    } else {
                        Some(snippet(&trimmed, 0, trimmed.len().min(60)))
                    },
                });
                return;
            }
        }
    }
}

/// Short context substring around a match, snapped to char boundaries
fn snippet(text: &str, pos: usize, len: usize) -> String {
    let mut start = pos.saturating_sub(30);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (pos + len + 30).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    text[start..end].trim().to_string()
}

/// Get the page title from an HTML snapshot
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join("").trim().to_string())
}
