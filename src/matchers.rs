//! Pattern-based free-text parsing.
//!
//! An ordered registry of per-service matchers evaluated against lower-cased
//! input; the first predicate that matches wins and later entries are not
//! consulted. There is no scoring and no tie-break. New services are added by
//! registration, not by editing control flow.

use crate::draft::{BillingCycle, DraftFields};
use crate::price;
use crate::temporal;

/// Trial duration used when trial intent is present but no explicit
/// duration can be extracted
const DEFAULT_TRIAL_DAYS: u32 = 30;

/// One service matcher: a keyword predicate plus extraction defaults
#[derive(Debug, Clone)]
pub struct ServiceMatcher {
    pub name: String,
    pub category: String,
    keywords: Vec<String>,
    pub default_cost: f64,
    pub default_trial_days: u32,
}

impl ServiceMatcher {
    /// All keywords must be present (lower-cased substring match)
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        keywords: &[&str],
        default_cost: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            default_cost,
            default_trial_days: DEFAULT_TRIAL_DAYS,
        }
    }

    fn matches(&self, lower: &str) -> bool {
        self.keywords.iter().all(|k| lower.contains(k.as_str()))
    }

    fn extract(&self, text: &str) -> DraftFields {
        // A currency-prefixed token wins and may carry a billing period;
        // a bare decimal is read as a monthly amount.
        let (amount, cycle) = match price::scan_price_tokens(text).into_iter().next() {
            Some(token) => {
                let cycle: BillingCycle = token.period.map(Into::into).unwrap_or_default();
                (token.amount, cycle)
            }
            None => (
                price::first_decimal(text).unwrap_or(self.default_cost),
                BillingCycle::Monthly,
            ),
        };
        let monthly = cycle.monthly_cost(amount);

        let is_trial = temporal::has_trial_intent(text);
        let trial_days = if is_trial {
            temporal::parse_trial_days(text).unwrap_or(self.default_trial_days)
        } else {
            0
        };

        DraftFields {
            service_name: Some(self.name.clone()),
            service_category: Some(self.category.clone()),
            monthly_cost: serde_json::Number::from_f64(monthly).map(serde_json::Value::Number),
            is_trial: Some(is_trial),
            trial_duration_days: Some(trial_days),
            ..DraftFields::default()
        }
    }
}

/// Ordered matcher registry; first match wins
#[derive(Debug, Clone)]
pub struct MatcherRegistry {
    matchers: Vec<ServiceMatcher>,
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MatcherRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    /// The built-in registry of well-known services
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ServiceMatcher::new(
            "Amazon Prime",
            "Streaming",
            &["amazon", "prime"],
            14.99,
        ));
        registry.register(ServiceMatcher::new("Netflix", "Streaming", &["netflix"], 15.49));
        registry.register(ServiceMatcher::new("Spotify", "Music", &["spotify"], 11.99));
        registry.register(ServiceMatcher::new(
            "YouTube Premium",
            "Streaming",
            &["youtube"],
            13.99,
        ));
        registry.register(ServiceMatcher::new("iCloud", "Cloud Storage", &["icloud"], 2.99));
        registry.register(ServiceMatcher::new("Disney+", "Streaming", &["disney"], 13.99));
        registry.register(ServiceMatcher::new(
            "ChatGPT Plus",
            "Software",
            &["chatgpt"],
            20.0,
        ));
        registry
    }

    /// Append a matcher; evaluation order is registration order
    pub fn register(&mut self, matcher: ServiceMatcher) {
        self.matchers.push(matcher);
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Run the input through the registry. A miss returns `None` (not an
    /// error) so the caller can fall through to the delegate.
    pub fn parse(&self, text: &str) -> Option<DraftFields> {
        let lower = text.to_lowercase();
        self.matchers
            .iter()
            .find(|m| m.matches(&lower))
            .map(|m| m.extract(text))
    }
}
