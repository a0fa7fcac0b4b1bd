use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category used when nothing better can be resolved
pub const DEFAULT_CATEGORY: &str = "Other";

/// Sentinel account used when the input names no account
pub const DEFAULT_ACCOUNT: &str = "Default Account";

/// Billing cycle of the underlying subscription price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
    Weekly,
}

/// Average weeks per month, used for weekly-to-monthly conversion
const WEEKS_PER_MONTH: f64 = 4.33;

impl BillingCycle {
    /// Derive the monthly cost from a cycle-priced amount, rounded to 2 decimals.
    /// The monthly cost is always derived, never entered directly.
    pub fn monthly_cost(&self, cost: f64) -> f64 {
        let monthly = match self {
            BillingCycle::Monthly => cost,
            BillingCycle::Yearly => cost / 12.0,
            BillingCycle::Weekly => cost * WEEKS_PER_MONTH,
        };
        round2(monthly)
    }
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Unvalidated draft fields as they arrive from an extraction, a pattern
/// matcher, or the delegate's JSON reply. Everything is optional and loosely
/// typed; the normalizer is the only component that turns this into a
/// [`SubscriptionDraft`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftFields {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    /// Accepts both a JSON number and a numeric string
    #[serde(default)]
    pub monthly_cost: Option<serde_json::Value>,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub is_trial: Option<bool>,
    #[serde(default)]
    pub trial_duration_days: Option<u32>,
    #[serde(default)]
    pub trial_start_date: Option<String>,
    #[serde(default)]
    pub trial_end_date: Option<String>,
}

/// A validated, normalized subscription proposal. Created by exactly one of
/// the extraction, pattern, or delegate paths and handed off once; the core
/// never re-reads a draft after hand-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDraft {
    pub service_name: Option<String>,
    pub service_category: String,
    pub account: String,
    pub monthly_cost: Option<f64>,
    pub payment_date: NaiveDate,
    pub is_trial: bool,
    pub trial_duration_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_end_date: Option<NaiveDate>,
}

impl SubscriptionDraft {
    /// Back-convert to the loose field shape, e.g. to re-run normalization
    pub fn to_fields(&self) -> DraftFields {
        DraftFields {
            service_name: self.service_name.clone(),
            service_category: Some(self.service_category.clone()),
            account: Some(self.account.clone()),
            monthly_cost: self
                .monthly_cost
                .and_then(|c| serde_json::Number::from_f64(c).map(serde_json::Value::Number)),
            payment_date: Some(self.payment_date.to_string()),
            is_trial: Some(self.is_trial),
            trial_duration_days: Some(self.trial_duration_days),
            trial_start_date: self.trial_start_date.map(|d| d.to_string()),
            trial_end_date: self.trial_end_date.map(|d| d.to_string()),
        }
    }

    /// Name/category pair proposed for downstream service de-duplication.
    /// The core never mutates persisted services.
    pub fn service_proposal(&self) -> Option<ServiceProposal> {
        self.service_name.as_ref().map(|name| ServiceProposal {
            name: name.clone(),
            category: self.service_category.clone(),
        })
    }
}

/// A proposed service identity for the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProposal {
    pub name: String,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_cycle_passthrough() {
        assert_eq!(BillingCycle::Monthly.monthly_cost(15.49), 15.49);
    }

    #[test]
    fn test_yearly_cycle_division() {
        assert_eq!(BillingCycle::Yearly.monthly_cost(99.99), 8.33);
        assert_eq!(BillingCycle::Yearly.monthly_cost(120.0), 10.0);
    }

    #[test]
    fn test_weekly_cycle_multiplication() {
        assert_eq!(BillingCycle::Weekly.monthly_cost(2.99), 12.95);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(8.3325), 8.33);
        assert_eq!(round2(12.9467), 12.95);
        assert_eq!(round2(10.0), 10.0);
    }

    #[test]
    fn test_draft_fields_accepts_numeric_string_cost() {
        let json = r#"{"service_name": "Netflix", "monthly_cost": "15.49"}"#;
        let fields: DraftFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.service_name.as_deref(), Some("Netflix"));
        assert!(fields.monthly_cost.is_some());
    }

    #[test]
    fn test_service_proposal() {
        let draft = SubscriptionDraft {
            service_name: Some("Spotify".into()),
            service_category: "Music".into(),
            account: DEFAULT_ACCOUNT.into(),
            monthly_cost: Some(11.99),
            payment_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            is_trial: false,
            trial_duration_days: 0,
            trial_start_date: None,
            trial_end_date: None,
        };
        let proposal = draft.service_proposal().unwrap();
        assert_eq!(proposal.name, "Spotify");
        assert_eq!(proposal.category, "Music");
    }
}
