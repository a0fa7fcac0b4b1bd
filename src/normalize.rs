use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::draft::{DraftFields, SubscriptionDraft, DEFAULT_ACCOUNT, DEFAULT_CATEGORY};

/// Trial duration applied when a trial has no explicit duration
pub const DEFAULT_TRIAL_DAYS: u32 = 30;

/// A draft that has passed through normalization. Unsuccessful drafts are
/// still returned, never discarded, so the caller can prompt for manual
/// completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDraft {
    pub draft: SubscriptionDraft,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Validate and default every field of an incoming draft.
///
/// This is the only place draft fields are validated; every path (page
/// extraction, pattern matcher, delegate) converges here exactly once.
/// Normalization is idempotent: re-running it on its own output produces an
/// identical draft.
pub fn normalize(fields: DraftFields, today: NaiveDate) -> NormalizedDraft {
    let service_name = fields
        .service_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let service_category = fields
        .service_category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let account = fields
        .account
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string());

    let monthly_cost = fields.monthly_cost.as_ref().and_then(parse_cost);

    let payment_date = fields
        .payment_date
        .as_deref()
        .and_then(parse_date)
        .unwrap_or_else(|| first_of_next_month(today));

    let is_trial = fields.is_trial.unwrap_or(false);
    let (trial_duration_days, trial_start_date, trial_end_date) = if is_trial {
        let duration = fields
            .trial_duration_days
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_TRIAL_DAYS);
        let start = fields.trial_start_date.as_deref().and_then(parse_date);
        let end = start.map(|s| s + Duration::days(i64::from(duration)));
        (duration, start, end)
    } else {
        (0, None, None)
    };

    let failure = match (&service_name, &monthly_cost) {
        (Some(_), Some(_)) => None,
        (None, Some(_)) => Some("service name could not be resolved".to_string()),
        (Some(_), None) => Some("monthly cost could not be resolved".to_string()),
        (None, None) => Some("service name and monthly cost could not be resolved".to_string()),
    };

    NormalizedDraft {
        success: failure.is_none(),
        failure,
        draft: SubscriptionDraft {
            service_name,
            service_category,
            account,
            monthly_cost,
            payment_date,
            is_trial,
            trial_duration_days,
            trial_start_date,
            trial_end_date,
        },
    }
}

/// Normalize against the current date
pub fn normalize_now(fields: DraftFields) -> NormalizedDraft {
    normalize(fields, Utc::now().date_naive())
}

/// Accept a finite JSON number or a numeric string
fn parse_cost(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// First day of the month after `today`
fn first_of_next_month(today: NaiveDate) -> NaiveDate {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of month is always valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn fields(name: Option<&str>, cost: Option<f64>) -> DraftFields {
        DraftFields {
            service_name: name.map(String::from),
            monthly_cost: cost
                .and_then(|c| serde_json::Number::from_f64(c).map(serde_json::Value::Number)),
            ..DraftFields::default()
        }
    }

    #[test]
    fn test_successful_draft() {
        let result = normalize(fields(Some("Netflix"), Some(15.49)), today());
        assert!(result.success);
        assert!(result.failure.is_none());
        assert_eq!(result.draft.service_name.as_deref(), Some("Netflix"));
        assert_eq!(result.draft.monthly_cost, Some(15.49));
        assert_eq!(result.draft.service_category, DEFAULT_CATEGORY);
        assert_eq!(result.draft.account, DEFAULT_ACCOUNT);
    }

    #[test]
    fn test_blank_name_is_nulled() {
        let result = normalize(fields(Some("   "), Some(9.99)), today());
        assert!(result.draft.service_name.is_none());
        assert!(!result.success);
        assert!(result.failure.unwrap().contains("service name"));
    }

    #[test]
    fn test_missing_cost_tags_failure() {
        let result = normalize(fields(Some("Netflix"), None), today());
        assert!(!result.success);
        assert!(result.failure.unwrap().contains("monthly cost"));
    }

    #[test]
    fn test_unparseable_cost_becomes_null() {
        let mut f = fields(Some("Netflix"), None);
        f.monthly_cost = Some(serde_json::Value::String("about ten".into()));
        let result = normalize(f, today());
        assert!(result.draft.monthly_cost.is_none());
        assert!(!result.success);
    }

    #[test]
    fn test_numeric_string_cost_parses() {
        let mut f = fields(Some("Netflix"), None);
        f.monthly_cost = Some(serde_json::Value::String("15.49".into()));
        let result = normalize(f, today());
        assert_eq!(result.draft.monthly_cost, Some(15.49));
        assert!(result.success);
    }

    #[test]
    fn test_invalid_payment_date_defaults_to_next_month() {
        let mut f = fields(Some("Netflix"), Some(15.49));
        f.payment_date = Some("soon".into());
        let result = normalize(f, today());
        assert_eq!(
            result.draft.payment_date,
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
        );
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let december = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let result = normalize(fields(Some("Netflix"), Some(15.49)), december);
        assert_eq!(
            result.draft.payment_date,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_valid_payment_date_is_kept() {
        let mut f = fields(Some("Netflix"), Some(15.49));
        f.payment_date = Some("2025-06-15".into());
        let result = normalize(f, today());
        assert_eq!(
            result.draft.payment_date,
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
        );
    }

    #[test]
    fn test_trial_end_derived_from_start() {
        let mut f = fields(Some("Amazon Prime"), Some(6.99));
        f.is_trial = Some(true);
        f.trial_duration_days = Some(90);
        f.trial_start_date = Some("2025-03-15".into());
        let result = normalize(f, today());
        assert_eq!(result.draft.trial_duration_days, 90);
        assert_eq!(
            result.draft.trial_end_date,
            NaiveDate::from_ymd_opt(2025, 6, 13).unwrap()
        );
    }

    #[test]
    fn test_trial_duration_defaults_to_thirty() {
        let mut f = fields(Some("Netflix"), Some(15.49));
        f.is_trial = Some(true);
        let result = normalize(f, today());
        assert_eq!(result.draft.trial_duration_days, 30);
    }

    #[test]
    fn test_non_trial_clears_trial_fields() {
        let mut f = fields(Some("Netflix"), Some(15.49));
        f.is_trial = Some(false);
        f.trial_duration_days = Some(14);
        f.trial_start_date = Some("2025-03-01".into());
        f.trial_end_date = Some("2025-03-15".into());
        let result = normalize(f, today());
        assert_eq!(result.draft.trial_duration_days, 0);
        assert!(result.draft.trial_start_date.is_none());
        assert!(result.draft.trial_end_date.is_none());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut f = fields(Some("Amazon Prime"), Some(6.99));
        f.is_trial = Some(true);
        f.trial_start_date = Some("2025-03-15".into());
        let first = normalize(f, today());
        let second = normalize(first.draft.to_fields(), today());
        assert_eq!(first, second);
    }

    #[test]
    fn test_idempotent_on_unsuccessful_draft() {
        let first = normalize(DraftFields::default(), today());
        let second = normalize(first.draft.to_fields(), today());
        assert_eq!(first, second);
    }
}
