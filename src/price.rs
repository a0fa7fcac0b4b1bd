//! Price token scanning shared by the page-signal extractor and the
//! pattern-based parser.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::draft::BillingCycle;

// Currency-prefixed amount for the three supported currency patterns.
// First match in text order wins; no cross-currency tie-break.
static CURRENCY_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([$€¥￥])\s*(\d+(?:\.\d{1,2})?)").expect("Invalid currency amount regex")
});

// Optional billing-period suffix directly after an amount: "/month", "per yr",
// "每月", "/年", ... The word boundary keeps "mo" from matching inside "more";
// CJK units get their own group because \b does not apply between CJK chars.
static PERIOD_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:/|每|per\s+)?\s*(?:(annual(?:ly)?|month(?:ly)?|mo|year(?:ly)?|yr)\b|([月年]))")
        .expect("Invalid period regex")
});

// Bare decimal used by the pattern parser when no currency symbol is present.
// The fractional part is required so day/month counts are not read as prices.
static BARE_DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d{1,2}").expect("Invalid decimal regex"));

/// Billing-period unit attached to a price token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    Month,
    Year,
}

impl From<PeriodUnit> for BillingCycle {
    fn from(unit: PeriodUnit) -> Self {
        match unit {
            PeriodUnit::Month => BillingCycle::Monthly,
            PeriodUnit::Year => BillingCycle::Yearly,
        }
    }
}

/// A currency-prefixed price token found in page text
#[derive(Debug, Clone, Serialize)]
pub struct PriceToken {
    /// The token as it appeared, e.g. "$9.99/month"
    pub raw: String,
    pub amount: f64,
    pub currency: char,
    pub period: Option<PeriodUnit>,
}

/// Scan text for currency-prefixed price tokens, in text order
pub fn scan_price_tokens(text: &str) -> Vec<PriceToken> {
    let mut tokens = Vec::new();

    for caps in CURRENCY_AMOUNT_RE.captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        let currency = caps[1].chars().next().expect("currency group is one char");
        let amount: f64 = match caps[2].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };

        let rest = &text[whole.end()..];
        let (period, suffix_len) = match PERIOD_SUFFIX_RE.captures(rest) {
            Some(suffix) => {
                let word = suffix
                    .get(1)
                    .or_else(|| suffix.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or("");
                let unit = if word.starts_with("year")
                    || word.starts_with("annual")
                    || word == "yr"
                    || word == "年"
                {
                    PeriodUnit::Year
                } else {
                    PeriodUnit::Month
                };
                (Some(unit), suffix.get(0).map_or(0, |m| m.end()))
            }
            None => (None, 0),
        };

        let raw = text[whole.start()..whole.end() + suffix_len].trim().to_string();
        tokens.push(PriceToken {
            raw,
            amount,
            currency,
            period,
        });
    }

    tokens
}

/// First bare decimal in the text (requires a fractional part)
pub fn first_decimal(text: &str) -> Option<f64> {
    BARE_DECIMAL_RE
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// First price-like amount: a currency-prefixed token wins over a bare decimal
pub fn first_amount(text: &str) -> Option<f64> {
    scan_price_tokens(text)
        .first()
        .map(|t| t.amount)
        .or_else(|| first_decimal(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_dollar_with_period() {
        let tokens = scan_price_tokens("Premium is $9.99/month after the trial");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].amount, 9.99);
        assert_eq!(tokens[0].currency, '$');
        assert_eq!(tokens[0].period, Some(PeriodUnit::Month));
        assert_eq!(tokens[0].raw, "$9.99/month");
    }

    #[test]
    fn test_scan_yen_and_euro() {
        let tokens = scan_price_tokens("¥68每月 or €99.99 per year");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].currency, '¥');
        assert_eq!(tokens[0].period, Some(PeriodUnit::Month));
        assert_eq!(tokens[1].currency, '€');
        assert_eq!(tokens[1].amount, 99.99);
        assert_eq!(tokens[1].period, Some(PeriodUnit::Year));
    }

    #[test]
    fn test_scan_no_period() {
        let tokens = scan_price_tokens("Pay $5 once");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].amount, 5.0);
        assert_eq!(tokens[0].period, None);
    }

    #[test]
    fn test_first_amount_prefers_currency_token() {
        // The bare decimal appears first, but the currency token wins
        assert_eq!(first_amount("rated 4.5 stars, now $12.99"), Some(12.99));
    }

    #[test]
    fn test_first_amount_falls_back_to_decimal() {
        assert_eq!(first_amount("一个月6.99"), Some(6.99));
    }

    #[test]
    fn test_integers_are_not_prices() {
        // "30" in "30-day" must not be read as an amount
        assert_eq!(first_amount("30-day trial"), None);
    }

    #[test]
    fn test_no_amount() {
        assert!(scan_price_tokens("no prices here").is_empty());
        assert_eq!(first_amount("no prices here"), None);
    }
}
