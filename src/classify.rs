use serde::{Deserialize, Serialize};

use crate::signals::SignalSet;

/// Per-signal weights for the confidence score
pub const URL_KEYWORD_WEIGHT: u32 = 40;
pub const CONTENT_MANY_WEIGHT: u32 = 30;
pub const CONTENT_FEW_WEIGHT: u32 = 15;
pub const PRICE_TOKEN_WEIGHT: u32 = 25;
pub const FORM_PRESENCE_WEIGHT: u32 = 20;

/// Content-keyword hits at or above this count earn the full weight
const CONTENT_MANY_THRESHOLD: usize = 3;

/// Content-keyword hits at or above this count make the page a candidate
const CANDIDATE_KEYWORD_THRESHOLD: usize = 2;

/// What fired a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerType {
    PageDetected,
    PaymentLink,
    PaymentForm,
    PaymentButton,
    SubscriptionAction,
    PlanSelection,
    BillingCycleChange,
}

/// Outcome of classifying one signal set. Created and discarded within a
/// single scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_candidate: bool,
    /// Heuristic weight sum clamped to [0, 100]; not a probability
    pub confidence: u8,
    pub trigger: TriggerType,
}

/// Combine signals into a candidate decision and a confidence score.
///
/// The candidate decision uses its own branch thresholds and is intentionally
/// not derived from the numeric score: a single content keyword contributes
/// +15 to the score but does not by itself make the page a candidate.
pub fn classify(signals: &SignalSet) -> ClassificationResult {
    let hits = signals.content_keyword_count();

    let mut score: u32 = 0;
    if signals.url_keyword() {
        score += URL_KEYWORD_WEIGHT;
    }
    if hits >= CONTENT_MANY_THRESHOLD {
        score += CONTENT_MANY_WEIGHT;
    } else if hits >= 1 {
        score += CONTENT_FEW_WEIGHT;
    }
    if signals.price_token() {
        score += PRICE_TOKEN_WEIGHT;
    }
    if signals.form_presence() {
        score += FORM_PRESENCE_WEIGHT;
    }

    let is_candidate = signals.url_keyword()
        || hits >= CANDIDATE_KEYWORD_THRESHOLD
        || signals.price_token()
        || signals.form_presence();

    ClassificationResult {
        is_candidate,
        confidence: score.min(100) as u8,
        trigger: TriggerType::PageDetected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{Signal, SignalKind};

    fn set(url: bool, content: usize, price: bool, form: bool) -> SignalSet {
        let mut signals = Vec::new();
        if url {
            signals.push(Signal {
                kind: SignalKind::UrlKeyword,
                value: "subscribe".into(),
                context: None,
            });
        }
        for i in 0..content {
            signals.push(Signal {
                kind: SignalKind::ContentKeyword,
                value: format!("kw{}", i),
                context: None,
            });
        }
        if price {
            signals.push(Signal {
                kind: SignalKind::PriceToken,
                value: "$9.99".into(),
                context: None,
            });
        }
        if form {
            signals.push(Signal {
                kind: SignalKind::FormPresence,
                value: "form[action*='checkout']".into(),
                context: None,
            });
        }
        SignalSet { signals }
    }

    #[test]
    fn test_url_keyword_alone() {
        let result = classify(&set(true, 0, false, false));
        assert!(result.is_candidate);
        assert_eq!(result.confidence, 40);
    }

    #[test]
    fn test_content_tiers() {
        assert_eq!(classify(&set(false, 1, false, false)).confidence, 15);
        assert_eq!(classify(&set(false, 2, false, false)).confidence, 15);
        assert_eq!(classify(&set(false, 3, false, false)).confidence, 30);
        assert_eq!(classify(&set(false, 7, false, false)).confidence, 30);
    }

    #[test]
    fn test_single_keyword_is_not_candidate() {
        // Scores +15 but the decision branch needs at least 2 hits
        let result = classify(&set(false, 1, false, false));
        assert_eq!(result.confidence, 15);
        assert!(!result.is_candidate);
    }

    #[test]
    fn test_two_keywords_make_candidate() {
        assert!(classify(&set(false, 2, false, false)).is_candidate);
    }

    #[test]
    fn test_all_signals_clamped_to_hundred() {
        // 40 + 30 + 25 + 20 = 115, clamped
        let result = classify(&set(true, 3, true, true));
        assert_eq!(result.confidence, 100);
        assert!(result.is_candidate);
    }

    #[test]
    fn test_empty_set() {
        let result = classify(&SignalSet::default());
        assert!(!result.is_candidate);
        assert_eq!(result.confidence, 0);
    }

    #[test]
    fn test_additional_signal_raises_score() {
        // Adding any signal type strictly raises the score, all else equal
        let base = classify(&set(false, 2, false, false)).confidence;
        assert!(classify(&set(true, 2, false, false)).confidence > base);
        assert!(classify(&set(false, 2, true, false)).confidence > base);
        assert!(classify(&set(false, 2, false, true)).confidence > base);
        assert!(classify(&set(false, 3, false, false)).confidence > base);
    }
}
