use serde::{Deserialize, Serialize};

use crate::delegate::{DelegateClient, DelegateReply};
use crate::draft::{DraftFields, SubscriptionDraft};
use crate::matchers::MatcherRegistry;
use crate::normalize;

/// A free-text parse request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseRequest {
    pub text: String,
    /// Optional base64 image payload for multimodal delegate input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ParseRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }
}

/// Outcome of one parse. `success=false` still carries best-effort
/// `parsed_data` with nulls for unresolved fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub success: bool,
    pub message: String,
    pub parsed_data: SubscriptionDraft,
}

/// The ordered fallback chain: pattern registry first, the delegate on a
/// miss, the normalizer always last.
pub struct Pipeline {
    registry: MatcherRegistry,
    delegate: Option<DelegateClient>,
}

impl Pipeline {
    pub fn new(registry: MatcherRegistry, delegate: Option<DelegateClient>) -> Self {
        Self { registry, delegate }
    }

    /// Parse free text into a normalized draft. Total: every path, including
    /// a pattern miss combined with a delegate failure, terminates in a
    /// draft the caller can render for manual completion.
    pub fn parse(&self, request: &ParseRequest) -> ParseOutcome {
        let (fields, via) = match self.registry.parse(&request.text) {
            Some(fields) => (fields, Via::Pattern),
            None => match &self.delegate {
                Some(client) => {
                    match client.complete(&request.text, request.image.as_deref()) {
                        DelegateReply::Parsed(fields) => (fields, Via::Delegate),
                        DelegateReply::Failed(reason) => {
                            (DraftFields::default(), Via::DelegateFailed(reason))
                        }
                    }
                }
                None => (DraftFields::default(), Via::NoDelegate),
            },
        };

        let normalized = normalize::normalize_now(fields);

        let message = if normalized.success {
            let name = normalized
                .draft
                .service_name
                .as_deref()
                .unwrap_or("subscription");
            match via {
                Via::Pattern => format!("Parsed {} from a known service pattern", name),
                Via::Delegate => format!("Parsed {} via the delegate", name),
                _ => format!("Parsed {}", name),
            }
        } else {
            let detail = normalized
                .failure
                .as_deref()
                .unwrap_or("fields could not be resolved");
            match via {
                Via::DelegateFailed(reason) => {
                    format!("Delegate failed ({}); {}; complete the draft manually", reason, detail)
                }
                Via::NoDelegate => {
                    format!("No pattern matched and no delegate is configured; {}; complete the draft manually", detail)
                }
                _ => format!("{}; complete the draft manually", detail),
            }
        };

        ParseOutcome {
            success: normalized.success,
            message,
            parsed_data: normalized.draft,
        }
    }
}

enum Via {
    Pattern,
    Delegate,
    DelegateFailed(String),
    NoDelegate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::new(MatcherRegistry::builtin(), None)
    }

    #[test]
    fn test_pattern_path() {
        let outcome = pipeline().parse(&ParseRequest::text("netflix for $15.49/month"));
        assert!(outcome.success);
        assert_eq!(outcome.parsed_data.service_name.as_deref(), Some("Netflix"));
        assert_eq!(outcome.parsed_data.monthly_cost, Some(15.49));
    }

    #[test]
    fn test_miss_without_delegate_returns_template_draft() {
        let outcome = pipeline().parse(&ParseRequest::text("pay the water bill"));
        assert!(!outcome.success);
        assert!(outcome.parsed_data.service_name.is_none());
        assert!(outcome.parsed_data.monthly_cost.is_none());
        // Defaults are still applied to the template draft
        assert_eq!(outcome.parsed_data.account, crate::draft::DEFAULT_ACCOUNT);
        assert!(outcome.message.contains("complete the draft manually"));
    }

    #[test]
    fn test_chinese_end_to_end() {
        let outcome =
            pipeline().parse(&ParseRequest::text("添加amazon prime 服务 一个月6.99 前三个月免费"));
        assert!(outcome.success);
        let draft = outcome.parsed_data;
        assert_eq!(draft.service_name.as_deref(), Some("Amazon Prime"));
        assert_eq!(draft.monthly_cost, Some(6.99));
        assert!(draft.is_trial);
        assert_eq!(draft.trial_duration_days, 90);
    }
}
