//! Remote delegate adapter.
//!
//! Invoked only when the pattern registry yields no draft. The delegate is an
//! external text-completion service: text (plus an optional image payload) in,
//! best-effort JSON-shaped draft fields out, fallible. Network failure,
//! timeout, a non-JSON reply, and missing required keys all collapse into the
//! single [`DelegateReply::Failed`] outcome; no partial-success merging is
//! attempted.

use std::time::Duration;

use crate::config::DelegateConfig;
use crate::draft::DraftFields;
use crate::error::{Result, SubwatchError};

const EXTRACTION_PROMPT: &str = r#"Extract subscription details from the text below.

## Input
{{input_text}}

Respond ONLY with JSON, no other text:
{
  "service_name": "name of the service, or null",
  "service_category": "Streaming|Music|Software|Cloud Storage|Gaming|News|Other",
  "account": "account identifier, or null",
  "monthly_cost": 9.99,
  "payment_date": "YYYY-MM-DD or null",
  "is_trial": true/false,
  "trial_duration_days": 30
}

Guidelines:
- monthly_cost: the per-month amount; divide yearly prices by 12
- trial_duration_days: 0 when there is no trial
- Use null for anything the text does not state"#;

/// Keys the delegate reply must carry to count as draft-shaped
const REQUIRED_KEYS: &[&str] = &["service_name", "monthly_cost"];

/// Typed outcome of one delegate call
#[derive(Debug, Clone)]
pub enum DelegateReply {
    Parsed(DraftFields),
    Failed(String),
}

/// Client for the external text-completion service
pub struct DelegateClient {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl DelegateClient {
    pub fn new(config: &DelegateConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        let api_key = config
            .api_key_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok());

        Self {
            agent,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        }
    }

    /// Send the text (and optional base64 image) through the delegate.
    /// Never errors past this boundary: every failure mode becomes
    /// [`DelegateReply::Failed`].
    pub fn complete(&self, text: &str, image: Option<&str>) -> DelegateReply {
        match self.request(text, image) {
            Ok(fields) => DelegateReply::Parsed(fields),
            Err(e) => DelegateReply::Failed(e.to_string()),
        }
    }

    fn request(&self, text: &str, image: Option<&str>) -> Result<DraftFields> {
        let prompt = EXTRACTION_PROMPT.replace("{{input_text}}", text);

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "image": image,
        });

        let mut request = self.agent.post(&self.endpoint);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", &format!("Bearer {}", key));
        }

        let response = request.send_json(&body)?;
        let reply = response.into_body().read_to_string()?;

        parse_reply(&reply)
    }
}

/// Parse a delegate reply into draft fields.
///
/// Accepts the JSON object directly, wrapped in a `result`/`completion`
/// envelope, or inside markdown code fencing.
pub fn parse_reply(reply: &str) -> Result<DraftFields> {
    let text = strip_code_fencing(reply);

    // Unwrap a {"result": "..."} / {"completion": "..."} envelope if present
    let text = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(serde_json::Value::Object(map)) => {
            match map
                .get("result")
                .or_else(|| map.get("completion"))
                .and_then(|v| v.as_str())
            {
                Some(inner) => strip_code_fencing(inner),
                None => serde_json::Value::Object(map).to_string(),
            }
        }
        _ => text,
    };

    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|_| SubwatchError::DelegateError("reply is not JSON".into()))?;

    let object = value
        .as_object()
        .ok_or_else(|| SubwatchError::DelegateError("reply is not a JSON object".into()))?;

    for key in REQUIRED_KEYS {
        if !object.contains_key(*key) {
            return Err(SubwatchError::DelegateError(format!(
                "reply is missing required key: {}",
                key
            )));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| SubwatchError::DelegateError(format!("reply shape mismatch: {}", e)))
}

/// Strip markdown code fencing from a reply (e.g. ```json ... ```)
fn strip_code_fencing(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        let body = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
        return body.trim().to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_reply() {
        let reply = r#"{
            "service_name": "Netflix",
            "service_category": "Streaming",
            "monthly_cost": 15.49,
            "is_trial": false,
            "trial_duration_days": 0
        }"#;
        let fields = parse_reply(reply).unwrap();
        assert_eq!(fields.service_name.as_deref(), Some("Netflix"));
        assert_eq!(fields.is_trial, Some(false));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"service_name\": \"Spotify\", \"monthly_cost\": 11.99}\n```";
        let fields = parse_reply(reply).unwrap();
        assert_eq!(fields.service_name.as_deref(), Some("Spotify"));
    }

    #[test]
    fn test_parse_enveloped_reply() {
        let reply = r#"{"result": "{\"service_name\": \"iCloud\", \"monthly_cost\": 2.99}"}"#;
        let fields = parse_reply(reply).unwrap();
        assert_eq!(fields.service_name.as_deref(), Some("iCloud"));
    }

    #[test]
    fn test_non_json_reply_fails() {
        assert!(parse_reply("sorry, I could not parse that").is_err());
    }

    #[test]
    fn test_missing_required_keys_fail() {
        assert!(parse_reply(r#"{"service_name": "Netflix"}"#).is_err());
        assert!(parse_reply(r#"{"monthly_cost": 9.99}"#).is_err());
    }

    #[test]
    fn test_null_values_are_accepted() {
        let reply = r#"{"service_name": null, "monthly_cost": null}"#;
        let fields = parse_reply(reply).unwrap();
        assert!(fields.service_name.is_none());
        assert!(fields.monthly_cost.is_none());
    }

    #[test]
    fn test_strip_code_fencing() {
        assert_eq!(strip_code_fencing("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fencing("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fencing("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(
            strip_code_fencing("preamble\n```json\n{\"a\": 1}\n```\ntrailer"),
            "{\"a\": 1}"
        );
    }
}
