use backon::{ExponentialBuilder, Retryable};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::config::Config;
use crate::db::models::Spec;
use crate::error::ForgeError;
use crate::llm::parse::parse_plan;
use crate::llm::prompt::build_plan_prompt;
use crate::types::plan::Plan;

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Low-level Gemini `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: Url,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: Url) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("planforge/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("FATAL: initialize Gemini HTTP client failed");
        Self {
            http,
            api_key,
            model,
            base_url,
        }
    }

    /// POST a prompt to `models/{model}:generateContent` and return the
    /// concatenated candidate text. Server errors are retried with backoff.
    pub async fn generate_content(&self, prompt: &str) -> Result<String, ForgeError> {
        let url = self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))?;
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let resp = (|| async {
            let resp = self
                .http
                .post(url.clone())
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await?;
            if resp.status().is_server_error() {
                let status = resp.status();
                let err = resp.error_for_status().unwrap_err();
                error!("Gemini server error (will retry): {}", status);
                return Err(err);
            }
            Ok(resp)
        })
        .retry(default_retry_policy())
        .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ForgeError::LlmStatus(status));
        }

        let payload: Value = resp.json().await?;
        debug!(model = %self.model, "Gemini response received");
        extract_candidate_text(&payload)
            .ok_or_else(|| ForgeError::LlmParse("no content generated".to_string()))
    }

    pub async fn generate_plan(&self, spec: &Spec) -> Result<Plan, ForgeError> {
        let text = self.generate_content(&build_plan_prompt(spec)).await?;
        parse_plan(&text)
    }

    /// One-word probe: a single attempt with a short timeout, no retries.
    /// The status endpoint polls this unauthenticated, so it must not
    /// inherit the generation path's backoff or 60s budget.
    pub async fn health_check(&self) -> bool {
        let url = match self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
        {
            Ok(url) => url,
            Err(e) => {
                error!("LLM health check failed: {}", e);
                return false;
            }
        };
        let body = json!({ "contents": [{ "parts": [{ "text": "test" }] }] });

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(5))
            .json(&body)
            .send()
            .await;
        match resp {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                error!("LLM health check failed with status: {}", resp.status());
                false
            }
            Err(e) => {
                error!("LLM health check failed: {}", e);
                false
            }
        }
    }
}

/// Concatenate the text parts of the first candidate.
///
/// Expected shape: `{"candidates": [{"content": {"parts": [{"text": "..."}]}}]}`
fn extract_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let mut text = String::new();
    for part in parts {
        if let Some(chunk) = part.get("text").and_then(|t| t.as_str()) {
            text.push_str(chunk);
        }
    }
    (!text.is_empty()).then_some(text)
}

/// High-level wrapper that is either an active Gemini client or disabled
/// when no API key is configured.
pub enum LlmClient {
    Active(GeminiClient),
    Disabled,
}

impl LlmClient {
    pub fn from_config(cfg: &Config) -> Self {
        match cfg.gemini_api_key.as_deref() {
            Some(key) if !key.is_empty() => LlmClient::Active(GeminiClient::new(
                key.to_string(),
                cfg.gemini_model.clone(),
                cfg.gemini_base_url.clone(),
            )),
            _ => LlmClient::Disabled,
        }
    }

    pub async fn generate_plan(&self, spec: &Spec) -> Result<Plan, ForgeError> {
        match self {
            LlmClient::Active(client) => client.generate_plan(spec).await,
            LlmClient::Disabled => Err(ForgeError::LlmUnavailable),
        }
    }

    pub async fn health_check(&self) -> bool {
        match self {
            LlmClient::Active(client) => client.health_check().await,
            LlmClient::Disabled => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_from_expected_shape() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "hello " }, { "text": "world" }] },
                "finishReason": "STOP"
            }],
            "modelVersion": "gemini-2.5-flash"
        });
        assert_eq!(extract_candidate_text(&payload).as_deref(), Some("hello world"));
    }

    #[test]
    fn extract_text_missing_candidates() {
        assert!(extract_candidate_text(&json!({ "promptFeedback": {} })).is_none());
    }

    #[test]
    fn extract_text_empty_parts() {
        let payload = json!({ "candidates": [{ "content": { "parts": [] } }] });
        assert!(extract_candidate_text(&payload).is_none());
    }

    #[test]
    fn from_config_without_key_is_disabled() {
        let cfg = Config::default();
        assert!(matches!(LlmClient::from_config(&cfg), LlmClient::Disabled));
    }

    #[test]
    fn from_config_with_empty_key_is_disabled() {
        let cfg = Config {
            gemini_api_key: Some(String::new()),
            ..Config::default()
        };
        assert!(matches!(LlmClient::from_config(&cfg), LlmClient::Disabled));
    }

    #[test]
    fn from_config_with_key_is_active() {
        let cfg = Config {
            gemini_api_key: Some("key".to_string()),
            ..Config::default()
        };
        assert!(matches!(LlmClient::from_config(&cfg), LlmClient::Active(_)));
    }

    #[tokio::test]
    async fn disabled_client_reports_unavailable() {
        use chrono::Utc;
        let spec = Spec {
            id: 1,
            user_id: 1,
            title: "t".to_string(),
            goal: "g".to_string(),
            target_users: "u".to_string(),
            constraints: "c".to_string(),
            risks: None,
            template: None,
            created_at: Utc::now(),
        };
        let err = LlmClient::Disabled.generate_plan(&spec).await.unwrap_err();
        assert!(matches!(err, ForgeError::LlmUnavailable));
        assert!(!LlmClient::Disabled.health_check().await);
    }
}
