use std::time::Duration;

use async_trait::async_trait;
use kvocab_config::llm::LlmConfig;
use kvocab_service::{LanguageModel, LlmResponse, Prompt, ProviderMetadata, ServiceError};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// Gemini `generateContent` client with JSON structured output
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_url, self.model)
    }
}

fn request_body(prompt: &Prompt) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt.text }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": prompt.schema
        }
    })
}

/// Map a failed response. Quota exhaustion may arrive with a non-429 status,
/// so the body status is checked as well.
fn classify_error(status: StatusCode, body: &str) -> ServiceError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().map(|v| &v["error"]);
    let message = error
        .and_then(|e| e["message"].as_str())
        .unwrap_or(body)
        .to_string();
    let exhausted = error.and_then(|e| e["status"].as_str()) == Some("RESOURCE_EXHAUSTED");

    if status == StatusCode::TOO_MANY_REQUESTS || exhausted {
        return ServiceError::RateLimitExceeded(message);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ServiceError::AuthenticationError;
    }
    ServiceError::ApiError(format!("HTTP {status}: {message}"))
}

fn candidate_text(body: &Value) -> Result<String, ServiceError> {
    let candidate = body["candidates"]
        .get(0)
        .ok_or_else(|| ServiceError::InvalidResponse("No candidates in response".to_string()))?;

    candidate["content"]["parts"]
        .get(0)
        .and_then(|part| part["text"].as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            let reason = candidate["finishReason"].as_str().unwrap_or("unknown");
            ServiceError::InvalidResponse(format!("No text in candidate (finish reason {reason})"))
        })
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &Prompt) -> Result<LlmResponse, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::AuthenticationError);
        }

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", &self.api_key)])
            .json(&request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        let json: Value = response.json().await.map_err(|e| {
            ServiceError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        Ok(LlmResponse {
            text: candidate_text(&json)?,
            model: self.model.clone(),
        })
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "Gemini".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_schema_and_json_mime_type() {
        let prompt = Prompt {
            text: "define".to_string(),
            schema: json!({ "type": "object" }),
        };

        let body = request_body(&prompt);

        assert_eq!(body["contents"][0]["parts"][0]["text"], "define");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "object");
    }

    #[test]
    fn quota_errors_are_rate_limits() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;

        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, body),
            ServiceError::RateLimitExceeded(m) if m == "Quota exceeded"
        ));
        assert!(classify_error(StatusCode::SERVICE_UNAVAILABLE, body).is_retryable());
    }

    #[test]
    fn other_errors_are_fatal() {
        assert!(matches!(
            classify_error(StatusCode::FORBIDDEN, "{}"),
            ServiceError::AuthenticationError
        ));

        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn extracts_first_candidate_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"definitions\": []}" }] } }]
        });
        assert_eq!(candidate_text(&body).unwrap(), "{\"definitions\": []}");

        let blocked = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let err = candidate_text(&blocked).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));

        assert!(candidate_text(&json!({})).is_err());
    }

    #[test]
    fn endpoint_includes_model() {
        let config = LlmConfig {
            api_url: "https://example.test/v1beta/models/".to_string(),
            model: "gemini-2.0-flash".to_string(),
            ..LlmConfig::default()
        };

        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(client.metadata().name, "Gemini");
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
